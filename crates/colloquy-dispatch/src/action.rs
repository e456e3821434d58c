//! Action tags the dialog engine can place in `context.action.lookup`,
//! and the validated request each one turns into.

use std::fmt;

use colloquy_core::ConversationContext;

use crate::error::DispatchError;

/// Tag of the knowledge-lookup action. The name predates the current
/// search backend and is baked into existing dialog workspaces.
pub const KNOWLEDGE_LOOKUP_TAG: &str = "rnr";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ListIntents,
    ListEntities,
    CreateIntent,
    CreateEntity,
    ListTopics,
    VerifyTopicName,
    UpdateDialogue,
    KnowledgeLookup,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::ListIntents,
        Action::ListEntities,
        Action::CreateIntent,
        Action::CreateEntity,
        Action::ListTopics,
        Action::VerifyTopicName,
        Action::UpdateDialogue,
        Action::KnowledgeLookup,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Action::ListIntents => "list_intents",
            Action::ListEntities => "list_entities",
            Action::CreateIntent => "create_intent",
            Action::CreateEntity => "create_entity",
            Action::ListTopics => "list_topics",
            Action::VerifyTopicName => "verify_topic_name",
            Action::UpdateDialogue => "update_dialogue",
            Action::KnowledgeLookup => KNOWLEDGE_LOOKUP_TAG,
        }
    }

    /// Unknown tags yield `None`; they are not an error.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.tag() == tag)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// What a handler sees of the current turn. Assembled per dispatch, never stored.
#[derive(Debug, Clone, Copy)]
pub struct LookupRequest<'a> {
    pub context: &'a ConversationContext,
    pub input: &'a str,
}

/// A per-action request with its required context fields already checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    ListIntents,
    ListEntities,
    CreateIntent { name: String },
    CreateEntity { name: String },
    ListTopics,
    VerifyTopicName { keyword: String },
    /// `passage` is only needed when the topic turns out to be new.
    UpdateDialogue { topic: String, passage: Option<String> },
    KnowledgeLookup { input: String },
}

impl ActionRequest {
    pub fn build(action: Action, req: &LookupRequest<'_>) -> Result<Self, DispatchError> {
        let missing = |field: &'static str| DispatchError::MissingField { action, field };
        let input = req.input.trim();

        Ok(match action {
            Action::ListIntents => ActionRequest::ListIntents,
            Action::ListEntities => ActionRequest::ListEntities,
            Action::ListTopics => ActionRequest::ListTopics,
            Action::CreateIntent | Action::CreateEntity => {
                if input.is_empty() {
                    return Err(missing("input"));
                }
                let name = input.to_string();
                if action == Action::CreateIntent {
                    ActionRequest::CreateIntent { name }
                } else {
                    ActionRequest::CreateEntity { name }
                }
            }
            Action::VerifyTopicName => {
                let keyword = req.context.first_keyword().ok_or_else(|| missing("keywords"))?;
                ActionRequest::VerifyTopicName {
                    keyword: keyword.to_string(),
                }
            }
            Action::UpdateDialogue => {
                let topic = req
                    .context
                    .key
                    .as_deref()
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| missing("key"))?;
                ActionRequest::UpdateDialogue {
                    topic: topic.to_string(),
                    passage: req
                        .context
                        .new_passage
                        .clone()
                        .filter(|p| !p.trim().is_empty()),
                }
            }
            Action::KnowledgeLookup => {
                if input.is_empty() && !req.context.search_in_progress() {
                    return Err(missing("input"));
                }
                ActionRequest::KnowledgeLookup {
                    input: input.to_string(),
                }
            }
        })
    }
}
