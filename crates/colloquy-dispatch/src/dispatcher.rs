use std::sync::Arc;

use colloquy_core::config::DispatchConfig;
use colloquy_core::MessageResponse;
use colloquy_gateways::{DialogGateway, KnowledgeGateway, LanguageGateway};

use crate::action::{Action, ActionRequest, LookupRequest};
use crate::error::DispatchError;
use crate::passage::PassageResolver;
use crate::readiness::Readiness;
use crate::topics::{TopicOutcome, TopicRegistry};

/// Handles to the three collaborating services.
#[derive(Clone)]
pub struct Gateways {
    pub dialog: Arc<dyn DialogGateway>,
    pub knowledge: Arc<dyn KnowledgeGateway>,
    pub language: Arc<dyn LanguageGateway>,
}

/// Reads the action tag out of a dialog reply and performs the requested lookup.
pub struct Dispatcher {
    dialog: Arc<dyn DialogGateway>,
    topics: TopicRegistry,
    passages: PassageResolver,
}

impl Dispatcher {
    pub fn new(gateways: &Gateways, readiness: Arc<Readiness>, config: &DispatchConfig) -> Self {
        Self {
            dialog: gateways.dialog.clone(),
            topics: TopicRegistry::new(gateways.dialog.clone(), config),
            passages: PassageResolver::new(
                gateways.knowledge.clone(),
                gateways.language.clone(),
                readiness,
                config.extraction,
            ),
        }
    }

    /// Handle the action pending in `response`, if any.
    ///
    /// A reply without a pending tag comes back untouched. Handler failures
    /// are logged and never turn into an error for the caller.
    pub async fn dispatch(&self, workspace_id: &str, mut response: MessageResponse) -> MessageResponse {
        let Some(tag) = response.context.pending_lookup() else {
            return response;
        };

        let Some(action) = Action::from_tag(&tag) else {
            tracing::warn!("Ignoring unknown action tag '{}'", tag);
            response.context.clear_action();
            return response;
        };

        let input = response.input.text.clone();
        let built = ActionRequest::build(
            action,
            &LookupRequest {
                context: &response.context,
                input: &input,
            },
        );
        let request = match built {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("{e}");
                response.context.clear_action();
                return response;
            }
        };

        tracing::debug!("Dispatching action '{}'", action);
        if let Err(e) = self.run(workspace_id, request, &mut response).await {
            tracing::error!("Action '{}' failed: {e}", action);
        }
        response
    }

    async fn run(
        &self,
        workspace_id: &str,
        request: ActionRequest,
        response: &mut MessageResponse,
    ) -> Result<(), DispatchError> {
        // The lookup flow owns its tag; every other action fires once.
        if !matches!(request, ActionRequest::KnowledgeLookup { .. }) {
            response.context.clear_action();
        }

        match request {
            ActionRequest::KnowledgeLookup { input } => {
                let resolution = self.passages.resolve(&mut response.context, &input).await;
                if let Some(line) = resolution.line() {
                    response.push_line(line);
                }
            }
            ActionRequest::ListIntents => {
                for item in self.dialog.list_intents(workspace_id).await? {
                    response.push_line(item.name);
                    response.push_line(item.description.unwrap_or_default());
                }
            }
            ActionRequest::ListEntities => {
                for item in self.dialog.list_entities(workspace_id).await? {
                    response.push_line(item.name);
                    response.push_line(item.description.unwrap_or_default());
                }
            }
            ActionRequest::CreateIntent { name } => {
                self.dialog.create_intent(workspace_id, &name, &name).await?;
            }
            ActionRequest::CreateEntity { name } => {
                self.dialog.create_entity(workspace_id, &name, &name).await?;
            }
            ActionRequest::ListTopics => {
                for topic in self.topics.list(workspace_id).await? {
                    response.push_line(topic);
                }
            }
            ActionRequest::VerifyTopicName { keyword } => {
                response.context.key = Some(keyword);
            }
            ActionRequest::UpdateDialogue { topic, passage } => {
                let outcome = self
                    .topics
                    .ensure_topic_node(workspace_id, &topic, passage.as_deref())
                    .await?;
                if outcome == TopicOutcome::Created {
                    response.context.key = None;
                    response.context.new_passage = None;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::{ConversationContext, MessageInput};
    use colloquy_gateways::mock::{MockDialogGateway, MockKnowledgeGateway, MockLanguageGateway};
    use colloquy_gateways::GatewayError;

    fn dispatcher(dialog: Arc<MockDialogGateway>) -> Dispatcher {
        let gateways = Gateways {
            dialog,
            knowledge: Arc::new(MockKnowledgeGateway::new()),
            language: Arc::new(MockLanguageGateway::new()),
        };
        let readiness = Arc::new(Readiness::ready("ws", MockKnowledgeGateway::params()));
        Dispatcher::new(&gateways, readiness, &DispatchConfig::default())
    }

    fn reply(tag: &str, input: &str) -> MessageResponse {
        let mut context = ConversationContext::default();
        context.set_lookup(tag);
        MessageResponse {
            input: MessageInput::text(input),
            context,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn intents_list_name_and_description_lines() {
        let dialog = Arc::new(MockDialogGateway::new());
        dialog.add_intent("greeting", Some("Say hello"));
        dialog.add_intent("goodbye", None);
        let d = dispatcher(dialog);

        let out = d.dispatch("ws", reply("list_intents", "")).await;

        assert_eq!(out.output.text, vec!["greeting", "Say hello", "goodbye", ""]);
        assert!(out.context.pending_lookup().is_none());
    }

    #[tokio::test]
    async fn create_intent_uses_input_as_example() {
        let dialog = Arc::new(MockDialogGateway::new());
        let d = dispatcher(dialog.clone());

        d.dispatch("ws", reply("create_intent", "book_flight")).await;

        let intents = dialog.intents();
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].name, "book_flight");
        assert_eq!(intents[0].description.as_deref(), Some("book_flight"));
    }

    #[tokio::test]
    async fn create_entity_registers_single_value() {
        let dialog = Arc::new(MockDialogGateway::new());
        let d = dispatcher(dialog.clone());

        let out = d.dispatch("ws", reply("create_entity", "colour")).await;

        assert_eq!(dialog.entities()[0].name, "colour");
        assert_eq!(dialog.values("colour"), vec!["colour".to_string()]);
        assert!(out.output.text.is_empty());
    }

    #[tokio::test]
    async fn list_topics_appends_each_value() {
        let dialog = Arc::new(MockDialogGateway::new());
        dialog.add_value("topics", "qubit");
        dialog.add_value("topics", "entanglement");
        let d = dispatcher(dialog);

        let out = d.dispatch("ws", reply("list_topics", "")).await;

        assert_eq!(out.output.text, vec!["qubit", "entanglement"]);
    }

    #[tokio::test]
    async fn verify_topic_copies_first_keyword() {
        let d = dispatcher(Arc::new(MockDialogGateway::new()));
        let mut resp = reply("verify_topic_name", "");
        resp.context.keywords = Some(vec![colloquy_core::Keyword {
            text: "superposition".into(),
            relevance: 0.7,
            sentiment: None,
        }]);

        let out = d.dispatch("ws", resp).await;

        assert_eq!(out.context.key.as_deref(), Some("superposition"));
        assert!(out.context.pending_lookup().is_none());
    }

    #[tokio::test]
    async fn missing_field_clears_tag_and_continues() {
        let dialog = Arc::new(MockDialogGateway::new());
        let d = dispatcher(dialog.clone());
        let mut resp = reply("update_dialogue", "");
        resp.output.text = vec!["engine line".into()];

        let out = d.dispatch("ws", resp).await;

        assert_eq!(out.output.text, vec!["engine line"]);
        assert!(out.context.pending_lookup().is_none());
        assert!(dialog.dialog_nodes().is_empty());
    }

    #[tokio::test]
    async fn update_dialogue_creates_then_clears_payload() {
        let dialog = Arc::new(MockDialogGateway::new());
        let d = dispatcher(dialog.clone());
        let mut resp = reply("update_dialogue", "");
        resp.context.key = Some("qubit".into());
        resp.context.new_passage = Some("a unit of quantum information".into());

        let out = d.dispatch("ws", resp).await;

        assert!(out.context.key.is_none());
        assert!(out.context.new_passage.is_none());
        assert_eq!(dialog.dialog_nodes()[0].conditions, "@topics:qubit");
    }

    #[tokio::test]
    async fn creation_failure_is_logged_not_raised() {
        let dialog = Arc::new(MockDialogGateway::new());
        dialog.fail_next(GatewayError::Status {
            code: 400,
            message: "bad name".into(),
        });
        let d = dispatcher(dialog.clone());

        let out = d.dispatch("ws", reply("create_entity", "x y")).await;

        assert!(out.context.pending_lookup().is_none());
        assert!(dialog.entities().is_empty());
    }

    #[tokio::test]
    async fn non_string_tag_is_ignored() {
        let d = dispatcher(Arc::new(MockDialogGateway::new()));
        let mut resp = MessageResponse::default();
        resp.context.action.lookup = Some(serde_json::json!(7));

        let out = d.dispatch("ws", resp).await;

        assert!(out.context.action.lookup.is_none());
        assert!(out.output.text.is_empty());
    }
}
