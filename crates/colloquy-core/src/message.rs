//! Wire shapes of `POST /api/message` and of the dialog engine's reply.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::context::ConversationContext;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageInput {
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessageInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: Map::new(),
        }
    }
}

/// Inbound turn from the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageRequest {
    #[serde(default)]
    pub input: Option<MessageInput>,
    #[serde(default)]
    pub context: Option<ConversationContext>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageOutput {
    /// Lines rendered to the end user, in order.
    #[serde(default, deserialize_with = "string_or_seq")]
    pub text: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reply of the dialog engine, augmented by the dispatcher and returned to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub input: MessageInput,
    #[serde(default)]
    pub context: ConversationContext,
    #[serde(default)]
    pub output: MessageOutput,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessageResponse {
    /// A reply carrying a single fixed line, without consulting the dialog engine.
    pub fn notice(context: ConversationContext, line: impl Into<String>) -> Self {
        Self {
            context,
            output: MessageOutput {
                text: vec![line.into()],
                extra: Map::new(),
            },
            ..Default::default()
        }
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.output.text.push(line.into());
    }
}

fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) if s.is_empty() => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}
