//! Conversation context round-tripped between caller, dialog engine and dispatcher.
//!
//! The server keeps no session store: the caller resends the context it was
//! given on every turn. Reserved fields are typed here; anything else the
//! dialog engine or the caller stores is kept verbatim in `extra`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Version of the reserved-field layout below.
pub const SCHEMA_VERSION: u32 = 1;

/// Tag value meaning "nothing pending".
pub const LOOKUP_COMPLETE: &str = "complete";

fn current_schema() -> u32 {
    SCHEMA_VERSION
}

/// The `action` sub-structure the dialog engine uses to request a lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionSlot {
    /// Kept as raw JSON: a malformed tag is a no-op, not a request error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    #[serde(rename = "colloquy_schema", default = "current_schema")]
    pub schema_version: u32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub action: ActionSlot,

    /// Original question of the knowledge-lookup flow in progress.
    #[serde(rename = "inputQuery", default)]
    pub input_query: Option<String>,

    /// Cursor into the ranked passages for `input_query`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub field: u32,

    /// Single-use feedback on the last shown answer.
    #[serde(rename = "isRelevant", default, deserialize_with = "lenient_flag")]
    pub is_relevant: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<Keyword>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nlu_output: Option<Analysis>,

    /// Active topic name.
    #[serde(default)]
    pub key: Option<String>,

    /// Last surfaced answer.
    #[serde(default)]
    pub new_passage: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            action: ActionSlot::default(),
            input_query: None,
            field: 0,
            is_relevant: None,
            keywords: None,
            nlu_output: None,
            key: None,
            new_passage: None,
            extra: Map::new(),
        }
    }
}

impl ConversationContext {
    /// The action tag still waiting to be handled, if any.
    ///
    /// Returns `None` when the tag is absent or `"complete"`. Non-string
    /// tags come back as their JSON text so the dispatcher can treat them
    /// as unrecognized.
    pub fn pending_lookup(&self) -> Option<String> {
        match self.action.lookup.as_ref()? {
            Value::Null => None,
            Value::String(s) if s.is_empty() || s == LOOKUP_COMPLETE => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn set_lookup(&mut self, tag: &str) {
        self.action.lookup = Some(Value::String(tag.to_string()));
    }

    /// Reset `action` to `{}` so the same lookup does not fire again.
    pub fn clear_action(&mut self) {
        self.action = ActionSlot::default();
    }

    pub fn search_in_progress(&self) -> bool {
        self.input_query.is_some()
    }

    /// Consume the relevance feedback flag.
    pub fn take_feedback(&mut self) -> Option<bool> {
        self.is_relevant.take()
    }

    /// Drop every piece of knowledge-lookup flow state.
    pub fn reset_search_flow(&mut self) {
        self.input_query = None;
        self.is_relevant = None;
        self.field = 0;
        self.new_passage = None;
        self.key = None;
    }

    pub fn first_keyword(&self) -> Option<&str> {
        self.keywords
            .as_ref()?
            .first()
            .map(|k| k.text.as_str())
            .filter(|t| !t.trim().is_empty())
    }
}

/// A keyword extracted by the language service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub text: String,
    #[serde(default)]
    pub relevance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMention {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(default)]
    pub relevance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSentiment {
    pub document: Sentiment,
}

/// Result of one language analysis call, cached in the context as `nlu_output`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    #[serde(default)]
    pub entities: Vec<EntityMention>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<DocumentSentiment>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept booleans, the dialog engine's numeric 0/1, and yes/no strings.
fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => Some(n.as_f64().map_or(true, |v| v != 0.0)),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}
