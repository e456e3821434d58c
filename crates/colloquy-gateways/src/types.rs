use serde::{Deserialize, Serialize};

/// A scored block of text returned by a knowledge search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    #[serde(rename = "passage_text")]
    pub text: String,
    #[serde(rename = "passage_score", default)]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

impl Passage {
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            score,
            document_id: None,
        }
    }
}

/// Where queries go once the search backend has been prepared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub environment_id: String,
    pub collection_id: String,
}

/// An intent or entity in the dialog engine's catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub name: String,
    pub description: Option<String>,
}

impl CatalogItem {
    pub fn new(name: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            name: name.into(),
            description: description.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeOutput {
    pub text: String,
}

/// A node of the dialog engine's response graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogNode {
    pub dialog_node: String,
    pub title: String,
    pub conditions: String,
    pub output: NodeOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_sibling: Option<String>,
}
