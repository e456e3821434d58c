use std::path::PathBuf;

use async_trait::async_trait;
use colloquy_core::{Analysis, ConversationContext, MessageResponse};

use crate::error::GatewayResult;
use crate::types::{CatalogItem, DialogNode, Passage, SearchParams};

/// The dialog engine: turn handling plus catalog and dialog-graph edits.
#[async_trait]
pub trait DialogGateway: Send + Sync {
    /// Send one turn and return the engine's reply with its updated context.
    async fn send_turn(
        &self,
        workspace_id: &str,
        input: &str,
        context: ConversationContext,
    ) -> GatewayResult<MessageResponse>;

    async fn list_intents(&self, workspace_id: &str) -> GatewayResult<Vec<CatalogItem>>;
    async fn list_entities(&self, workspace_id: &str) -> GatewayResult<Vec<CatalogItem>>;

    /// Values of one entity, in catalog order.
    async fn list_values(&self, workspace_id: &str, entity: &str) -> GatewayResult<Vec<String>>;

    /// Create an intent with a single example utterance.
    async fn create_intent(
        &self,
        workspace_id: &str,
        intent: &str,
        example: &str,
    ) -> GatewayResult<()>;

    /// Create an entity with a single value.
    async fn create_entity(&self, workspace_id: &str, entity: &str, value: &str)
        -> GatewayResult<()>;

    async fn create_value(&self, workspace_id: &str, entity: &str, value: &str)
        -> GatewayResult<()>;

    async fn create_dialog_node(&self, workspace_id: &str, node: &DialogNode) -> GatewayResult<()>;

    /// Look up a workspace by name.
    async fn find_workspace(&self, name: &str) -> GatewayResult<Option<String>>;

    /// Confirm that a workspace id exists.
    async fn workspace_exists(&self, workspace_id: &str) -> GatewayResult<bool>;

    /// Create a workspace from a full definition, returning its id.
    async fn create_workspace(&self, definition: &serde_json::Value) -> GatewayResult<String>;
}

/// The knowledge-search backend.
#[async_trait]
pub trait KnowledgeGateway: Send + Sync {
    /// One-time setup: make sure the collection exists and holds `documents`.
    async fn prepare(&self, documents: &[PathBuf]) -> GatewayResult<SearchParams>;

    /// Ranked passages for a natural-language query, best first.
    async fn query(&self, text: &str, params: &SearchParams) -> GatewayResult<Vec<Passage>>;
}

/// The language-understanding service.
#[async_trait]
pub trait LanguageGateway: Send + Sync {
    async fn analyze(&self, text: &str) -> GatewayResult<Analysis>;
}
