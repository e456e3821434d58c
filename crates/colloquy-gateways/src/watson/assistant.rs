use async_trait::async_trait;
use colloquy_core::config::{read_secret, AssistantConfig};
use colloquy_core::{ConversationContext, MessageInput, MessageResponse};
use serde::{Deserialize, Serialize};

use super::{send, Endpoint};
use crate::error::{GatewayError, GatewayResult};
use crate::traits::DialogGateway;
use crate::types::{CatalogItem, DialogNode};

/// Dialog gateway backed by the Watson Assistant v1 API.
pub struct AssistantClient {
    endpoint: Endpoint,
}

impl AssistantClient {
    pub fn new(config: &AssistantConfig) -> Self {
        Self::with_api_key(config, read_secret(&config.api_key_env))
    }

    pub fn with_api_key(config: &AssistantConfig, api_key: String) -> Self {
        Self {
            endpoint: Endpoint::new(&config.url, &config.version, api_key),
        }
    }

    fn workspace_path(workspace_id: &str, rest: &str) -> String {
        if rest.is_empty() {
            format!("v1/workspaces/{workspace_id}")
        } else {
            format!("v1/workspaces/{workspace_id}/{rest}")
        }
    }
}

#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    input: MessageInput,
    context: &'a ConversationContext,
}

#[derive(Debug, Deserialize)]
struct IntentList {
    #[serde(default)]
    intents: Vec<IntentEntry>,
}

#[derive(Debug, Deserialize)]
struct IntentEntry {
    intent: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntityList {
    #[serde(default)]
    entities: Vec<EntityEntry>,
}

#[derive(Debug, Deserialize)]
struct EntityEntry {
    entity: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValueList {
    #[serde(default)]
    values: Vec<ValueEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ValueEntry {
    value: String,
}

#[derive(Debug, Serialize)]
struct CreateIntent<'a> {
    intent: &'a str,
    examples: Vec<Example<'a>>,
}

#[derive(Debug, Serialize)]
struct Example<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateEntity<'a> {
    entity: &'a str,
    values: Vec<ValueEntry>,
}

#[derive(Debug, Deserialize)]
struct WorkspaceList {
    #[serde(default)]
    workspaces: Vec<WorkspaceEntry>,
}

#[derive(Debug, Deserialize)]
struct WorkspaceEntry {
    name: String,
    workspace_id: String,
}

/// Catalog names may hold spaces or symbols; keep path segments safe.
fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

#[async_trait]
impl DialogGateway for AssistantClient {
    async fn send_turn(
        &self,
        workspace_id: &str,
        input: &str,
        context: ConversationContext,
    ) -> GatewayResult<MessageResponse> {
        let body = MessageBody {
            input: MessageInput::text(input),
            context: &context,
        };
        let req = self
            .endpoint
            .post(&Self::workspace_path(workspace_id, "message"))?
            .json(&body);
        let resp = send(req).await?;
        let reply: MessageResponse = resp.json().await?;
        tracing::debug!(
            "Assistant replied with {} output line(s)",
            reply.output.text.len()
        );
        Ok(reply)
    }

    async fn list_intents(&self, workspace_id: &str) -> GatewayResult<Vec<CatalogItem>> {
        let req = self.endpoint.get(&Self::workspace_path(workspace_id, "intents"))?;
        let list: IntentList = send(req).await?.json().await?;
        Ok(list
            .intents
            .into_iter()
            .map(|i| CatalogItem {
                name: i.intent,
                description: i.description,
            })
            .collect())
    }

    async fn list_entities(&self, workspace_id: &str) -> GatewayResult<Vec<CatalogItem>> {
        let req = self.endpoint.get(&Self::workspace_path(workspace_id, "entities"))?;
        let list: EntityList = send(req).await?.json().await?;
        Ok(list
            .entities
            .into_iter()
            .map(|e| CatalogItem {
                name: e.entity,
                description: e.description,
            })
            .collect())
    }

    async fn list_values(&self, workspace_id: &str, entity: &str) -> GatewayResult<Vec<String>> {
        let path = Self::workspace_path(workspace_id, &format!("entities/{}/values", segment(entity)));
        let list: ValueList = send(self.endpoint.get(&path)?).await?.json().await?;
        Ok(list.values.into_iter().map(|v| v.value).collect())
    }

    async fn create_intent(
        &self,
        workspace_id: &str,
        intent: &str,
        example: &str,
    ) -> GatewayResult<()> {
        let body = CreateIntent {
            intent,
            examples: vec![Example { text: example }],
        };
        let req = self
            .endpoint
            .post(&Self::workspace_path(workspace_id, "intents"))?
            .json(&body);
        send(req).await?;
        tracing::info!("Created intent '{intent}'");
        Ok(())
    }

    async fn create_entity(
        &self,
        workspace_id: &str,
        entity: &str,
        value: &str,
    ) -> GatewayResult<()> {
        let body = CreateEntity {
            entity,
            values: vec![ValueEntry {
                value: value.to_string(),
            }],
        };
        let req = self
            .endpoint
            .post(&Self::workspace_path(workspace_id, "entities"))?
            .json(&body);
        send(req).await?;
        tracing::info!("Created entity '{entity}'");
        Ok(())
    }

    async fn create_value(
        &self,
        workspace_id: &str,
        entity: &str,
        value: &str,
    ) -> GatewayResult<()> {
        let path = Self::workspace_path(workspace_id, &format!("entities/{}/values", segment(entity)));
        let req = self.endpoint.post(&path)?.json(&ValueEntry {
            value: value.to_string(),
        });
        send(req).await?;
        tracing::info!("Created value '{value}' in @{entity}");
        Ok(())
    }

    async fn create_dialog_node(&self, workspace_id: &str, node: &DialogNode) -> GatewayResult<()> {
        let req = self
            .endpoint
            .post(&Self::workspace_path(workspace_id, "dialog_nodes"))?
            .json(node);
        send(req).await?;
        tracing::info!("Created dialog node '{}'", node.dialog_node);
        Ok(())
    }

    async fn find_workspace(&self, name: &str) -> GatewayResult<Option<String>> {
        let list: WorkspaceList = send(self.endpoint.get("v1/workspaces")?).await?.json().await?;
        Ok(list
            .workspaces
            .into_iter()
            .find(|w| w.name == name)
            .map(|w| w.workspace_id))
    }

    async fn workspace_exists(&self, workspace_id: &str) -> GatewayResult<bool> {
        match send(self.endpoint.get(&Self::workspace_path(workspace_id, ""))?).await {
            Ok(_) => Ok(true),
            Err(GatewayError::Status { code: 404, .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_workspace(&self, definition: &serde_json::Value) -> GatewayResult<String> {
        let req = self.endpoint.post("v1/workspaces")?.json(definition);
        let created: WorkspaceEntry = send(req).await?.json().await?;
        tracing::info!("Created workspace '{}' ({})", created.name, created.workspace_id);
        Ok(created.workspace_id)
    }
}
