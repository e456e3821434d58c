use std::sync::Arc;

use colloquy_core::config::DispatchConfig;
use colloquy_gateways::types::NodeOutput;
use colloquy_gateways::{DialogGateway, DialogNode, GatewayError};

use crate::action::Action;
use crate::error::DispatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicOutcome {
    /// The topic was already known; nothing was created.
    Exists,
    Created,
}

/// The `topics` vocabulary of the dialog workspace and the nodes that answer it.
pub struct TopicRegistry {
    dialog: Arc<dyn DialogGateway>,
    entity: String,
    parent: String,
    previous_sibling: String,
}

impl TopicRegistry {
    pub fn new(dialog: Arc<dyn DialogGateway>, config: &DispatchConfig) -> Self {
        Self {
            dialog,
            entity: config.topic_entity.clone(),
            parent: config.topic_parent.clone(),
            previous_sibling: config.topic_previous_sibling.clone(),
        }
    }

    pub async fn list(&self, workspace_id: &str) -> Result<Vec<String>, DispatchError> {
        Ok(self.dialog.list_values(workspace_id, &self.entity).await?)
    }

    pub async fn exists(&self, workspace_id: &str, topic: &str) -> Result<bool, DispatchError> {
        Ok(self.list(workspace_id).await?.iter().any(|v| v == topic))
    }

    /// The dialog node that answers `topic` with `passage`.
    pub fn node_for(&self, topic: &str, passage: &str) -> DialogNode {
        DialogNode {
            dialog_node: topic.to_string(),
            title: topic.to_string(),
            conditions: format!("@{}:{}", self.entity, topic),
            output: NodeOutput {
                text: passage.to_string(),
            },
            parent: Some(self.parent.clone()),
            previous_sibling: Some(self.previous_sibling.clone()),
        }
    }

    /// Register `topic` and a node answering it, unless the topic is already known.
    ///
    /// `passage` is only required when the topic is new.
    pub async fn ensure_topic_node(
        &self,
        workspace_id: &str,
        topic: &str,
        passage: Option<&str>,
    ) -> Result<TopicOutcome, DispatchError> {
        if self.exists(workspace_id, topic).await? {
            tracing::debug!("Topic '{}' already registered", topic);
            return Ok(TopicOutcome::Exists);
        }

        let passage = passage.ok_or(DispatchError::MissingField {
            action: Action::UpdateDialogue,
            field: "new_passage",
        })?;

        match self.dialog.create_value(workspace_id, &self.entity, topic).await {
            Ok(()) => {}
            // Another turn registered the value between our list and create.
            Err(GatewayError::Status { code: 409, .. }) => {
                tracing::debug!("Topic value '{}' created concurrently", topic);
            }
            Err(e) => return Err(e.into()),
        }

        self.dialog
            .create_dialog_node(workspace_id, &self.node_for(topic, passage))
            .await?;
        tracing::info!("Created dialog node for topic '{}'", topic);
        Ok(TopicOutcome::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::AppConfig;
    use colloquy_gateways::mock::MockDialogGateway;

    fn registry(dialog: Arc<MockDialogGateway>) -> TopicRegistry {
        let config = AppConfig::default();
        TopicRegistry::new(dialog, &config.dispatch)
    }

    #[test]
    fn node_conditions_reference_topic_entity() {
        let reg = registry(Arc::new(MockDialogGateway::new()));
        let node = reg.node_for("qubit", "a unit of quantum information");
        assert_eq!(node.dialog_node, "qubit");
        assert_eq!(node.title, "qubit");
        assert_eq!(node.conditions, "@topics:qubit");
        assert_eq!(node.output.text, "a unit of quantum information");
        assert_eq!(node.parent.as_deref(), Some("node_1_1531784196478"));
        assert_eq!(node.previous_sibling.as_deref(), Some("node_3_1531784387906"));
    }

    #[tokio::test]
    async fn new_topic_creates_value_and_node() {
        let dialog = Arc::new(MockDialogGateway::new());
        let reg = registry(dialog.clone());

        let outcome = reg
            .ensure_topic_node("ws", "qubit", Some("an answer"))
            .await
            .unwrap();

        assert_eq!(outcome, TopicOutcome::Created);
        assert_eq!(dialog.values("topics"), vec!["qubit".to_string()]);
        assert_eq!(dialog.dialog_nodes().len(), 1);
    }

    #[tokio::test]
    async fn known_topic_needs_no_passage() {
        let dialog = Arc::new(MockDialogGateway::new());
        dialog.add_value("topics", "qubit");
        let reg = registry(dialog.clone());

        let outcome = reg.ensure_topic_node("ws", "qubit", None).await.unwrap();

        assert_eq!(outcome, TopicOutcome::Exists);
        assert!(dialog.dialog_nodes().is_empty());
    }

    #[tokio::test]
    async fn new_topic_without_passage_is_rejected() {
        let dialog = Arc::new(MockDialogGateway::new());
        let reg = registry(dialog.clone());

        let err = reg.ensure_topic_node("ws", "qubit", None).await.unwrap_err();

        assert!(matches!(err, DispatchError::MissingField { field: "new_passage", .. }));
        assert!(dialog.values("topics").is_empty());
    }

    #[tokio::test]
    async fn listing_failure_propagates() {
        let dialog = Arc::new(MockDialogGateway::new());
        dialog.fail_next(GatewayError::Transport("down".into()));
        let reg = registry(dialog);
        assert!(matches!(
            reg.list("ws").await,
            Err(DispatchError::Gateway(GatewayError::Transport(_)))
        ));
    }
}
