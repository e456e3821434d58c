use std::sync::Arc;

use colloquy_core::config::DispatchConfig;
use colloquy_core::{redact, ConversationContext, Keyword, MessageRequest, MessageResponse};

use crate::dispatcher::{Dispatcher, Gateways};
use crate::error::TurnError;
use crate::readiness::Readiness;

pub const SETUP_FAILED_PREFIX: &str = "The app failed to initialize properly. Setup and restart needed.";
pub const ASSISTANT_INITIALIZING: &str = "Assistant initialization in progress. Please try again.";

/// Entry point for one inbound turn.
pub struct TurnOrchestrator {
    gateways: Gateways,
    readiness: Arc<Readiness>,
    dispatcher: Dispatcher,
}

impl TurnOrchestrator {
    pub fn new(gateways: Gateways, readiness: Arc<Readiness>, config: &DispatchConfig) -> Self {
        let dispatcher = Dispatcher::new(&gateways, readiness.clone(), config);
        Self {
            gateways,
            readiness,
            dispatcher,
        }
    }

    pub fn readiness(&self) -> &Arc<Readiness> {
        &self.readiness
    }

    pub async fn handle(&self, request: MessageRequest) -> Result<MessageResponse, TurnError> {
        let inbound = request.context.unwrap_or_default();

        if let Some(reason) = self.readiness.setup_error() {
            return Ok(MessageResponse::notice(
                inbound,
                format!("{SETUP_FAILED_PREFIX} {reason}"),
            ));
        }
        let Some(workspace_id) = self.readiness.workspace_id() else {
            return Ok(MessageResponse::notice(inbound, ASSISTANT_INITIALIZING));
        };

        // No input at all opens the conversation; a blank one is a no-op.
        let input = match request.input {
            Some(given) => {
                let input = redact(&given.text);
                if input.is_empty() {
                    tracing::debug!("Empty input, skipping dialog turn");
                    return Ok(MessageResponse {
                        context: inbound,
                        ..Default::default()
                    });
                }
                input
            }
            None => String::new(),
        };

        let carried = inbound.nlu_output.as_ref().map(|a| a.keywords.clone());
        let mut response = self
            .gateways
            .dialog
            .send_turn(workspace_id, &input, inbound)
            .await
            .map_err(|e| {
                tracing::error!("Dialog turn failed: {e}");
                TurnError::Dialog(e)
            })?;

        carry_keywords(&mut response.context, carried);
        Ok(self.dispatcher.dispatch(workspace_id, response).await)
    }
}

/// Reuse keywords cached on an earlier turn when no lookup flow is running.
fn carry_keywords(context: &mut ConversationContext, carried: Option<Vec<Keyword>>) {
    if context.search_in_progress() {
        return;
    }
    if let Some(keywords) = carried.filter(|k| !k.is_empty()) {
        context.keywords = Some(keywords);
    }
}
