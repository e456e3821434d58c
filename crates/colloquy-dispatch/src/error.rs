use colloquy_gateways::GatewayError;
use thiserror::Error;

use crate::action::Action;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Action '{action}' requires context field '{field}'")]
    MissingField { action: Action, field: &'static str },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Failures that abort a turn instead of degrading it to an apology line.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Dialog engine call failed: {0}")]
    Dialog(#[source] GatewayError),
}

impl TurnError {
    /// HTTP status to report to the caller.
    pub fn status_code(&self) -> u16 {
        match self {
            TurnError::Dialog(e) => e.code().unwrap_or(500),
        }
    }
}
