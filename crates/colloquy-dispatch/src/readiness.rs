//! Startup readiness, published once and read by every turn.

use std::sync::OnceLock;

use colloquy_gateways::SearchParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessStatus {
    Initializing,
    Ready,
    Failed,
}

impl ReadinessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessStatus::Initializing => "initializing",
            ReadinessStatus::Ready => "ready",
            ReadinessStatus::Failed => "failed",
        }
    }
}

/// Values produced by the startup task. Each cell is written at most once.
#[derive(Debug, Default)]
pub struct Readiness {
    workspace_id: OnceLock<String>,
    search_params: OnceLock<SearchParams>,
    setup_error: OnceLock<String>,
}

impl Readiness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Readiness with everything already published.
    pub fn ready(workspace_id: &str, params: SearchParams) -> Self {
        let readiness = Self::new();
        readiness.publish_workspace(workspace_id.to_string());
        readiness.publish_search(params);
        readiness
    }

    /// Returns false if a workspace was already published.
    pub fn publish_workspace(&self, workspace_id: String) -> bool {
        self.workspace_id.set(workspace_id).is_ok()
    }

    pub fn publish_search(&self, params: SearchParams) -> bool {
        self.search_params.set(params).is_ok()
    }

    /// Record an unrecoverable setup failure. Only the first one sticks.
    pub fn record_setup_error(&self, reason: impl Into<String>) -> bool {
        self.setup_error.set(reason.into()).is_ok()
    }

    pub fn workspace_id(&self) -> Option<&str> {
        self.workspace_id.get().map(String::as_str)
    }

    pub fn search_params(&self) -> Option<&SearchParams> {
        self.search_params.get()
    }

    pub fn setup_error(&self) -> Option<&str> {
        self.setup_error.get().map(String::as_str)
    }

    pub fn status(&self) -> ReadinessStatus {
        if self.setup_error().is_some() {
            ReadinessStatus::Failed
        } else if self.workspace_id().is_some() && self.search_params().is_some() {
            ReadinessStatus::Ready
        } else {
            ReadinessStatus::Initializing
        }
    }
}
