pub mod action;
pub mod dispatcher;
pub mod error;
pub mod extract;
pub mod passage;
pub mod readiness;
pub mod topics;
pub mod turn;

pub use action::{Action, ActionRequest, LookupRequest};
pub use dispatcher::{Dispatcher, Gateways};
pub use error::{DispatchError, TurnError};
pub use passage::{Fallback, PassageResolver, Resolution};
pub use readiness::{Readiness, ReadinessStatus};
pub use topics::{TopicOutcome, TopicRegistry};
pub use turn::TurnOrchestrator;
