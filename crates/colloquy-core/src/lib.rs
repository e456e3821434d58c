pub mod config;
pub mod context;
pub mod lifecycle;
pub mod message;
pub mod redaction;

pub use config::AppConfig;
pub use context::{Analysis, ConversationContext, Keyword};
pub use message::{MessageInput, MessageOutput, MessageRequest, MessageResponse};
pub use redaction::redact;
