pub mod error;
pub mod traits;
pub mod types;
pub mod watson;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use error::{GatewayError, GatewayResult};
pub use traits::{DialogGateway, KnowledgeGateway, LanguageGateway};
pub use types::{CatalogItem, DialogNode, Passage, SearchParams};
pub use watson::{AssistantClient, DiscoveryClient, NluClient};
