use async_trait::async_trait;
use colloquy_core::config::{read_secret, NluConfig};
use colloquy_core::Analysis;
use serde::Serialize;

use super::{send, Endpoint};
use crate::error::GatewayResult;
use crate::traits::LanguageGateway;

/// Language gateway backed by the Watson Natural Language Understanding v1 API.
pub struct NluClient {
    endpoint: Endpoint,
    feature_limit: u32,
}

impl NluClient {
    pub fn new(config: &NluConfig) -> Self {
        Self::with_api_key(config, read_secret(&config.api_key_env))
    }

    pub fn with_api_key(config: &NluConfig, api_key: String) -> Self {
        Self {
            endpoint: Endpoint::new(&config.url, &config.version, api_key),
            feature_limit: config.feature_limit,
        }
    }
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
    features: Features,
}

#[derive(Debug, Serialize)]
struct Features {
    entities: FeatureOptions,
    keywords: FeatureOptions,
    sentiment: EmptyOptions,
}

#[derive(Debug, Serialize)]
struct FeatureOptions {
    emotion: bool,
    sentiment: bool,
    limit: u32,
}

#[derive(Debug, Serialize)]
struct EmptyOptions {}

impl<'a> AnalyzeRequest<'a> {
    fn new(text: &'a str, limit: u32) -> Self {
        let options = || FeatureOptions {
            emotion: true,
            sentiment: true,
            limit,
        };
        Self {
            text,
            features: Features {
                entities: options(),
                keywords: options(),
                sentiment: EmptyOptions {},
            },
        }
    }
}

#[async_trait]
impl LanguageGateway for NluClient {
    async fn analyze(&self, text: &str) -> GatewayResult<Analysis> {
        let req = self
            .endpoint
            .post("v1/analyze")?
            .json(&AnalyzeRequest::new(text, self.feature_limit));
        let analysis: Analysis = send(req).await?.json().await?;
        tracing::debug!(
            "NLU found {} keyword(s), {} entit(ies)",
            analysis.keywords.len(),
            analysis.entities.len()
        );
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn analyze_request_requests_keywords_and_entities() {
        let v = serde_json::to_value(AnalyzeRequest::new("what is a qubit", 2)).unwrap();
        assert_eq!(v["text"], "what is a qubit");
        assert_eq!(
            v["features"]["keywords"],
            json!({ "emotion": true, "sentiment": true, "limit": 2 })
        );
        assert_eq!(v["features"]["entities"]["limit"], 2);
        assert_eq!(v["features"]["sentiment"], json!({}));
    }
}
