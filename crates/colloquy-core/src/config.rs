use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub nlu: NluConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Dialog engine (Watson Assistant v1) connection settings.
/// The API key is not stored here; it is read from the variable named by `api_key_env`.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_url")]
    pub url: String,
    #[serde(default = "default_assistant_version")]
    pub version: String,
    #[serde(default = "default_assistant_key_env")]
    pub api_key_env: String,
    /// Use this workspace as-is instead of looking one up by name.
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default = "default_workspace_name")]
    pub workspace_name: String,
    /// Bundled workspace definition used when no workspace exists yet.
    #[serde(default = "default_workspace_path")]
    pub workspace_path: PathBuf,
}

fn default_assistant_url() -> String {
    "https://gateway.watsonplatform.net/assistant/api".into()
}
fn default_assistant_version() -> String {
    "2018-02-16".into()
}
fn default_assistant_key_env() -> String {
    "ASSISTANT_APIKEY".into()
}
fn default_workspace_name() -> String {
    "watson-quantum-chatbot".into()
}
fn default_workspace_path() -> PathBuf {
    PathBuf::from("data/workspace.json")
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            url: default_assistant_url(),
            version: default_assistant_version(),
            api_key_env: default_assistant_key_env(),
            workspace_id: None,
            workspace_name: default_workspace_name(),
            workspace_path: default_workspace_path(),
        }
    }
}

/// Knowledge search (Watson Discovery v1) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_discovery_url")]
    pub url: String,
    #[serde(default = "default_discovery_version")]
    pub version: String,
    #[serde(default = "default_discovery_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_environment_name")]
    pub environment_name: String,
    #[serde(default = "default_workspace_name")]
    pub collection_name: String,
    /// Documents uploaded when the collection is empty.
    #[serde(default = "default_documents")]
    pub documents: Vec<PathBuf>,
}

fn default_discovery_url() -> String {
    "https://gateway.watsonplatform.net/discovery/api".into()
}
fn default_discovery_version() -> String {
    "2018-03-05".into()
}
fn default_discovery_key_env() -> String {
    "DISCOVERY_APIKEY".into()
}
fn default_environment_name() -> String {
    "byod".into()
}
fn default_documents() -> Vec<PathBuf> {
    vec![PathBuf::from("data/discovery/docs/quantum-basics.html")]
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            url: default_discovery_url(),
            version: default_discovery_version(),
            api_key_env: default_discovery_key_env(),
            environment_name: default_environment_name(),
            collection_name: default_workspace_name(),
            documents: default_documents(),
        }
    }
}

/// Language understanding (Watson NLU v1) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NluConfig {
    #[serde(default = "default_nlu_url")]
    pub url: String,
    #[serde(default = "default_nlu_version")]
    pub version: String,
    #[serde(default = "default_nlu_key_env")]
    pub api_key_env: String,
    /// Maximum keywords and entities requested per analysis.
    #[serde(default = "default_feature_limit")]
    pub feature_limit: u32,
}

fn default_nlu_url() -> String {
    "https://gateway.watsonplatform.net/natural-language-understanding/api".into()
}
fn default_nlu_version() -> String {
    "2018-03-16".into()
}
fn default_nlu_key_env() -> String {
    "NLU_APIKEY".into()
}
fn default_feature_limit() -> u32 {
    2
}

impl Default for NluConfig {
    fn default() -> Self {
        Self {
            url: default_nlu_url(),
            version: default_nlu_version(),
            api_key_env: default_nlu_key_env(),
            feature_limit: default_feature_limit(),
        }
    }
}

/// How an answer line is pulled out of a passage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// First non-blank line after a detected question.
    #[default]
    QaLines,
    /// The whole passage text.
    RawPassage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    #[serde(default)]
    pub extraction: ExtractionStrategy,
    /// Controlled vocabulary holding topic names.
    #[serde(default = "default_topic_entity")]
    pub topic_entity: String,
    /// Parent node new topic nodes are attached under.
    #[serde(default = "default_topic_parent")]
    pub topic_parent: String,
    /// Sibling new topic nodes are ordered after.
    #[serde(default = "default_topic_previous_sibling")]
    pub topic_previous_sibling: String,
}

fn default_topic_entity() -> String {
    "topics".into()
}
fn default_topic_parent() -> String {
    "node_1_1531784196478".into()
}
fn default_topic_previous_sibling() -> String {
    "node_3_1531784387906".into()
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionStrategy::default(),
            topic_entity: default_topic_entity(),
            topic_parent: default_topic_parent(),
            topic_previous_sibling: default_topic_previous_sibling(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            assistant: AssistantConfig::default(),
            discovery: DiscoveryConfig::default(),
            nlu: NluConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback chain: explicit path → ./config/default.toml → hardcoded defaults.
    pub fn load_or_default(explicit_path: Option<&Path>) -> Self {
        if let Some(path) = explicit_path {
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {e}", path.display());
                }
            }
        }

        let default_path = Path::new("config/default.toml");
        if default_path.exists() {
            match Self::load(default_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!("Failed to load default config: {e}");
                }
            }
        }

        tracing::info!("Using hardcoded default configuration");
        Self::default()
    }
}

/// Read a secret from the environment variable named in config.
/// Missing or empty variables yield an empty string; clients report the
/// misconfiguration when they first talk to the service.
pub fn read_secret(env_name: &str) -> String {
    std::env::var(env_name).unwrap_or_default()
}
