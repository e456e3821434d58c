//! One-time provisioning of the dialog workspace and the search collection.

use std::path::Path;

use anyhow::{bail, Context, Result};
use colloquy_core::config::AssistantConfig;
use colloquy_core::AppConfig;
use colloquy_dispatch::{Gateways, Readiness};
use colloquy_gateways::DialogGateway;
use serde_json::Value;

/// Provision both collaborators concurrently, publishing each result as soon as it is known.
pub async fn provision(config: &AppConfig, gateways: &Gateways, readiness: &Readiness) -> Result<()> {
    let dialog = async {
        let id = ensure_workspace(&config.assistant, gateways.dialog.as_ref()).await?;
        tracing::info!("Dialog workspace ready: {id}");
        readiness.publish_workspace(id);
        anyhow::Ok(())
    };
    let search = async {
        let params = gateways
            .knowledge
            .prepare(&config.discovery.documents)
            .await
            .context("Knowledge collection setup failed")?;
        tracing::info!(
            "Search collection ready: {}/{}",
            params.environment_id,
            params.collection_id
        );
        readiness.publish_search(params);
        anyhow::Ok(())
    };
    tokio::try_join!(dialog, search)?;
    Ok(())
}

/// Run provisioning and record a failure as the sticky setup error.
///
/// Returns `false` when the process should stop.
pub async fn run_startup(config: &AppConfig, gateways: &Gateways, readiness: &Readiness) -> bool {
    match provision(config, gateways, readiness).await {
        Ok(()) => true,
        Err(e) => {
            let reason = format!("{e:#}");
            tracing::error!("The app failed to initialize properly: {reason}");
            readiness.record_setup_error(reason);
            false
        }
    }
}

/// Resolve the workspace id: configured id, then lookup by name, then creation.
pub async fn ensure_workspace(config: &AssistantConfig, dialog: &dyn DialogGateway) -> Result<String> {
    if let Some(id) = config.workspace_id.as_deref().filter(|id| !id.trim().is_empty()) {
        if dialog.workspace_exists(id).await? {
            return Ok(id.to_string());
        }
        bail!("Configured workspace '{id}' does not exist");
    }

    if let Some(id) = dialog.find_workspace(&config.workspace_name).await? {
        tracing::debug!("Found workspace '{}' by name", config.workspace_name);
        return Ok(id);
    }

    let definition = load_definition(&config.workspace_path, &config.workspace_name)?;
    let id = dialog
        .create_workspace(&definition)
        .await
        .context("Failed to create dialog workspace")?;
    tracing::info!("Created workspace '{}' ({id})", config.workspace_name);
    Ok(id)
}

/// Read a workspace definition and stamp it with the configured name.
pub fn load_definition(path: &Path, name: &str) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read workspace definition {}", path.display()))?;
    let mut definition: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid workspace definition {}", path.display()))?;
    match definition.as_object_mut() {
        Some(map) => {
            map.insert("name".into(), Value::String(name.to_string()));
        }
        None => bail!("Workspace definition {} is not a JSON object", path.display()),
    }
    Ok(definition)
}
