//! Deploy and publish flows.
//!
//! Build-style deploys push datasources one at a time and stop on the
//! first failure; deploy order matters, unlike tests, which isolate
//! failures per datasource.

use crate::loader::IntegrationBundle;
use aifabrix_client::{AuthConfig, DataplaneApi};
use aifabrix_common::{ItemOutcome, OutcomeSummary};
use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};

/// Upload the system, then deploy each selected datasource through the
/// pipeline, fail-fast.
pub async fn deploy_datasources(
    api: &dyn DataplaneApi,
    auth: &AuthConfig,
    bundle: &IntegrationBundle,
    selected: Option<&[String]>,
) -> Result<OutcomeSummary> {
    let system_key = bundle.system_key().to_string();

    info!("uploading system {}", system_key);
    api.upload_system(&system_key, &bundle.systems[0].raw, auth)
        .await
        .map_err(|e| anyhow::Error::new(e).context("System upload failed"))?;

    let mut items = Vec::new();
    for datasource in bundle.selected_datasources(selected) {
        let key = datasource.config.key.clone();
        info!("deploying {}/{}", system_key, key);

        match api
            .pipeline_deploy(&system_key, &key, &datasource.raw, auth)
            .await
        {
            Ok(_) => items.push(ItemOutcome::ok(key)),
            Err(e) => {
                warn!("deploy of {} failed; stopping", key);
                items.push(ItemOutcome::failed(key, e.to_string()));
                break;
            }
        }
    }

    Ok(OutcomeSummary::from_items(items))
}

/// Options for the publish workflow.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub skip_validation: bool,
    /// Ask the server to generate the MCP contract on publish.
    pub mcp_contract: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            skip_validation: false,
            mcp_contract: true,
        }
    }
}

/// Publish a system: upload, optionally validate, then publish.
pub async fn publish(
    api: &dyn DataplaneApi,
    auth: &AuthConfig,
    bundle: &IntegrationBundle,
    options: &PublishOptions,
) -> Result<()> {
    let system_key = bundle.system_key().to_string();

    let mut configuration = bundle.systems[0].raw.clone();
    configuration["dataSources"] = Value::Array(
        bundle
            .datasources
            .iter()
            .map(|ds| ds.raw.clone())
            .collect(),
    );

    info!("uploading system {}", system_key);
    api.upload_system(&system_key, &configuration, auth)
        .await
        .map_err(|e| anyhow::Error::new(e).context("System upload failed"))?;

    if options.skip_validation {
        info!("skipping server-side validation");
    } else {
        let result = api
            .validate_upload(&system_key, auth)
            .await
            .map_err(|e| anyhow::Error::new(e).context("Upload validation failed"))?;
        let errors: Vec<String> = result
            .get("errors")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        if !errors.is_empty() {
            anyhow::bail!("Upload validation failed: {}", errors.join("; "));
        }
    }

    info!(
        "publishing {} (mcp contract: {})",
        system_key, options.mcp_contract
    );
    api.publish_system(&system_key, options.mcp_contract, auth)
        .await
        .map_err(|e| anyhow::Error::new(e).context("Publish failed"))?;

    Ok(())
}

/// Publish straight from a directory.
pub async fn publish_dir(
    api: &dyn DataplaneApi,
    auth: &AuthConfig,
    dir: &std::path::Path,
    options: &PublishOptions,
) -> Result<()> {
    let bundle = crate::loader::load_bundle(dir)
        .with_context(|| format!("Failed to load integration from {}", dir.display()))?;
    publish(api, auth, &bundle, options).await
}
