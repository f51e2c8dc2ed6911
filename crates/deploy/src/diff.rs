//! Local inventory and local-vs-remote diffing of datasources.

use crate::loader::IntegrationBundle;
use aifabrix_client::{AuthConfig, DataplaneApi};
use anyhow::Result;
use serde_json::Value;
use std::collections::BTreeMap;

/// One row of `datasource list`.
#[derive(Debug, Clone)]
pub struct DatasourceSummary {
    pub key: String,
    pub display_name: Option<String>,
    pub entity: Option<String>,
    pub has_test_payload: bool,
}

/// Summarize the datasources of a loaded bundle.
pub fn list_datasources(bundle: &IntegrationBundle) -> Vec<DatasourceSummary> {
    bundle
        .datasources
        .iter()
        .map(|ds| DatasourceSummary {
            key: ds.config.key.clone(),
            display_name: ds.config.display_name.clone(),
            entity: ds.config.entity.clone(),
            has_test_payload: ds.config.test_payload.is_some(),
        })
        .collect()
}

/// Per-key classification of local files against the remote config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}

impl DiffReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Compare local datasource files against the configuration stored on
/// the dataplane.
pub async fn diff_system(
    api: &dyn DataplaneApi,
    auth: &AuthConfig,
    bundle: &IntegrationBundle,
) -> Result<DiffReport> {
    let remote = api
        .download_system(bundle.system_key(), auth)
        .await
        .map_err(|e| anyhow::Error::new(e).context("Failed to download remote configuration"))?;

    let local: BTreeMap<String, Value> = bundle
        .datasources
        .iter()
        .map(|ds| (ds.config.key.clone(), ds.raw.clone()))
        .collect();

    let remote: BTreeMap<String, Value> = remote
        .get("dataSources")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.get("key")
                        .and_then(Value::as_str)
                        .map(|key| (key.to_string(), item.clone()))
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(classify(&local, &remote))
}

/// Pure classification: keys only local are added, only remote are
/// removed, present in both but unequal are changed.
pub fn classify(
    local: &BTreeMap<String, Value>,
    remote: &BTreeMap<String, Value>,
) -> DiffReport {
    let mut report = DiffReport::default();

    for (key, value) in local {
        match remote.get(key) {
            None => report.added.push(key.clone()),
            Some(remote_value) if remote_value != value => report.changed.push(key.clone()),
            Some(_) => {}
        }
    }
    for key in remote.keys() {
        if !local.contains_key(key) {
            report.removed.push(key.clone());
        }
    }

    report
}
