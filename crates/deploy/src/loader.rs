//! Loading an integration directory into memory.

use aifabrix_common::Error;
use aifabrix_schema::{AppConfig, DataSourceConfig, SystemConfig};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// One system deploy descriptor, kept both raw (for schema validation
/// and upload) and typed.
#[derive(Debug, Clone)]
pub struct LoadedSystem {
    pub file_name: String,
    pub raw: Value,
    pub config: SystemConfig,
}

/// One datasource deploy descriptor.
#[derive(Debug, Clone)]
pub struct LoadedDatasource {
    pub file_name: String,
    pub raw: Value,
    pub config: DataSourceConfig,
}

/// The full file set one deploy/test invocation operates on.
#[derive(Debug, Clone)]
pub struct IntegrationBundle {
    pub dir: PathBuf,
    pub app: AppConfig,
    pub systems: Vec<LoadedSystem>,
    pub datasources: Vec<LoadedDatasource>,
}

impl IntegrationBundle {
    /// Key of the owning system; every datasource must reference it.
    pub fn system_key(&self) -> &str {
        &self.systems[0].config.key
    }

    /// Datasources filtered to an optional key selection.
    pub fn selected_datasources(&self, selected: Option<&[String]>) -> Vec<&LoadedDatasource> {
        self.datasources
            .iter()
            .filter(|ds| {
                selected
                    .map(|keys| keys.iter().any(|k| k == &ds.config.key))
                    .unwrap_or(true)
            })
            .collect()
    }
}

/// Load `application.yaml` (or `variables.yaml`) and every referenced
/// deploy descriptor. All failures here are local preconditions: they
/// fail fast and are never retried.
pub fn load_bundle(dir: &Path) -> Result<IntegrationBundle> {
    let config_path = ["application.yaml", "variables.yaml"]
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
        .ok_or_else(|| {
            Error::MissingFile(format!(
                "{} (no application.yaml or variables.yaml)",
                dir.display()
            ))
        })?;

    let contents = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let app = AppConfig::from_yaml(&contents)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;

    let integration = app.external_integration.clone().ok_or_else(|| {
        Error::Config(format!(
            "{} has no externalIntegration block",
            config_path.display()
        ))
    })?;

    if integration.systems.is_empty() {
        anyhow::bail!(Error::Config(
            "externalIntegration lists no system files".to_string()
        ));
    }

    let mut systems = Vec::new();
    for file_name in &integration.systems {
        let raw = read_json(dir, file_name)?;
        let config: SystemConfig = serde_json::from_value(raw.clone())
            .with_context(|| format!("Failed to parse {}", file_name))?;
        systems.push(LoadedSystem {
            file_name: file_name.clone(),
            raw,
            config,
        });
    }

    let mut datasources = Vec::new();
    for file_name in &integration.data_sources {
        let raw = read_json(dir, file_name)?;
        let config: DataSourceConfig = serde_json::from_value(raw.clone())
            .with_context(|| format!("Failed to parse {}", file_name))?;
        datasources.push(LoadedDatasource {
            file_name: file_name.clone(),
            raw,
            config,
        });
    }

    Ok(IntegrationBundle {
        dir: dir.to_path_buf(),
        app,
        systems,
        datasources,
    })
}

fn read_json(dir: &Path, file_name: &str) -> Result<Value> {
    let path = dir.join(file_name);
    if !path.exists() {
        anyhow::bail!(Error::MissingFile(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}
