//! Application configuration (`variables.yaml` / `application.yaml`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The complete application configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub app: AppSection,
    #[serde(default)]
    pub requires: RequiresSection,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub databases: Vec<DatabaseSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_integration: Option<ExternalIntegration>,
}

/// Identity of the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppSection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Runtime language of the scaffolded app (python, node, custom).
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

fn default_language() -> String {
    "python".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Backing services the app needs at runtime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RequiresSection {
    #[serde(default)]
    pub database: bool,
    #[serde(default)]
    pub redis: bool,
    #[serde(default)]
    pub storage: bool,
}

/// One logical database to be created on startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSpec {
    pub name: String,
}

/// References to external-system deploy descriptors, by file name.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIntegration {
    #[serde(default)]
    pub systems: Vec<String>,
    #[serde(default)]
    pub data_sources: Vec<String>,
}

impl AppConfig {
    /// Parse from YAML text.
    pub fn from_yaml(contents: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Serialize to YAML text.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Resolved image name, defaulting to `<name>:latest`.
    pub fn image_name(&self) -> String {
        self.app
            .image
            .clone()
            .unwrap_or_else(|| format!("{}:latest", self.app.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
app:
  name: shop
  language: python
  port: 8080
requires:
  database: true
databases:
  - name: shop
  - name: shop_audit
env:
  LOG_LEVEL: info
externalIntegration:
  systems:
    - crm-deploy.json
  dataSources:
    - crm-deploy-contacts.json
"#;

    #[test]
    fn test_parse_sample() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.app.name, "shop");
        assert_eq!(config.app.port, 8080);
        assert!(config.requires.database);
        assert!(!config.requires.redis);
        assert_eq!(config.databases.len(), 2);
        let integration = config.external_integration.unwrap();
        assert_eq!(integration.systems, vec!["crm-deploy.json"]);
        assert_eq!(integration.data_sources, vec!["crm-deploy-contacts.json"]);
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_yaml("app:\n  name: tiny\n").unwrap();
        assert_eq!(config.app.language, "python");
        assert_eq!(config.app.port, 3000);
        assert_eq!(config.image_name(), "tiny:latest");
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();
        let text = config.to_yaml().unwrap();
        let again = AppConfig::from_yaml(&text).unwrap();
        assert_eq!(again.app.name, config.app.name);
        assert_eq!(
            again.external_integration.unwrap().systems,
            config.external_integration.unwrap().systems
        );
    }
}
