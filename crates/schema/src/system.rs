//! External-system and datasource deploy descriptors.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Kind of external system being integrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemType {
    Openapi,
    Mcp,
    Custom,
}

impl fmt::Display for SystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemType::Openapi => write!(f, "openapi"),
            SystemType::Mcp => write!(f, "mcp"),
            SystemType::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for SystemType {
    type Err = aifabrix_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openapi" => Ok(SystemType::Openapi),
            "mcp" => Ok(SystemType::Mcp),
            "custom" => Ok(SystemType::Custom),
            _ => Err(aifabrix_common::Error::Config(format!(
                "unknown system type: {}",
                s
            ))),
        }
    }
}

/// An external system, written to `<key>-deploy.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    pub key: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub system_type: SystemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Name of the credential attached during the wizard, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// One datasource of an external system, written to
/// `<systemKey>-deploy-<key>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceConfig {
    pub key: String,
    /// Must match the owning system's `key`.
    pub system_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<String>,
    /// Source payload field path -> target field path.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_mappings: BTreeMap<String, String>,
    /// Inline JSON Schema the test payload must satisfy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_payload: Option<TestPayload>,
}

/// Payload used for pipeline testing of a datasource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPayload {
    pub payload_template: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_result: Option<Value>,
}
