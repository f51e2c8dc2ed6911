//! Per-user CLI configuration and token storage.
//!
//! Loaded once at process start into an explicit [`CliConfig`] value and
//! passed into the components that need it. Persisted as YAML in the
//! platform config directory; `AIFABRIX_CONFIG_DIR` overrides the
//! location for tests and CI.

use chrono::{DateTime, Duration, Utc};
use directories_next::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The CLI configuration file.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Explicit controller URL; wins over the device token's controller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    /// Developer slot used to derive the localhost controller port.
    #[serde(default)]
    pub developer_id: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_token: Option<DeviceToken>,
    /// Per-app client credentials, keyed by `<environment>/<app>`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub app_credentials: BTreeMap<String, AppCredential>,
    /// Cached client-credential tokens, keyed like `app_credentials`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub app_tokens: BTreeMap<String, CachedToken>,
}

/// Token obtained via `aifabrix login`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceToken {
    pub access_token: String,
    pub refresh_token: String,
    /// Controller this token was issued by.
    pub controller: String,
    pub expires_at: DateTime<Utc>,
}

impl DeviceToken {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Stored client credentials for one app/environment.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppCredential {
    pub client_id: String,
    pub client_secret: String,
}

/// A cached access token with its expiry.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Key into `app_credentials`/`app_tokens`.
pub fn app_key(environment: &str, app: &str) -> String {
    format!("{}/{}", environment, app)
}

/// Compute an absolute expiry from a token response. An absolute
/// `expiresAt` wins; otherwise `now + expiresIn` seconds (1h default).
pub fn token_expiry(expires_in: Option<i64>, expires_at: Option<DateTime<Utc>>) -> DateTime<Utc> {
    if let Some(absolute) = expires_at {
        return absolute;
    }
    Utc::now() + Duration::seconds(expires_in.unwrap_or(3600))
}

/// Load the configuration, defaulting when the file does not exist.
pub fn load_config() -> anyhow::Result<CliConfig> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(CliConfig::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    let config: CliConfig = serde_yaml::from_str(&contents)?;
    Ok(config)
}

/// Persist the configuration.
pub fn save_config(config: &CliConfig) -> anyhow::Result<()> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_yaml::to_string(config)?;
    std::fs::write(&path, contents)?;
    Ok(())
}

/// Location of the config file.
pub fn config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("AIFABRIX_CONFIG_DIR") {
        return Ok(Path::new(&value).join("config.yaml"));
    }
    let dirs = ProjectDirs::from("", "aifabrix", "builder")
        .ok_or_else(|| anyhow::anyhow!("unable to determine config directory"))?;
    Ok(dirs.config_dir().join("config.yaml"))
}
