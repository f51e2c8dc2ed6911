//! Authentication resolution for deployment commands.

use crate::api::ApiErrorKind;
use crate::config::{self, app_key, CachedToken, CliConfig, DeviceToken};
use crate::controller::ControllerClient;
use anyhow::{Context, Result};
use tracing::debug;

/// Credentials attached to outgoing requests. Resolved fresh per command
/// invocation; replaced on refresh, never mutated in place.
#[derive(Debug, Clone)]
pub enum AuthConfig {
    Bearer { token: String },
    ClientCredentials { client_id: String, client_secret: String },
}

impl AuthConfig {
    pub fn bearer(token: impl Into<String>) -> Self {
        AuthConfig::Bearer {
            token: token.into(),
        }
    }

    /// Attach these credentials to a request.
    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            AuthConfig::Bearer { token } => request.bearer_auth(token),
            AuthConfig::ClientCredentials {
                client_id,
                client_secret,
            } => request.basic_auth(client_id, Some(client_secret)),
        }
    }
}

/// Resolve the auth to use for a deployment-style command.
///
/// Priority: stored per-app client credentials (exchanged for a cached
/// bearer token) over the device token from `aifabrix login` (refreshed
/// when expired). Refreshed and exchanged tokens are persisted back to
/// the config file.
pub async fn get_deployment_auth(
    controller: &ControllerClient,
    config: &mut CliConfig,
    environment: &str,
    app: &str,
) -> Result<AuthConfig> {
    let key = app_key(environment, app);

    if let Some(credential) = config.app_credentials.get(&key).cloned() {
        if let Some(cached) = config.app_tokens.get(&key) {
            if !cached.is_expired() {
                debug!("using cached client token for {}", key);
                return Ok(AuthConfig::bearer(cached.access_token.clone()));
            }
        }

        debug!("exchanging client credentials for {}", key);
        let token = controller
            .exchange_client_credentials(&credential.client_id, &credential.client_secret)
            .await
            .with_context(|| format!("Failed to obtain app token for {}", key))?;

        let cached = CachedToken {
            access_token: token.access_token.clone(),
            expires_at: config::token_expiry(token.expires_in, token.expires_at),
        };
        config.app_tokens.insert(key, cached);
        config::save_config(config).context("Failed to persist app token")?;
        return Ok(AuthConfig::bearer(token.access_token));
    }

    let Some(device) = config.device_token.clone() else {
        anyhow::bail!(aifabrix_common::Error::Authentication(
            "no stored credentials; run 'aifabrix login' first".to_string()
        ));
    };

    if !device.is_expired() {
        return Ok(AuthConfig::bearer(device.access_token));
    }

    debug!("device token expired; refreshing");
    match controller.refresh_token(&device.refresh_token).await {
        Ok(token) => {
            let refreshed = DeviceToken {
                access_token: token.access_token.clone(),
                refresh_token: token
                    .refresh_token
                    .unwrap_or(device.refresh_token),
                controller: device.controller,
                expires_at: config::token_expiry(token.expires_in, token.expires_at),
            };
            config.device_token = Some(refreshed);
            config::save_config(config).context("Failed to persist refreshed token")?;
            Ok(AuthConfig::bearer(token.access_token))
        }
        Err(e) if e.kind == ApiErrorKind::Authentication => {
            Err(anyhow::anyhow!(aifabrix_common::Error::Authentication(
                "session expired; please login again with 'aifabrix login'".to_string()
            )))
        }
        Err(e) => Err(anyhow::Error::new(e).context("Token refresh failed")),
    }
}
