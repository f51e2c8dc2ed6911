//! Controller API client.
//!
//! The controller issues and refreshes tokens, brokers dataplane
//! discovery and serves the account-level listing endpoints.

use crate::api::{self, ApiError};
use crate::auth::AuthConfig;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Response of the controller token endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until expiry, relative to now.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Absolute expiry; wins over `expires_in` when present.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// One deployment as listed by the controller.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentInfo {
    pub app: String,
    pub environment: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub deployed_at: Option<DateTime<Utc>>,
}

/// A credential visible to the logged-in user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialInfo {
    pub key: String,
    #[serde(rename = "type", default)]
    pub credential_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A newly created service user. The secret is only ever returned once.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUser {
    pub client_id: String,
    pub client_secret: String,
}

/// HTTP client for one controller.
pub struct ControllerClient {
    base_url: String,
    client: reqwest::Client,
}

impl ControllerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange client credentials for a token pair.
    pub async fn exchange_client_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenResponse, ApiError> {
        debug!("exchanging client credentials against {}", self.base_url);
        let basic = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", client_id, client_secret));
        let data = api::send_json(
            self.client
                .post(self.url("/api/v1/auth/token"))
                .header("Authorization", format!("Basic {}", basic))
                .json(&json!({ "grantType": "client_credentials" })),
        )
        .await?;
        parse_token(data)
    }

    /// Refresh an expired device token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, ApiError> {
        debug!("refreshing device token against {}", self.base_url);
        let data = api::send_json(
            self.client
                .post(self.url("/api/v1/auth/refresh"))
                .json(&json!({ "refreshToken": refresh_token })),
        )
        .await?;
        parse_token(data)
    }

    /// Ask which dataplane serves an environment. Errors are the
    /// controller's own, surfaced verbatim.
    pub async fn dataplane_url(
        &self,
        environment: &str,
        auth: &AuthConfig,
    ) -> Result<String, ApiError> {
        let data = api::send_json(auth.apply(
            self.client
                .get(self.url(&format!("/api/v1/environments/{}/dataplane", environment))),
        ))
        .await?;
        data.get("url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ApiError::new(
                    crate::api::ApiErrorKind::Server,
                    format!("controller returned no dataplane url for '{}'", environment),
                )
            })
    }

    /// List deployments, optionally filtered by environment.
    pub async fn list_deployments(
        &self,
        environment: Option<&str>,
        auth: &AuthConfig,
    ) -> Result<Vec<DeploymentInfo>, ApiError> {
        let mut request = self.client.get(self.url("/api/v1/deployments"));
        if let Some(environment) = environment {
            request = request.query(&[("environment", environment)]);
        }
        let data = api::send_json(auth.apply(request)).await?;
        parse_list(data)
    }

    /// List credentials available for wizard attachment.
    pub async fn list_credentials(&self, auth: &AuthConfig) -> Result<Vec<CredentialInfo>, ApiError> {
        let data = api::send_json(auth.apply(self.client.get(self.url("/api/v1/credentials")))).await?;
        parse_list(data)
    }

    /// Create a service user for machine-to-machine deployments.
    pub async fn create_service_user(
        &self,
        name: &str,
        auth: &AuthConfig,
    ) -> Result<ServiceUser, ApiError> {
        let data = api::send_json(
            auth.apply(self.client.post(self.url("/api/v1/service-users")))
                .json(&json!({ "name": name })),
        )
        .await?;
        serde_json::from_value(data).map_err(|e| {
            ApiError::new(
                crate::api::ApiErrorKind::Server,
                format!("malformed service-user response: {}", e),
            )
        })
    }
}

fn parse_token(data: Value) -> Result<TokenResponse, ApiError> {
    serde_json::from_value(data).map_err(|e| {
        ApiError::new(
            crate::api::ApiErrorKind::Server,
            format!("malformed token response: {}", e),
        )
    })
}

fn parse_list<T: serde::de::DeserializeOwned>(data: Value) -> Result<Vec<T>, ApiError> {
    // Some endpoints wrap the list as { "items": [...] }.
    let list = match data {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => map.remove("items").unwrap_or(Value::Array(vec![])),
        _ => Value::Array(vec![]),
    };
    serde_json::from_value(list).map_err(|e| {
        ApiError::new(
            crate::api::ApiErrorKind::Server,
            format!("malformed list response: {}", e),
        )
    })
}
