//! Dataplane API client.
//!
//! The dataplane executes wizard steps, stores external-system
//! configuration and runs pipeline tests. [`DataplaneApi`] is the seam
//! the wizard and deploy pipelines program against; tests substitute a
//! scripted implementation.

use crate::api::{self, ApiError};
use crate::auth::AuthConfig;
use async_trait::async_trait;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::debug;

/// Operations the wizard and deploy pipelines need from a dataplane.
#[async_trait]
pub trait DataplaneApi: Send + Sync {
    /// Create a wizard session; returns the session data including its id.
    async fn create_session(
        &self,
        mode: &str,
        system: Option<&str>,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError>;

    /// Record the selected source on a session.
    async fn select_source(
        &self,
        session_id: &str,
        source: &Value,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError>;

    /// Parse the session's source (OpenAPI document or MCP listing).
    async fn parse_source(&self, session_id: &str, auth: &AuthConfig) -> Result<Value, ApiError>;

    /// Attach a named credential to the session.
    async fn select_credential(
        &self,
        session_id: &str,
        credential_key: &str,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError>;

    /// Detect entity types from the parsed source.
    async fn detect_types(&self, session_id: &str, auth: &AuthConfig) -> Result<Value, ApiError>;

    /// Generate the system/datasource configuration.
    async fn generate_configuration(
        &self,
        session_id: &str,
        request: &Value,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError>;

    /// Validate the generated configuration server-side.
    async fn validate_configuration(
        &self,
        session_id: &str,
        configuration: &Value,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError>;

    /// Fetch generic deployment docs for a system.
    async fn deployment_docs(&self, system_key: &str, auth: &AuthConfig)
        -> Result<String, ApiError>;

    /// Generate deployment docs from the actual configuration files.
    async fn deployment_docs_for(
        &self,
        system_key: &str,
        files: &Value,
        auth: &AuthConfig,
    ) -> Result<String, ApiError>;

    /// Run a datasource through the pipeline with a test payload.
    async fn pipeline_test(
        &self,
        system_key: &str,
        datasource_key: &str,
        payload: &Value,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError>;

    /// Deploy one datasource through the pipeline.
    async fn pipeline_deploy(
        &self,
        system_key: &str,
        datasource_key: &str,
        datasource: &Value,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError>;

    /// Upload a system configuration.
    async fn upload_system(
        &self,
        system_key: &str,
        body: &Value,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError>;

    /// Download the stored configuration of a system.
    async fn download_system(&self, system_key: &str, auth: &AuthConfig)
        -> Result<Value, ApiError>;

    /// Validate the uploaded configuration server-side.
    async fn validate_upload(&self, system_key: &str, auth: &AuthConfig)
        -> Result<Value, ApiError>;

    /// Publish an uploaded system.
    async fn publish_system(
        &self,
        system_key: &str,
        mcp_contract: bool,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError>;
}

/// HTTP implementation of [`DataplaneApi`].
pub struct DataplaneClient {
    base_url: String,
    client: reqwest::Client,
}

impl DataplaneClient {
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

    async fn post_json(
        &self,
        path: &str,
        body: &Value,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        debug!("POST {}", path);
        api::send_json(auth.apply(self.client.post(self.url(path))).json(body)).await
    }

    async fn get_json(&self, path: &str, auth: &AuthConfig) -> Result<Value, ApiError> {
        debug!("GET {}", path);
        api::send_json(auth.apply(self.client.get(self.url(path)))).await
    }
}

/// Hex sha256 of a canonically serialized JSON value, sent alongside
/// uploads so the dataplane can detect truncated bodies.
pub fn content_checksum(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

fn docs_text(data: Value) -> Result<String, ApiError> {
    data.get("markdown")
        .or_else(|| data.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            ApiError::new(
                crate::api::ApiErrorKind::Server,
                "deployment docs response carried no content",
            )
        })
}

#[async_trait]
impl DataplaneApi for DataplaneClient {
    async fn create_session(
        &self,
        mode: &str,
        system: Option<&str>,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        let mut body = json!({ "mode": mode });
        if let Some(system) = system {
            body["system"] = json!(system);
        }
        self.post_json("/api/v1/wizard/sessions", &body, auth).await
    }

    async fn select_source(
        &self,
        session_id: &str,
        source: &Value,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.post_json(
            &format!("/api/v1/wizard/sessions/{}/source", session_id),
            source,
            auth,
        )
        .await
    }

    async fn parse_source(&self, session_id: &str, auth: &AuthConfig) -> Result<Value, ApiError> {
        self.post_json(
            &format!("/api/v1/wizard/sessions/{}/parse", session_id),
            &json!({}),
            auth,
        )
        .await
    }

    async fn select_credential(
        &self,
        session_id: &str,
        credential_key: &str,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.post_json(
            &format!("/api/v1/wizard/sessions/{}/credential", session_id),
            &json!({ "credentialKey": credential_key }),
            auth,
        )
        .await
    }

    async fn detect_types(&self, session_id: &str, auth: &AuthConfig) -> Result<Value, ApiError> {
        self.post_json(
            &format!("/api/v1/wizard/sessions/{}/detect-types", session_id),
            &json!({}),
            auth,
        )
        .await
    }

    async fn generate_configuration(
        &self,
        session_id: &str,
        request: &Value,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.post_json(
            &format!("/api/v1/wizard/sessions/{}/generate", session_id),
            request,
            auth,
        )
        .await
    }

    async fn validate_configuration(
        &self,
        session_id: &str,
        configuration: &Value,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.post_json(
            &format!("/api/v1/wizard/sessions/{}/validate", session_id),
            configuration,
            auth,
        )
        .await
    }

    async fn deployment_docs(
        &self,
        system_key: &str,
        auth: &AuthConfig,
    ) -> Result<String, ApiError> {
        let data = self
            .get_json(&format!("/api/v1/external-systems/{}/docs", system_key), auth)
            .await?;
        docs_text(data)
    }

    async fn deployment_docs_for(
        &self,
        system_key: &str,
        files: &Value,
        auth: &AuthConfig,
    ) -> Result<String, ApiError> {
        let data = self
            .post_json(
                &format!("/api/v1/external-systems/{}/docs", system_key),
                files,
                auth,
            )
            .await?;
        docs_text(data)
    }

    async fn pipeline_test(
        &self,
        system_key: &str,
        datasource_key: &str,
        payload: &Value,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.post_json(
            &format!("/api/v1/pipeline/{}/{}/test", system_key, datasource_key),
            payload,
            auth,
        )
        .await
    }

    async fn pipeline_deploy(
        &self,
        system_key: &str,
        datasource_key: &str,
        datasource: &Value,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.post_json(
            &format!("/api/v1/pipeline/{}/{}/deploy", system_key, datasource_key),
            datasource,
            auth,
        )
        .await
    }

    async fn upload_system(
        &self,
        system_key: &str,
        body: &Value,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        let wrapped = json!({
            "configuration": body,
            "checksum": content_checksum(body),
        });
        self.post_json(
            &format!("/api/v1/external-systems/{}", system_key),
            &wrapped,
            auth,
        )
        .await
    }

    async fn download_system(
        &self,
        system_key: &str,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.get_json(&format!("/api/v1/external-systems/{}", system_key), auth)
            .await
    }

    async fn validate_upload(
        &self,
        system_key: &str,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.post_json(
            &format!("/api/v1/external-systems/{}/validate", system_key),
            &json!({}),
            auth,
        )
        .await
    }

    async fn publish_system(
        &self,
        system_key: &str,
        mcp_contract: bool,
        auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.post_json(
            &format!("/api/v1/external-systems/{}/publish", system_key),
            &json!({ "mcpContract": mcp_contract }),
            auth,
        )
        .await
    }
}
