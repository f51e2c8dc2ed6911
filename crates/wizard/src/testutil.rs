//! Scripted dataplane for pipeline tests.

use aifabrix_client::api::{ApiError, ApiErrorKind};
use aifabrix_client::{AuthConfig, DataplaneApi};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Mutex;

pub(crate) struct MockDataplane {
    calls: Mutex<Vec<String>>,
    failing_credential: Option<String>,
    failing_generation: bool,
    validation: Value,
    docs_post: Option<String>,
    docs_get: Option<String>,
}

impl MockDataplane {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing_credential: None,
            failing_generation: false,
            validation: json!({ "valid": true, "errors": [], "warnings": [] }),
            docs_post: Some("# README from configuration\n".to_string()),
            docs_get: Some("# Generic README\n".to_string()),
        }
    }

    pub fn failing_credential(mut self, key: &str) -> Self {
        self.failing_credential = Some(key.to_string());
        self
    }

    pub fn failing_generation(mut self) -> Self {
        self.failing_generation = true;
        self
    }

    pub fn validation_response(mut self, validation: Value) -> Self {
        self.validation = validation;
        self
    }

    pub fn docs_post_fails(mut self) -> Self {
        self.docs_post = None;
        self
    }

    pub fn docs_get_fails(mut self) -> Self {
        self.docs_get = None;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

fn unreachable_docs() -> ApiError {
    ApiError::network("docs endpoint unreachable")
}

#[async_trait]
impl DataplaneApi for MockDataplane {
    async fn create_session(
        &self,
        mode: &str,
        _system: Option<&str>,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.record(format!("create_session {}", mode));
        Ok(json!({ "sessionId": "s1" }))
    }

    async fn select_source(
        &self,
        _session_id: &str,
        source: &Value,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.record(format!(
            "select_source {}",
            source["sourceType"].as_str().unwrap_or("?")
        ));
        Ok(json!({}))
    }

    async fn parse_source(&self, _session_id: &str, _auth: &AuthConfig) -> Result<Value, ApiError> {
        self.record("parse_source");
        Ok(json!({ "entities": ["contacts"] }))
    }

    async fn select_credential(
        &self,
        _session_id: &str,
        credential_key: &str,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.record(format!("select_credential {}", credential_key));
        if self.failing_credential.as_deref() == Some(credential_key) {
            return Err(ApiError::new(
                ApiErrorKind::NotFound,
                format!("credential '{}' not found", credential_key),
            ));
        }
        Ok(json!({}))
    }

    async fn detect_types(&self, _session_id: &str, _auth: &AuthConfig) -> Result<Value, ApiError> {
        self.record("detect_types");
        Ok(json!({ "types": ["contact"] }))
    }

    async fn generate_configuration(
        &self,
        _session_id: &str,
        _request: &Value,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.record("generate_configuration");
        if self.failing_generation {
            return Err(ApiError {
                kind: ApiErrorKind::Validation,
                message: "configuration rejected".to_string(),
                details: Some(json!({
                    "errors": [{ "field": "baseUrl", "message": "must be https" }]
                })),
                formatted: Some("\u{1b}[31mconfiguration rejected\u{1b}[0m".to_string()),
            });
        }
        Ok(json!({
            "system": {
                "key": "crm",
                "displayName": "CRM",
                "type": "openapi",
                "baseUrl": "https://api.crm.example"
            },
            "dataSources": [
                {
                    "key": "contacts",
                    "systemKey": "crm",
                    "testPayload": { "payloadTemplate": { "email": "a@b.example" } }
                }
            ]
        }))
    }

    async fn validate_configuration(
        &self,
        _session_id: &str,
        _configuration: &Value,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.record("validate_configuration");
        Ok(self.validation.clone())
    }

    async fn deployment_docs(
        &self,
        system_key: &str,
        _auth: &AuthConfig,
    ) -> Result<String, ApiError> {
        self.record(format!("deployment_docs {}", system_key));
        self.docs_get.clone().ok_or_else(unreachable_docs)
    }

    async fn deployment_docs_for(
        &self,
        system_key: &str,
        _files: &Value,
        _auth: &AuthConfig,
    ) -> Result<String, ApiError> {
        self.record(format!("deployment_docs_for {}", system_key));
        self.docs_post.clone().ok_or_else(unreachable_docs)
    }

    async fn pipeline_test(
        &self,
        system_key: &str,
        datasource_key: &str,
        _payload: &Value,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.record(format!("pipeline_test {}/{}", system_key, datasource_key));
        Ok(json!({}))
    }

    async fn pipeline_deploy(
        &self,
        system_key: &str,
        datasource_key: &str,
        _datasource: &Value,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.record(format!("pipeline_deploy {}/{}", system_key, datasource_key));
        Ok(json!({}))
    }

    async fn upload_system(
        &self,
        system_key: &str,
        _body: &Value,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.record(format!("upload_system {}", system_key));
        Ok(json!({}))
    }

    async fn download_system(
        &self,
        system_key: &str,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.record(format!("download_system {}", system_key));
        Ok(json!({}))
    }

    async fn validate_upload(
        &self,
        system_key: &str,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.record(format!("validate_upload {}", system_key));
        Ok(json!({}))
    }

    async fn publish_system(
        &self,
        system_key: &str,
        mcp_contract: bool,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.record(format!("publish_system {} mcp={}", system_key, mcp_contract));
        Ok(json!({}))
    }
}
