//! Shared fixtures and a scripted dataplane for deploy tests.

use aifabrix_client::api::{ApiError, ApiErrorKind};
use aifabrix_client::{AuthConfig, DataplaneApi};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

/// Write a complete integration fixture: one system, a datasource with
/// a test payload (`contacts`) and one without (`deals`).
pub(crate) fn write_fixture(dir: &Path) {
    std::fs::write(
        dir.join("application.yaml"),
        "\
app:
  name: crm
  language: custom
externalIntegration:
  systems:
    - crm-deploy.json
  dataSources:
    - crm-deploy-contacts.json
    - crm-deploy-deals.json
",
    )
    .unwrap();

    std::fs::write(
        dir.join("crm-deploy.json"),
        serde_json::to_string_pretty(&json!({
            "key": "crm",
            "displayName": "CRM",
            "type": "openapi",
            "baseUrl": "https://api.crm.example"
        }))
        .unwrap(),
    )
    .unwrap();

    std::fs::write(
        dir.join("crm-deploy-contacts.json"),
        serde_json::to_string_pretty(&json!({
            "key": "contacts",
            "systemKey": "crm",
            "fieldMappings": { "properties.email": "email" },
            "testPayload": {
                "payloadTemplate": { "properties": { "email": "a@b.example" } }
            }
        }))
        .unwrap(),
    )
    .unwrap();

    std::fs::write(
        dir.join("crm-deploy-deals.json"),
        serde_json::to_string_pretty(&json!({
            "key": "deals",
            "systemKey": "crm"
        }))
        .unwrap(),
    )
    .unwrap();
}

pub(crate) struct MockDataplane {
    calls: Mutex<Vec<String>>,
    failing_tests: HashSet<String>,
    failing_deploys: HashSet<String>,
    fail_upload: bool,
    remote_config: Option<Value>,
}

impl MockDataplane {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing_tests: HashSet::new(),
            failing_deploys: HashSet::new(),
            fail_upload: false,
            remote_config: None,
        }
    }

    pub fn failing_test(mut self, datasource_key: &str) -> Self {
        self.failing_tests.insert(datasource_key.to_string());
        self
    }

    pub fn failing_deploy(mut self, datasource_key: &str) -> Self {
        self.failing_deploys.insert(datasource_key.to_string());
        self
    }

    pub fn failing_upload(mut self) -> Self {
        self.fail_upload = true;
        self
    }

    pub fn remote_config(mut self, config: Value) -> Self {
        self.remote_config = Some(config);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl DataplaneApi for MockDataplane {
    async fn create_session(
        &self,
        _mode: &str,
        _system: Option<&str>,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        unimplemented!("not used by deploy tests")
    }

    async fn select_source(
        &self,
        _session_id: &str,
        _source: &Value,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        unimplemented!("not used by deploy tests")
    }

    async fn parse_source(&self, _session_id: &str, _auth: &AuthConfig) -> Result<Value, ApiError> {
        unimplemented!("not used by deploy tests")
    }

    async fn select_credential(
        &self,
        _session_id: &str,
        _credential_key: &str,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        unimplemented!("not used by deploy tests")
    }

    async fn detect_types(&self, _session_id: &str, _auth: &AuthConfig) -> Result<Value, ApiError> {
        unimplemented!("not used by deploy tests")
    }

    async fn generate_configuration(
        &self,
        _session_id: &str,
        _request: &Value,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        unimplemented!("not used by deploy tests")
    }

    async fn validate_configuration(
        &self,
        _session_id: &str,
        _configuration: &Value,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        unimplemented!("not used by deploy tests")
    }

    async fn deployment_docs(
        &self,
        _system_key: &str,
        _auth: &AuthConfig,
    ) -> Result<String, ApiError> {
        unimplemented!("not used by deploy tests")
    }

    async fn deployment_docs_for(
        &self,
        _system_key: &str,
        _files: &Value,
        _auth: &AuthConfig,
    ) -> Result<String, ApiError> {
        unimplemented!("not used by deploy tests")
    }

    async fn pipeline_test(
        &self,
        system_key: &str,
        datasource_key: &str,
        _payload: &Value,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.record(format!("pipeline_test {}/{}", system_key, datasource_key));
        if self.failing_tests.contains(datasource_key) {
            return Err(ApiError::new(
                ApiErrorKind::Server,
                format!("pipeline returned 500 for {}", datasource_key),
            ));
        }
        Ok(json!({ "matched": true }))
    }

    async fn pipeline_deploy(
        &self,
        system_key: &str,
        datasource_key: &str,
        _datasource: &Value,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.record(format!("pipeline_deploy {}/{}", system_key, datasource_key));
        if self.failing_deploys.contains(datasource_key) {
            return Err(ApiError::new(
                ApiErrorKind::Server,
                format!("deploy rejected for {}", datasource_key),
            ));
        }
        Ok(json!({}))
    }

    async fn upload_system(
        &self,
        system_key: &str,
        _body: &Value,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.record(format!("upload_system {}", system_key));
        if self.fail_upload {
            return Err(ApiError::new(ApiErrorKind::Server, "upload failed"));
        }
        Ok(json!({}))
    }

    async fn download_system(
        &self,
        system_key: &str,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.record(format!("download_system {}", system_key));
        self.remote_config
            .clone()
            .ok_or_else(|| ApiError::new(ApiErrorKind::NotFound, "system not uploaded"))
    }

    async fn validate_upload(
        &self,
        system_key: &str,
        _auth: &AuthConfig,
    ) -> Result<Value, ApiError> {
        self.record(format!("validate_upload {}", system_key));
        Ok(json!({ "valid": true, "errors": [] }))
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
