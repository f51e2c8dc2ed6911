//! Wizard session steps.
//!
//! The pipeline is strictly linear: mode-selected, source-selected,
//! parsed, credential-resolved, type-detected, config-generated,
//! validated, files-saved. Each step calls one dataplane endpoint and
//! maps failures into an error carrying a step prefix. Only credential
//! selection loops, and only once.

use crate::prompts::Prompter;
use aifabrix_client::api::{flatten_field_errors, ApiError};
use aifabrix_client::{AuthConfig, DataplaneApi};
use aifabrix_common::{Error, Result as CommonResult};
use aifabrix_schema::{DataSourceConfig, SystemConfig};
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What the wizard is doing: building a new system or extending one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardMode {
    CreateSystem,
    AddDatasource,
}

impl WizardMode {
    pub fn as_str(self) -> &'static str {
        match self {
            WizardMode::CreateSystem => "create-system",
            WizardMode::AddDatasource => "add-datasource",
        }
    }
}

impl std::str::FromStr for WizardMode {
    type Err = Error;

    fn from_str(s: &str) -> CommonResult<Self> {
        match s {
            "create-system" => Ok(WizardMode::CreateSystem),
            "add-datasource" => Ok(WizardMode::AddDatasource),
            other => Err(Error::Config(format!("unknown wizard mode: {}", other))),
        }
    }
}

impl fmt::Display for WizardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the external system's description comes from.
#[derive(Debug, Clone)]
pub enum SourceSelection {
    OpenapiFile(PathBuf),
    OpenapiUrl(String),
    McpServer(String),
    KnownPlatform(String),
}

impl SourceSelection {
    pub fn source_type(&self) -> &'static str {
        match self {
            SourceSelection::OpenapiFile(_) => "openapi-file",
            SourceSelection::OpenapiUrl(_) => "openapi-url",
            SourceSelection::McpServer(_) => "mcp-server",
            SourceSelection::KnownPlatform(_) => "known-platform",
        }
    }
}

/// Ephemeral session state; lives for one CLI invocation only.
#[derive(Debug, Clone)]
pub struct WizardSession {
    pub session_id: String,
    pub mode: WizardMode,
    pub system_id_or_key: Option<String>,
    pub source_type: Option<String>,
    pub source_data: Option<Value>,
}

/// Knobs forwarded to configuration generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserPreferences {
    pub enable_mcp: bool,
    pub enable_abac: bool,
    pub enable_rbac: bool,
}

/// Configuration produced by the generation step.
#[derive(Debug, Clone)]
pub struct GeneratedConfig {
    pub system: SystemConfig,
    pub datasources: Vec<DataSourceConfig>,
    /// The untouched server response, written to deploy JSON as-is.
    pub raw: Value,
}

/// Outcome of server-side validation; warnings are non-fatal.
#[derive(Debug, Clone, Default)]
pub struct ServerValidation {
    pub warnings: Vec<String>,
}

/// Create the session on the dataplane (mode selection).
pub async fn start_session(
    api: &dyn DataplaneApi,
    auth: &AuthConfig,
    mode: WizardMode,
    system: Option<&str>,
) -> Result<WizardSession> {
    let data = api
        .create_session(mode.as_str(), system, auth)
        .await
        .map_err(step_error("Failed to start wizard session"))?;

    let session_id = data
        .get("sessionId")
        .and_then(Value::as_str)
        .map(str::to_string)
        .context("wizard session response carried no sessionId")?;

    info!("wizard session {} ({})", session_id, mode);
    Ok(WizardSession {
        session_id,
        mode,
        system_id_or_key: system.map(str::to_string),
        source_type: None,
        source_data: None,
    })
}

/// Record the chosen source on the session.
///
/// File sources are read locally first (a missing file fails fast, no
/// network call). MCP servers are probed for reachability before the
/// session is updated.
pub async fn select_source(
    api: &dyn DataplaneApi,
    auth: &AuthConfig,
    session: &mut WizardSession,
    source: &SourceSelection,
) -> Result<()> {
    let source_data = match source {
        SourceSelection::OpenapiFile(path) => {
            let document = std::fs::read_to_string(path).map_err(|_| {
                anyhow::Error::new(Error::MissingFile(path.display().to_string()))
            })?;
            json!({ "document": document })
        }
        SourceSelection::OpenapiUrl(url) => {
            let document = download_document(url).await?;
            json!({ "url": url, "document": document })
        }
        SourceSelection::McpServer(url) => {
            probe_mcp_server(url).await?;
            json!({ "url": url })
        }
        SourceSelection::KnownPlatform(platform) => json!({ "platform": platform }),
    };

    let body = json!({
        "sourceType": source.source_type(),
        "sourceData": source_data.clone(),
    });

    api.select_source(&session.session_id, &body, auth)
        .await
        .map_err(step_error("Source selection failed"))?;

    session.source_type = Some(source.source_type().to_string());
    session.source_data = Some(source_data);
    Ok(())
}

/// Parse the selected source. Known platforms skip this step entirely.
pub async fn parse_source(
    api: &dyn DataplaneApi,
    auth: &AuthConfig,
    session: &WizardSession,
    source: &SourceSelection,
) -> Result<Option<Value>> {
    let prefix = match source {
        SourceSelection::KnownPlatform(_) => {
            debug!("known platform source; skipping parse step");
            return Ok(None);
        }
        SourceSelection::McpServer(_) => "MCP parsing failed",
        _ => "OpenAPI parsing failed",
    };

    let data = api
        .parse_source(&session.session_id, auth)
        .await
        .map_err(step_error(prefix))?;
    Ok(Some(data))
}

/// Resolve the credential to attach, with at most one retry.
///
/// On a failed selection the user may either skip (no credential, no
/// further attempt) or supply a different key for one final attempt.
pub async fn resolve_credential(
    api: &dyn DataplaneApi,
    auth: &AuthConfig,
    session: &WizardSession,
    initial: Option<String>,
    prompter: &mut dyn Prompter,
) -> Result<Option<String>> {
    let key = match initial {
        Some(key) => key,
        None => {
            let answer = prompter.line("Credential key (leave empty to skip): ")?;
            if answer.is_empty() {
                println!("Skipping credential selection");
                info!("no credential attached");
                return Ok(None);
            }
            answer
        }
    };

    match api.select_credential(&session.session_id, &key, auth).await {
        Ok(_) => Ok(Some(key)),
        Err(e) => {
            warn!("credential selection failed: {}", e);
            let retry_key = prompter.line(
                "Credential selection failed. Enter a different key, or leave empty to skip: ",
            )?;
            if retry_key.is_empty() {
                println!("Skipping credential selection");
                info!("no credential attached after failed selection");
                return Ok(None);
            }
            api.select_credential(&session.session_id, &retry_key, auth)
                .await
                .map_err(step_error("Credential selection failed"))?;
            Ok(Some(retry_key))
        }
    }
}

/// Detect entity types from the parsed source.
pub async fn detect_types(
    api: &dyn DataplaneApi,
    auth: &AuthConfig,
    session: &WizardSession,
) -> Result<Value> {
    api.detect_types(&session.session_id, auth)
        .await
        .map_err(step_error("Type detection failed"))
}

/// Generate the system/datasource configuration.
///
/// On failure, field-level errors reported by the server are flattened
/// into the message; the server's pre-formatted text stays on the
/// underlying [`ApiError`] for terminal display.
pub async fn generate_configuration(
    api: &dyn DataplaneApi,
    auth: &AuthConfig,
    session: &WizardSession,
    preferences: UserPreferences,
    intent: Option<&str>,
) -> Result<GeneratedConfig> {
    let request = json!({
        "userPreferences": {
            "enableMCP": preferences.enable_mcp,
            "enableABAC": preferences.enable_abac,
            "enableRBAC": preferences.enable_rbac,
        },
        "intent": intent,
    });

    let data = api
        .generate_configuration(&session.session_id, &request, auth)
        .await
        .map_err(|e| {
            let mut message = format!("Configuration generation failed: {}", e.message);
            for (field, detail) in flatten_field_errors(e.details.as_ref()) {
                message.push_str(&format!("\n  {}: {}", field, detail));
            }
            anyhow::Error::new(e).context(message)
        })?;

    parse_generated(data)
}

fn parse_generated(data: Value) -> Result<GeneratedConfig> {
    let system: SystemConfig = serde_json::from_value(
        data.get("system")
            .cloned()
            .context("generated configuration carried no system")?,
    )
    .context("malformed generated system configuration")?;

    let datasources: Vec<DataSourceConfig> = data
        .get("dataSources")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| serde_json::from_value(item.clone()))
                .collect::<std::result::Result<Vec<_>, _>>()
        })
        .transpose()
        .context("malformed generated datasource configuration")?
        .unwrap_or_default();

    Ok(GeneratedConfig {
        system,
        datasources,
        raw: data,
    })
}

/// Validate the generated configuration server-side. Warnings are
/// returned for display; any reported error fails the step.
pub async fn validate_configuration(
    api: &dyn DataplaneApi,
    auth: &AuthConfig,
    session: &WizardSession,
    generated: &GeneratedConfig,
) -> Result<ServerValidation> {
    let data = api
        .validate_configuration(&session.session_id, &generated.raw, auth)
        .await
        .map_err(step_error("Configuration validation failed"))?;

    let errors: Vec<String> = string_list(&data, "errors");
    let warnings = string_list(&data, "warnings");

    if !errors.is_empty() {
        anyhow::bail!("Configuration validation failed: {}", errors.join("; "));
    }
    Ok(ServerValidation { warnings })
}

fn string_list(data: &Value, field: &str) -> Vec<String> {
    data.get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn step_error(prefix: &'static str) -> impl Fn(ApiError) -> anyhow::Error {
    move |e| anyhow::Error::new(e).context(prefix)
}

/// Download an OpenAPI document to a scratch directory and read it
/// back. The directory is removed when the handle drops, errors
/// included.
async fn download_document(url: &str) -> Result<String> {
    let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download OpenAPI document from {}", url))?;
    if !response.status().is_success() {
        anyhow::bail!(
            "Failed to download OpenAPI document from {}: {}",
            url,
            response.status()
        );
    }

    let body = response.text().await?;
    let path = scratch.path().join("openapi-document");
    std::fs::write(&path, &body)?;
    debug!("downloaded {} bytes to {}", body.len(), path.display());
    Ok(body)
}

/// Probe an MCP server for reachability. Any HTTP response, error
/// statuses included, proves the transport works; only connection
/// failures fail the step.
pub async fn probe_mcp_server(url: &str) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    client
        .get(url)
        .send()
        .await
        .map(|_| ())
        .with_context(|| format!("MCP server unreachable: {}", url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::ScriptedPrompter;
    use crate::testutil::MockDataplane;

    fn auth() -> AuthConfig {
        AuthConfig::bearer("at")
    }

    fn session() -> WizardSession {
        WizardSession {
            session_id: "s1".to_string(),
            mode: WizardMode::CreateSystem,
            system_id_or_key: None,
            source_type: None,
            source_data: None,
        }
    }

    #[tokio::test]
    async fn test_start_session_reads_session_id() {
        let api = MockDataplane::new();
        let session = start_session(&api, &auth(), WizardMode::CreateSystem, None)
            .await
            .unwrap();
        assert_eq!(session.session_id, "s1");
        assert_eq!(api.calls(), vec!["create_session create-system"]);
    }

    #[tokio::test]
    async fn test_known_platform_skips_parse() {
        let api = MockDataplane::new();
        let source = SourceSelection::KnownPlatform("hubspot".to_string());
        let parsed = parse_source(&api, &auth(), &session(), &source).await.unwrap();
        assert!(parsed.is_none());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_credential_failure_then_skip_yields_none() {
        let api = MockDataplane::new().failing_credential("bad-key");
        let mut prompter = ScriptedPrompter::new(&[""]);

        let credential = resolve_credential(
            &api,
            &auth(),
            &session(),
            Some("bad-key".to_string()),
            &mut prompter,
        )
        .await
        .unwrap();

        assert!(credential.is_none());
        // one failed selection, no retry after the skip
        assert_eq!(api.calls(), vec!["select_credential bad-key"]);
    }

    #[tokio::test]
    async fn test_credential_failure_then_different_key_retries_once() {
        let api = MockDataplane::new().failing_credential("bad-key");
        let mut prompter = ScriptedPrompter::new(&["good-key"]);

        let credential = resolve_credential(
            &api,
            &auth(),
            &session(),
            Some("bad-key".to_string()),
            &mut prompter,
        )
        .await
        .unwrap();

        assert_eq!(credential.as_deref(), Some("good-key"));
        assert_eq!(
            api.calls(),
            vec!["select_credential bad-key", "select_credential good-key"]
        );
    }

    #[tokio::test]
    async fn test_generation_failure_flattens_field_errors() {
        let api = MockDataplane::new().failing_generation();
        let err = generate_configuration(
            &api,
            &auth(),
            &session(),
            UserPreferences::default(),
            Some("sync contacts"),
        )
        .await
        .unwrap_err();

        let message = format!("{}", err);
        assert!(message.contains("Configuration generation failed: configuration rejected"));
        assert!(message.contains("baseUrl: must be https"));

        // the server's pre-formatted text stays reachable for display
        let api_error = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<ApiError>())
            .expect("ApiError retained in chain");
        assert!(api_error.formatted.is_some());
    }

    #[tokio::test]
    async fn test_validation_warnings_pass_errors_fail() {
        let api = MockDataplane::new().validation_response(serde_json::json!({
            "valid": true,
            "errors": [],
            "warnings": ["credential not attached"]
        }));
        let generated = GeneratedConfig {
            system: serde_json::from_value(serde_json::json!({
                "key": "crm", "displayName": "CRM", "type": "openapi"
            }))
            .unwrap(),
            datasources: vec![],
            raw: serde_json::json!({}),
        };

        let validation = validate_configuration(&api, &auth(), &session(), &generated)
            .await
            .unwrap();
        assert_eq!(validation.warnings, vec!["credential not attached"]);

        let api = MockDataplane::new().validation_response(serde_json::json!({
            "valid": false,
            "errors": ["systemKey mismatch"],
            "warnings": []
        }));
        let err = validate_configuration(&api, &auth(), &session(), &generated)
            .await
            .unwrap_err();
        assert!(format!("{}", err).contains("systemKey mismatch"));
    }

    #[tokio::test]
    async fn test_mcp_probe_accepts_error_statuses() {
        let server = httpmock::MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::GET);
            then.status(404);
        });
        // a 404 still proves the transport works
        probe_mcp_server(&server.base_url()).await.unwrap();
    }

    #[tokio::test]
    async fn test_mcp_probe_fails_on_connection_error() {
        let err = probe_mcp_server("http://127.0.0.1:1").await.unwrap_err();
        assert!(format!("{:#}", err).contains("MCP server unreachable"));
    }

    #[tokio::test]
    async fn test_missing_openapi_file_fails_before_any_call() {
        let api = MockDataplane::new();
        let mut session = session();
        let source = SourceSelection::OpenapiFile(PathBuf::from("/nope/openapi.yaml"));

        let err = select_source(&api, &auth(), &mut session, &source)
            .await
            .unwrap_err();
        assert!(format!("{}", err).contains("Missing file"));
        assert!(api.calls().is_empty());
    }
}
