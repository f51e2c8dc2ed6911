//! Integration testing of datasources against the pipeline API.

use crate::loader::IntegrationBundle;
use aifabrix_client::{retry, AuthConfig, DataplaneApi, RetryOptions};
use aifabrix_common::{ItemOutcome, OutcomeSummary};
use anyhow::Result;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

/// Reason recorded on datasources that have nothing to send.
pub const NO_PAYLOAD_REASON: &str = "No test payload available";

/// Options for one integration-test run.
#[derive(Debug, Clone, Default)]
pub struct TestOptions {
    /// Restrict to these datasource keys; `None` tests everything.
    pub selected: Option<Vec<String>>,
    /// Payload used for every tested datasource instead of its own
    /// template.
    pub custom_payload: Option<Value>,
    pub retry: RetryOptions,
}

/// Outcome of one run.
#[derive(Debug, Clone)]
pub struct TestReport {
    pub run_id: String,
    pub summary: OutcomeSummary,
}

/// Test each selected datasource through the remote pipeline.
///
/// Datasources are processed strictly in order. A failing datasource is
/// recorded and the remaining ones still run; only the retry helper
/// re-issues calls. A datasource with no payload at all is skipped and
/// never counts against the summary.
pub async fn run_pipeline_tests(
    api: &dyn DataplaneApi,
    auth: &AuthConfig,
    bundle: &IntegrationBundle,
    options: &TestOptions,
) -> Result<TestReport> {
    let run_id = Uuid::new_v4().to_string();
    let system_key = bundle.system_key().to_string();
    let mut items = Vec::new();

    for datasource in bundle.selected_datasources(options.selected.as_deref()) {
        let key = datasource.config.key.clone();

        let payload = options.custom_payload.clone().or_else(|| {
            datasource
                .config
                .test_payload
                .as_ref()
                .map(|t| t.payload_template.clone())
        });

        let Some(payload) = payload else {
            info!("skipping {}: no payload", key);
            items.push(ItemOutcome::skipped(key, NO_PAYLOAD_REASON));
            continue;
        };

        info!("testing {}/{}", system_key, key);
        let outcome = retry(
            || api.pipeline_test(&system_key, &key, &payload, auth),
            options.retry,
        )
        .await;

        match outcome {
            Ok(_) => items.push(ItemOutcome::ok(key)),
            Err(e) => {
                warn!("{} failed: {}", key, e);
                items.push(ItemOutcome::failed(key, e.to_string()));
            }
        }
    }

    Ok(TestReport {
        run_id,
        summary: OutcomeSummary::from_items(items),
    })
}
