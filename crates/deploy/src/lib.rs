//! External-system deploy and test pipelines.
//!
//! Two independent entry points share one loaded file set: unit
//! validation runs entirely offline against the embedded schemas, while
//! integration testing and deploy/publish talk to the dataplane. Tests
//! isolate per-datasource failures; deploys stop on the first one.

pub mod diff;
pub mod loader;
pub mod publish;
pub mod report;
pub mod testing;
pub mod unit;

#[cfg(test)]
pub(crate) mod testutil;

pub use diff::{diff_system, list_datasources, DiffReport};
pub use loader::{load_bundle, IntegrationBundle};
pub use publish::{deploy_datasources, publish, PublishOptions};
pub use testing::{run_pipeline_tests, TestOptions, TestReport};
pub use unit::{unit_validate, UnitReport};
