//! HTTP client layer for the aifabrix controller and dataplane APIs.
//!
//! The controller authenticates users and apps and brokers discovery of
//! per-environment dataplanes; the dataplane executes wizard steps,
//! stores external-system configuration and runs pipeline tests. Both
//! speak the same `{success, data}` / `{success: false, error}` envelope,
//! normalized here into [`api::ApiError`].

pub mod api;
pub mod auth;
pub mod config;
pub mod controller;
pub mod dataplane;
pub mod resolve;
pub mod retry;

pub use api::{ApiError, ApiErrorKind};
pub use auth::AuthConfig;
pub use config::CliConfig;
pub use controller::ControllerClient;
pub use dataplane::{DataplaneApi, DataplaneClient};
pub use retry::{retry, RetryOptions};
