//! Configuration schema for aifabrix.
//!
//! This crate defines the on-disk shapes the CLI reads and writes:
//! `variables.yaml` / `application.yaml`, system deploy descriptors and
//! datasource deploy descriptors, plus the JSON Schemas and local
//! validation applied to them before anything touches the network.

pub mod app;
pub mod schema;
pub mod system;
pub mod validation;

pub use app::{AppConfig, AppSection, DatabaseSpec, ExternalIntegration, RequiresSection};
pub use system::{DataSourceConfig, SystemConfig, SystemType, TestPayload};
pub use validation::{
    validate_datasource, validate_field_mappings, validate_metadata_schema,
    validate_relationship, validate_system, ValidationResult,
};
