//! Project directory layout.
//!
//! Apps live under `builder/<app>/`, external-system integrations under
//! `integration/<system>/`. Deploy JSON file names are derived from the
//! system and entity keys.

use std::path::{Path, PathBuf};

/// Directory for a containerized application.
pub fn builder_dir(root: &Path, app: &str) -> PathBuf {
    root.join("builder").join(app)
}

/// Directory for an external-system integration.
pub fn integration_dir(root: &Path, system_key: &str) -> PathBuf {
    root.join("integration").join(system_key)
}

/// File name of a system deploy descriptor.
pub fn system_file_name(system_key: &str) -> String {
    format!("{}-deploy.json", system_key)
}

/// File name of a datasource deploy descriptor.
pub fn datasource_file_name(system_key: &str, entity_key: &str) -> String {
    format!("{}-deploy-{}.json", system_key, entity_key)
}
