//! Name validation for apps, systems and datasources.
//!
//! Names end up in file paths, docker resource names and API routes,
//! so they are restricted to a conservative character set.

use crate::error::{Error, Result};

/// Check that a key is safe: lowercase alphanumeric, dash or underscore,
/// starting with a letter or digit.
pub fn is_valid_key(name: &str) -> bool {
    !name.is_empty()
        && name.len() < 64
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        && name
            .chars()
            .next()
            .map(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            .unwrap_or(false)
}

/// Validate an application name.
pub fn validate_app_name(name: &str) -> Result<()> {
    if is_valid_key(name) {
        Ok(())
    } else {
        Err(Error::InvalidName {
            kind: "application".to_string(),
            value: name.to_string(),
        })
    }
}

/// Validate an external-system key.
pub fn validate_system_key(name: &str) -> Result<()> {
    if is_valid_key(name) {
        Ok(())
    } else {
        Err(Error::InvalidName {
            kind: "system".to_string(),
            value: name.to_string(),
        })
    }
}

/// Validate a datasource entity key.
pub fn validate_entity_key(name: &str) -> Result<()> {
    if is_valid_key(name) {
        Ok(())
    } else {
        Err(Error::InvalidName {
            kind: "datasource".to_string(),
            value: name.to_string(),
        })
    }
}
