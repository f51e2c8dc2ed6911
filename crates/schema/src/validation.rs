//! Local validation of deploy descriptors.
//!
//! Everything here is offline: JSON Schema checks, the system/datasource
//! relationship invariant, and the payload-level checks applied to
//! datasources that carry a test payload.

use crate::schema;
use crate::system::DataSourceConfig;
use jsonschema::JSONSchema;
use serde_json::Value;

/// Result of a validation step. Child results merge into parents without
/// losing individual messages.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.valid = false;
        self.errors.push(error.into());
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Fold another result into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

fn validate_against(schema_value: &Value, instance: &Value, label: &str) -> ValidationResult {
    let mut result = ValidationResult::new();

    let compiled = match JSONSchema::compile(schema_value) {
        Ok(compiled) => compiled,
        Err(e) => {
            result.add_error(format!("{} schema is invalid: {}", label, e));
            return result;
        }
    };

    if let Err(errors) = compiled.validate(instance) {
        for error in errors {
            result.add_error(format!("{}: {} at {}", label, error, error.instance_path));
        }
    }

    result
}

/// Validate a system descriptor against the external-system schema.
pub fn validate_system(system: &Value) -> ValidationResult {
    validate_against(&schema::external_system_schema(), system, "system")
}

/// Validate a datasource descriptor against the datasource schema.
pub fn validate_datasource(datasource: &Value) -> ValidationResult {
    validate_against(&schema::datasource_schema(), datasource, "datasource")
}

/// Check that a datasource belongs to the given system.
pub fn validate_relationship(system_key: &str, datasource: &DataSourceConfig) -> ValidationResult {
    let mut result = ValidationResult::new();
    if datasource.system_key != system_key {
        result.add_error(format!(
            "systemKey mismatch: expected '{}', got '{}'",
            system_key, datasource.system_key
        ));
    }
    result
}

/// Check that every field-mapping source path resolves inside the test
/// payload template. Only meaningful for datasources that carry one.
pub fn validate_field_mappings(datasource: &DataSourceConfig) -> ValidationResult {
    let mut result = ValidationResult::new();

    let Some(payload) = datasource
        .test_payload
        .as_ref()
        .map(|t| &t.payload_template)
    else {
        return result;
    };

    for source in datasource.field_mappings.keys() {
        if lookup_path(payload, source).is_none() {
            result.add_error(format!(
                "field mapping source '{}' not present in test payload",
                source
            ));
        }
    }

    result
}

/// Validate the test payload template against the datasource's inline
/// metadata schema, when both are present.
pub fn validate_metadata_schema(datasource: &DataSourceConfig) -> ValidationResult {
    let mut result = ValidationResult::new();

    let (Some(metadata_schema), Some(payload)) = (
        datasource.metadata_schema.as_ref(),
        datasource
            .test_payload
            .as_ref()
            .map(|t| &t.payload_template),
    ) else {
        return result;
    };

    result.merge(validate_against(metadata_schema, payload, "metadata"));
    result
}

/// Resolve a dot-separated path inside a JSON value.
fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_datasource(payload: Option<Value>) -> DataSourceConfig {
        let mut value = json!({
            "key": "contacts",
            "systemKey": "crm",
            "fieldMappings": { "properties.email": "email" }
        });
        if let Some(payload) = payload {
            value["testPayload"] = json!({ "payloadTemplate": payload });
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_validate_system_minimal() {
        let result = validate_system(&json!({
            "key": "crm",
            "displayName": "CRM",
            "type": "openapi"
        }));
        assert!(result.valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn test_validate_system_missing_type() {
        let result = validate_system(&json!({ "key": "crm", "displayName": "CRM" }));
        assert!(!result.valid);
    }

    #[test]
    fn test_validate_system_bad_key() {
        let result = validate_system(&json!({
            "key": "Bad Key",
            "displayName": "CRM",
            "type": "custom"
        }));
        assert!(!result.valid);
    }

    #[test]
    fn test_relationship_mismatch_message() {
        let ds = sample_datasource(None);
        let result = validate_relationship("sales", &ds);
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec!["systemKey mismatch: expected 'sales', got 'crm'"]
        );
    }

    #[test]
    fn test_relationship_match() {
        let ds = sample_datasource(None);
        assert!(validate_relationship("crm", &ds).valid);
    }

    #[test]
    fn test_field_mappings_resolve() {
        let ds = sample_datasource(Some(json!({
            "properties": { "email": "a@b.example" }
        })));
        assert!(validate_field_mappings(&ds).valid);
    }

    #[test]
    fn test_field_mappings_missing_source() {
        let ds = sample_datasource(Some(json!({ "properties": {} })));
        let result = validate_field_mappings(&ds);
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec!["field mapping source 'properties.email' not present in test payload"]
        );
    }

    #[test]
    fn test_field_mappings_no_payload_is_vacuous() {
        let ds = sample_datasource(None);
        assert!(validate_field_mappings(&ds).valid);
    }

    #[test]
    fn test_metadata_schema_applies_to_payload() {
        let mut ds = sample_datasource(Some(json!({
            "properties": { "email": "a@b.example" }
        })));
        ds.metadata_schema = Some(json!({
            "type": "object",
            "required": ["id"]
        }));
        let result = validate_metadata_schema(&ds);
        assert!(!result.valid);
    }

    #[test]
    fn test_merge_preserves_messages() {
        let mut parent = ValidationResult::new();
        parent.add_warning("deprecated field");
        let mut child = ValidationResult::new();
        child.add_error("boom");
        parent.merge(child);
        assert!(!parent.valid);
        assert_eq!(parent.errors, vec!["boom"]);
        assert_eq!(parent.warnings, vec!["deprecated field"]);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let ds = sample_datasource(Some(json!({ "properties": {} })));
        let first = validate_field_mappings(&ds);
        let second = validate_field_mappings(&ds);
        assert_eq!(first.valid, second.valid);
        assert_eq!(first.errors, second.errors);
        assert_eq!(first.warnings, second.warnings);
    }
}
