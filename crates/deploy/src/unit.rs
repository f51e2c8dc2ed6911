//! Local-only ("unit") validation of an integration bundle.

use crate::loader::IntegrationBundle;
use aifabrix_schema::validation::{
    validate_datasource, validate_field_mappings, validate_metadata_schema,
    validate_relationship, validate_system, ValidationResult,
};

/// Aggregate of every local check, with per-file detail preserved.
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub result: ValidationResult,
    pub items: Vec<(String, ValidationResult)>,
}

impl UnitReport {
    pub fn valid(&self) -> bool {
        self.result.valid
    }
}

/// Validate every system and selected datasource file. Never contacts
/// the network; running it twice on unchanged files yields identical
/// results.
pub fn unit_validate(bundle: &IntegrationBundle, selected: Option<&[String]>) -> UnitReport {
    let mut overall = ValidationResult::new();
    let mut items = Vec::new();
    let system_key = bundle.system_key().to_string();

    for system in &bundle.systems {
        let result = validate_system(&system.raw);
        overall.merge(result.clone());
        items.push((system.file_name.clone(), result));
    }

    for datasource in bundle.selected_datasources(selected) {
        let mut result = validate_datasource(&datasource.raw);
        result.merge(validate_relationship(&system_key, &datasource.config));

        if datasource.config.test_payload.is_some() {
            result.merge(validate_field_mappings(&datasource.config));
            result.merge(validate_metadata_schema(&datasource.config));
        }

        overall.merge(result.clone());
        items.push((datasource.file_name.clone(), result));
    }

    UnitReport {
        result: overall,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_bundle;
    use crate::testutil::write_fixture;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_valid_fixture_passes() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let bundle = load_bundle(dir.path()).unwrap();

        let report = unit_validate(&bundle, None);
        assert!(report.valid(), "errors: {:?}", report.result.errors);
        assert_eq!(report.items.len(), 3);
    }

    #[test]
    fn test_system_key_mismatch_reported_exactly() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        std::fs::write(
            dir.path().join("crm-deploy-deals.json"),
            r#"{ "key": "deals", "systemKey": "sales" }"#,
        )
        .unwrap();
        let bundle = load_bundle(dir.path()).unwrap();

        let report = unit_validate(&bundle, None);
        assert!(!report.valid());
        assert!(report
            .result
            .errors
            .contains(&"systemKey mismatch: expected 'crm', got 'sales'".to_string()));
    }

    #[test]
    fn test_payload_checks_only_run_with_payload() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        // break the contacts payload so field mappings can't resolve
        std::fs::write(
            dir.path().join("crm-deploy-contacts.json"),
            serde_json::to_string_pretty(&serde_json::json!({
                "key": "contacts",
                "systemKey": "crm",
                "fieldMappings": { "properties.email": "email" },
                "testPayload": { "payloadTemplate": { "properties": {} } }
            }))
            .unwrap(),
        )
        .unwrap();
        let bundle = load_bundle(dir.path()).unwrap();

        let report = unit_validate(&bundle, None);
        assert!(!report.valid());
        // deals has no payload and stays clean
        let deals = report
            .items
            .iter()
            .find(|(name, _)| name == "crm-deploy-deals.json")
            .unwrap();
        assert!(deals.1.valid);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        std::fs::write(
            dir.path().join("crm-deploy-deals.json"),
            r#"{ "key": "deals", "systemKey": "sales" }"#,
        )
        .unwrap();
        let bundle = load_bundle(dir.path()).unwrap();

        let first = unit_validate(&bundle, None);
        let second = unit_validate(&bundle, None);
        assert_eq!(first.result.valid, second.result.valid);
        assert_eq!(first.result.errors, second.result.errors);
        assert_eq!(first.result.warnings, second.result.warnings);
    }

    #[test]
    fn test_selection_limits_validated_files() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let bundle = load_bundle(dir.path()).unwrap();

        let selected = ["contacts".to_string()];
        let report = unit_validate(&bundle, Some(&selected));
        // system file + one datasource
        assert_eq!(report.items.len(), 2);
    }
}
