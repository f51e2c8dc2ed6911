//! `variables.yaml` / `application.yaml` generation.

use aifabrix_common::paths;
use aifabrix_schema::{
    AppConfig, AppSection, DataSourceConfig, ExternalIntegration, SystemConfig,
};
use anyhow::Result;

/// Build the `application.yaml` text for an external-system integration.
///
/// Re-parsing the output reproduces the `externalIntegration` file-name
/// lists exactly; the deploy pipeline relies on that to find the JSON
/// descriptors next to the file.
pub fn generate_variables_yaml(
    system_key: &str,
    system: &SystemConfig,
    datasources: &[DataSourceConfig],
) -> Result<String> {
    let config = AppConfig {
        app: AppSection {
            name: system_key.to_string(),
            display_name: Some(system.display_name.clone()),
            description: system.description.clone(),
            language: "custom".to_string(),
            port: 3000,
            image: None,
        },
        external_integration: Some(ExternalIntegration {
            systems: vec![paths::system_file_name(system_key)],
            data_sources: datasources
                .iter()
                .map(|ds| paths::datasource_file_name(system_key, &ds.key))
                .collect(),
        }),
        ..Default::default()
    };
    config.to_yaml()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aifabrix_schema::SystemType;
    use serde_json::json;

    fn sample_system() -> SystemConfig {
        serde_json::from_value(json!({
            "key": "crm",
            "displayName": "CRM",
            "type": "openapi"
        }))
        .unwrap()
    }

    fn sample_datasource(key: &str) -> DataSourceConfig {
        serde_json::from_value(json!({ "key": key, "systemKey": "crm" })).unwrap()
    }

    #[test]
    fn test_round_trip_reproduces_file_lists() {
        let datasources = vec![sample_datasource("contacts"), sample_datasource("deals")];
        let yaml = generate_variables_yaml("crm", &sample_system(), &datasources).unwrap();

        let parsed = AppConfig::from_yaml(&yaml).unwrap();
        let integration = parsed.external_integration.unwrap();
        assert_eq!(integration.systems, vec!["crm-deploy.json"]);
        assert_eq!(
            integration.data_sources,
            vec!["crm-deploy-contacts.json", "crm-deploy-deals.json"]
        );
        assert_eq!(parsed.app.name, "crm");
        assert_eq!(parsed.app.display_name.as_deref(), Some("CRM"));
    }

    #[test]
    fn test_system_type_preserved_in_descriptor() {
        let system = sample_system();
        assert_eq!(system.system_type, SystemType::Openapi);
    }
}
