//! JSON Schema definitions for deploy descriptors.

/// JSON Schema for `<key>-deploy.json` (external system).
pub const EXTERNAL_SYSTEM_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "$id": "https://aifabrix.dev/schemas/external-system.json",
  "title": "External System Deploy Descriptor",
  "type": "object",
  "required": ["key", "displayName", "type"],
  "properties": {
    "key": {
      "type": "string",
      "pattern": "^[a-z0-9][a-z0-9_-]{0,62}$"
    },
    "displayName": {
      "type": "string",
      "minLength": 1
    },
    "description": {
      "type": ["string", "null"]
    },
    "type": {
      "type": "string",
      "enum": ["openapi", "mcp", "custom"]
    },
    "baseUrl": {
      "type": ["string", "null"]
    },
    "credentialKey": {
      "type": ["string", "null"]
    },
    "metadata": {
      "type": ["object", "null"]
    }
  },
  "additionalProperties": false
}"#;

/// JSON Schema for `<systemKey>-deploy-<key>.json` (datasource).
pub const DATASOURCE_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "$id": "https://aifabrix.dev/schemas/datasource.json",
  "title": "Datasource Deploy Descriptor",
  "type": "object",
  "required": ["key", "systemKey"],
  "properties": {
    "key": {
      "type": "string",
      "pattern": "^[a-z0-9][a-z0-9_-]{0,62}$"
    },
    "systemKey": {
      "type": "string",
      "pattern": "^[a-z0-9][a-z0-9_-]{0,62}$"
    },
    "displayName": {
      "type": ["string", "null"]
    },
    "entity": {
      "type": ["string", "null"]
    },
    "operations": {
      "type": "array",
      "items": { "type": "string" }
    },
    "fieldMappings": {
      "type": "object",
      "additionalProperties": { "type": "string" }
    },
    "metadataSchema": {
      "type": ["object", "null"]
    },
    "testPayload": {
      "type": "object",
      "required": ["payloadTemplate"],
      "properties": {
        "payloadTemplate": {},
        "expectedResult": {}
      },
      "additionalProperties": false
    }
  },
  "additionalProperties": false
}"#;

/// Parsed external-system schema.
pub fn external_system_schema() -> serde_json::Value {
    serde_json::from_str(EXTERNAL_SYSTEM_SCHEMA).expect("embedded schema is valid JSON")
}

/// Parsed datasource schema.
pub fn datasource_schema() -> serde_json::Value {
    serde_json::from_str(DATASOURCE_SCHEMA).expect("embedded schema is valid JSON")
}
