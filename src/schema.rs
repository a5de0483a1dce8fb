//! JSON Schema validation for canonical source documents.
//!
//! The schema is loaded once per run and treated as an opaque contract;
//! draft-07 `if/then` conditionals are supported, which the spell schema
//! uses to require `materials` whenever `components.material` is true.

use anyhow::{Context, Result};
use jsonschema::Validator;
use serde_json::Value;
use std::path::Path;

/// One schema violation: instance path (JSON pointer) plus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = if self.path.is_empty() {
            "<root>"
        } else {
            &self.path
        };
        write!(f, "{} -> {}", path, self.message)
    }
}

/// Compiled schema wrapper. Built once, checked against every document
/// in the batch.
pub struct SchemaValidator {
    validator: Validator,
}

impl SchemaValidator {
    /// Load and compile a schema from a JSON file.
    pub fn from_file(path: &Path) -> Result<SchemaValidator> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema: {}", path.display()))?;
        let schema: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid JSON in schema: {}", path.display()))?;
        Self::from_value(&schema)
    }

    /// Compile a schema from an in-memory JSON value.
    pub fn from_value(schema: &Value) -> Result<SchemaValidator> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| anyhow::anyhow!("Schema does not compile: {}", e))?;
        Ok(SchemaValidator { validator })
    }

    /// Check one document. Returns violations sorted by instance path
    /// so repeated runs over the same invalid input produce identical
    /// reports. Empty iff the document is valid.
    pub fn validate(&self, document: &Value) -> Vec<SchemaViolation> {
        let mut violations: Vec<SchemaViolation> = self
            .validator
            .iter_errors(document)
            .map(|e| SchemaViolation {
                path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect();
        violations.sort_by(|a, b| a.path.cmp(&b.path).then(a.message.cmp(&b.message)));
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spell_schema() -> Value {
        let raw = include_str!("../schemas/srd-spell-5e-2014.json");
        serde_json::from_str(raw).unwrap()
    }

    fn minimal_spell() -> Value {
        json!({
            "name": "Magic Missile",
            "srd_id": "spell:magic-missile",
            "edition": "5e-2014",
            "license": "CC-BY-4.0",
            "source": {"title": "SRD 5.1", "url": null, "publisher": "Wizards of the Coast"},
            "level": 1,
            "school": "Evocation",
            "casting_time": "1 action",
            "range": "120 feet",
            "duration": "Instantaneous",
            "ritual": false,
            "concentration": false,
            "components": {"verbal": true, "somatic": true, "material": false},
            "materials": null,
            "description_md": "Placeholder SRD-safe text."
        })
    }

    #[test]
    fn test_spell_without_materials_passes_when_not_material() {
        let validator = SchemaValidator::from_value(&spell_schema()).unwrap();
        assert!(validator.validate(&minimal_spell()).is_empty());
    }

    #[test]
    fn test_material_component_requires_materials_text() {
        let validator = SchemaValidator::from_value(&spell_schema()).unwrap();

        let mut spell = minimal_spell();
        spell["components"]["material"] = json!(true);
        let violations = validator.validate(&spell);
        assert!(
            !violations.is_empty(),
            "material=true with null materials must fail"
        );

        spell["materials"] = json!("a pearl worth at least 100 gp and an owl feather");
        assert!(validator.validate(&spell).is_empty());
    }

    #[test]
    fn test_violations_sorted_by_path() {
        let schema = json!({
            "type": "object",
            "required": ["a", "b"],
            "properties": {
                "z": {"type": "integer"},
                "a": {"type": "string"}
            }
        });
        let validator = SchemaValidator::from_value(&schema).unwrap();
        let doc = json!({"z": "not-an-int", "a": 5});
        let first = validator.validate(&doc);
        let second = validator.validate(&doc);
        assert_eq!(first, second);
        let paths: Vec<_> = first.iter().map(|v| v.path.clone()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }
}
