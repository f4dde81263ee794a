//! Declarative input/output contracts for analysis calls.
//!
//! A schema is plain data: the same definition instructs the model which shape
//! to return and validates whatever comes back.

use serde_json::{json, Map, Value};
use thiserror::Error;

/// Primitive type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
}

impl FieldKind {
    /// JSON Schema type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
        }
    }
}

/// A single declared field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
}

impl FieldSpec {
    pub const fn string(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::String,
            description,
        }
    }
}

/// Ways a value can fail an [`ObjectSchema`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("expected a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' must be a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("field '{0}' is blank")]
    BlankField(&'static str),
}

/// An object whose declared fields are all required.
#[derive(Debug, Clone, Copy)]
pub struct ObjectSchema {
    pub fields: &'static [FieldSpec],
}

impl ObjectSchema {
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    /// Check `value` against the schema and return only the declared fields.
    ///
    /// Undeclared fields are ignored so replies may grow without breaking
    /// readers; a missing or mistyped declared field is always an error.
    pub fn validate(&self, value: &Value) -> Result<Map<String, Value>, SchemaViolation> {
        let object = value.as_object().ok_or(SchemaViolation::NotAnObject)?;

        let mut validated = Map::with_capacity(self.fields.len());
        for field in self.fields {
            let found = match object.get(field.name) {
                Some(Value::Null) | None => return Err(SchemaViolation::MissingField(field.name)),
                Some(found) => found,
            };
            if !field.kind.matches(found) {
                return Err(SchemaViolation::WrongType {
                    field: field.name,
                    expected: field.kind.as_str(),
                });
            }
            if found.as_str().is_some_and(|s| s.trim().is_empty()) {
                return Err(SchemaViolation::BlankField(field.name));
            }
            validated.insert(field.name.to_string(), found.clone());
        }

        Ok(validated)
    }

    /// JSON Schema rendering of this contract.
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|field| {
                (
                    field.name.to_string(),
                    json!({ "type": field.kind.as_str(), "description": field.description }),
                )
            })
            .collect();
        let required: Vec<&str> = self.fields.iter().map(|field| field.name).collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Bullet list of fields for inclusion in model instructions.
    pub fn describe_fields(&self) -> String {
        self.fields
            .iter()
            .map(|field| format!("- {} ({}): {}", field.name, field.kind.as_str(), field.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(|field| field.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOOD: ObjectSchema = ObjectSchema::new(&[
        FieldSpec::string("mood", "The mood."),
        FieldSpec::string("symbol", "An emoji."),
    ]);

    #[test]
    fn test_validate_drops_unknown_fields() {
        let value = json!({"mood": "sleepy", "symbol": "😴", "confidence": 0.7});
        let validated = MOOD.validate(&value).unwrap();
        assert_eq!(validated.len(), 2);
        assert_eq!(validated["mood"], "sleepy");
        assert!(!validated.contains_key("confidence"));
    }

    #[test]
    fn test_validate_rejects_missing_field() {
        let err = MOOD.validate(&json!({"mood": "sleepy"})).unwrap_err();
        assert_eq!(err, SchemaViolation::MissingField("symbol"));

        let err = MOOD.validate(&json!({"mood": "sleepy", "symbol": null})).unwrap_err();
        assert_eq!(err, SchemaViolation::MissingField("symbol"));
    }

    #[test]
    fn test_validate_rejects_wrong_type_and_blank() {
        let err = MOOD.validate(&json!({"mood": 3, "symbol": "🐶"})).unwrap_err();
        assert_eq!(
            err,
            SchemaViolation::WrongType {
                field: "mood",
                expected: "string"
            }
        );

        let err = MOOD.validate(&json!({"mood": "  ", "symbol": "🐶"})).unwrap_err();
        assert_eq!(err, SchemaViolation::BlankField("mood"));
    }

    #[test]
    fn test_validate_rejects_non_object() {
        assert_eq!(
            MOOD.validate(&json!(["mood"])).unwrap_err(),
            SchemaViolation::NotAnObject
        );
    }

    #[test]
    fn test_json_schema_lists_every_field_as_required() {
        let schema = MOOD.to_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["mood", "symbol"]));
        assert_eq!(schema["properties"]["symbol"]["type"], "string");
    }

    #[test]
    fn test_describe_fields() {
        assert_eq!(
            MOOD.describe_fields(),
            "- mood (string): The mood.\n- symbol (string): An emoji."
        );
    }
}
