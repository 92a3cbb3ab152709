use serde_json::{Map, Value, json};

use crate::error::{Result, VidbookError};

/// Expected shape of a structured response
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub kind: SchemaKind,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    String,
    Number,
    Integer,
    Boolean,
    Array(Box<Schema>),
    Object(Vec<Field>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    pub required: bool,
}

impl Field {
    pub fn required<S: Into<String>>(name: S, schema: Schema) -> Self {
        Self { name: name.into(), schema, required: true }
    }

    pub fn optional<S: Into<String>>(name: S, schema: Schema) -> Self {
        Self { name: name.into(), schema, required: false }
    }
}

impl Schema {
    fn of(kind: SchemaKind) -> Self {
        Self { kind, description: None }
    }

    pub fn string() -> Self {
        Self::of(SchemaKind::String)
    }

    pub fn number() -> Self {
        Self::of(SchemaKind::Number)
    }

    pub fn integer() -> Self {
        Self::of(SchemaKind::Integer)
    }

    pub fn boolean() -> Self {
        Self::of(SchemaKind::Boolean)
    }

    pub fn array(items: Schema) -> Self {
        Self::of(SchemaKind::Array(Box::new(items)))
    }

    pub fn object(fields: Vec<Field>) -> Self {
        Self::of(SchemaKind::Object(fields))
    }

    pub fn describe<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Render in the OpenAPI subset the generation service accepts as `responseSchema`
    pub fn to_response_schema(&self) -> Value {
        let mut out = Map::new();

        let type_name = match &self.kind {
            SchemaKind::String => "STRING",
            SchemaKind::Number => "NUMBER",
            SchemaKind::Integer => "INTEGER",
            SchemaKind::Boolean => "BOOLEAN",
            SchemaKind::Array(_) => "ARRAY",
            SchemaKind::Object(_) => "OBJECT",
        };
        out.insert("type".to_string(), json!(type_name));

        if let Some(description) = &self.description {
            out.insert("description".to_string(), json!(description));
        }

        match &self.kind {
            SchemaKind::Array(items) => {
                out.insert("items".to_string(), items.to_response_schema());
            }
            SchemaKind::Object(fields) => {
                let properties: Map<String, Value> = fields
                    .iter()
                    .map(|f| (f.name.clone(), f.schema.to_response_schema()))
                    .collect();
                let required: Vec<&str> = fields
                    .iter()
                    .filter(|f| f.required)
                    .map(|f| f.name.as_str())
                    .collect();
                let ordering: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();

                out.insert("properties".to_string(), Value::Object(properties));
                out.insert("required".to_string(), json!(required));
                out.insert("propertyOrdering".to_string(), json!(ordering));
            }
            _ => {}
        }

        Value::Object(out)
    }

    /// Check `value` against this schema. Unknown object members are allowed;
    /// a required member that is missing or null is not.
    pub fn validate(&self, value: &Value) -> Result<()> {
        self.validate_at(value, "$")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<()> {
        match &self.kind {
            SchemaKind::String if value.is_string() => Ok(()),
            SchemaKind::Number if value.is_number() => Ok(()),
            SchemaKind::Integer if is_integral(value) => Ok(()),
            SchemaKind::Boolean if value.is_boolean() => Ok(()),
            SchemaKind::Array(items) => {
                let elements = value.as_array().ok_or_else(|| mismatch(path, "array", value))?;
                for (i, element) in elements.iter().enumerate() {
                    items.validate_at(element, &format!("{}[{}]", path, i))?;
                }
                Ok(())
            }
            SchemaKind::Object(fields) => {
                let members = value.as_object().ok_or_else(|| mismatch(path, "object", value))?;
                for field in fields {
                    let field_path = format!("{}.{}", path, field.name);
                    match members.get(&field.name) {
                        None | Some(Value::Null) if field.required => {
                            return Err(VidbookError::SchemaViolation(format!(
                                "missing required field {}",
                                field_path
                            )));
                        }
                        None | Some(Value::Null) => {}
                        Some(member) => field.schema.validate_at(member, &field_path)?,
                    }
                }
                Ok(())
            }
            SchemaKind::String => Err(mismatch(path, "string", value)),
            SchemaKind::Number => Err(mismatch(path, "number", value)),
            SchemaKind::Integer => Err(mismatch(path, "integer", value)),
            SchemaKind::Boolean => Err(mismatch(path, "boolean", value)),
        }
    }
}

fn is_integral(value: &Value) -> bool {
    value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
}

fn mismatch(path: &str, expected: &str, found: &Value) -> VidbookError {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    VidbookError::SchemaViolation(format!("{}: expected {}, found {}", path, expected, found))
}

/// Parse a raw structured response and validate it. Malformed JSON is a
/// schema violation, not something to repair.
pub fn parse_structured(raw: &str, schema: &Schema) -> Result<Value> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| VidbookError::SchemaViolation(format!("response is not valid JSON: {}", e)))?;
    schema.validate(&value)?;
    Ok(value)
}
