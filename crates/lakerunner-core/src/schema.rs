//! Structural validation of invocation payloads.
//!
//! An [`ArgsSchema`] declares the fields a tool accepts. The runner applies
//! it before any lifecycle event fires: a payload that cannot be parsed
//! into the expected shape never reaches the handler or the observer.
//!
//! Without a schema the payload passes through untouched: text becomes a
//! positional argument, a mapping becomes named arguments.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::InputError;
use crate::tool::{JsonMap, ToolInput};

/// The kind of value a schema field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl FieldKind {
    fn json_type(&self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Text => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }

    /// Coerce a raw text payload into this kind.
    fn coerce_text(&self, text: &str) -> Option<Value> {
        match self {
            Self::Text => Some(Value::String(text.to_string())),
            Self::Integer => text.parse::<i64>().ok().map(Value::from),
            Self::Number => text.parse::<f64>().ok().map(Value::from),
            Self::Boolean => text.parse::<bool>().ok().map(Value::from),
            Self::Object | Self::Array => {
                let value: Value = serde_json::from_str(text).ok()?;
                self.matches(&value).then_some(value)
            }
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.json_type())
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One declared argument of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    /// Required fields must be present in a mapping payload. Defaults on.
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

fn default_required() -> bool {
    true
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: String::new(),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Ordered set of declared fields for a tool's input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgsSchema {
    fields: Vec<FieldSpec>,
}

impl ArgsSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, preserving declaration order. The first declared field
    /// is the one a raw text payload binds to.
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Validate a payload into handler arguments.
    ///
    /// Text payloads bind to the first declared field, coerced to its kind.
    /// Mapping payloads are checked field by field: required fields must be
    /// present, kinds must match, and undeclared fields are rejected.
    pub fn validate(&self, input: &ToolInput) -> Result<ToolArgs, InputError> {
        match input {
            ToolInput::Text(text) => self.validate_text(text),
            ToolInput::Args(map) => self.validate_map(map),
        }
    }

    fn validate_text(&self, text: &str) -> Result<ToolArgs, InputError> {
        let first = self.fields.first().ok_or(InputError::TextNotAccepted)?;
        let value = first.kind.coerce_text(text).ok_or_else(|| {
            InputError::KindMismatch {
                field: first.name.clone(),
                expected: first.kind,
                actual: "string".to_string(),
            }
        })?;
        if let Some(missing) = self.fields.iter().skip(1).find(|f| f.required) {
            return Err(InputError::MissingField {
                field: missing.name.clone(),
            });
        }
        let mut map = JsonMap::new();
        map.insert(first.name.clone(), value);
        Ok(ToolArgs::Named(map))
    }

    fn validate_map(&self, map: &JsonMap) -> Result<ToolArgs, InputError> {
        for field in &self.fields {
            match map.get(&field.name) {
                Some(value) => {
                    if !field.kind.matches(value) {
                        return Err(InputError::KindMismatch {
                            field: field.name.clone(),
                            expected: field.kind,
                            actual: kind_of(value).to_string(),
                        });
                    }
                }
                None if field.required => {
                    return Err(InputError::MissingField {
                        field: field.name.clone(),
                    });
                }
                None => {}
            }
        }
        if let Some(unknown) = map.keys().find(|k| !self.fields.iter().any(|f| &f.name == *k)) {
            return Err(InputError::UnknownField {
                field: unknown.clone(),
            });
        }
        Ok(ToolArgs::Named(map.clone()))
    }

    /// Render the schema as a JSON Schema object for agent-facing listings.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = JsonMap::new();
        let mut required = Vec::new();
        for field in &self.fields {
            let mut spec = JsonMap::new();
            spec.insert("type".into(), Value::String(field.kind.json_type().into()));
            if !field.description.is_empty() {
                spec.insert(
                    "description".into(),
                    Value::String(field.description.clone()),
                );
            }
            properties.insert(field.name.clone(), Value::Object(spec));
            if field.required {
                required.push(Value::String(field.name.clone()));
            }
        }
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Arguments as the handler receives them.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolArgs {
    /// A raw text payload, passed positionally (schema-less tools).
    Positional(String),
    /// Named arguments validated against the schema.
    Named(JsonMap),
}

impl ToolArgs {
    /// Default parse applied when the tool declares no schema.
    pub fn from_input(input: &ToolInput) -> Self {
        match input {
            ToolInput::Text(s) => Self::Positional(s.clone()),
            ToolInput::Args(map) => Self::Named(map.clone()),
        }
    }

    /// The positional text, if this call was made with raw text.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Positional(s) => Some(s),
            Self::Named(_) => None,
        }
    }

    /// Look up a named argument.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Positional(_) => None,
            Self::Named(map) => map.get(name),
        }
    }

    /// Named argument as a string slice.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Named argument as an integer.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    /// Named argument as a boolean.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// The positional text or the named field, whichever this call carries.
    ///
    /// Convenience for single-argument tools that accept both raw text and
    /// a one-field mapping.
    pub fn text_or(&self, field: &str) -> Option<&str> {
        self.text().or_else(|| self.get_str(field))
    }
}
