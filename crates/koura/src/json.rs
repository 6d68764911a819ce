/*
 * json.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Conversion from JSON documents to template values.
//!
//! - string → Text
//! - integer → Number
//! - boolean → Number (1 or 0)
//! - array → Sequence
//! - object → Mapping
//!
//! `null` and non-integral numbers have no template representation. Object
//! keys must be identifiers (ASCII letters and `_`), since templates could
//! never name any other key.

use std::collections::HashMap;

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::expr::is_identifier_char;
use crate::scope::Scope;
use crate::value::Value;

/// Errors converting JSON into template values.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("null is not a template value (at {path})")]
    Null { path: String },

    #[error("{number} is not an integer (at {path})")]
    NotAnInteger { number: String, path: String },

    #[error("the top level of a context must be an object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("key {key:?} is not a valid name (at {path})")]
    InvalidKey { key: String, path: String },
}

fn check_key(key: &str, path: &str) -> Result<(), ConversionError> {
    if !key.is_empty() && key.chars().all(is_identifier_char) {
        Ok(())
    } else {
        Err(ConversionError::InvalidKey {
            key: key.to_string(),
            path: path.to_string(),
        })
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn convert(json: JsonValue, path: &str) -> Result<Value, ConversionError> {
    Ok(match json {
        JsonValue::Null => {
            return Err(ConversionError::Null {
                path: path.to_string(),
            });
        }
        JsonValue::Bool(b) => Value::Number(i64::from(b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Number(i),
            None => {
                return Err(ConversionError::NotAnInteger {
                    number: n.to_string(),
                    path: path.to_string(),
                });
            }
        },
        JsonValue::String(s) => Value::Text(s),
        JsonValue::Array(items) => {
            let values: Result<Vec<_>, _> = items
                .into_iter()
                .enumerate()
                .map(|(i, item)| convert(item, &format!("{}[{}]", path, i)))
                .collect();
            Value::Sequence(values?)
        }
        JsonValue::Object(fields) => {
            let mut map = HashMap::new();
            for (key, item) in fields {
                check_key(&key, path)?;
                let value = convert(item, &format!("{}.{}", path, key))?;
                map.insert(key, value);
            }
            Value::Mapping(map)
        }
    })
}

impl TryFrom<JsonValue> for Value {
    type Error = ConversionError;

    fn try_from(json: JsonValue) -> Result<Self, Self::Error> {
        convert(json, "$")
    }
}

impl TryFrom<JsonValue> for Scope {
    type Error = ConversionError;

    /// Build a scope from a JSON object, one binding per top-level key.
    fn try_from(json: JsonValue) -> Result<Self, Self::Error> {
        let fields = match json {
            JsonValue::Object(fields) => fields,
            other => {
                return Err(ConversionError::NotAnObject {
                    found: json_kind(&other),
                });
            }
        };

        let mut scope = Scope::new();
        for (key, item) in fields {
            check_key(&key, "$")?;
            let value = convert(item, &key)?;
            scope.insert(key, value);
        }
        Ok(scope)
    }
}
