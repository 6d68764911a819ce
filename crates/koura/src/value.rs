/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template values.
//!
//! A [`Value`] is one of four variants. The variant is fixed at construction;
//! the checked accessors (`as_text`, `as_mapping`, ...) fail with
//! [`RenderError::TypeMismatch`] instead of reinterpreting the payload.
//!
//! Cloning a value deep-copies any nested mappings and sequences, so two
//! clones never share mutable structure.

use std::collections::HashMap;
use std::fmt;

use crate::error::{RenderError, RenderResult};

/// The integer type carried by [`Value::Number`].
pub type Number = i64;

/// A value that can be bound in a [`crate::Scope`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A text value.
    Text(String),

    /// A signed integer.
    Number(Number),

    /// Named fields. Iteration order is unspecified.
    Mapping(HashMap<String, Value>),

    /// An ordered list of values.
    Sequence(Vec<Value>),
}

/// The variant tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Number,
    Mapping,
    Sequence,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Text => "text",
            ValueKind::Number => "number",
            ValueKind::Mapping => "mapping",
            ValueKind::Sequence => "sequence",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Get the variant tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Text(_) => ValueKind::Text,
            Value::Number(_) => ValueKind::Number,
            Value::Mapping(_) => ValueKind::Mapping,
            Value::Sequence(_) => ValueKind::Sequence,
        }
    }

    /// Check if this value is "truthy" for conditional evaluation.
    ///
    /// - Text is truthy when non-empty
    /// - Number is truthy when non-zero
    /// - Mapping and Sequence are truthy when non-empty
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Text(s) => !s.is_empty(),
            Value::Number(n) => *n != 0,
            Value::Mapping(m) => !m.is_empty(),
            Value::Sequence(items) => !items.is_empty(),
        }
    }

    fn mismatch(&self, expected: ValueKind) -> RenderError {
        RenderError::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }

    pub fn as_text(&self) -> RenderResult<&str> {
        match self {
            Value::Text(s) => Ok(s),
            other => Err(other.mismatch(ValueKind::Text)),
        }
    }

    pub fn as_number(&self) -> RenderResult<Number> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(other.mismatch(ValueKind::Number)),
        }
    }

    pub fn as_mapping(&self) -> RenderResult<&HashMap<String, Value>> {
        match self {
            Value::Mapping(m) => Ok(m),
            other => Err(other.mismatch(ValueKind::Mapping)),
        }
    }

    pub fn as_mapping_mut(&mut self) -> RenderResult<&mut HashMap<String, Value>> {
        match self {
            Value::Mapping(m) => Ok(m),
            other => Err(other.mismatch(ValueKind::Mapping)),
        }
    }

    pub fn as_sequence(&self) -> RenderResult<&[Value]> {
        match self {
            Value::Sequence(items) => Ok(items),
            other => Err(other.mismatch(ValueKind::Sequence)),
        }
    }

    /// Take the elements out of a sequence value.
    pub fn into_sequence(self) -> RenderResult<Vec<Value>> {
        match self {
            Value::Sequence(items) => Ok(items),
            other => Err(other.mismatch(ValueKind::Sequence)),
        }
    }

    /// Replace this value with `other`, which must be of the same variant.
    ///
    /// This is the only mutation a template can perform (via `set`).
    pub fn replace(&mut self, other: Value) -> RenderResult<()> {
        if self.kind() != other.kind() {
            return Err(RenderError::TypeMismatch {
                expected: self.kind(),
                found: other.kind(),
            });
        }
        *self = other;
        Ok(())
    }

    /// Render a text or number value for output.
    pub fn to_output(&self) -> RenderResult<String> {
        match self {
            Value::Text(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(RenderError::NotInterpolatable { kind: other.kind() }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Mapping(m) => write!(f, "<mapping of {} fields>", m.len()),
            Value::Sequence(items) => write!(f, "<sequence of {} items>", items.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Sequence(value)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(value: HashMap<String, Value>) -> Self {
        Value::Mapping(value)
    }
}
