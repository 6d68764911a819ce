/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template rendering.
//!
//! Every condition aborts the current render. The only local recovery is
//! the `if`/`unless` condition, which treats a missing name as false; that
//! case never reaches this type (see [`crate::expr::Lookup`]).

use crate::value::ValueKind;
use thiserror::Error;

/// Errors that can occur while rendering a template.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The input at `offset` is not a valid expression or marker.
    #[error("Malformed expression at offset {offset}: {message}")]
    MalformedExpression { offset: usize, message: String },

    /// A value was used as the wrong variant.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: ValueKind,
        found: ValueKind,
    },

    /// A name is not bound in the scope.
    #[error("Unknown name: {name}")]
    UnknownName { name: String },

    /// A dotted path named a field the mapping does not have.
    #[error("Unknown field '{field}' in '{path}'")]
    UnknownField { path: String, field: String },

    /// No filter is registered under this name.
    #[error("Unknown filter: {name}")]
    UnknownFilter { name: String },

    /// No directive is registered under this name.
    #[error("Unknown directive: {name}")]
    UnknownDirective { name: String },

    /// Mappings and sequences cannot be written to the output directly.
    #[error("Cannot interpolate a {kind} value")]
    NotInterpolatable { kind: ValueKind },

    /// Block nesting exceeded the engine's limit.
    #[error("Block nesting deeper than {max_depth} levels")]
    NestingTooDeep { max_depth: usize },

    /// The template ended before a marker or block was closed.
    #[error("Unexpected end of template at offset {offset}: expected {expected}")]
    UnexpectedEnd { offset: usize, expected: String },

    /// The output sink rejected a write.
    #[error("Write error: {0}")]
    Write(#[from] std::fmt::Error),
}

impl RenderError {
    pub(crate) fn malformed(offset: usize, message: impl Into<String>) -> Self {
        RenderError::MalformedExpression {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn unexpected_end(offset: usize, expected: impl Into<String>) -> Self {
        RenderError::UnexpectedEnd {
            offset,
            expected: expected.into(),
        }
    }
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;
