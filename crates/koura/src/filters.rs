/*
 * filters.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Built-in text filters.
//!
//! A filter takes the current text and the scope and returns new text. It
//! must not depend on anything but its arguments.

use crate::scope::Scope;

/// Uppercase every character: `{{ "world" | capitalize }}` renders `WORLD`.
pub fn capitalize(text: &str, _scope: &Scope) -> String {
    text.to_uppercase()
}

pub fn lower(text: &str, _scope: &Scope) -> String {
    text.to_lowercase()
}

/// Strip leading and trailing whitespace.
pub fn trim(text: &str, _scope: &Scope) -> String {
    text.trim().to_string()
}
