/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Building the render scope from command-line inputs.
//!
//! A scope starts from an optional JSON or YAML context file, then each
//! `-D KEY=VALUE` definition is bound on top of it.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use koura::{Scope, Value};

/// Load a context file into a scope.
///
/// Files ending in `.yaml` or `.yml` are read as YAML; anything else as JSON.
pub fn load_context_file(path: &Path) -> Result<Scope> {
    let text =
        fs::read_to_string(path).context(format!("Failed to read context file: {:?}", path))?;

    let is_yaml = path
        .extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml");

    let json: serde_json::Value = if is_yaml {
        serde_yaml::from_str(&text).context(format!("Invalid YAML in {:?}", path))?
    } else {
        serde_json::from_str(&text).context(format!("Invalid JSON in {:?}", path))?
    };

    Scope::try_from(json).context(format!("Unsupported context in {:?}", path))
}

/// Parse a `KEY=VALUE` definition.
///
/// A value made only of ASCII digits binds a Number; anything else binds Text.
pub fn parse_definition(definition: &str) -> Result<(String, Value)> {
    let Some((key, value)) = definition.split_once('=') else {
        bail!("Definition must have the form KEY=VALUE: {}", definition);
    };

    let key = key.trim();
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
        bail!("Invalid variable name in definition: {:?}", key);
    }

    let value = if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        match value.parse() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Text(value.to_string()),
        }
    } else {
        Value::Text(value.to_string())
    };

    Ok((key.to_string(), value))
}

/// Build the render scope from an optional context file and definitions.
pub fn build_scope(context_file: Option<&Path>, definitions: &[String]) -> Result<Scope> {
    let mut scope = match context_file {
        Some(path) => load_context_file(path)?,
        None => Scope::new(),
    };

    for definition in definitions {
        let (key, value) = parse_definition(definition)?;
        scope.insert(key, value);
    }

    Ok(scope)
}
