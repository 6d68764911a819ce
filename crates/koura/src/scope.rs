/*
 * scope.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Variable bindings for template rendering.
//!
//! A [`Scope`] is created by the caller, populated, and handed to
//! [`crate::Engine::render`]. Loops derive one child scope per iteration with
//! [`Scope::with_binding`]; the child is a deep copy, so writes made inside a
//! loop body never leak into the enclosing scope or into later iterations.

use indexmap::IndexMap;

use crate::error::{RenderError, RenderResult};
use crate::value::Value;

/// Name to value bindings, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    bindings: IndexMap<String, Value>,
}

impl Scope {
    /// Create a new empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key` to `value`, replacing any previous binding of `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.bindings.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.bindings.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.bindings.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.bindings.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterate over the bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Derive a child scope: a copy of this scope with one extra binding.
    pub fn with_binding(&self, key: impl Into<String>, value: Value) -> Scope {
        let mut child = self.clone();
        child.insert(key, value);
        child
    }

    /// Resolve a dotted path to the live binding it names.
    ///
    /// The first segment is looked up in the scope; every further segment is
    /// a field of the mapping reached so far.
    pub fn resolve_mut(&mut self, path: &[String]) -> RenderResult<&mut Value> {
        let Some((first, rest)) = path.split_first() else {
            return Err(RenderError::malformed(0, "empty binding path"));
        };

        let mut current = self
            .bindings
            .get_mut(first)
            .ok_or_else(|| RenderError::UnknownName {
                name: first.clone(),
            })?;

        for (index, field) in rest.iter().enumerate() {
            current = current
                .as_mapping_mut()?
                .get_mut(field)
                .ok_or_else(|| RenderError::UnknownField {
                    path: path[..=index].join("."),
                    field: field.clone(),
                })?;
        }

        Ok(current)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Scope {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut scope = Scope::new();
        for (key, value) in iter {
            scope.insert(key, value);
        }
        scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_insert_rebinds() {
        let mut scope = Scope::new();
        scope.insert("x", "first");
        scope.insert("x", "second");
        assert_eq!(scope.len(), 1);
        assert_eq!(scope.get("x"), Some(&Value::from("second")));
    }

    #[test]
    fn test_insertion_order() {
        let scope: Scope = [("b", 1i64), ("a", 2), ("c", 3)].into_iter().collect();
        let keys: Vec<&str> = scope.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_with_binding_isolates_child() {
        let mut parent = Scope::new();
        parent.insert("x", "parent_x");

        let mut child = parent.with_binding("y", Value::from("child_y"));
        child.get_mut("x").unwrap().replace(Value::from("changed")).unwrap();

        assert_eq!(child.get("y"), Some(&Value::from("child_y")));
        assert_eq!(child.get("x"), Some(&Value::from("changed")));
        // Parent unchanged
        assert_eq!(parent.get("x"), Some(&Value::from("parent_x")));
        assert!(!parent.contains("y"));
    }

    #[test]
    fn test_resolve_mut_nested() {
        let mut inner = HashMap::new();
        inner.insert("salary".to_string(), Value::Number(50_000));
        let mut scope = Scope::new();
        scope.insert("employee", Value::Mapping(inner));

        let path = vec!["employee".to_string(), "salary".to_string()];
        *scope.resolve_mut(&path).unwrap() = Value::Number(60_000);

        assert_eq!(
            scope.get("employee").unwrap().as_mapping().unwrap().get("salary"),
            Some(&Value::Number(60_000))
        );
    }

    #[test]
    fn test_resolve_mut_errors() {
        let mut scope = Scope::new();
        scope.insert("name", "text");

        let missing = vec!["nope".to_string()];
        assert!(matches!(
            scope.resolve_mut(&missing),
            Err(RenderError::UnknownName { .. })
        ));

        let through_text = vec!["name".to_string(), "field".to_string()];
        assert!(matches!(
            scope.resolve_mut(&through_text),
            Err(RenderError::TypeMismatch { .. })
        ));

        scope.insert("map", Value::Mapping(HashMap::new()));
        let absent_field = vec!["map".to_string(), "field".to_string()];
        assert!(matches!(
            scope.resolve_mut(&absent_field),
            Err(RenderError::UnknownField { .. })
        ));
    }
}
