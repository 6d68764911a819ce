/*
 * expr.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Expression reader.
//!
//! Reads exactly one expression at the cursor, after skipping whitespace:
//!
//! - `'text'`: a text literal. There is no escape syntax, so a text literal
//!   cannot contain `'`.
//! - `123`: a number literal (maximal digit run).
//! - `name` or `name.field.field`: a path into the scope.
//!
//! Name lookups that fail on the *first* segment are reported as
//! [`Lookup::Missing`] rather than an error, so that conditionals can treat
//! unset names as false. The rest of such a path is still consumed. Everything
//! else is a [`RenderError`].

use std::borrow::Cow;

use crate::error::{RenderError, RenderResult};
use crate::scope::Scope;
use crate::source::Source;
use crate::value::{Value, ValueKind};

/// The outcome of resolving a name: found, or not bound at all.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    Missing(String),
}

impl<T> Lookup<T> {
    /// Turn a missing name into [`RenderError::UnknownName`].
    pub fn found(self) -> RenderResult<T> {
        match self {
            Lookup::Found(value) => Ok(value),
            Lookup::Missing(name) => Err(RenderError::UnknownName { name }),
        }
    }
}

/// A resolved path into the scope, with the value it names.
#[derive(Debug)]
pub struct Binding<'a> {
    pub path: Vec<String>,
    pub value: &'a Value,
}

pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Read an identifier after optional whitespace. May return an empty string.
pub fn read_identifier<'s>(source: &mut Source<'s>) -> &'s str {
    source.skip_whitespace();
    source.take_while(is_identifier_char)
}

/// Read an identifier, failing if there is none.
pub fn expect_identifier<'s>(source: &mut Source<'s>, what: &str) -> RenderResult<&'s str> {
    let name = read_identifier(source);
    if !name.is_empty() {
        return Ok(name);
    }
    if source.is_eof() {
        Err(RenderError::unexpected_end(source.offset(), what))
    } else {
        Err(RenderError::malformed(
            source.offset(),
            format!("expected {}", what),
        ))
    }
}

/// Read one expression, failing with `UnknownName` if it names an unbound variable.
pub fn read_expression<'a>(
    source: &mut Source<'_>,
    scope: &'a Scope,
) -> RenderResult<Cow<'a, Value>> {
    lookup_expression(source, scope)?.found()
}

/// Read one expression, reporting an unbound first name as [`Lookup::Missing`].
pub fn lookup_expression<'a>(
    source: &mut Source<'_>,
    scope: &'a Scope,
) -> RenderResult<Lookup<Cow<'a, Value>>> {
    source.skip_whitespace();
    let start = source.offset();

    match source.peek() {
        Some('\'') => {
            source.bump();
            let text = source
                .take_until("'")
                .ok_or_else(|| RenderError::unexpected_end(start, "closing quote"))?;
            source.bump();
            Ok(Lookup::Found(Cow::Owned(Value::Text(text.to_string()))))
        }
        Some(c) if c.is_ascii_digit() => {
            let digits = source.take_while(|c| c.is_ascii_digit());
            let number = digits
                .parse()
                .map_err(|_| RenderError::malformed(start, "number literal out of range"))?;
            Ok(Lookup::Found(Cow::Owned(Value::Number(number))))
        }
        Some(c) if is_identifier_char(c) => Ok(match read_binding(source, scope)? {
            Lookup::Found(binding) => Lookup::Found(Cow::Borrowed(binding.value)),
            Lookup::Missing(name) => Lookup::Missing(name),
        }),
        Some(c) => Err(RenderError::malformed(
            start,
            format!("unexpected '{}' where an expression was expected", c),
        )),
        None => Err(RenderError::unexpected_end(start, "an expression")),
    }
}

/// Resolve a name or dotted path to the binding it names.
///
/// Field access continues only while the value reached is a mapping. A `.`
/// after the first segment's text, number or sequence value is left
/// unconsumed; a `.` after a deeper non-mapping value is a type mismatch.
pub fn read_binding<'a>(
    source: &mut Source<'_>,
    scope: &'a Scope,
) -> RenderResult<Lookup<Binding<'a>>> {
    let name = expect_identifier(source, "a name")?;
    let Some(mut value) = scope.get(name) else {
        skip_fields(source)?;
        return Ok(Lookup::Missing(name.to_string()));
    };
    let mut path = vec![name.to_string()];

    loop {
        let mark = source.position();
        source.skip_whitespace();
        if !source.starts_with(".") {
            source.seek(mark);
            break;
        }

        match value {
            Value::Mapping(fields) => {
                source.bump();
                let field = expect_identifier(source, "a field name")?;
                value = fields
                    .get(field)
                    .ok_or_else(|| RenderError::UnknownField {
                        path: path.join("."),
                        field: field.to_string(),
                    })?;
                path.push(field.to_string());
            }
            other if path.len() > 1 => {
                return Err(RenderError::TypeMismatch {
                    expected: ValueKind::Mapping,
                    found: other.kind(),
                });
            }
            _ => {
                source.seek(mark);
                break;
            }
        }
    }

    Ok(Lookup::Found(Binding { path, value }))
}

/// Consume the `.field` segments after an unbound name.
fn skip_fields(source: &mut Source<'_>) -> RenderResult<()> {
    loop {
        let mark = source.position();
        source.skip_whitespace();
        if !source.eat(".") {
            source.seek(mark);
            return Ok(());
        }
        expect_identifier(source, "a field name")?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn scope() -> Scope {
        let mut address = HashMap::new();
        address.insert("city".to_string(), Value::from("Lisbon"));
        let mut person = HashMap::new();
        person.insert("name".to_string(), Value::from("Ana"));
        person.insert("address".to_string(), Value::Mapping(address));

        let mut scope = Scope::new();
        scope.insert("person", Value::Mapping(person));
        scope.insert("title", "Dr");
        scope.insert("count", 3i64);
        scope.insert("items", Value::Sequence(vec![Value::from("a")]));
        scope
    }

    fn read(input: &str) -> RenderResult<Value> {
        let scope = scope();
        let mut source = Source::new(input);
        read_expression(&mut source, &scope).map(Cow::into_owned)
    }

    #[test]
    fn test_text_literal() {
        let scope = Scope::new();
        let mut source = Source::new("  'hello world' rest");
        let value = read_expression(&mut source, &scope).unwrap();
        assert_eq!(*value, Value::from("hello world"));
        assert_eq!(source.rest(), " rest");
    }

    #[test]
    fn test_unterminated_text_literal() {
        assert!(matches!(
            read("'never closed"),
            Err(RenderError::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn test_number_literal() {
        assert_eq!(read("42}}").unwrap(), Value::Number(42));
        assert!(matches!(
            read("99999999999999999999999"),
            Err(RenderError::MalformedExpression { .. })
        ));
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(read("title").unwrap(), Value::from("Dr"));
        assert_eq!(read("count").unwrap(), Value::Number(3));
    }

    #[test]
    fn test_dotted_path() {
        assert_eq!(read("person.name").unwrap(), Value::from("Ana"));
        assert_eq!(read("person.address.city").unwrap(), Value::from("Lisbon"));
        assert_eq!(read("person . name").unwrap(), Value::from("Ana"));
    }

    #[test]
    fn test_path_errors() {
        assert!(matches!(
            read("nobody"),
            Err(RenderError::UnknownName { name }) if name == "nobody"
        ));
        assert!(matches!(
            read("person.age"),
            Err(RenderError::UnknownField { field, .. }) if field == "age"
        ));
        assert!(matches!(
            read("person.name.first"),
            Err(RenderError::TypeMismatch {
                expected: ValueKind::Mapping,
                found: ValueKind::Text,
            })
        ));
    }

    #[test]
    fn test_top_level_scalar_stops_at_dot() {
        let scope = scope();
        let mut source = Source::new("title.x");
        let value = read_expression(&mut source, &scope).unwrap();
        assert_eq!(*value, Value::from("Dr"));
        assert_eq!(source.rest(), ".x");
    }

    #[test]
    fn test_missing_is_reported_not_raised() {
        let scope = Scope::new();
        let mut source = Source::new("missing %}");
        let lookup = lookup_expression(&mut source, &scope).unwrap();
        assert!(matches!(lookup, Lookup::Missing(name) if name == "missing"));
    }

    #[test]
    fn test_missing_consumes_whole_path() {
        let scope = Scope::new();
        let mut source = Source::new("user.profile . name %}");
        let lookup = lookup_expression(&mut source, &scope).unwrap();
        assert!(matches!(lookup, Lookup::Missing(name) if name == "user"));
        assert_eq!(source.rest(), " %}");

        let mut source = Source::new("user.%}");
        assert!(matches!(
            lookup_expression(&mut source, &scope),
            Err(RenderError::MalformedExpression { .. })
        ));
    }

    #[test]
    fn test_binding_path() {
        let scope = scope();
        let mut source = Source::new("person.address.city 'Porto'");
        let binding = read_binding(&mut source, &scope).unwrap().found().unwrap();
        assert_eq!(binding.path, vec!["person", "address", "city"]);
        assert_eq!(binding.value, &Value::from("Lisbon"));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            read("%}"),
            Err(RenderError::MalformedExpression { .. })
        ));
        assert!(matches!(read("   "), Err(RenderError::UnexpectedEnd { .. })));
    }
}
