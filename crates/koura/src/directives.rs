/*
 * directives.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Built-in directives: `if`, `unless`, `for` and `set`.
//!
//! Each handler is called right after its name has been read and consumes
//! the rest of its own markers, through the closing `%}` of its terminator.

use std::fmt;

use tracing::trace;

use crate::error::{RenderError, RenderResult};
use crate::expr::{
    Lookup, expect_identifier, lookup_expression, read_binding, read_expression, read_identifier,
};
use crate::interpreter::Interpreter;
use crate::scope::Scope;

/// `{% if cond %} ... {% elseif cond %} ... {% else %} ... {% endif %}`
pub fn if_directive(
    interp: &mut Interpreter<'_, '_>,
    out: &mut dyn fmt::Write,
    scope: &mut Scope,
) -> RenderResult<()> {
    conditional(interp, out, scope, "endif", false)
}

/// `{% unless cond %} ... {% endunless %}`, the inverse of `if`.
///
/// Only the opening condition is inverted; `elseif` conditions read as in `if`.
pub fn unless_directive(
    interp: &mut Interpreter<'_, '_>,
    out: &mut dyn fmt::Write,
    scope: &mut Scope,
) -> RenderResult<()> {
    conditional(interp, out, scope, "endunless", true)
}

/// Evaluate a condition and close its marker.
///
/// An unbound name is false. Any other failure propagates.
fn read_condition(interp: &mut Interpreter<'_, '_>, scope: &Scope) -> RenderResult<bool> {
    let truthy = match lookup_expression(interp.source(), scope)? {
        Lookup::Found(value) => value.is_truthy(),
        Lookup::Missing(name) => {
            trace!(name = %name, "unbound name in condition is false");
            false
        }
    };
    interp.finish_directive()?;
    Ok(truthy)
}

fn conditional(
    interp: &mut Interpreter<'_, '_>,
    out: &mut dyn fmt::Write,
    scope: &mut Scope,
    end: &str,
    negate: bool,
) -> RenderResult<()> {
    let terminators = ["elseif", "else", end];
    let mut active = read_condition(interp, scope)? != negate;
    let mut taken = false;
    let mut seen_else = false;

    loop {
        let found = if active {
            taken = true;
            interp.emit_until(&terminators, out, scope)?
        } else {
            interp.skip_until(&terminators)?
        };
        let offset = interp.source().offset();
        interp.open_directive(found)?;

        if seen_else && found != end {
            return Err(RenderError::MalformedExpression {
                offset,
                message: format!("'{}' after 'else' in '{}' block", found, end),
            });
        }

        match found {
            "elseif" if taken => {
                interp.skip_directive_rest()?;
                active = false;
            }
            "elseif" => active = read_condition(interp, scope)?,
            "else" => {
                interp.finish_directive()?;
                seen_else = true;
                active = !taken;
            }
            _ => return interp.finish_directive(),
        }
    }
}

/// `{% for name in expr %} ... {% endfor %}`
///
/// The body is re-read from the source once per element, each time against
/// a fresh copy of the scope with `name` bound to the element.
pub fn for_directive(
    interp: &mut Interpreter<'_, '_>,
    out: &mut dyn fmt::Write,
    scope: &mut Scope,
) -> RenderResult<()> {
    let var = expect_identifier(interp.source(), "a loop variable")?;
    let offset = interp.source().offset();
    if read_identifier(interp.source()) != "in" {
        return Err(RenderError::MalformedExpression {
            offset,
            message: format!("expected 'in' after loop variable '{}'", var),
        });
    }
    let items = read_expression(interp.source(), scope)?
        .into_owned()
        .into_sequence()?;
    interp.finish_directive()?;

    let body = interp.source().position();
    if items.is_empty() {
        interp.skip_until(&["endfor"])?;
    }

    for (index, item) in items.into_iter().enumerate() {
        trace!(var, index, "loop iteration");
        interp.source().seek(body);
        let mut iteration_scope = scope.with_binding(var, item);
        interp.emit_until(&["endfor"], out, &mut iteration_scope)?;
    }

    interp.open_directive("endfor")?;
    interp.finish_directive()
}

/// `{% set target expr %}`
///
/// Replaces the value bound at `target` (a name or dotted path) in the
/// current scope. The new value must have the same variant as the old one.
pub fn set_directive(
    interp: &mut Interpreter<'_, '_>,
    _out: &mut dyn fmt::Write,
    scope: &mut Scope,
) -> RenderResult<()> {
    let path = read_binding(interp.source(), scope)?.found()?.path;
    let value = read_expression(interp.source(), scope)?.into_owned();
    interp.finish_directive()?;

    trace!(path = %path.join("."), "set");
    scope.resolve_mut(&path)?.replace(value)
}
