/*
 * interpreter.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Single-pass streaming interpreter.
//!
//! The template is read as alternating literal runs and markers:
//!
//! - `{{ expr | filter | ... }}` interpolates a text or number value
//! - `{% name ... %}` dispatches to a registered directive
//!
//! There is no parse tree. Every traversal happens in one of two modes:
//!
//! - **emit**: literal runs are written to the sink and markers are evaluated
//! - **skip**: literal runs and markers are consumed and discarded, but block
//!   directives are still tracked so that a nested `{% endif %}` does not end
//!   an enclosing block early
//!
//! Directives drive these traversals themselves through [`Interpreter::emit_until`]
//! and [`Interpreter::skip_until`].

use std::fmt;

use tracing::trace;

use crate::engine::Engine;
use crate::error::{RenderError, RenderResult};
use crate::expr::{expect_identifier, read_expression, read_identifier};
use crate::scope::Scope;
use crate::source::Source;

const INTERPOLATION_OPEN: &str = "{{";
const INTERPOLATION_CLOSE: &str = "}}";
const DIRECTIVE_OPEN: &str = "{%";
const DIRECTIVE_CLOSE: &str = "%}";

/// Byte length of the literal run at the start of `text`.
fn literal_len(text: &str) -> usize {
    text.match_indices('{')
        .map(|(index, _)| index)
        .find(|&index| matches!(text.as_bytes().get(index + 1), Some(b'{' | b'%')))
        .unwrap_or(text.len())
}

/// Interpreter state for one render call.
///
/// Directive handlers receive the interpreter and use it to read their
/// arguments from [`Interpreter::source`] and to traverse their bodies.
pub struct Interpreter<'e, 's> {
    engine: &'e Engine,
    source: Source<'s>,
    depth: usize,
}

impl<'e, 's> Interpreter<'e, 's> {
    pub fn new(engine: &'e Engine, text: &'s str) -> Self {
        Self {
            engine,
            source: Source::new(text),
            depth: 0,
        }
    }

    pub fn engine(&self) -> &'e Engine {
        self.engine
    }

    /// The template cursor, positioned just after whatever was last consumed.
    pub fn source(&mut self) -> &mut Source<'s> {
        &mut self.source
    }

    /// Current block nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Interpret the whole template in emit mode.
    pub fn run(&mut self, out: &mut dyn fmt::Write, scope: &mut Scope) -> RenderResult<()> {
        loop {
            self.emit_literal(out)?;
            if self.source.is_eof() {
                return Ok(());
            }
            self.process_marker(out, scope)?;
        }
    }

    /// Emit literal text and markers until a directive named in `terminators`
    /// is next. The terminator itself is not consumed.
    pub fn emit_until<'t>(
        &mut self,
        terminators: &[&'t str],
        out: &mut dyn fmt::Write,
        scope: &mut Scope,
    ) -> RenderResult<&'t str> {
        loop {
            self.emit_literal(out)?;
            if let Some(found) = self.next_terminator(terminators)? {
                return Ok(found);
            }
            self.process_marker(out, scope)?;
        }
    }

    /// Skip literal text and markers until a directive named in
    /// `terminators` is next. The terminator itself is not consumed.
    pub fn skip_until<'t>(&mut self, terminators: &[&'t str]) -> RenderResult<&'t str> {
        loop {
            self.skip_literal();
            if let Some(found) = self.next_terminator(terminators)? {
                return Ok(found);
            }
            self.skip_marker()?;
        }
    }

    /// Consume `{% name` for a directive already identified as next.
    pub fn open_directive(&mut self, name: &str) -> RenderResult<()> {
        let offset = self.source.offset();
        if !self.source.eat(DIRECTIVE_OPEN) || read_identifier(&mut self.source) != name {
            return Err(RenderError::malformed(
                offset,
                format!("expected {{% {} %}}", name),
            ));
        }
        Ok(())
    }

    /// Consume the closing `%}` of the current directive, then a single
    /// newline directly after it if there is one.
    pub fn finish_directive(&mut self) -> RenderResult<()> {
        self.source.skip_whitespace();
        if !self.source.eat(DIRECTIVE_CLOSE) {
            return Err(self.expected(DIRECTIVE_CLOSE));
        }
        self.source.eat("\n");
        Ok(())
    }

    /// Discard the rest of the current directive through its closing `%}`,
    /// without interpreting its arguments.
    pub fn skip_directive_rest(&mut self) -> RenderResult<()> {
        let offset = self.source.offset();
        if self.source.take_until(DIRECTIVE_CLOSE).is_none() {
            return Err(RenderError::unexpected_end(offset, DIRECTIVE_CLOSE));
        }
        self.source.eat(DIRECTIVE_CLOSE);
        self.source.eat("\n");
        Ok(())
    }

    fn expected(&self, what: &str) -> RenderError {
        if self.source.is_eof() {
            RenderError::unexpected_end(self.source.offset(), what)
        } else {
            RenderError::malformed(self.source.offset(), format!("expected '{}'", what))
        }
    }

    /// Check whether the next marker is one of `terminators`.
    ///
    /// Running out of input while looking for a terminator is an error.
    fn next_terminator<'t>(&self, terminators: &[&'t str]) -> RenderResult<Option<&'t str>> {
        if self.source.is_eof() {
            return Err(RenderError::unexpected_end(
                self.source.offset(),
                terminators
                    .iter()
                    .map(|t| format!("{{% {} %}}", t))
                    .collect::<Vec<_>>()
                    .join(" or "),
            ));
        }

        let mut probe = self.source.clone();
        if !probe.eat(DIRECTIVE_OPEN) {
            return Ok(None);
        }
        let name = read_identifier(&mut probe);
        Ok(terminators.iter().copied().find(|t| *t == name))
    }

    fn enter_block(&mut self) -> RenderResult<()> {
        let max_depth = self.engine.max_depth();
        if self.depth >= max_depth {
            return Err(RenderError::NestingTooDeep { max_depth });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave_block(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn emit_literal(&mut self, out: &mut dyn fmt::Write) -> RenderResult<()> {
        let len = literal_len(self.source.rest());
        out.write_str(self.source.take(len))?;
        Ok(())
    }

    fn skip_literal(&mut self) {
        let len = literal_len(self.source.rest());
        self.source.take(len);
    }

    fn process_marker(&mut self, out: &mut dyn fmt::Write, scope: &mut Scope) -> RenderResult<()> {
        if self.source.eat(INTERPOLATION_OPEN) {
            self.interpolate(out, scope)
        } else if self.source.eat(DIRECTIVE_OPEN) {
            self.dispatch_directive(out, scope)
        } else {
            Err(self.expected("a marker"))
        }
    }

    /// `{{ expr | filter ... }}`, after the opening braces.
    fn interpolate(&mut self, out: &mut dyn fmt::Write, scope: &Scope) -> RenderResult<()> {
        let mut text = read_expression(&mut self.source, scope)?.to_output()?;

        loop {
            self.source.skip_whitespace();
            if !self.source.eat("|") {
                break;
            }
            let name = expect_identifier(&mut self.source, "a filter name")?;
            let filter = self
                .engine
                .filter(name)
                .ok_or_else(|| RenderError::UnknownFilter {
                    name: name.to_string(),
                })?;
            text = filter(&text, scope);
        }

        if !self.source.eat(INTERPOLATION_CLOSE) {
            return Err(self.expected(INTERPOLATION_CLOSE));
        }
        out.write_str(&text)?;
        Ok(())
    }

    /// `{% name ... %}`, after the opening `{%`.
    fn dispatch_directive(
        &mut self,
        out: &mut dyn fmt::Write,
        scope: &mut Scope,
    ) -> RenderResult<()> {
        let name = expect_identifier(&mut self.source, "a directive name")?;
        let engine = self.engine;
        let directive = engine
            .directive(name)
            .ok_or_else(|| RenderError::UnknownDirective {
                name: name.to_string(),
            })?;

        trace!(directive = name, depth = self.depth, "dispatching directive");
        if !directive.is_block() {
            return directive.call(self, out, scope);
        }

        self.enter_block()?;
        let result = directive.call(self, out, scope);
        self.leave_block();
        result
    }

    fn skip_marker(&mut self) -> RenderResult<()> {
        let offset = self.source.offset();

        if self.source.eat(INTERPOLATION_OPEN) {
            if self.source.take_until(INTERPOLATION_CLOSE).is_none() {
                return Err(RenderError::unexpected_end(offset, INTERPOLATION_CLOSE));
            }
            self.source.eat(INTERPOLATION_CLOSE);
            return Ok(());
        }

        if !self.source.eat(DIRECTIVE_OPEN) {
            return Err(self.expected("a marker"));
        }

        let name = read_identifier(&mut self.source);
        self.skip_directive_rest()?;
        if self.engine.is_block(name) {
            self.skip_block(name)?;
        }
        Ok(())
    }

    /// Discard a block body through its `{% end<name> %}` marker, whose own
    /// opening marker has already been consumed.
    fn skip_block(&mut self, name: &str) -> RenderResult<()> {
        self.enter_block()?;
        trace!(block = name, depth = self.depth, "skipping block");

        let end = format!("end{}", name);
        self.skip_until(&[end.as_str()])?;
        self.open_directive(&end)?;
        self.finish_directive()?;

        self.leave_block();
        Ok(())
    }
}
