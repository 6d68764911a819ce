/*
 * engine.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The rendering engine.
//!
//! An [`Engine`] owns the directive and filter registries. There is no compile
//! step: every call to [`Engine::render`] interprets the template text from
//! the start.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::directives;
use crate::error::RenderResult;
use crate::filters;
use crate::interpreter::Interpreter;
use crate::scope::Scope;

/// Default maximum block nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// The type of a directive handler.
///
/// A handler is called after the directive name has been read. It must
/// consume the rest of its marker (see [`Interpreter::finish_directive`])
/// and, for block directives, everything through `{% end<name> %}`.
pub type DirectiveFn =
    dyn Fn(&mut Interpreter<'_, '_>, &mut dyn fmt::Write, &mut Scope) -> RenderResult<()>;

/// The type of a text filter.
pub type FilterFn = dyn Fn(&str, &Scope) -> String;

/// A registered directive.
pub struct Directive {
    handler: Box<DirectiveFn>,
    block: bool,
}

impl Directive {
    /// Whether this directive has a body ending at `{% end<name> %}`.
    pub fn is_block(&self) -> bool {
        self.block
    }

    pub fn call(
        &self,
        interp: &mut Interpreter<'_, '_>,
        out: &mut dyn fmt::Write,
        scope: &mut Scope,
    ) -> RenderResult<()> {
        (self.handler)(interp, out, scope)
    }
}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directive")
            .field("block", &self.block)
            .finish_non_exhaustive()
    }
}

/// The Koura rendering engine.
pub struct Engine {
    directives: HashMap<String, Directive>,
    filters: HashMap<String, Box<FilterFn>>,
    max_depth: usize,
}

impl Engine {
    /// Create an engine with the built-in directives and filters.
    pub fn new() -> Self {
        let mut engine = Self {
            directives: HashMap::new(),
            filters: HashMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        };

        engine
            .register_block_directive("if", directives::if_directive)
            .register_block_directive("unless", directives::unless_directive)
            .register_block_directive("for", directives::for_directive)
            .register_directive("set", directives::set_directive);

        engine
            .register_filter("capitalize", filters::capitalize)
            .register_filter("capitalise", filters::capitalize)
            .register_filter("lower", filters::lower)
            .register_filter("trim", filters::trim);

        engine
    }

    /// Set the maximum block nesting depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Register a text filter, replacing any filter of the same name.
    ///
    /// After a filter is registered it can be used like a built-in one:
    /// `engine.register_filter("shout", shout)` enables `{{ thing | shout }}`.
    pub fn register_filter<F>(&mut self, name: impl Into<String>, filter: F) -> &mut Self
    where
        F: Fn(&str, &Scope) -> String + 'static,
    {
        self.filters.insert(name.into(), Box::new(filter));
        self
    }

    /// Register a single-marker directive, replacing any of the same name.
    pub fn register_directive<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&mut Interpreter<'_, '_>, &mut dyn fmt::Write, &mut Scope) -> RenderResult<()>
            + 'static,
    {
        self.insert_directive(name.into(), Box::new(handler), false)
    }

    /// Register a block directive whose body ends at `{% end<name> %}`,
    /// replacing any directive of the same name.
    pub fn register_block_directive<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&mut Interpreter<'_, '_>, &mut dyn fmt::Write, &mut Scope) -> RenderResult<()>
            + 'static,
    {
        self.insert_directive(name.into(), Box::new(handler), true)
    }

    fn insert_directive(
        &mut self,
        name: String,
        handler: Box<DirectiveFn>,
        block: bool,
    ) -> &mut Self {
        self.directives.insert(name, Directive { handler, block });
        self
    }

    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.directives.get(name)
    }

    pub fn filter(&self, name: &str) -> Option<&FilterFn> {
        self.filters.get(name).map(|f| f.as_ref())
    }

    /// Whether `name` is a registered block directive.
    pub fn is_block(&self, name: &str) -> bool {
        self.directives.get(name).is_some_and(Directive::is_block)
    }

    /// Render the template `source` into `out` using `scope`.
    ///
    /// `set` directives write through to `scope`. On error, whatever was
    /// already written to `out` should be discarded.
    pub fn render(
        &self,
        source: &str,
        out: &mut dyn fmt::Write,
        scope: &mut Scope,
    ) -> RenderResult<()> {
        debug!(len = source.len(), bindings = scope.len(), "rendering template");
        Interpreter::new(self, source).run(out, scope)?;
        debug!("render finished");
        Ok(())
    }

    /// Render the template `source` to a new string.
    pub fn render_to_string(&self, source: &str, scope: &mut Scope) -> RenderResult<String> {
        let mut out = String::new();
        self.render(source, &mut out, scope)?;
        Ok(out)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut directives: Vec<&str> = self.directives.keys().map(String::as_str).collect();
        directives.sort_unstable();
        let mut filters: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        filters.sort_unstable();

        f.debug_struct("Engine")
            .field("directives", &directives)
            .field("filters", &filters)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::expr::read_expression;

    #[test]
    fn test_builtins_registered() {
        let engine = Engine::new();
        assert!(engine.is_block("if"));
        assert!(engine.is_block("unless"));
        assert!(engine.is_block("for"));
        assert!(!engine.is_block("set"));
        assert!(engine.directive("set").is_some());
        assert!(engine.filter("capitalize").is_some());
        assert!(engine.filter("capitalise").is_some());
        assert_eq!(engine.max_depth(), DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_custom_filter() {
        let mut engine = Engine::new();
        engine.register_filter("change_to_cheese", |_: &str, _: &Scope| "cheese".to_string());

        let mut scope = Scope::new();
        scope.insert("what", "world");
        let out = engine
            .render_to_string("Hello {{what|change_to_cheese}}", &mut scope)
            .unwrap();
        assert_eq!(out, "Hello cheese");
    }

    #[test]
    fn test_filter_overrides_builtin() {
        let mut engine = Engine::new();
        engine.register_filter("capitalize", |text: &str, _: &Scope| format!("<{}>", text));

        let mut scope = Scope::new();
        scope.insert("what", "world");
        let out = engine.render_to_string("{{what|capitalize}}", &mut scope).unwrap();
        assert_eq!(out, "<world>");
    }

    #[test]
    fn test_unknown_filter() {
        let mut scope = Scope::new();
        scope.insert("what", "world");
        let err = Engine::new()
            .render_to_string("{{ what | shout }}", &mut scope)
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownFilter { name } if name == "shout"));
    }

    #[test]
    fn test_custom_inline_directive() {
        // {% repeat expr %} writes its argument twice
        let mut engine = Engine::new();
        engine.register_directive("repeat", |interp, out, scope| {
            let text = read_expression(interp.source(), scope)?.to_output()?;
            interp.finish_directive()?;
            out.write_str(&text)?;
            out.write_str(&text)?;
            Ok(())
        });

        let mut scope = Scope::new();
        scope.insert("word", "ab");
        let out = engine
            .render_to_string("{% repeat word %}\n!", &mut scope)
            .unwrap();
        assert_eq!(out, "abab!");
    }

    #[test]
    fn test_custom_block_directive() {
        // {% upper %}...{% endupper %} uppercases its body
        let mut engine = Engine::new();
        engine.register_block_directive("upper", |interp, out, scope| {
            interp.finish_directive()?;
            let mut body = String::new();
            interp.emit_until(&["endupper"], &mut body, scope)?;
            interp.open_directive("endupper")?;
            interp.finish_directive()?;
            out.write_str(&body.to_uppercase())?;
            Ok(())
        });

        let mut scope = Scope::new();
        scope.insert("name", "ana");
        let out = engine
            .render_to_string(
                "{% upper %}hi {{name}}{% endupper %}|{% if missing %}{% upper %}x{% endupper %}{% endif %}",
                &mut scope,
            )
            .unwrap();
        assert_eq!(out, "HI ANA|");
    }

    #[test]
    fn test_render_to_sink() {
        let mut scope = Scope::new();
        scope.insert("n", 7i64);
        let mut out = String::from("> ");
        Engine::new().render("n={{n}}", &mut out, &mut scope).unwrap();
        assert_eq!(out, "> n=7");
    }
}
