/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Koura: a small streaming template engine.
//!
//! Templates mix literal text with two kinds of markers:
//!
//! - Interpolation: `{{ name }}`, `{{ person.name }}`, `{{ name | capitalize }}`
//! - Directives: `{% if cond %}...{% elseif cond %}...{% else %}...{% endif %}`,
//!   `{% unless cond %}...{% endunless %}`, `{% for x in xs %}...{% endfor %}`,
//!   `{% set name expr %}`
//!
//! # Architecture
//!
//! There is no parse tree. The [`Interpreter`] tokenizes, parses and evaluates
//! in a single forward pass over the template text. Branches that are not
//! taken are consumed in a *skip* mode that still tracks nested blocks, and
//! loop bodies are re-read from a saved [`Position`] once per element.
//!
//! Values live in a [`Scope`] supplied by the caller. Each loop iteration
//! works on its own copy of the scope, so a `set` inside a loop body is
//! invisible outside that iteration.
//!
//! # Example
//!
//! ```
//! use koura::{Engine, Scope, Value};
//!
//! let engine = Engine::new();
//!
//! let mut scope = Scope::new();
//! scope.insert("what", "world");
//! scope.insert("names", Value::Sequence(vec!["alice".into(), "bob".into()]));
//!
//! let output = engine
//!     .render_to_string(
//!         "Hello {{what|capitalize}}\n{% for name in names %}- {{name}}\n{% endfor %}",
//!         &mut scope,
//!     )
//!     .unwrap();
//! assert_eq!(output, "Hello WORLD\n- alice\n- bob\n");
//! ```

pub mod directives;
pub mod engine;
pub mod error;
pub mod expr;
pub mod filters;
pub mod interpreter;
pub mod json;
pub mod scope;
pub mod source;
pub mod value;

// Re-export main types at crate root
pub use engine::{DEFAULT_MAX_DEPTH, Directive, DirectiveFn, Engine, FilterFn};
pub use error::{RenderError, RenderResult};
pub use expr::{Binding, Lookup};
pub use interpreter::Interpreter;
pub use json::ConversionError;
pub use scope::Scope;
pub use source::{Position, Source};
pub use value::{Number, Value, ValueKind};
