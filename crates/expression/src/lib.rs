#![warn(missing_docs)]

//! # Nebula Expression
//!
//! Expression language and template engine for Nebula workflows, compatible
//! with n8n-style `{{ }}` syntax: a recursive-descent parser, a tree-walking
//! evaluator with a builtin function library, and two consumers built on top
//! of it:
//!
//! - [`engine::ExpressionEngine::evaluate_bool`] — the grammar admitted for
//!   `condition` node routing (arithmetic, comparisons, boolean operators,
//!   `len`/membership builtins).
//! - [`resolver`] — dotted-path template substitution for node input fields,
//!   with a deliberately lenient contract: an unresolvable path leaves the
//!   `{{ }}` placeholder untouched rather than failing the node.
//!
//! [`template::Template`] is the richer, n8n-compatible template engine
//! (whitespace control, full expression grammar inside `{{ }}`); it is a
//! separate, stricter tool from [`resolver`] and is used where a node
//! explicitly opts into expression templates rather than plain field
//! substitution.

pub mod builtins;
pub mod context;
pub mod core;
pub mod engine;
pub mod error;
pub mod error_formatter;
pub mod eval;
pub mod parser;
pub mod resolver;
pub mod template;
pub mod value_utils;

pub use context::EvaluationContext;
pub use engine::ExpressionEngine;
pub use error::{ExpressionError, ExpressionResult};
pub use resolver::render_template;
pub use template::Template;
