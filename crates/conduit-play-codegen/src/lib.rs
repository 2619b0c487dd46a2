//! Conduit playground code generator: lowers a parsed [`Program`] to host
//! script text.
//!
//! # Host script
//!
//! The output is a small JavaScript-flavored language that the sandbox
//! interprets directly:
//!
//! - `var` declarations are function-scoped
//! - functions are `function name(a, b = 1) { … }`
//! - classes are `class Name { constructor(…) { … } method(…) { … } }`, with
//!   the receiver bound through `var self = this;`
//! - route decorators become explicit registrar calls, e.g.
//!   `app.__register("get", "/", handler);`
//!
//! Framework classes, builtin renames and the registrar name come from an
//! injected [`GeneratorConfig`].
//!
//! [`Program`]: conduit_play_types::ast::Program

pub mod config;
pub mod error;
pub mod expr;
pub mod generator;
pub mod source_map;
pub mod stmt;

pub use config::GeneratorConfig;
pub use error::{CodegenError, CodegenResult};
pub use generator::{generate, generate_with_source_map};
pub use source_map::SourceMap;
