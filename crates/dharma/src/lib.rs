//! Dharma: a tree-walking interpreter for a small, dynamically-typed
//! scripting language with optional type annotations and an arbitrary-
//! precision numeric tower.

pub mod ast;
pub mod callable;
pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod environment;
pub mod instance;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod source_map;
pub mod token;
pub mod types;

pub use config::Config;
pub use diagnostics::{Diagnostic, DharmaError};
pub use driver::{run_source, Repl, RunOutcome};
