//! # Zenv
//!
//! A line-oriented transpiler from the Zenv scripting dialect to Python.
//!
//! ```text
//! Batch Driver -> Line Processor -> Rule Table -> Expression Converter
//!                                               -> Keyword Normalizer
//!              -> Validator (optional)
//! ```
//!
//! The [`Engine`] is built once and shared read-only; each transpilation owns
//! its own state. Output has exactly one line per input line.

pub mod batch;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod errors;
pub mod repl;
pub mod rules;
pub mod syntax;
pub mod validation;

use std::path::Path;

pub use batch::{BatchResult, FileFailure};
pub use config::Config;
pub use engine::{Engine, LineOutcome, Transpilation, TranspileStats, Transpiler};
pub use errors::{ErrorKind, ZenvError};
pub use rules::{Rule, RuleTable, RuleViolation};
pub use validation::Validator;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Transpiles a dialect string with the default engine.
pub fn transpile_string(source: &str) -> Result<String, ZenvError> {
    Engine::new().transpile(source)
}

/// Transpiles a file with the default engine, writing to `output` when given.
pub fn transpile_file(input: &Path, output: Option<&Path>) -> Result<String, ZenvError> {
    Engine::new().transpile_file(input, output)
}

/// Transpiles every dialect file in a directory with the default engine.
pub fn transpile_directory(
    input_dir: &Path,
    output_dir: Option<&Path>,
    recursive: bool,
) -> Result<BatchResult, ZenvError> {
    Engine::new().transpile_directory(input_dir, output_dir, recursive)
}

/// Transpiles `source` and checks that the result is valid Python.
pub fn validate(source: &str) -> Result<(), ZenvError> {
    Validator::new(&Engine::new()).validate(source)
}
