//! # Validator
//!
//! Parses produced target text with a real Python parser. A parse failure is
//! reported as a `TargetParse` error on the dialect line that produced the
//! offending target line (lines correspond one-to-one).

use rustpython_parser::{ast, Parse};
use tracing::debug;

use crate::{
    engine::{Engine, STRING_SOURCE},
    errors::{ErrorReporting, SourceContext, ZenvError},
};

pub struct Validator<'e> {
    engine: &'e Engine,
}

impl<'e> Validator<'e> {
    pub fn new(engine: &'e Engine) -> Self {
        Self { engine }
    }

    /// Transpiles `source` and checks that the result parses.
    pub fn validate(&self, source: &str) -> Result<(), ZenvError> {
        self.validate_named(source, STRING_SOURCE).map(|_| ())
    }

    /// Like [`Validator::validate`], returning the target text on success.
    pub fn validate_named(&self, source: &str, name: &str) -> Result<String, ZenvError> {
        let target = self.engine.transpile_named(source, name)?;
        check_target(&target, &SourceContext::from_file(name, source))?;
        Ok(target)
    }

    /// Checks already-produced target text. Errors point into the target.
    pub fn check_target(&self, target: &str) -> Result<(), ZenvError> {
        check_target(target, &SourceContext::from_file(STRING_SOURCE, target))
    }
}

/// Parses `target`; on failure reports against `source`, the dialect text
/// `target` was produced from.
pub fn check_target(target: &str, source: &SourceContext) -> Result<(), ZenvError> {
    match ast::Suite::parse(target, &source.name) {
        Ok(suite) => {
            debug!(source = %source.name, statements = suite.len(), "target parsed");
            Ok(())
        }
        Err(err) => {
            let line = line_at_offset(target, u32::from(err.offset) as usize);
            let produced = target.lines().nth(line - 1).unwrap_or_default().trim();
            let message = if produced.is_empty() {
                err.error.to_string()
            } else {
                format!("{} in `{}`", err.error, produced)
            };
            Err(source.target_parse(&message, line, source.line_text(line)))
        }
    }
}

/// 1-based line holding the byte `offset`, clamped to the last line.
fn line_at_offset(text: &str, offset: usize) -> usize {
    let offset = offset.min(text.len());
    let line = text.as_bytes()[..offset]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1;
    line.min(text.lines().count().max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_program() {
        let engine = Engine::new();
        let validator = Validator::new(&engine);
        validator
            .validate("function f(x):\n    return x ? 1 : 0\nzncv.[(f(2))]\n")
            .unwrap();
    }

    #[test]
    fn test_dialect_error_surfaces_first() {
        let engine = Engine::new();
        let err = Validator::new(&engine).validate("42lol ==> 1\n").unwrap_err();
        assert!(err.to_string().starts_with("syntax error (line 1)"));
    }

    #[test]
    fn test_invalid_pass_through_reported_as_target_error() {
        let engine = Engine::new();
        let err = Validator::new(&engine)
            .validate("x ==> 1\nfoo(\n")
            .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("produced invalid target code"));
        assert!(err.line().is_some());
    }

    #[test]
    fn test_line_at_offset() {
        assert_eq!(line_at_offset("a\nb\nc\n", 0), 1);
        assert_eq!(line_at_offset("a\nb\nc\n", 2), 2);
        assert_eq!(line_at_offset("a\nb\nc\n", 6), 3);
        assert_eq!(line_at_offset("", 10), 1);
    }
}
