//! # Rule Table
//!
//! The ordered set of statement rules. Each rule recognizes one statement
//! form and builds the target line for it. Order matters: the first rule
//! whose recognizer accepts a line wins, so more specific forms sit ahead of
//! the general ones (the assignment rule is last).
//!
//! A rule answers `Ok(None)` when the line is not its form, `Ok(Some(line))`
//! when it translated the line, and `Err(RuleViolation)` when the line is
//! clearly its form but malformed.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::syntax::scan::{is_ident_start, split_top_level};

lazy_static! {
    static ref ASSIGNABLE: Regex =
        Regex::new(r"^[A-Za-z_]\w*(?:\s*(?:\.\s*[A-Za-z_]\w*|\[[^\]]+\]))*$").expect("valid pattern");
}

mod control;
mod definitions;
mod imports;
mod statements;

/// Outcome of applying a single rule.
pub type RuleResult = Result<Option<String>, RuleViolation>;

/// A line that a rule recognized but could not translate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RuleViolation {
    pub message: String,
}

impl RuleViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// RULES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    Import,
    FunctionHeader,
    ClassHeader,
    ControlFlow,
    ExceptionHeader,
    ReturnYield,
    CollectionMutation,
    Print,
    Access,
    Assignment,
}

impl Rule {
    /// Every rule, in table order.
    pub const ALL: [Rule; 10] = [
        Rule::Import,
        Rule::FunctionHeader,
        Rule::ClassHeader,
        Rule::ControlFlow,
        Rule::ExceptionHeader,
        Rule::ReturnYield,
        Rule::CollectionMutation,
        Rule::Print,
        Rule::Access,
        Rule::Assignment,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Rule::Import => "import",
            Rule::FunctionHeader => "function-header",
            Rule::ClassHeader => "class-header",
            Rule::ControlFlow => "control-flow",
            Rule::ExceptionHeader => "exception-header",
            Rule::ReturnYield => "return-yield",
            Rule::CollectionMutation => "collection-mutation",
            Rule::Print => "print",
            Rule::Access => "access",
            Rule::Assignment => "assignment",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Rule::Import => "module imports, optionally aliased",
            Rule::FunctionHeader => "function definitions; a leading `this` parameter becomes `self`",
            Rule::ClassHeader => "class definitions with a single `extends` parent",
            Rule::ControlFlow => "if / else if / else / for / while headers, optional then/do",
            Rule::ExceptionHeader => "try / catch / finally headers and throw",
            Rule::ReturnYield => "return, yield and yield from",
            Rule::CollectionMutation => "`name:method[(args)]` calls on collections",
            Rule::Print => "print statements",
            Rule::Access => "`a~b` attribute and `x{{i}}` subscript sugar",
            Rule::Assignment => "`==>` assignment, chained and tuple targets, let/var/const",
        }
    }

    /// One representative dialect line and its translation.
    pub fn example(self) -> (&'static str, &'static str) {
        match self {
            Rule::Import => ("zen[import os.path from as p]", "from os import path as p"),
            Rule::FunctionHeader => ("function area(this, r):", "def area(self, r):"),
            Rule::ClassHeader => ("class Dog extends Animal:", "class Dog(Animal):"),
            Rule::ControlFlow => ("else if n > 1 then:", "elif n > 1:"),
            Rule::ExceptionHeader => ("catch (ValueError err):", "except ValueError as err:"),
            Rule::ReturnYield => ("return a && b", "return a and b"),
            Rule::CollectionMutation => ("numbers:apend[(4)]", "numbers.append(4)"),
            Rule::Print => ("zncv.[('Hi $s' $name)]", "print(f'Hi {name}')"),
            Rule::Access => ("second~name ==> user~name", "second_name = user.name"),
            Rule::Assignment => ("a ==> b ==> {1, 2}", "a = b = [1, 2]"),
        }
    }

    /// Recognizes and translates a trimmed, comment-free line.
    pub fn apply(self, line: &str, table: &RuleTable) -> RuleResult {
        match self {
            Rule::Import => imports::import(line),
            Rule::FunctionHeader => definitions::function(line, table),
            Rule::ClassHeader => definitions::class(line, table),
            Rule::ControlFlow => control::control_flow(line, table),
            Rule::ExceptionHeader => control::exception(line, table),
            Rule::ReturnYield => statements::return_yield(line),
            Rule::CollectionMutation => statements::mutation(line),
            Rule::Print => statements::print(line),
            Rule::Access => statements::access(line),
            Rule::Assignment => statements::assignment(line),
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// TABLE
// ============================================================================

/// Result of translating one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    Rule(Rule, String),
    PassThrough(String),
}

impl Translation {
    pub fn text(&self) -> &str {
        match self {
            Translation::Rule(_, text) | Translation::PassThrough(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::from_rules(Rule::ALL.to_vec())
    }
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with a custom rule order, or a subset of the rules.
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Runs the rules in order; the first one that recognizes the line
    /// builds the result.
    pub fn match_and_build(&self, line: &str) -> Result<Option<(Rule, String)>, RuleViolation> {
        for &rule in &self.rules {
            if let Some(text) = rule.apply(line, self)? {
                return Ok(Some((rule, text)));
            }
        }
        Ok(None)
    }

    /// Translates a statement, falling back to pass-through for lines that
    /// look like target code.
    pub fn translate(&self, line: &str) -> Result<Translation, RuleViolation> {
        if let Some((rule, text)) = self.match_and_build(line)? {
            return Ok(Translation::Rule(rule, text));
        }
        pass_through(line).map(Translation::PassThrough)
    }

    /// Translates the statement that follows a header delimiter on the same
    /// line and joins it back.
    pub(crate) fn with_inline_body(&self, header: String, body: &str) -> RuleResult {
        let body = body.trim();
        if body.is_empty() {
            return Ok(Some(header));
        }
        let inner = self.translate(body)?;
        Ok(Some(format!("{header} {}", inner.text())))
    }
}

/// Checks a target list as found left of `=` or between `for` and `in`:
/// names, attributes, subscripts, starred names and nested tuples or lists of
/// those. Returns the first element that is not a target.
pub(crate) fn check_targets(raw: &str) -> Result<(), &str> {
    let parts = split_top_level(raw, ',');
    let last = parts.len() - 1;
    for (index, part) in parts.iter().enumerate() {
        let part = part.trim();
        if part.is_empty() && index == last && index > 0 {
            continue;
        }
        let unstarred = part.strip_prefix('*').map(str::trim).unwrap_or(part);
        let nested = unstarred
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .or_else(|| unstarred.strip_prefix('[').and_then(|r| r.strip_suffix(']')));
        let ok = match nested {
            Some(inner) => !inner.trim().is_empty() && check_targets(inner).is_ok(),
            None => ASSIGNABLE.is_match(unstarred),
        };
        if !ok {
            return Err(part);
        }
    }
    Ok(())
}

/// Lines no rule claimed are emitted unchanged when they start like target
/// code: an identifier, a decorator or a closing bracket.
fn pass_through(line: &str) -> Result<String, RuleViolation> {
    match line.chars().next() {
        None => Ok(String::new()),
        Some(c) if is_ident_start(c) || matches!(c, '@' | ')' | ']' | '}') => {
            Ok(line.to_string())
        }
        Some(_) => Err(RuleViolation::new("unknown or invalid statement")),
    }
}
