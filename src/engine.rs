//! # Line Processor
//!
//! The [`Engine`] is an immutable value holding the rule table, the keyword
//! normalizer and the configuration. Every transpilation runs in a
//! [`Transpiler`] session that owns its [`TranspileState`]: the block-comment
//! mode, the current line number and the output produced so far.
//!
//! Each input line produces exactly one output line, so line numbers in the
//! dialect source and in the target text always agree.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    config::Config,
    errors::{ErrorReporting, SourceContext, ZenvError},
    rules::{Rule, RuleTable, RuleViolation, Translation},
    syntax::{
        scan::{find_outside_quotes, indentation},
        KeywordNormalizer,
    },
};

const OPEN_COMMENT: &str = "/*";
const CLOSE_COMMENT: &str = "*/";

/// Name used for sources that do not come from a file.
pub const STRING_SOURCE: &str = "<string>";

// ============================================================================
// ENGINE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Engine {
    rules: RuleTable,
    keywords: KeywordNormalizer,
    config: Config,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_rules(rules: RuleTable) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Starts an incremental session; block-comment state carries across
    /// calls to [`Transpiler::feed_line`].
    pub fn session(&self) -> Transpiler<'_> {
        self.session_named(STRING_SOURCE)
    }

    pub fn session_named(&self, name: &str) -> Transpiler<'_> {
        Transpiler {
            engine: self,
            name: name.to_string(),
            input: String::new(),
            state: TranspileState::default(),
        }
    }

    /// Transpiles a whole source string. Fails on the first line that cannot
    /// be classified.
    pub fn transpile(&self, source: &str) -> Result<String, ZenvError> {
        self.transpile_named(source, STRING_SOURCE)
    }

    pub fn transpile_named(&self, source: &str, name: &str) -> Result<String, ZenvError> {
        self.transpile_with_report_named(source, name)
            .map(|report| report.output)
    }

    /// Like [`Engine::transpile`], also recording how every line was handled.
    pub fn transpile_with_report(&self, source: &str) -> Result<Transpilation, ZenvError> {
        self.transpile_with_report_named(source, STRING_SOURCE)
    }

    pub fn transpile_with_report_named(
        &self,
        source: &str,
        name: &str,
    ) -> Result<Transpilation, ZenvError> {
        let mut session = self.session_named(name);
        for line in source.lines() {
            session
                .feed_line(line)
                .map_err(|e| e.with_source(&SourceContext::from_file(name, source)))?;
        }
        let report = session.finish();
        debug!(source = name, lines = report.outcomes.len(), "transpiled");
        Ok(report)
    }
}

// ============================================================================
// SESSION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineMode {
    #[default]
    Normal,
    InBlockComment,
}

/// How a single line was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "rule", rename_all = "kebab-case")]
pub enum LineOutcome {
    Blank,
    Comment,
    Rule(Rule),
    PassThrough,
}

/// Per-session mutable state. Never shared between sessions.
#[derive(Debug, Clone, Default)]
pub struct TranspileState {
    pub mode: LineMode,
    /// 1-based number of the last line fed.
    pub line_number: usize,
    /// Indentation width of the last code line.
    pub indentation: usize,
    pub output: Vec<String>,
    pub outcomes: Vec<LineOutcome>,
}

pub struct Transpiler<'e> {
    engine: &'e Engine,
    name: String,
    input: String,
    state: TranspileState,
}

impl<'e> Transpiler<'e> {
    pub fn state(&self) -> &TranspileState {
        &self.state
    }

    /// Output produced so far, one line per input line.
    pub fn output(&self) -> String {
        join_lines(&self.state.output)
    }

    /// Transpiles the next line of the source and returns its target line.
    pub fn feed_line(&mut self, raw: &str) -> Result<String, ZenvError> {
        let raw = raw.trim_end_matches(['\n', '\r']);
        self.state.line_number += 1;
        self.input.push_str(raw);
        self.input.push('\n');

        let (text, outcome) = self.process(raw).map_err(|violation| {
            SourceContext::from_file(self.name.as_str(), self.input.as_str()).dialect_syntax(
                &violation.message,
                self.state.line_number,
                raw,
            )
        })?;
        trace!(line = self.state.line_number, ?outcome, "line processed");
        self.state.output.push(text.clone());
        self.state.outcomes.push(outcome);
        Ok(text)
    }

    pub fn finish(self) -> Transpilation {
        Transpilation {
            output: join_lines(&self.state.output),
            outcomes: self.state.outcomes,
        }
    }

    fn process(&mut self, raw: &str) -> Result<(String, LineOutcome), RuleViolation> {
        let indent = indentation(raw);
        let line = raw.trim();

        if self.state.mode == LineMode::Normal {
            if line.is_empty() {
                return Ok((String::new(), LineOutcome::Blank));
            }
            if line.starts_with('#') {
                return Ok((format!("{indent}{line}"), LineOutcome::Comment));
            }
            if let Some(text) = line.strip_prefix("//") {
                return Ok((comment_line(indent, text), LineOutcome::Comment));
            }
        }

        let (pieces, mode) = split_block_comments(line, self.state.mode);
        let (code, trailing) = split_trailing_comment(&pieces.code);
        let result = if code.is_empty() {
            let text = match (pieces.comment.as_str(), trailing.trim_start()) {
                (comment, "") => comment_line(indent, comment),
                ("", hash) => format!("{indent}{hash}"),
                (comment, hash) => format!("{}  {hash}", comment_line(indent, comment)),
            };
            (text, LineOutcome::Comment)
        } else {
            let (text, outcome) = self.translate(indent, code)?;
            let text = if pieces.comment.is_empty() {
                format!("{indent}{text}{trailing}")
            } else {
                format!("{indent}{text}  # {}{trailing}", pieces.comment)
            };
            (text, outcome)
        };
        self.state.mode = mode;
        Ok(result)
    }

    fn translate(
        &mut self,
        indent: &str,
        code: &str,
    ) -> Result<(String, LineOutcome), RuleViolation> {
        self.state.indentation = indent.len();
        let keywords = &self.engine.keywords;
        let (text, outcome) = match self.engine.rules.translate(code)? {
            Translation::Rule(rule, text) => (keywords.normalize(&text), LineOutcome::Rule(rule)),
            Translation::PassThrough(text) => (keywords.normalize(&text), LineOutcome::PassThrough),
        };
        if find_outside_quotes(&text, "?").is_some() {
            return Err(RuleViolation::new(
                "incomplete conditional; expected `cond ? a : b`",
            ));
        }
        Ok((text, outcome))
    }
}

/// A line taken apart at its block-comment delimiters.
#[derive(Debug)]
struct LinePieces {
    /// Code outside block comments, joined with single spaces.
    code: String,
    /// Block-comment text, joined with single spaces.
    comment: String,
}

/// Walks the line alternating between code and block comments, starting in
/// `mode`, and returns the pieces with the mode at the end of the line. A
/// `/*` after a trailing `#` comment is part of that comment.
fn split_block_comments(line: &str, mode: LineMode) -> (LinePieces, LineMode) {
    let mut code = Vec::new();
    let mut comment = Vec::new();
    let mut mode = mode;
    let mut rest = line;
    loop {
        match mode {
            LineMode::InBlockComment => match rest.find(CLOSE_COMMENT) {
                Some(close) => {
                    comment.push(&rest[..close]);
                    rest = &rest[close + CLOSE_COMMENT.len()..];
                    mode = LineMode::Normal;
                }
                None => {
                    comment.push(rest);
                    break;
                }
            },
            LineMode::Normal => {
                let hash = find_outside_quotes(rest, "#");
                let open = find_outside_quotes(rest, OPEN_COMMENT)
                    .filter(|&open| hash.map_or(true, |hash| open < hash));
                match open {
                    Some(open) => {
                        code.push(&rest[..open]);
                        rest = &rest[open + OPEN_COMMENT.len()..];
                        mode = LineMode::InBlockComment;
                    }
                    None => {
                        code.push(rest);
                        break;
                    }
                }
            }
        }
    }
    let join = |parts: Vec<&str>| {
        parts
            .into_iter()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    };
    (
        LinePieces {
            code: join(code),
            comment: join(comment),
        },
        mode,
    )
}

fn comment_line(indent: &str, text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        format!("{indent}#")
    } else {
        format!("{indent}# {text}")
    }
}

/// Splits `x = 1  # note` into the code and the comment with its leading
/// spaces.
fn split_trailing_comment(line: &str) -> (&str, &str) {
    match find_outside_quotes(line, "#") {
        Some(idx) => {
            let code = line[..idx].trim_end();
            (code, &line[code.len()..])
        }
        None => (line, ""),
    }
}

fn join_lines(lines: &[String]) -> String {
    let mut out = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

// ============================================================================
// REPORTS
// ============================================================================

/// Output of a transpilation together with the per-line outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transpilation {
    pub output: String,
    pub outcomes: Vec<LineOutcome>,
}

impl Transpilation {
    pub fn stats(&self, source: &str) -> TranspileStats {
        let mut rule_hits = BTreeMap::new();
        let mut pass_through = 0;
        let mut comments = 0;
        for outcome in &self.outcomes {
            match outcome {
                LineOutcome::Rule(rule) => *rule_hits.entry(rule.name()).or_insert(0) += 1,
                LineOutcome::PassThrough => pass_through += 1,
                LineOutcome::Comment => comments += 1,
                LineOutcome::Blank => {}
            }
        }
        TranspileStats {
            source_lines: source.lines().count(),
            target_lines: self.output.lines().count(),
            source_bytes: source.len(),
            target_bytes: self.output.len(),
            rule_hits,
            pass_through,
            comments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranspileStats {
    pub source_lines: usize,
    pub target_lines: usize,
    pub source_bytes: usize,
    pub target_bytes: usize,
    pub rule_hits: BTreeMap<&'static str, usize>,
    pub pass_through: usize,
    pub comments: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transpile(source: &str) -> String {
        Engine::new().transpile(source).unwrap()
    }

    #[test]
    fn test_indentation_reapplied() {
        let source = "function f(x):\n    if x then:\n        return true\n    y ==> {1}\n";
        assert_eq!(
            transpile(source),
            "def f(x):\n    if x:\n        return True\n    y = [1]\n"
        );
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let source = "# keep\n\n// note\n   \nx ==> 1  # trailing true\n";
        assert_eq!(
            transpile(source),
            "# keep\n\n# note\n\nx = 1  # trailing true\n"
        );
    }

    #[test]
    fn test_block_comment_spanning_lines() {
        let source = "/* header\nx ==> 1\n{1, 2}\n*/\ny ==> 2\n";
        assert_eq!(
            transpile(source),
            "# header\n# x ==> 1\n# {1, 2}\n#\ny = 2\n"
        );
    }

    #[test]
    fn test_block_comment_on_one_line_with_code() {
        assert_eq!(
            transpile("x ==> {1} /* list */\n"),
            "x = [1]  # list\n"
        );
        assert_eq!(transpile("/* only */\n"), "# only\n");
    }

    #[test]
    fn test_open_delimiter_inside_hash_comment_is_text() {
        assert_eq!(
            transpile("x ==> 1  # see /* note\ny ==> 2\n"),
            "x = 1  # see /* note\ny = 2\n"
        );
    }

    #[test]
    fn test_several_block_comments_on_one_line() {
        assert_eq!(
            transpile("x ==> 1 /* a */ /* b */\n"),
            "x = 1  # a b\n"
        );
        assert_eq!(
            transpile("/* a\nb */ y ==> 1 /* c\nz\n*/\n"),
            "# a\ny = 1  # b c\n# z\n#\n"
        );
        assert_eq!(transpile("/* a */ # b\n"), "# a  # b\n");
    }

    #[test]
    fn test_rejected_line_does_not_open_block_comment() {
        let engine = Engine::new();
        let mut session = engine.session();
        assert!(session.feed_line("x ==> /* c").is_err());
        assert_eq!(session.state().mode, LineMode::Normal);
        assert_eq!(session.feed_line("y ==> 2").unwrap(), "y = 2");
    }

    #[test]
    fn test_incomplete_conditional_is_rejected() {
        let err = Engine::new().transpile("x ==> a ? 1\n").unwrap_err();
        assert!(err.message().starts_with("incomplete conditional"));
        assert_eq!(transpile("x ==> f(a ? 1 : 2)\n"), "x = f(1 if a else 2)\n");
    }

    #[test]
    fn test_unterminated_block_comment_runs_to_end() {
        assert_eq!(transpile("/*\n42lol\n"), "#\n# 42lol\n");
    }

    #[test]
    fn test_lone_close_delimiter_is_not_special() {
        let err = Engine::new().transpile("*/\n").unwrap_err();
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn test_error_carries_line_and_text() {
        let err = Engine::new()
            .transpile("x ==> 1\n  42lol ==> 2\n")
            .unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert_eq!(err.text(), Some("  42lol ==> 2"));
        assert_eq!(err.message(), "invalid variable name '42lol'");
    }

    #[test]
    fn test_session_carries_block_comment_state() {
        let engine = Engine::new();
        let mut session = engine.session();
        assert_eq!(session.feed_line("/* start").unwrap(), "# start");
        assert_eq!(session.state().mode, LineMode::InBlockComment);
        assert_eq!(session.feed_line("x ==> 1").unwrap(), "# x ==> 1");
        assert_eq!(session.feed_line("end */ y ==> 2").unwrap(), "y = 2  # end");
        assert_eq!(session.state().mode, LineMode::Normal);
        assert_eq!(session.output(), "# start\n# x ==> 1\ny = 2  # end\n");
    }

    #[test]
    fn test_report_outcomes_and_stats() {
        let source = "x ==> 1\n\n# c\npass\nzncv.[(x)]\n";
        let report = Engine::new().transpile_with_report(source).unwrap();
        assert_eq!(
            report.outcomes,
            vec![
                LineOutcome::Rule(Rule::Assignment),
                LineOutcome::Blank,
                LineOutcome::Comment,
                LineOutcome::PassThrough,
                LineOutcome::Rule(Rule::Print),
            ]
        );
        let stats = report.stats(source);
        assert_eq!(stats.source_lines, 5);
        assert_eq!(stats.target_lines, 5);
        assert_eq!(stats.rule_hits.get("assignment"), Some(&1));
        assert_eq!(stats.pass_through, 1);
        assert_eq!(stats.comments, 1);
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(transpile(""), "");
    }

    #[test]
    fn test_keywords_normalized_on_pass_through() {
        assert_eq!(transpile("assert flag == true\n"), "assert flag == True\n");
    }
}
