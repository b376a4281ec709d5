//! Zenv Error Handling
//!
//! Every failure the engine surfaces is a [`ZenvError`]: what went wrong
//! ([`ErrorKind`]), where it happened ([`SourceInfo`]) and how to help
//! ([`DiagnosticInfo`]). Errors render through `miette`, so the CLI shows the
//! offending dialect line with a pointer instead of a bare message.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use thiserror::Error;

// ============================================================================
// SOURCE CONTEXT - Error reporting infrastructure
// ============================================================================

/// Named source text that errors point into.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Create a source context from real file (or string) content.
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Create a fallback when real source is unavailable (file-system errors).
    pub fn fallback(context: &str) -> Self {
        Self {
            name: "fallback".to_string(),
            content: format!("# {}", context),
        }
    }

    /// Convert to NamedSource for use with miette error reporting
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }

    /// Byte span covering the non-blank part of the 1-based `line`.
    ///
    /// Falls back to an empty span at the end of the content when the line
    /// does not exist.
    pub fn line_span(&self, line: usize) -> SourceSpan {
        let mut offset = 0;
        for (index, raw) in self.content.split_inclusive('\n').enumerate() {
            if index + 1 == line {
                let text = raw.trim_end_matches(['\n', '\r']);
                let indent = text.len() - text.trim_start().len();
                let len = text.trim_end().len().saturating_sub(indent);
                return SourceSpan::from((offset + indent, len));
            }
            offset += raw.len();
        }
        SourceSpan::from((self.content.len(), 0))
    }

    /// The text of the 1-based `line`, without its line terminator.
    pub fn line_text(&self, line: usize) -> &str {
        self.content
            .lines()
            .nth(line.saturating_sub(1))
            .unwrap_or_default()
    }
}

impl Default for SourceContext {
    fn default() -> Self {
        Self::fallback("default context")
    }
}

// ============================================================================
// ERROR TYPES
// ============================================================================

/// The single error type: kind, location and diagnostics.
#[derive(Debug)]
pub struct ZenvError {
    /// What went wrong
    pub kind: ErrorKind,
    /// Where it happened
    pub source_info: SourceInfo,
    /// How to help
    pub diagnostic_info: DiagnosticInfo,
}

/// All error kinds. Syntax and target errors always carry the 1-based line
/// number and the offending dialect line; file-system errors carry the path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("syntax error (line {line}): {message}")]
    DialectSyntax {
        message: String,
        line: usize,
        text: String,
    },
    #[error("produced invalid target code (line {line}): {message}")]
    TargetParse {
        message: String,
        line: usize,
        text: String,
    },
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },
    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },
    #[error("I/O failure on {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The dialect source itself is invalid.
    Syntax,
    /// The engine produced text the target parser rejects.
    Target,
    /// Reading or writing files failed.
    FileSystem,
}

impl ErrorKind {
    /// Get the error category for callers choosing exit codes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DialectSyntax { .. } => ErrorCategory::Syntax,
            Self::TargetParse { .. } => ErrorCategory::Target,
            Self::FileNotFound { .. } | Self::NotADirectory { .. } | Self::Io { .. } => {
                ErrorCategory::FileSystem
            }
        }
    }

    /// Get error code suffix for diagnostic codes
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::DialectSyntax { .. } => "dialect_syntax",
            Self::TargetParse { .. } => "target_parse",
            Self::FileNotFound { .. } => "file_not_found",
            Self::NotADirectory { .. } => "not_a_directory",
            Self::Io { .. } => "io",
        }
    }
}

/// Context-specific source information
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub primary_span: SourceSpan,
    pub phase: String,
}

/// Diagnostic enhancement data
#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
}

impl ZenvError {
    /// Line number of a syntax or target error.
    pub fn line(&self) -> Option<usize> {
        match &self.kind {
            ErrorKind::DialectSyntax { line, .. } | ErrorKind::TargetParse { line, .. } => {
                Some(*line)
            }
            _ => None,
        }
    }

    /// Offending dialect line of a syntax or target error.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::DialectSyntax { text, .. } | ErrorKind::TargetParse { text, .. } => {
                Some(text)
            }
            _ => None,
        }
    }

    /// Offending path of a file-system error.
    pub fn path(&self) -> Option<&Path> {
        match &self.kind {
            ErrorKind::FileNotFound { path }
            | ErrorKind::NotADirectory { path }
            | ErrorKind::Io { path, .. } => Some(path),
            _ => None,
        }
    }

    /// The bare message without location prefix.
    pub fn message(&self) -> String {
        match &self.kind {
            ErrorKind::DialectSyntax { message, .. } | ErrorKind::TargetParse { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    pub fn file_not_found(path: &Path) -> Self {
        Self::unsourced(ErrorKind::FileNotFound {
            path: path.to_path_buf(),
        })
    }

    pub fn not_a_directory(path: &Path) -> Self {
        Self::unsourced(ErrorKind::NotADirectory {
            path: path.to_path_buf(),
        })
    }

    pub fn io(path: &Path, error: std::io::Error) -> Self {
        Self::unsourced(ErrorKind::Io {
            path: path.to_path_buf(),
            message: error.to_string(),
        })
    }

    /// Re-attach the error to a named source, e.g. once the batch driver
    /// knows which file the transpiled string came from.
    pub fn with_source(mut self, source: &SourceContext) -> Self {
        if let Some(line) = self.line() {
            self.source_info.primary_span = source.line_span(line);
        }
        self.source_info.source = source.to_named_source();
        self
    }

    fn unsourced(kind: ErrorKind) -> Self {
        let context = SourceContext::fallback("file-system");
        let error_code = format!("zenv::{}", kind.code_suffix());
        ZenvError {
            kind,
            source_info: SourceInfo {
                source: context.to_named_source(),
                primary_span: unspanned(),
                phase: "file-system".into(),
            },
            diagnostic_info: DiagnosticInfo {
                help: None,
                error_code,
            },
        }
    }

    fn primary_label(&self) -> String {
        match &self.kind {
            ErrorKind::DialectSyntax { .. } => "not valid Zenv".into(),
            ErrorKind::TargetParse { .. } => "translates to invalid Python".into(),
            ErrorKind::FileNotFound { .. } => "missing file".into(),
            ErrorKind::NotADirectory { .. } => "not a directory".into(),
            ErrorKind::Io { .. } => "I/O failure".into(),
        }
    }
}

impl std::error::Error for ZenvError {}

impl fmt::Display for ZenvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(text) = self.text() {
            write!(f, "\n--> {}", text)?;
        }
        Ok(())
    }
}

impl Diagnostic for ZenvError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        if self.line().is_none() {
            return None;
        }
        let labels = vec![LabeledSpan::new_with_span(
            Some(self.primary_label()),
            self.source_info.primary_span,
        )];
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        if self.line().is_none() {
            return None;
        }
        Some(&*self.source_info.source)
    }
}

// ============================================================================
// ERROR REPORTING
// ============================================================================

/// Context-aware error creation: each context knows its source and phase.
pub trait ErrorReporting {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> ZenvError;

    /// A dialect line that no rule accepts or that a rule rejects.
    fn dialect_syntax(&self, message: &str, line: usize, text: &str) -> ZenvError;

    /// Produced target text that does not parse.
    fn target_parse(&self, message: &str, line: usize, text: &str) -> ZenvError;
}

impl ErrorReporting for SourceContext {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> ZenvError {
        let error_code = format!("zenv::{}", kind.code_suffix());
        let help = match &kind {
            ErrorKind::DialectSyntax { message, .. } if message.contains("variable name") => {
                Some("identifiers must start with a letter or an underscore".to_string())
            }
            ErrorKind::DialectSyntax { .. } => {
                Some("run `zenv rules` to list the statement forms Zenv understands".to_string())
            }
            ErrorKind::TargetParse { .. } => Some(
                "the line transpiled but the result is not valid Python; \
                 pass-through lines must already be valid Python"
                    .to_string(),
            ),
            _ => None,
        };
        ZenvError {
            kind,
            source_info: SourceInfo {
                source: self.to_named_source(),
                primary_span: span,
                phase: self.name.clone(),
            },
            diagnostic_info: DiagnosticInfo { help, error_code },
        }
    }

    fn dialect_syntax(&self, message: &str, line: usize, text: &str) -> ZenvError {
        self.report(
            ErrorKind::DialectSyntax {
                message: message.into(),
                line,
                text: text.into(),
            },
            self.line_span(line),
        )
    }

    fn target_parse(&self, message: &str, line: usize, text: &str) -> ZenvError {
        self.report(
            ErrorKind::TargetParse {
                message: message.into(),
                line,
                text: text.into(),
            },
            self.line_span(line),
        )
    }
}

/// Creates a placeholder span for errors not tied to a source location.
pub fn unspanned() -> SourceSpan {
    SourceSpan::from(0..0)
}

/// Prints a ZenvError with full miette diagnostics
pub fn print_error(error: ZenvError) {
    use miette::Report;
    let report = Report::new(error);
    eprintln!("{report:?}");
}
