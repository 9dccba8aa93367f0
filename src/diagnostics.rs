//! Diagnostics
//!
//! Every problem found while interpreting a program becomes a [`Diagnostic`]
//! keyed by its physical line. Lexical, parse and classification errors
//! reject their line; semantic warnings annotate it.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::command::ClassifyError;
use crate::parser::{LexError, ParseError};

/// Any error that drops a line from the event stream
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum LineError {
    #[error(transparent)]
    Lexical(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Classification(#[from] ClassifyError),
}

/// A line that was dropped, with the reason
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("line {line}: {error}")]
pub struct RejectedLine {
    pub line: usize,
    pub error: LineError,
}

/// Non-fatal findings; the line is still interpreted
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum SemanticWarning {
    #[error("unrecognized code {code}")]
    UnrecognizedCode { code: String },
    #[error("axis words without an active motion mode")]
    NoActiveMotion,
    #[error("program ends without M2 or M30")]
    MissingProgramEnd,
    #[error("line follows the end of the program")]
    AfterProgramEnd,
    #[error("unexpected parameter '{letter}' for {code}")]
    UnexpectedParameter { letter: char, code: String },
    #[error("missing parameter '{name}' for {code}")]
    MissingParameter { name: String, code: String },
    #[error("{code}: {message}")]
    InvalidParameter { code: String, message: String },
    #[error("negative feed rate {value} ignored")]
    NegativeFeedRate { value: f64 },
    #[error("feed move with zero feed rate")]
    ZeroFeedRate,
    #[error("negative spindle speed {value} ignored")]
    NegativeSpindleSpeed { value: f64 },
    #[error("invalid tool number {value}")]
    InvalidToolNumber { value: f64 },
    #[error("dwell without a valid P time")]
    MissingDwellTime,
    #[error("G10 supports only the L2 form")]
    UnsupportedOffsetMode,
    #[error("invalid coordinate system slot")]
    InvalidOffsetSlot,
    #[error("arc without centre words")]
    ArcWithoutCenter,
    #[error("arc radius {radius} is too small for chord {chord}")]
    ArcRadiusTooSmall { radius: f64, chord: f64 },
    #[error("radius arc with coincident start and end points")]
    DegenerateArc,
}

/// Diagnostic category
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category", content = "detail", rename_all = "snake_case")]
pub enum ErrorKind {
    Lexical(LexError),
    Parse(ParseError),
    Classification(ClassifyError),
    Semantic(SemanticWarning),
}

impl From<LineError> for ErrorKind {
    fn from(error: LineError) -> Self {
        match error {
            LineError::Lexical(e) => ErrorKind::Lexical(e),
            LineError::Parse(e) => ErrorKind::Parse(e),
            LineError::Classification(e) => ErrorKind::Classification(e),
        }
    }
}

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// A diagnostic message for one line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub line: usize,
    pub severity: Severity,
    pub kind: ErrorKind,
    pub message: String,
}

impl Diagnostic {
    pub fn rejected(rejected: RejectedLine) -> Self {
        let message = rejected.error.to_string();
        Self {
            line: rejected.line,
            severity: Severity::Error,
            kind: rejected.error.into(),
            message,
        }
    }

    pub fn warning(line: usize, warning: SemanticWarning) -> Self {
        Self {
            line,
            severity: Severity::Warning,
            message: warning.to_string(),
            kind: ErrorKind::Semantic(warning),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.severity, self.message)
    }
}

/// Ordered diagnostics of one interpretation pass
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rejected(&mut self, rejected: RejectedLine) {
        self.diagnostics.push(Diagnostic::rejected(rejected));
    }

    pub fn push_warning(&mut self, line: usize, warning: SemanticWarning) {
        self.diagnostics.push(Diagnostic::warning(line, warning));
    }

    /// No line was rejected; warnings are allowed
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
