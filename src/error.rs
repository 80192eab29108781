//! Structured error types for document parsing and runtime merges.

use crate::document::Format;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The document parses but does not have the shape a schema path needs.
    MalformedDocument,
    /// The version discriminator does not match any known adapter.
    UnsupportedVersion,
    /// An override fragment cannot be applied to a runtime entry.
    InvalidOverride,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedDocument => "malformed document",
            ErrorKind::UnsupportedVersion => "unsupported version",
            ErrorKind::InvalidOverride => "invalid override",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by the merge engine and engine adapters.
///
/// A merge that fails leaves the caller's document exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeError {
    pub kind: ErrorKind,
    pub message: String,
    /// Dotted path of the node that caused the failure, when known.
    pub path: Option<String>,
}

impl MergeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    // Convenience constructors

    pub fn malformed(path: impl fmt::Display, reason: &str) -> Self {
        let path = path.to_string();
        Self::new(ErrorKind::MalformedDocument, format!("{}: {}", path, reason)).with_path(path)
    }

    pub fn unsupported_version(engine: &str, version: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::UnsupportedVersion,
            format!("unsupported {} config version {}", engine, version),
        )
    }

    pub fn version_mismatch(engine: &str, expected: i64, found: i64) -> Self {
        Self::new(
            ErrorKind::UnsupportedVersion,
            format!(
                "{} config declares version {} but version {} was requested",
                engine, found, expected
            ),
        )
        .with_path("version")
    }

    pub fn invalid_override(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidOverride, reason)
    }

    pub fn is_malformed(&self) -> bool {
        self.kind == ErrorKind::MalformedDocument
    }
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for MergeError {}

/// Result type for merge operations.
pub type MergeResult<T> = std::result::Result<T, MergeError>;

/// Input bytes are not well-formed in the declared format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{format} parse error{}: {message}", location_hint(.line, .column))]
pub struct ParseError {
    pub format: Format,
    pub message: String,
    /// 1-based line of the failure, when the parser reports one.
    pub line: Option<usize>,
    /// 1-based column of the failure, when the parser reports one.
    pub column: Option<usize>,
}

impl ParseError {
    pub fn new(format: Format, message: impl Into<String>) -> Self {
        Self {
            format,
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Attach a location computed from a byte offset into `input`.
    pub fn at_offset(self, input: &str, offset: usize) -> Self {
        let (line, column) = line_column(input, offset);
        self.at(line, column)
    }
}

fn location_hint(line: &Option<usize>, column: &Option<usize>) -> String {
    match (*line, *column) {
        (Some(line), Some(column)) => format!(" at line {}, column {}", line, column),
        (Some(line), None) => format!(" at line {}", line),
        _ => String::new(),
    }
}

/// Convert a byte offset into a 1-based (line, column) pair.
pub(crate) fn line_column(input: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(input.len());
    let before = &input.as_bytes()[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    (line, offset - line_start + 1)
}
