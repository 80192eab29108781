//! Key paths into a configuration tree.

use std::fmt;
use std::str::FromStr;

/// A non-empty sequence of table keys.
///
/// Segments may contain dots (containerd plugin ids do), so the textual form
/// quotes such segments the way TOML does:
/// `plugins."io.containerd.grpc.v1.cri".containerd`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

/// Error returned when a dotted path string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyPathError {
    #[error("key path is empty")]
    Empty,
    #[error("key path {0:?} contains an empty segment")]
    EmptySegment(String),
    #[error("key path {0:?} has an unterminated quote")]
    UnterminatedQuote(String),
}

impl KeyPath {
    /// Build a path from segments. Returns `None` for an empty list.
    pub fn new<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Option<Self> {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            None
        } else {
            Some(Self { segments })
        }
    }

    /// Single-segment path.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            segments: vec![key.into()],
        }
    }

    /// Parse a dotted path with optional double-quoted segments. Inside
    /// quotes, `\"` and `\\` stand for a literal quote and backslash.
    pub fn parse(s: &str) -> Result<Self, KeyPathError> {
        if s.trim().is_empty() {
            return Err(KeyPathError::Empty);
        }

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut quoted = false;
        let mut was_quoted = false;
        let mut chars = s.chars();

        while let Some(c) = chars.next() {
            match c {
                '\\' if quoted => match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => return Err(KeyPathError::UnterminatedQuote(s.to_string())),
                },
                '"' => {
                    quoted = !quoted;
                    was_quoted = true;
                }
                '.' if !quoted => {
                    if current.is_empty() && !was_quoted {
                        return Err(KeyPathError::EmptySegment(s.to_string()));
                    }
                    segments.push(std::mem::take(&mut current));
                    was_quoted = false;
                }
                c => current.push(c),
            }
        }

        if quoted {
            return Err(KeyPathError::UnterminatedQuote(s.to_string()));
        }
        if current.is_empty() && !was_quoted {
            return Err(KeyPathError::EmptySegment(s.to_string()));
        }
        segments.push(current);

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false: a path has at least one segment.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment (the key written by a `set`).
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Extend the path with one more key.
    pub fn join(&self, key: impl Into<String>) -> KeyPath {
        let mut segments = self.segments.clone();
        segments.push(key.into());
        KeyPath { segments }
    }

    /// Render the first `n` segments, for error messages about a prefix.
    pub fn prefix_display(&self, n: usize) -> String {
        let n = n.clamp(1, self.segments.len());
        KeyPath {
            segments: self.segments[..n].to_vec(),
        }
        .to_string()
    }
}

impl FromStr for KeyPath {
    type Err = KeyPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyPath::parse(s)
    }
}

fn is_bare(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            if is_bare(segment) {
                f.write_str(segment)?;
            } else {
                f.write_str("\"")?;
                for c in segment.chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                f.write_str("\"")?;
            }
        }
        Ok(())
    }
}
