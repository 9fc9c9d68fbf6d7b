//! Error types for xmlharvest

use std::fmt;
use thiserror::Error;

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A path expression or relative XPath could not be compiled
    MalformedSelector { expression: String },
    /// The event source ended inside an open element
    TruncatedInput,
    /// The event source rejected the markup
    Syntax,
    /// The underlying reader failed
    Io,
    /// Too many descended frames were open at once
    MaxDepthExceeded { max: u16 },
    /// A captured fragment grew past the configured limit
    MaxSizeExceeded { max: usize },
    /// A captured fragment could not be reparsed into a tree
    FragmentParse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedSelector { expression } => {
                write!(f, "malformed selector: {expression:?}")
            }
            Self::TruncatedInput => write!(f, "truncated input"),
            Self::Syntax => write!(f, "syntax error"),
            Self::Io => write!(f, "i/o error"),
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
            Self::MaxSizeExceeded { max } => write!(f, "max fragment size exceeded: {max}"),
            Self::FragmentParse => write!(f, "fragment parse error"),
        }
    }
}

/// Main error type for xmlharvest
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    position: Option<u64>,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            position: None,
            message,
        }
    }

    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            position: None,
            message: message.into(),
        }
    }

    /// Attach the byte offset in the source where the error surfaced
    pub fn at(mut self, position: u64) -> Self {
        self.position = Some(position);
        self
    }

    pub fn malformed_selector(expression: &str, reason: impl fmt::Display) -> Self {
        Self::with_message(
            ErrorKind::MalformedSelector {
                expression: expression.to_string(),
            },
            format!("malformed selector {expression:?}: {reason}"),
        )
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn position(&self) -> Option<u64> {
        self.position
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this error ends the stream it came from.
    ///
    /// Only a fragment that fails to reparse is scoped to a single item;
    /// everything else either happens before streaming starts or leaves the
    /// event source in an unusable state.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind, ErrorKind::FragmentParse)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "error at byte {pos}: {}", self.message),
            None => write!(f, "error: {}", self.message),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(io) => Self::with_message(ErrorKind::Io, io.to_string()),
            other => Self::with_message(ErrorKind::Syntax, other.to_string()),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::with_message(ErrorKind::Syntax, err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::with_message(ErrorKind::Io, err.to_string())
    }
}

/// Result type alias for xmlharvest
pub type Result<T> = std::result::Result<T, Error>;
