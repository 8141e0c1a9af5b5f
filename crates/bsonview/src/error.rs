//! Error types for BSON reading and streaming.

use std::fmt;

/// Error type for all reader and pipeline operations.
#[derive(Debug)]
pub enum Error {
    // Frame reader
    /// The byte source is exhausted; normal completion of the frame reader.
    EndOfStream,
    /// The byte source ended in the middle of a frame.
    Truncated,
    /// A frame declared an implausible length (negative, below the
    /// 5-byte document minimum, or above the frame cap).
    MalformedFrame { len: i64 },

    // Document reader
    /// Unknown element tag, or an element overruns its document.
    MalformedElement { tag: u8 },
    /// A typed accessor was invoked on a non-matching, non-empty value.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// String, regex, or namespace bytes are not valid UTF-8.
    InvalidUtf8,

    // JSON projection
    /// f64 is NaN or Infinity (not representable in JSON).
    NonFiniteFloat(f64),
    /// Failed to serialize the generic projection to JSON.
    Json(String),

    // Collaborators
    /// The encoder rejected a value inside the search-token builder
    /// or the document builder.
    Encoder(String),
    /// A streaming callback failed; the user error is carried verbatim.
    Callback(Box<dyn std::error::Error + Send + Sync>),
    /// I/O failure underneath the frame reader.
    Io(std::io::Error),
}

impl Error {
    /// Wrap an arbitrary error as a callback failure.
    ///
    /// Accepts anything convertible into a boxed error, including plain
    /// strings:
    ///
    /// ```
    /// use bsonview::Error;
    ///
    /// let err = Error::callback("unexpected document shape");
    /// assert!(matches!(err, Error::Callback(_)));
    /// ```
    pub fn callback(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Callback(err.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EndOfStream => write!(f, "end of stream"),
            Error::Truncated => write!(f, "stream ended mid-frame"),
            Error::MalformedFrame { len } => write!(f, "implausible frame length {len}"),
            Error::MalformedElement { tag } => write!(f, "malformed element (tag {tag:#04x})"),
            Error::TypeMismatch { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Error::InvalidUtf8 => write!(f, "invalid UTF-8 in string value"),
            Error::NonFiniteFloat(n) => write!(f, "cannot encode non-finite float {n} as JSON"),
            Error::Json(msg) => write!(f, "JSON serialize error: {msg}"),
            Error::Encoder(msg) => write!(f, "encoder error: {msg}"),
            Error::Callback(e) => write!(f, "callback failed: {e}"),
            Error::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Callback(e) => Some(e.as_ref()),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// Result type alias for reader and pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
