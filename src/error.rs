//! Unified error type.

use std::fmt;

/// The error type returned by gantry's fallible operations.
///
/// Application-level failures (404, 429, 500) are expressed as HTTP
/// [`Response`](crate::Response) values inside the pipeline, never as
/// `Error`s. This type surfaces infrastructure failures: binding to a port,
/// accepting a connection, or a malformed environment variable.
#[derive(Debug)]
pub enum Error {
    /// Socket-level failure while binding or accepting.
    Io(std::io::Error),
    /// An environment variable was present but could not be parsed.
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
