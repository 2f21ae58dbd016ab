//! Error types for the FOXML injector.

use thiserror::Error;

/// Errors that can occur while injecting a datastream version.
#[derive(Error, Debug)]
pub enum Error {
    /// The source document is not well-formed XML
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// No datastream carries the requested ID
    #[error("Datastream with ID of {dsid} does not exist")]
    DatastreamNotFound {
        /// The datastream ID that was requested
        dsid: String,
    },

    /// The mutated tree could not be serialized
    #[error("Serialization failure: {0}")]
    SerializationFailure(String),

    /// A content block is not valid base64
    #[error("Invalid binary content: {0}")]
    InvalidContent(#[from] base64::DecodeError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps a parser error, recording the byte offset it was raised at.
    pub(crate) fn malformed(err: impl std::fmt::Display, position: u64) -> Self {
        Error::MalformedInput(format!("{} (at byte {})", err, position))
    }

    pub(crate) fn serialization(err: impl std::fmt::Display) -> Self {
        Error::SerializationFailure(err.to_string())
    }
}

/// Result type alias for injector operations.
pub type Result<T> = std::result::Result<T, Error>;
