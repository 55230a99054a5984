//! Error types for the import pipeline.
//!
//! This module defines the error hierarchy that wraps the MongoDB driver's
//! error type and the pipeline's own failure kinds.

use std::{fmt, io};

use crate::error::mongo::format_mongodb_error;

/// Crate-wide `Result` type using [`ImportError`] as the error.
pub type Result<T> = std::result::Result<T, ImportError>;

/// Top-level error type for the import pipeline.
#[derive(Debug)]
pub enum ImportError {
    /// MongoDB driver errors (automatically formatted as structured JSON).
    MongoDb(mongodb::error::Error),

    /// CLI arguments or config file combine into an unsatisfiable setup.
    InvalidConfiguration(String),

    /// A field list failed validation (edge/consecutive dots, duplicate, prefix collision).
    InvalidHeader(String),

    /// An extra-column synthetic name collided with an explicit field.
    DuplicateSyntheticField(String),

    /// Malformed CSV/TSV/JSON input.
    Parse(ParseError),

    /// A built document could not be serialized to BSON.
    Encoding(String),

    /// Transport-level failure talking to the server.
    Network(String),

    /// The server rejected an entire bulk command (`ok: 0`).
    CommandFailed(String),

    /// One or more documents in a batch failed to write.
    WriteError(String),

    /// The requested write concern could not be satisfied.
    WriteConcernError(String),

    /// A write-concern string/object did not parse.
    InvalidWriteConcern(String),

    /// Failure reading or opening the input source.
    SourceIo(io::Error),

    /// Generic error with a message.
    Generic(String),
}

/// Parsing-specific errors (CSV/TSV tokenizer, JSON record reader).
#[derive(Debug)]
pub enum ParseError {
    /// A CSV/TSV token was malformed (unterminated quote, stray quote, etc).
    Tokenizer(String),

    /// A JSON document or array element failed to parse.
    Json(String),

    /// The record reader hit EOF inside an incomplete record.
    UnexpectedEof(String),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::MongoDb(e) => format_mongodb_error(f, e),
            ImportError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            ImportError::InvalidHeader(msg) => write!(f, "invalid header: {msg}"),
            ImportError::DuplicateSyntheticField(msg) => {
                write!(f, "duplicate synthetic field: {msg}")
            }
            ImportError::Parse(e) => write!(f, "parse error: {e}"),
            ImportError::Encoding(msg) => write!(f, "encoding error: {msg}"),
            ImportError::Network(msg) => write!(f, "network error: {msg}"),
            ImportError::CommandFailed(msg) => write!(f, "command failed: {msg}"),
            ImportError::WriteError(msg) => write!(f, "write error: {msg}"),
            ImportError::WriteConcernError(msg) => write!(f, "write concern error: {msg}"),
            ImportError::InvalidWriteConcern(msg) => write!(f, "invalid write concern: {msg}"),
            ImportError::SourceIo(e) => write!(f, "source I/O error: {e}"),
            ImportError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Tokenizer(msg) => write!(f, "{msg}"),
            ParseError::Json(msg) => write!(f, "{msg}"),
            ParseError::UnexpectedEof(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ImportError {}
impl std::error::Error for ParseError {}

impl From<mongodb::error::Error> for ImportError {
    fn from(err: mongodb::error::Error) -> Self {
        ImportError::MongoDb(err)
    }
}

impl From<ParseError> for ImportError {
    fn from(err: ParseError) -> Self {
        ImportError::Parse(err)
    }
}

impl From<io::Error> for ImportError {
    fn from(err: io::Error) -> Self {
        ImportError::SourceIo(err)
    }
}

impl From<String> for ImportError {
    fn from(msg: String) -> Self {
        ImportError::Generic(msg)
    }
}

impl From<&str> for ImportError {
    fn from(msg: &str) -> Self {
        ImportError::Generic(msg.to_string())
    }
}

impl From<bson::ser::Error> for ImportError {
    fn from(err: bson::ser::Error) -> Self {
        ImportError::Encoding(format!("BSON serialization error: {err}"))
    }
}

impl From<bson::de::Error> for ImportError {
    fn from(err: bson::de::Error) -> Self {
        ImportError::Encoding(format!("BSON deserialization error: {err}"))
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::Parse(ParseError::Json(err.to_string()))
    }
}
