//! mongoimport-rs
//!
//! A concurrent bulk import pipeline for loading CSV/TSV/JSON records into a
//! MongoDB collection. Exposed as a library so the pipeline, readers, and
//! parsing primitives can be exercised independently of the CLI binary.
//!
//! # Modules
//!
//! - `cli`: command-line argument parsing
//! - `config`: layered configuration (CLI over TOML file over defaults)
//! - `connection`: MongoDB connection and topology detection
//! - `document`: field-list-driven document construction from raw tokens
//! - `error`: error types and handling
//! - `fields`: field list parsing and header validation
//! - `pipeline`: the concurrent reader/decode/insert pipeline
//! - `reader`: pluggable CSV/TSV/JSON record readers
//! - `record`: the in-memory document representation
//! - `source`: the input byte stream (file or stdin)
//! - `upsert`: upsert selector construction
//! - `utils`: utility functions and helpers
//! - `value_parser`: raw-token-to-typed-value inference
//! - `write_concern`: write concern string parsing
//! - `writer`: the MongoDB write interface

pub mod cli;
pub mod config;
pub mod connection;
pub mod document;
pub mod error;
pub mod fields;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod source;
pub mod upsert;
pub mod utils;
pub mod value_parser;
pub mod write_concern;
pub mod writer;

pub use config::PipelineConfig;
pub use error::{ImportError, Result};
pub use pipeline::{PipelineCoordinator, PipelineOutcome};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
