//! Record readers: pluggable streaming parsers over a [`crate::source::SourceStream`].

pub mod csv;
pub mod json;
pub mod tokenizer;
pub mod tsv;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

/// A record pulled off the source before field-list/value-parsing has been
/// applied. Tabular readers emit raw tokens (so the decode stage can apply
/// the field list in parallel); the JSON reader emits an already-typed
/// BSON document directly, since JSON carries its own structure and richer
/// type set (arrays, booleans, null) than the tabular `Record` model covers.
#[derive(Debug, Clone)]
pub enum RawRecord {
    Tokens(Vec<String>),
    Json(bson::Document),
}

/// A streaming, format-aware reader over record-oriented input.
#[async_trait]
pub trait RecordReader: Send {
    /// For tabular formats: read the first line of the source and adopt it
    /// as the field list. A no-op for JSON.
    async fn read_headers_from_source(&mut self) -> Result<Vec<String>>;

    /// The field list currently in effect (possibly populated by
    /// `read_headers_from_source` or supplied at construction time).
    fn get_headers(&self) -> Vec<String>;

    /// Stream every remaining record on the source into `out`, returning once
    /// the source is exhausted. A malformed record is a terminal error.
    async fn stream_documents(&mut self, out: mpsc::Sender<RawRecord>) -> Result<()>;
}
