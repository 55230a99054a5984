//! Pipeline Coordinator: resolves the field list, spins up the reader,
//! decode, and insertion stages, and waits for them to drain.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::fields::FieldList;
use crate::pipeline::batch::{self, BatchConfig};
use crate::pipeline::decode::{self, DecodedDocument};
use crate::pipeline::progress::ProgressTracker;
use crate::pipeline::state::PipelineState;
use crate::reader::{RawRecord, RecordReader};
use crate::write_concern::{self, ParsedWriteConcern};
use crate::writer::Writer;

/// Result of a completed (or cancelled) import run.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub documents_imported: u64,
    /// The terminal error, if the run ended early.
    pub error: Option<crate::error::ImportError>,
}

pub struct PipelineCoordinator {
    config: PipelineConfig,
    reader: Box<dyn RecordReader>,
    writer: Arc<dyn Writer>,
    progress: ProgressTracker,
}

impl PipelineCoordinator {
    pub fn new(
        config: PipelineConfig,
        reader: Box<dyn RecordReader>,
        writer: Arc<dyn Writer>,
        progress: ProgressTracker,
    ) -> Self {
        Self {
            config,
            reader,
            writer,
            progress,
        }
    }

    /// Resolve headers, spawn the reader/decode/insertion stages, and wait
    /// for the import to finish. Returns `Err` only for setup failures that
    /// occur before any worker is spawned; stage-level failures are reported
    /// inside the returned `PipelineOutcome`.
    pub async fn run(mut self) -> Result<PipelineOutcome> {
        let fields = Arc::new(self.resolve_fields().await?);

        let write_concern = match write_concern::parse(&self.config.write_concern)? {
            ParsedWriteConcern::None => ParsedWriteConcern::None,
            ParsedWriteConcern::Concern(wc) => {
                if self.writer.is_replica_set() {
                    ParsedWriteConcern::Concern(wc)
                } else {
                    ParsedWriteConcern::Concern(wc.downgrade_for_standalone())
                }
            }
        };

        // Ordering across the decode stage is only guaranteed with a single
        // decode worker; ordered mode already pins insertion workers to one
        // via config validation.
        let decode_workers = if self.config.maintain_insertion_order {
            1
        } else {
            self.config.num_decoding_workers
        };
        let insertion_workers = self.config.num_insertion_workers;

        let raw_channel_cap = self.config.batch_size * decode_workers;
        let decoded_channel_cap = self.config.batch_size * insertion_workers;

        let (raw_tx, raw_rx) = mpsc::channel::<RawRecord>(raw_channel_cap.max(1));
        let (decoded_tx, decoded_rx) = mpsc::channel::<DecodedDocument>(decoded_channel_cap.max(1));

        let state = Arc::new(PipelineState::new());

        let reader_task = self.spawn_reader(raw_tx, state.clone());

        let raw_rx = Arc::new(AsyncMutex::new(raw_rx));
        let mut decode_tasks = Vec::with_capacity(decode_workers);
        let upsert_fields = Arc::new(self.config.upsert_fields.clone());
        for _ in 0..decode_workers {
            decode_tasks.push(self.spawn_decode_worker(
                raw_rx.clone(),
                decoded_tx.clone(),
                fields.clone(),
                upsert_fields.clone(),
                state.clone(),
            ));
        }
        drop(decoded_tx);

        let batch_config = Arc::new(BatchConfig {
            collection_name: self.writer.collection_name().to_string(),
            batch_size: self.config.batch_size,
            max_batch_bytes: batch::max_batch_bytes(self.writer.supports_write_commands()),
            ordered: self.config.maintain_insertion_order,
            write_concern,
            stop_on_error: self.config.stop_on_error,
            upsert: self.config.upsert,
        });

        let decoded_rx = Arc::new(AsyncMutex::new(decoded_rx));
        let mut insert_tasks = Vec::with_capacity(insertion_workers);
        for _ in 0..insertion_workers {
            insert_tasks.push(self.spawn_insert_worker(
                decoded_rx.clone(),
                batch_config.clone(),
                state.clone(),
            ));
        }

        let _ = reader_task.await;
        for task in decode_tasks {
            let _ = task.await;
        }
        for task in insert_tasks {
            let _ = task.await;
        }

        self.progress.update(state.inserted_count());
        self.progress.finish();

        let documents_imported = state.inserted_count();
        let error = state.take_error();

        if let Some(ref err) = error {
            tracing::error!(error = %err, documents_imported, "import terminated with an error");
        } else {
            info!(documents_imported, "import completed");
        }

        Ok(PipelineOutcome {
            documents_imported,
            error,
        })
    }

    async fn resolve_fields(&mut self) -> Result<FieldList> {
        if !self.config.input_type.is_tabular() {
            return Ok(FieldList::new(Vec::new()));
        }

        let list = if self.config.header_line {
            let headers = self.reader.read_headers_from_source().await?;
            FieldList::new(headers)
        } else {
            FieldList::new(self.config.fields.clone())
        };

        list.validate()
    }

    fn spawn_reader(&mut self, tx: mpsc::Sender<RawRecord>, state: Arc<PipelineState>) -> JoinHandle<()> {
        // `reader` lives in `self`, but it must be moved into the spawned
        // task to keep streaming from it across an `.await` boundary; swap
        // in a placeholder so the rest of the coordinator can still use
        // `self` by reference for channel sizing decided before this call.
        let mut reader = std::mem::replace(&mut self.reader, Box::new(NullReader));
        tokio::spawn(async move {
            if let Err(err) = reader.stream_documents(tx).await {
                state.record_error(err);
            }
        })
    }

    fn spawn_decode_worker(
        &self,
        rx: Arc<AsyncMutex<mpsc::Receiver<RawRecord>>>,
        tx: mpsc::Sender<DecodedDocument>,
        fields: Arc<FieldList>,
        upsert_fields: Arc<Vec<String>>,
        state: Arc<PipelineState>,
    ) -> JoinHandle<()> {
        let ignore_blanks = self.config.ignore_blanks;
        tokio::spawn(decode::run(rx, tx, fields, ignore_blanks, upsert_fields, state))
    }

    fn spawn_insert_worker(
        &self,
        rx: Arc<AsyncMutex<mpsc::Receiver<DecodedDocument>>>,
        config: Arc<BatchConfig>,
        state: Arc<PipelineState>,
    ) -> JoinHandle<()> {
        let writer = self.writer.clone();
        tokio::spawn(batch::run(rx, writer, config, state))
    }
}

/// Placeholder reader swapped into a coordinator after its real reader has
/// been moved into the spawned reader task.
struct NullReader;

#[async_trait::async_trait]
impl RecordReader for NullReader {
    async fn read_headers_from_source(&mut self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn get_headers(&self) -> Vec<String> {
        Vec::new()
    }

    async fn stream_documents(&mut self, _out: mpsc::Sender<RawRecord>) -> Result<()> {
        Ok(())
    }
}
