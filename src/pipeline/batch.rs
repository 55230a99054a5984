//! Batcher & Inserter: accumulates decoded documents into bulk write
//! commands (or, in upsert mode, submits them one at a time), interprets
//! the server's response, and feeds the shared insertion counter.

use std::sync::Arc;

use mongodb::bson::doc;
use tokio::sync::{mpsc, Mutex as AsyncMutex};

use crate::error::ImportError;
use crate::pipeline::decode::DecodedDocument;
use crate::pipeline::state::PipelineState;
use crate::write_concern::ParsedWriteConcern;
use crate::writer::Writer;

/// The maximum size of a single BSON document MongoDB accepts.
pub const MAX_BSON_SIZE: usize = 16 * 1024 * 1024;

/// The batch byte cap: half the max document size when the server speaks
/// write commands (room for command overhead around the documents array),
/// twice it otherwise (legacy opcode framing has a different budget).
pub fn max_batch_bytes(supports_write_commands: bool) -> usize {
    if supports_write_commands {
        MAX_BSON_SIZE / 2
    } else {
        MAX_BSON_SIZE * 2
    }
}

pub struct BatchConfig {
    pub collection_name: String,
    pub batch_size: usize,
    pub max_batch_bytes: usize,
    pub ordered: bool,
    pub write_concern: ParsedWriteConcern,
    pub stop_on_error: bool,
    /// Upsert mode is active when non-empty; the actual field list lives in
    /// the decode stage, this only gates which code path the inserter runs.
    pub upsert: bool,
}

/// Run a single insertion worker to completion.
pub async fn run(
    rx: Arc<AsyncMutex<mpsc::Receiver<DecodedDocument>>>,
    writer: Arc<dyn Writer>,
    config: Arc<BatchConfig>,
    state: Arc<PipelineState>,
) {
    if config.upsert {
        run_upsert(rx, writer, config, state).await;
        return;
    }

    let mut batch: Vec<bson::Document> = Vec::new();
    let mut batch_bytes = 0usize;

    loop {
        let item = tokio::select! {
            _ = state.cancel_token().cancelled() => break,
            maybe = async { rx.lock().await.recv().await } => match maybe {
                Some(item) => item,
                None => break,
            },
        };

        let size = document_size(&item.document);

        if !batch.is_empty()
            && (batch.len() >= config.batch_size || batch_bytes + size > config.max_batch_bytes)
        {
            if let Err(err) = flush(&writer, &config, &state, std::mem::take(&mut batch)).await {
                state.record_error(err);
                break;
            }
            batch_bytes = 0;
        }

        batch_bytes += size;
        batch.push(item.document);
    }

    if !batch.is_empty() && !state.is_cancelled() {
        if let Err(err) = flush(&writer, &config, &state, batch).await {
            state.record_error(err);
        }
    }
}

async fn run_upsert(
    rx: Arc<AsyncMutex<mpsc::Receiver<DecodedDocument>>>,
    writer: Arc<dyn Writer>,
    config: Arc<BatchConfig>,
    state: Arc<PipelineState>,
) {
    loop {
        let item = tokio::select! {
            _ = state.cancel_token().cancelled() => break,
            maybe = async { rx.lock().await.recv().await } => match maybe {
                Some(item) => item,
                None => break,
            },
        };

        let result = match item.selector {
            Some(selector) => writer.upsert(selector, item.document).await,
            None => writer.insert(item.document).await,
        };

        match result {
            Ok(()) => state.add_inserted(1),
            Err(err) => {
                tracing::warn!(error = %err, "upsert document failed");
                if config.stop_on_error {
                    state.record_error(err);
                    break;
                }
            }
        }
    }
}

fn document_size(doc: &bson::Document) -> usize {
    bson::to_vec(doc).map(|v| v.len()).unwrap_or(0)
}

async fn flush(
    writer: &Arc<dyn Writer>,
    config: &BatchConfig,
    state: &PipelineState,
    documents: Vec<bson::Document>,
) -> crate::error::Result<()> {
    let count = documents.len() as u64;
    let total_bytes: usize = documents.iter().map(document_size).sum();

    let is_none_concern = matches!(config.write_concern, ParsedWriteConcern::None);

    let mut command = doc! {
        "insert": &config.collection_name,
        "ordered": config.ordered,
        "documents": documents,
    };
    if let ParsedWriteConcern::Concern(wc) = &config.write_concern {
        command.insert("writeConcern", wc.to_bson());
    }

    tracing::debug!(
        count,
        bytes = %crate::utils::convert::format_bytes(total_bytes as u64),
        "submitting batch"
    );

    let response = writer.run(command).await?;

    if is_none_concern {
        state.add_inserted(count);
        return Ok(());
    }

    let ok = response
        .get_f64("ok")
        .map(|v| v == 1.0)
        .unwrap_or_else(|_| response.get_bool("ok").unwrap_or(false));
    if !ok {
        return Err(ImportError::CommandFailed(format!("{response:?}")));
    }

    if let Ok(n) = response.get_i32("n") {
        state.add_inserted(n as u64);
    } else {
        state.add_inserted(count);
    }

    if let Ok(write_errors) = response.get_array("writeErrors") {
        if !write_errors.is_empty() {
            for entry in write_errors {
                let errmsg = entry
                    .as_document()
                    .and_then(|d| d.get_str("errmsg").ok())
                    .unwrap_or("unknown write error");
                tracing::warn!(errmsg, "write error in batch");
            }
            let summary = format!("{} document(s) failed to write", write_errors.len());
            if config.stop_on_error {
                return Err(ImportError::WriteError(summary));
            } else {
                tracing::warn!(summary, "continuing past write errors (stop-on-error not set)");
            }
        }
    }

    if let Ok(wc_error) = response.get_document("writeConcernError") {
        let errmsg = wc_error.get_str("errmsg").unwrap_or("unknown write concern error");
        if is_norepl_error(errmsg) {
            tracing::debug!("ignoring legacy norepl write concern error");
        } else {
            tracing::warn!(errmsg, "write concern error");
            if config.stop_on_error {
                return Err(ImportError::WriteConcernError(errmsg.to_string()));
            }
        }
    }

    Ok(())
}

/// Pre-replica-set standalone servers reject `w: "majority"` with this
/// legacy error string; swallowed unconditionally regardless of stop-on-error.
fn is_norepl_error(errmsg: &str) -> bool {
    errmsg.contains("norepl")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::tests::MockWriter;

    fn config(stop_on_error: bool) -> Arc<BatchConfig> {
        Arc::new(BatchConfig {
            collection_name: "coll".into(),
            batch_size: 2,
            max_batch_bytes: max_batch_bytes(true),
            ordered: false,
            write_concern: ParsedWriteConcern::Concern(crate::write_concern::WriteConcern {
                w: 1,
                wmode: String::new(),
                j: false,
                fsync: false,
                wtimeout: 0,
            }),
            stop_on_error,
            upsert: false,
        })
    }

    #[tokio::test]
    async fn flushes_on_batch_size_and_at_end() {
        let (tx, rx) = mpsc::channel(8);
        let writer: Arc<dyn Writer> = Arc::new(MockWriter::with_responses(vec![
            doc! { "ok": 1.0, "n": 2 },
            doc! { "ok": 1.0, "n": 1 },
        ]));
        let state = Arc::new(PipelineState::new());

        for _ in 0..3 {
            tx.send(DecodedDocument {
                document: doc! { "a": 1 },
                selector: None,
            })
            .await
            .unwrap();
        }
        drop(tx);

        run(Arc::new(AsyncMutex::new(rx)), writer, config(false), state.clone()).await;
        assert_eq!(state.inserted_count(), 3);
        assert!(state.take_error().is_none());
    }

    #[tokio::test]
    async fn stop_on_error_surfaces_write_errors() {
        let (tx, rx) = mpsc::channel(8);
        let writer: Arc<dyn Writer> = Arc::new(MockWriter::with_responses(vec![doc! {
            "ok": 1.0,
            "n": 0,
            "writeErrors": [ doc! { "index": 0, "code": 11000, "errmsg": "dup key" } ],
        }]));
        let state = Arc::new(PipelineState::new());

        tx.send(DecodedDocument {
            document: doc! { "a": 1 },
            selector: None,
        })
        .await
        .unwrap();
        drop(tx);

        run(Arc::new(AsyncMutex::new(rx)), writer, config(true), state.clone()).await;
        assert!(matches!(state.take_error(), Some(ImportError::WriteError(_))));
    }

    #[tokio::test]
    async fn write_errors_are_non_fatal_without_stop_on_error() {
        let (tx, rx) = mpsc::channel(8);
        let writer: Arc<dyn Writer> = Arc::new(MockWriter::with_responses(vec![doc! {
            "ok": 1.0,
            "n": 0,
            "writeErrors": [ doc! { "index": 0, "code": 11000, "errmsg": "dup key" } ],
        }]));
        let state = Arc::new(PipelineState::new());

        tx.send(DecodedDocument {
            document: doc! { "a": 1 },
            selector: None,
        })
        .await
        .unwrap();
        drop(tx);

        run(Arc::new(AsyncMutex::new(rx)), writer, config(false), state.clone()).await;
        assert!(state.take_error().is_none());
    }
}
