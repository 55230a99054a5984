//! Decode Worker: the stage that turns raw reader output into wire-ready
//! BSON documents plus (in upsert mode) their selectors.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex as AsyncMutex};

use crate::document;
use crate::fields::FieldList;
use crate::pipeline::state::PipelineState;
use crate::reader::RawRecord;
use crate::upsert::{self, Selector};

/// One decoded record, ready for the batcher.
#[derive(Debug, Clone)]
pub struct DecodedDocument {
    pub document: bson::Document,
    /// `Some(filter)` when upsert mode is on and a selector resolved;
    /// `None` means either upsert mode is off, or none of the configured
    /// upsert keys resolved (plain insert).
    pub selector: Option<bson::Document>,
}

/// Run a single decode worker to completion: pull raw records off a
/// receiver shared with its sibling decode workers until the channel
/// closes or cancellation is signaled, push decoded documents downstream.
pub async fn run(
    rx: Arc<AsyncMutex<mpsc::Receiver<RawRecord>>>,
    tx: mpsc::Sender<DecodedDocument>,
    fields: Arc<FieldList>,
    ignore_blanks: bool,
    upsert_fields: Arc<Vec<String>>,
    state: Arc<PipelineState>,
) {
    loop {
        let raw = tokio::select! {
            _ = state.cancel_token().cancelled() => break,
            maybe = async { rx.lock().await.recv().await } => match maybe {
                Some(raw) => raw,
                None => break,
            },
        };

        match decode_one(raw, &fields, ignore_blanks, &upsert_fields) {
            Ok(item) => {
                if tx.send(item).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                state.record_error(err);
                break;
            }
        }
    }
}

fn decode_one(
    raw: RawRecord,
    fields: &FieldList,
    ignore_blanks: bool,
    upsert_fields: &[String],
) -> crate::error::Result<DecodedDocument> {
    match raw {
        RawRecord::Tokens(tokens) => {
            let mut record = document::build_from_tokens(&tokens, fields)?;
            if ignore_blanks {
                record.remove_blank_fields();
            }
            let selector = if upsert_fields.is_empty() {
                None
            } else {
                match upsert::build_selector(&record, upsert_fields) {
                    Selector::Filter(filter) => Some(filter),
                    Selector::None => None,
                }
            };
            Ok(DecodedDocument {
                document: record.into_bson(),
                selector,
            })
        }
        RawRecord::Json(doc) => {
            let selector = if upsert_fields.is_empty() {
                None
            } else {
                upsert::build_selector_from_bson(&doc, upsert_fields)
            };
            Ok(DecodedDocument {
                document: doc,
                selector,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldList;

    #[test]
    fn tokens_decode_without_upsert_fields() {
        let fields = FieldList::new(vec!["a".into()]).validate().unwrap();
        let item = decode_one(
            RawRecord::Tokens(vec!["1".into()]),
            &fields,
            false,
            &[],
        )
        .unwrap();
        assert_eq!(item.document.get_i64("a").unwrap(), 1);
        assert!(item.selector.is_none());
    }

    #[test]
    fn tokens_decode_with_resolved_upsert_field() {
        let fields = FieldList::new(vec!["a".into()]).validate().unwrap();
        let item = decode_one(
            RawRecord::Tokens(vec!["1".into()]),
            &fields,
            false,
            &["a".to_string()],
        )
        .unwrap();
        assert!(item.selector.is_some());
    }

    #[test]
    fn json_passthrough_ignores_ignore_blanks() {
        let fields = FieldList::new(vec![]).validate().unwrap();
        let doc = bson::doc! { "a": "" };
        let item = decode_one(RawRecord::Json(doc.clone()), &fields, true, &[]).unwrap();
        assert_eq!(item.document, doc);
    }
}
