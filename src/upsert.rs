//! Upsert selector extraction.
//!
//! Pulls the configured dotted key paths out of a built document; if none of
//! them resolve, the caller should perform a plain insert instead.

use crate::record::{Record, Value};

/// The result of attempting to build an upsert selector from a document.
pub enum Selector {
    /// At least one configured key resolved; perform an upsert with this
    /// filter document.
    Filter(bson::Document),
    /// None of the configured keys resolved in the document; the caller
    /// should fall back to a plain insert.
    None,
}

/// Extract a selector document containing only the configured `upsert_fields`
/// dotted paths that are present in `record`, preserving nesting.
pub fn build_selector(record: &Record, upsert_fields: &[String]) -> Selector {
    let mut selector = Record::new();
    let mut found_any = false;

    for field in upsert_fields {
        let segments: Vec<&str> = field.split('.').collect();
        if let Some(value) = record.get_path(&segments) {
            found_any = true;
            set_flat(&mut selector, field, value.clone());
        }
    }

    if found_any {
        Selector::Filter(selector.into_bson())
    } else {
        Selector::None
    }
}

/// Selector documents use the dotted path itself as the key (matching
/// MongoDB's dotted-path query syntax), not a nested sub-document.
fn set_flat(selector: &mut Record, dotted_key: &str, value: Value) {
    selector.push(dotted_key, value);
}

/// The JSON reader emits records as `bson::Document` directly rather than
/// through `Record`; this is the equivalent of [`build_selector`] operating
/// on that representation.
pub fn build_selector_from_bson(doc: &bson::Document, upsert_fields: &[String]) -> Option<bson::Document> {
    let mut selector = bson::Document::new();
    let mut found_any = false;

    for field in upsert_fields {
        if let Some(value) = get_bson_path(doc, field) {
            found_any = true;
            selector.insert(field.clone(), value.clone());
        }
    }

    if found_any { Some(selector) } else { None }
}

fn get_bson_path<'a>(doc: &'a bson::Document, path: &str) -> Option<&'a bson::Bson> {
    let mut segments = path.split('.');
    let head = segments.next()?;
    let mut current = doc.get(head)?;
    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }
    Some(current)
}
