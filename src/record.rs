//! The in-memory document representation produced by a record reader and
//! consumed by the document builder, before it is encoded to BSON.

use std::collections::BTreeMap;

/// A scalar or nested value inside a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Document(Record),
}

/// An ordered sequence of `(key, value)` pairs. Order is significant: it
/// mirrors the order fields were encountered in the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn push(&mut self, key: impl Into<String>, value: Value) {
        self.entries.push((key.into(), value));
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the top-level entry with the given key, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Find a mutable reference to a nested `Document` entry with the given
    /// key, creating and inserting one if none exists yet.
    pub fn get_or_insert_document(&mut self, key: &str) -> &mut Record {
        if let Some(idx) = self.entries.iter().position(|(k, _)| k == key) {
            match &mut self.entries[idx].1 {
                Value::Document(doc) => return doc,
                _ => {
                    // The key already holds a scalar; this indicates a
                    // conflicting dotted path, which the caller validates
                    // against before ever reaching here.
                    self.entries[idx].1 = Value::Document(Record::new());
                    match &mut self.entries[idx].1 {
                        Value::Document(doc) => return doc,
                        _ => unreachable!(),
                    }
                }
            }
        }
        self.entries.push((key.to_string(), Value::Document(Record::new())));
        match &mut self.entries.last_mut().unwrap().1 {
            Value::Document(doc) => doc,
            _ => unreachable!(),
        }
    }

    /// Look up a value by a dotted path, descending through nested documents.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (head, rest) = path.split_first()?;
        let value = self.get(head)?;
        if rest.is_empty() {
            Some(value)
        } else if let Value::Document(doc) = value {
            doc.get_path(rest)
        } else {
            None
        }
    }

    /// Remove every entry whose value is the empty string, recursively
    /// through nested documents.
    pub fn remove_blank_fields(&mut self) {
        self.entries.retain(|(_, v)| !matches!(v, Value::Str(s) if s.is_empty()));
        for (_, v) in self.entries.iter_mut() {
            if let Value::Document(doc) = v {
                doc.remove_blank_fields();
            }
        }
    }

    /// Convert into a `bson::Document`, preserving key order.
    pub fn into_bson(self) -> bson::Document {
        let mut doc = bson::Document::new();
        for (key, value) in self.entries {
            doc.insert(key, value.into_bson());
        }
        doc
    }
}

impl Value {
    fn into_bson(self) -> bson::Bson {
        match self {
            Value::Int(i) => bson::Bson::Int64(i),
            Value::Float(f) => bson::Bson::Double(f),
            Value::Str(s) => bson::Bson::String(s),
            Value::Document(doc) => bson::Bson::Document(doc.into_bson()),
        }
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Helper retained for callers that want a name -> index map over a flat
/// record (used by the upsert selector when matching against a field list).
pub fn index_by_key(record: &Record) -> BTreeMap<&str, usize> {
    record
        .iter()
        .enumerate()
        .map(|(i, (k, _))| (k.as_str(), i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_get_roundtrip() {
        let mut r = Record::new();
        r.push("a", Value::Int(1));
        assert_eq!(r.get("a"), Some(&Value::Int(1)));
        assert_eq!(r.get("missing"), None);
    }

    #[test]
    fn nested_document_created_on_demand() {
        let mut r = Record::new();
        r.get_or_insert_document("b").push("c", Value::Str("x".into()));
        match r.get("b") {
            Some(Value::Document(doc)) => {
                assert_eq!(doc.get("c"), Some(&Value::Str("x".into())));
            }
            _ => panic!("expected nested document"),
        }
    }

    #[test]
    fn get_path_descends_nesting() {
        let mut r = Record::new();
        r.get_or_insert_document("b").push("c", Value::Int(7));
        assert_eq!(r.get_path(&["b", "c"]), Some(&Value::Int(7)));
        assert_eq!(r.get_path(&["b", "missing"]), None);
        assert_eq!(r.get_path(&["missing"]), None);
    }

    #[test]
    fn remove_blank_fields_drops_empty_strings_recursively() {
        let mut r = Record::new();
        r.push("a", Value::Str(String::new()));
        r.push("b", Value::Str("keep".into()));
        r.get_or_insert_document("c").push("d", Value::Str(String::new()));
        r.remove_blank_fields();
        assert_eq!(r.get("a"), None);
        assert_eq!(r.get("b"), Some(&Value::Str("keep".into())));
        match r.get("c") {
            Some(Value::Document(doc)) => assert_eq!(doc.len(), 0),
            _ => panic!("expected nested document to survive"),
        }
    }

    #[test]
    fn into_bson_preserves_order_and_types() {
        let mut r = Record::new();
        r.push("a", Value::Int(1));
        r.push("b", Value::Float(2.5));
        let doc = r.into_bson();
        let keys: Vec<&str> = doc.keys().map(|s| s.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
