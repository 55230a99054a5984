//! Document Builder: applies a field list to a raw tabular record, or passes
//! a JSON record through unchanged, producing a [`Record`].

use crate::error::{ImportError, Result};
use crate::fields::{synthetic_field_name, FieldList};
use crate::record::{Record, Value};
use crate::value_parser::parse_token;

/// Build a `Record` from raw tabular tokens and a validated field list.
///
/// Tokens beyond the field list are assigned the synthetic name
/// `field<index>`, keyed by the token's absolute index in the row; a
/// collision with an explicit field name is a [`ImportError::DuplicateSyntheticField`].
pub fn build_from_tokens(tokens: &[String], fields: &FieldList) -> Result<Record> {
    let mut record = Record::new();

    for (index, token) in tokens.iter().enumerate() {
        let path = match fields.get(index) {
            Some(p) => p.to_string(),
            None => {
                let synthetic = synthetic_field_name(index);
                if fields.contains(&synthetic) {
                    return Err(ImportError::DuplicateSyntheticField(format!(
                        "synthetic field '{synthetic}' collides with an explicit header"
                    )));
                }
                synthetic
            }
        };

        let value = parse_token(token);
        set_nested_value(&mut record, &path, value);
    }

    Ok(record)
}

/// Insert `value` at a (possibly dotted) `path` into `record`, materializing
/// intermediate nested documents as needed.
fn set_nested_value(record: &mut Record, path: &str, value: Value) {
    match path.split_once('.') {
        None => record.push(path, value),
        Some((head, rest)) => {
            let nested = record.get_or_insert_document(head);
            set_nested_value(nested, rest, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldList;

    #[test]
    fn builds_nested_document_from_tokens() {
        let fields = FieldList::new(vec!["a".into(), "b.c".into(), "c".into()])
            .validate()
            .unwrap();
        let tokens = vec!["1".into(), "2f".into(), " 3e".into(), " may".into()];
        let doc = build_from_tokens(&tokens, &fields).unwrap();

        assert_eq!(doc.get("a"), Some(&Value::Int(1)));
        match doc.get("b") {
            Some(Value::Document(nested)) => {
                assert_eq!(nested.get("c"), Some(&Value::Str("2f".into())));
            }
            _ => panic!("expected nested document at 'b'"),
        }
        assert_eq!(doc.get("c"), Some(&Value::Str(" 3e".into())));
        assert_eq!(doc.get("field3"), Some(&Value::Str(" may".into())));
    }

    #[test]
    fn extra_column_collides_with_explicit_field() {
        let fields = FieldList::new(vec!["a".into(), "field3".into(), "c".into()])
            .validate()
            .unwrap();
        let tokens = vec!["1".into(), "2".into(), "3".into(), "4".into()];
        let result = build_from_tokens(&tokens, &fields);
        assert!(matches!(result, Err(ImportError::DuplicateSyntheticField(_))));
    }

    #[test]
    fn fewer_tokens_than_fields_leaves_trailing_fields_absent() {
        let fields = FieldList::new(vec!["a".into(), "b".into()]).validate().unwrap();
        let tokens = vec!["1".into()];
        let doc = build_from_tokens(&tokens, &fields).unwrap();
        assert_eq!(doc.get("a"), Some(&Value::Int(1)));
        assert_eq!(doc.get("b"), None);
    }
}
