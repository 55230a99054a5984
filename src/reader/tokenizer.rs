//! RFC-4180-lite field tokenizer shared by the CSV reader.
//!
//! A `"` is only legal in two positions: as the very first character of a
//! field (opening a quoted run), or as the second character of a `""` pair
//! while already inside a quoted run (an escaped literal quote). Any other
//! bare `"`, including one appearing after a quoted run has already closed
//! in the same field, is a parse error. Two quoted strings joined by
//! whitespace (`"foo"  "bar"`) are rejected, while whitespace occurring
//! inside an escaped-quote run (`"foo"" ""bar"`) is kept verbatim.

use crate::error::{ImportError, ParseError, Result};

/// Split one logical CSV line into fields.
pub fn tokenize_csv_line(line: &str) -> Result<Vec<String>> {
    let chars: Vec<char> = line.chars().collect();
    let mut fields = Vec::new();
    let mut i = 0;

    loop {
        let (field, next) = parse_field(&chars, i)?;
        fields.push(field);
        i = next;
        if i >= chars.len() {
            break;
        }
        // `next` points just past the separating comma.
    }

    Ok(fields)
}

/// TSV fields are separated by a bare tab with no quoting or escaping.
pub fn tokenize_tsv_line(line: &str) -> Vec<String> {
    line.split('\t').map(|s| s.to_string()).collect()
}

/// Parse a single field starting at `start`, returning the field text and
/// the index just past the field's terminating comma (or `chars.len()` at
/// end of line).
fn parse_field(chars: &[char], start: usize) -> Result<(String, usize)> {
    let mut out = String::new();
    let mut i = start;
    let mut quote_seen = false;
    let mut quote_open = false;

    while i < chars.len() {
        let c = chars[i];

        if quote_open {
            if c == '"' {
                if i + 1 < chars.len() && chars[i + 1] == '"' {
                    out.push('"');
                    i += 2;
                    continue;
                }
                quote_open = false;
                i += 1;
                continue;
            }
            out.push(c);
            i += 1;
            continue;
        }

        if c == ',' {
            return Ok((out, i + 1));
        }

        if c == '"' {
            if out.is_empty() && !quote_seen {
                quote_open = true;
                quote_seen = true;
                i += 1;
                continue;
            }
            return Err(ImportError::Parse(ParseError::Tokenizer(format!(
                "stray '\"' in field at column {i}"
            ))));
        }

        out.push(c);
        i += 1;
    }

    if quote_open {
        return Err(ImportError::Parse(ParseError::Tokenizer(
            "unterminated quoted field".into(),
        )));
    }

    Ok((out, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_fields() {
        assert_eq!(
            tokenize_csv_line("1,2,3").unwrap(),
            vec!["1".to_string(), "2".into(), "3".into()]
        );
    }

    #[test]
    fn unescapes_doubled_quotes() {
        assert_eq!(
            tokenize_csv_line(r#""foo""bar""#).unwrap(),
            vec![r#"foo"bar"#.to_string()]
        );
    }

    #[test]
    fn whitespace_inside_escaped_quote_run_is_kept() {
        assert_eq!(
            tokenize_csv_line(r#""foo"" ""bar""#).unwrap(),
            vec!["foo\" \"bar".to_string()]
        );
    }

    #[test]
    fn two_quoted_strings_joined_by_whitespace_is_an_error() {
        assert!(tokenize_csv_line(r#""foo"  "bar""#).is_err());
    }

    #[test]
    fn stray_quote_mid_field_is_an_error() {
        assert!(tokenize_csv_line(r#"foo"bar"#).is_err());
    }

    #[test]
    fn leading_whitespace_in_unquoted_field_is_preserved() {
        assert_eq!(tokenize_csv_line(r#"1, 2f, 3e, may"#).unwrap()[1], " 2f");
    }

    #[test]
    fn tsv_splits_on_bare_tab() {
        assert_eq!(
            tokenize_tsv_line("1\t2\t3"),
            vec!["1".to_string(), "2".into(), "3".into()]
        );
    }
}
