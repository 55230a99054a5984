//! Write-concern string parsing.
//!
//! The accepted grammar, in order of preference:
//!
//! 1. A lenient object literal, e.g. `{w: 2, j: true, wtimeout: 1000}`.
//!    Unquoted keys are accepted, values may be bare or quoted.
//! 2. A bare integer, assigned to `w`.
//! 3. Any other string, assigned to `wmode` (e.g. `"majority"`).
//!
//! A concern with `w == 0 && wmode.is_empty() && !j` is "none": fire-and-forget,
//! no server acknowledgment expected. `fsync` is deliberately excluded from
//! that check.

use crate::error::{ImportError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct WriteConcern {
    pub w: i64,
    pub wmode: String,
    pub j: bool,
    pub fsync: bool,
    pub wtimeout: i64,
}

impl WriteConcern {
    fn is_none(&self) -> bool {
        self.wmode.is_empty() && self.w == 0 && !self.j
    }

    /// Downgrade to `w=1, wmode=""` for a standalone (non-replicated) server,
    /// which cannot honor replica-set write concerns.
    pub fn downgrade_for_standalone(mut self) -> Self {
        self.w = 1;
        self.wmode.clear();
        self
    }

    /// Render as the `writeConcern` sub-document of a bulk write command.
    pub fn to_bson(&self) -> bson::Document {
        let mut doc = bson::Document::new();
        if !self.wmode.is_empty() {
            doc.insert("w", &self.wmode);
        } else {
            doc.insert("w", self.w);
        }
        doc.insert("j", self.j);
        if self.fsync {
            doc.insert("fsync", self.fsync);
        }
        if self.wtimeout > 0 {
            doc.insert("wtimeout", self.wtimeout);
        }
        doc
    }
}

/// Outcome of parsing a write-concern configuration string.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedWriteConcern {
    /// Fire-and-forget: no acknowledgment is requested from the server.
    None,
    Concern(WriteConcern),
}

pub fn parse(input: &str) -> Result<ParsedWriteConcern> {
    let trimmed = input.trim();

    let concern = if trimmed.starts_with('{') && trimmed.ends_with('}') {
        parse_object(trimmed)?
    } else if let Ok(w) = trimmed.parse::<i64>() {
        WriteConcern {
            w,
            wmode: String::new(),
            j: false,
            fsync: false,
            wtimeout: 0,
        }
    } else {
        WriteConcern {
            w: 0,
            wmode: trimmed.to_string(),
            j: false,
            fsync: false,
            wtimeout: 0,
        }
    };

    if concern.is_none() {
        Ok(ParsedWriteConcern::None)
    } else {
        Ok(ParsedWriteConcern::Concern(concern))
    }
}

/// Parse a lenient `{key: value, ...}` literal tolerating unquoted keys.
fn parse_object(s: &str) -> Result<WriteConcern> {
    let inner = &s[1..s.len() - 1];
    let mut concern = WriteConcern {
        w: 0,
        wmode: String::new(),
        j: false,
        fsync: false,
        wtimeout: 0,
    };

    for entry in split_top_level(inner) {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (raw_key, raw_value) = entry.split_once(':').ok_or_else(|| {
            ImportError::InvalidWriteConcern(format!("malformed entry '{entry}'"))
        })?;
        let key = unquote(raw_key.trim());
        let value = raw_value.trim();

        match key.as_str() {
            "w" => match parse_int_or_bare(value) {
                IntOrString::Int(i) => concern.w = i,
                IntOrString::Str(s) => concern.wmode = s,
            },
            "wmode" => concern.wmode = unquote(value),
            "j" => concern.j = parse_bool(value)?,
            "fsync" => concern.fsync = parse_bool(value)?,
            "wtimeout" => match parse_int_or_bare(value) {
                IntOrString::Int(i) => concern.wtimeout = i,
                IntOrString::Str(s) => {
                    return Err(ImportError::InvalidWriteConcern(format!(
                        "wtimeout must be numeric, got '{s}'"
                    )));
                }
            },
            other => {
                return Err(ImportError::InvalidWriteConcern(format!(
                    "unrecognized write concern field '{other}'"
                )));
            }
        }
    }

    Ok(concern)
}

enum IntOrString {
    Int(i64),
    Str(String),
}

fn parse_int_or_bare(value: &str) -> IntOrString {
    let unquoted = unquote(value);
    match unquoted.parse::<i64>() {
        Ok(i) => IntOrString::Int(i),
        Err(_) => IntOrString::Str(unquoted),
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match unquote(value).as_str() {
        "true" | "t" | "1" => Ok(true),
        "false" | "f" | "0" => Ok(false),
        other => Err(ImportError::InvalidWriteConcern(format!(
            "'{other}' is not a valid boolean"
        ))),
    }
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// Split on top-level commas, ignoring commas inside quoted strings.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match in_quote {
            Some(q) if c == q => in_quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => in_quote = Some(c),
            None if c == ',' => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            None => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn majority_mode_string() {
        assert_eq!(
            parse("majority").unwrap(),
            ParsedWriteConcern::Concern(WriteConcern {
                w: 0,
                wmode: "majority".into(),
                j: false,
                fsync: false,
                wtimeout: 0,
            })
        );
    }

    #[test]
    fn zero_is_none() {
        assert_eq!(parse("0").unwrap(), ParsedWriteConcern::None);
    }

    #[test]
    fn w_zero_with_journal_is_not_none() {
        let parsed = parse("{w: 0, j: true}").unwrap();
        assert_eq!(
            parsed,
            ParsedWriteConcern::Concern(WriteConcern {
                w: 0,
                wmode: String::new(),
                j: true,
                fsync: false,
                wtimeout: 0,
            })
        );
    }

    #[test]
    fn full_object_with_string_booleans() {
        let parsed = parse(r#"{w: 3, j: "t", fsync: "f", wtimeout: 43}"#).unwrap();
        assert_eq!(
            parsed,
            ParsedWriteConcern::Concern(WriteConcern {
                w: 3,
                wmode: String::new(),
                j: true,
                fsync: false,
                wtimeout: 43,
            })
        );
    }

    #[test]
    fn invalid_boolean_fails() {
        let result = parse(r#"{w: 3, j: "rue"}"#);
        assert!(matches!(result, Err(ImportError::InvalidWriteConcern(_))));
    }

    #[test]
    fn downgrade_clears_wmode_and_sets_w_one() {
        let parsed = match parse("majority").unwrap() {
            ParsedWriteConcern::Concern(c) => c,
            ParsedWriteConcern::None => panic!("expected concern"),
        };
        let downgraded = parsed.downgrade_for_standalone();
        assert_eq!(downgraded.w, 1);
        assert!(downgraded.wmode.is_empty());
    }
}
