//! TSV record reader: one record per line, bare-tab separated, no quoting.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, Lines};
use tokio::sync::mpsc;

use crate::error::{ImportError, ParseError, Result};
use crate::fields::FieldList;
use crate::reader::{tokenizer, RawRecord, RecordReader};
use crate::source::SourceStream;

pub struct TsvReader {
    lines: Lines<SourceStream>,
    fields: Option<FieldList>,
}

impl TsvReader {
    pub fn new(stream: SourceStream, fields: Option<FieldList>) -> Self {
        Self {
            lines: stream.lines(),
            fields,
        }
    }
}

#[async_trait]
impl RecordReader for TsvReader {
    async fn read_headers_from_source(&mut self) -> Result<Vec<String>> {
        let line = self
            .lines
            .next_line()
            .await?
            .ok_or_else(|| ImportError::Parse(ParseError::UnexpectedEof(
                "source is empty; no header line to read".into(),
            )))?;
        let tokens = tokenizer::tokenize_tsv_line(&line);
        let field_list = FieldList::new(tokens).validate()?;
        let headers = field_list.as_slice().to_vec();
        self.fields = Some(field_list);
        Ok(headers)
    }

    fn get_headers(&self) -> Vec<String> {
        self.fields
            .as_ref()
            .map(|f| f.as_slice().to_vec())
            .unwrap_or_default()
    }

    async fn stream_documents(&mut self, out: mpsc::Sender<RawRecord>) -> Result<()> {
        while let Some(line) = self.lines.next_line().await? {
            if line.is_empty() {
                continue;
            }
            let tokens = tokenizer::tokenize_tsv_line(&line);
            if out.send(RawRecord::Tokens(tokens)).await.is_err() {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    fn stream_from(s: &'static str) -> SourceStream {
        Box::new(BufReader::new(std::io::Cursor::new(s.as_bytes())))
    }

    #[tokio::test]
    async fn streams_tab_separated_records() {
        let mut reader = TsvReader::new(stream_from("1\t2\t3\n4\t5\t6\n"), Some(FieldList::new(vec!["a".into(), "b".into(), "c".into()])));
        let (tx, mut rx) = mpsc::channel(8);
        reader.stream_documents(tx).await.unwrap();

        let mut rows = Vec::new();
        while let Some(RawRecord::Tokens(tokens)) = rx.recv().await {
            rows.push(tokens);
        }
        assert_eq!(rows, vec![vec!["1", "2", "3"], vec!["4", "5", "6"]]);
    }
}
