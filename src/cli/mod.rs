//! Command-line interface for the import tool.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{FileDefaults, InputType, PipelineConfig};
use crate::error::Result;
use crate::fields::FieldList;

/// Concurrent bulk import pipeline for loading CSV/TSV/JSON records into a
/// MongoDB collection.
#[derive(Parser, Debug)]
#[command(name = "mongoimport-rs", version, about)]
pub struct CliArgs {
    /// MongoDB connection URI.
    #[arg(long, value_name = "URI")]
    pub uri: Option<String>,

    /// Destination database.
    #[arg(short = 'd', long, value_name = "NAME")]
    pub db: Option<String>,

    /// Destination collection. Derived from the input file name if omitted.
    #[arg(short = 'c', long, value_name = "NAME")]
    pub collection: Option<String>,

    /// Input format.
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub input_type: Option<InputTypeArg>,

    /// Input file path. Reads standard input if omitted.
    #[arg(short = 'f', long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Treat the first line of a CSV/TSV source as its field names.
    #[arg(long)]
    pub header_line: bool,

    /// Comma-separated field list (CSV/TSV only); mutually exclusive with `--header-line`.
    #[arg(long, value_name = "F1,F2,...")]
    pub fields: Option<String>,

    /// Path to a newline-separated field list file.
    #[arg(long, value_name = "FILE")]
    pub field_file: Option<PathBuf>,

    /// Treat the JSON source as a single streamed top-level array.
    #[arg(long)]
    pub json_array: bool,

    /// Drop the destination collection before importing.
    #[arg(long)]
    pub drop: bool,

    /// Upsert instead of insert.
    #[arg(long)]
    pub upsert: bool,

    /// Comma-separated dotted key paths used to build the upsert selector.
    #[arg(long, value_name = "F1,F2,...")]
    pub upsert_fields: Option<String>,

    /// Drop empty-string fields (tabular input only).
    #[arg(long)]
    pub ignore_blanks: bool,

    /// Abort the import on the first write error.
    #[arg(long)]
    pub stop_on_error: bool,

    /// Preserve source ordering in the destination collection.
    #[arg(long)]
    pub maintain_insertion_order: bool,

    /// Write concern: a bare string ("majority"), an integer, or an object
    /// literal (`{w: 2, j: true}`).
    #[arg(long, value_name = "CONCERN")]
    pub write_concern: Option<String>,

    /// Documents per bulk write command.
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Number of decode workers.
    #[arg(long, value_name = "N")]
    pub num_decoding_workers: Option<usize>,

    /// Number of insertion workers.
    #[arg(long, value_name = "N")]
    pub num_insertion_workers: Option<usize>,

    /// Path to a TOML config file supplying defaults for unset options.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose logging (debug level).
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose logging (trace level).
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Suppress the progress bar even on an interactive terminal.
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum InputTypeArg {
    Csv,
    Tsv,
    Json,
}

impl From<InputTypeArg> for InputType {
    fn from(value: InputTypeArg) -> Self {
        match value {
            InputTypeArg::Csv => InputType::Csv,
            InputTypeArg::Tsv => InputType::Tsv,
            InputTypeArg::Json => InputType::Json,
        }
    }
}

impl CliArgs {
    /// Layer these arguments over a config file's defaults and the hard-coded
    /// defaults, producing a fully resolved, validated [`PipelineConfig`].
    pub fn resolve(&self, defaults: &FileDefaults) -> Result<PipelineConfig> {
        let input_type = self.input_type.map(InputType::from).unwrap_or(InputType::Json);

        let fields = self.resolve_fields()?;

        let uri = self
            .uri
            .clone()
            .or_else(|| defaults.uri.clone())
            .unwrap_or_else(|| "mongodb://localhost:27017".to_string());

        let write_concern = self
            .write_concern
            .clone()
            .or_else(|| defaults.write_concern.clone())
            .unwrap_or_else(|| "1".to_string());

        let batch_size = self
            .batch_size
            .or(defaults.batch_size)
            .unwrap_or(1000);

        let num_decoding_workers = self
            .num_decoding_workers
            .or(defaults.num_decoding_workers)
            .unwrap_or_else(PipelineConfig::default_worker_count);

        let num_insertion_workers = self
            .num_insertion_workers
            .or(defaults.num_insertion_workers)
            .unwrap_or_else(PipelineConfig::default_worker_count);

        let collection = match &self.collection {
            Some(name) => name.clone(),
            None => self
                .file
                .as_deref()
                .and_then(PipelineConfig::collection_name_from_path)
                .ok_or_else(|| {
                    crate::error::ImportError::InvalidConfiguration(
                        "collection must be given explicitly when reading from stdin".into(),
                    )
                })?,
        };

        let config = PipelineConfig {
            uri,
            db: self.db.clone().unwrap_or_default(),
            collection,
            input_type,
            file: self.file.clone(),
            header_line: self.header_line,
            fields,
            json_array: self.json_array,
            drop: self.drop,
            upsert: self.upsert,
            upsert_fields: self
                .upsert_fields
                .as_deref()
                .map(|s| FieldList::from_comma_separated(s).as_slice().to_vec())
                .unwrap_or_default(),
            ignore_blanks: self.ignore_blanks,
            stop_on_error: self.stop_on_error,
            maintain_insertion_order: self.maintain_insertion_order,
            write_concern,
            batch_size,
            num_decoding_workers,
            num_insertion_workers,
        };

        config.validate()?;
        Ok(config)
    }

    fn resolve_fields(&self) -> Result<Vec<String>> {
        if let Some(path) = &self.field_file {
            let content = std::fs::read_to_string(path).map_err(|e| {
                crate::error::ImportError::InvalidConfiguration(format!(
                    "failed to read field file '{}': {e}",
                    path.display()
                ))
            })?;
            return Ok(FieldList::from_lines(&content).as_slice().to_vec());
        }
        if let Some(raw) = &self.fields {
            return Ok(FieldList::from_comma_separated(raw).as_slice().to_vec());
        }
        Ok(Vec::new())
    }

    /// The effective tracing level, given the verbosity flags and a config
    /// file's logging defaults.
    pub fn log_level(&self, defaults: &FileDefaults) -> tracing::Level {
        if self.very_verbose {
            tracing::Level::TRACE
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            defaults.logging.level.to_tracing_level()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn parses_minimal_args() {
        let args = parse(&["mongoimport-rs", "--db", "test", "--file", "data.json"]);
        assert_eq!(args.db.as_deref(), Some("test"));
    }

    #[test]
    fn resolve_derives_collection_from_file_name() {
        let args = parse(&[
            "mongoimport-rs",
            "--db",
            "test",
            "--file",
            "people.csv",
            "--input-type",
            "csv",
            "--header-line",
        ]);
        let config = args.resolve(&FileDefaults::default()).unwrap();
        assert_eq!(config.collection, "people");
        assert_eq!(config.input_type, InputType::Csv);
    }

    #[test]
    fn resolve_fails_without_collection_on_stdin() {
        let args = parse(&["mongoimport-rs", "--db", "test"]);
        assert!(args.resolve(&FileDefaults::default()).is_err());
    }

    #[test]
    fn resolve_parses_comma_separated_fields() {
        let args = parse(&[
            "mongoimport-rs",
            "--db",
            "test",
            "--collection",
            "people",
            "--input-type",
            "csv",
            "--fields",
            "a,b,c",
        ]);
        let config = args.resolve(&FileDefaults::default()).unwrap();
        assert_eq!(config.fields, vec!["a", "b", "c"]);
    }

    #[test]
    fn verbosity_flags_raise_log_level() {
        let args = parse(&["mongoimport-rs", "--db", "test", "--collection", "c", "-v"]);
        assert_eq!(args.log_level(&FileDefaults::default()), tracing::Level::DEBUG);
    }
}
