//! Configuration management for the import pipeline.
//!
//! This module handles loading and validating configuration from two sources:
//! - an optional TOML config file supplying defaults
//! - command-line arguments, which always take precedence
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Configuration file
//! 3. Built-in defaults

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ImportError, Result};

/// Source format of the input records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Csv,
    Tsv,
    Json,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Csv => "csv",
            InputType::Tsv => "tsv",
            InputType::Json => "json",
        }
    }

    pub fn is_tabular(&self) -> bool {
        matches!(self, InputType::Csv | InputType::Tsv)
    }
}

impl std::str::FromStr for InputType {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(InputType::Csv),
            "tsv" => Ok(InputType::Tsv),
            "json" => Ok(InputType::Json),
            other => Err(ImportError::InvalidConfiguration(format!(
                "unrecognized input type '{other}', expected one of csv, tsv, json"
            ))),
        }
    }
}

/// Fully resolved settings for a single import run.
///
/// Built by layering CLI arguments over an optional config file's
/// [`FileDefaults`] over the hard-coded defaults below, then validated.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub uri: String,
    pub db: String,
    pub collection: String,
    pub input_type: InputType,
    pub file: Option<PathBuf>,
    pub header_line: bool,
    pub fields: Vec<String>,
    pub json_array: bool,
    pub drop: bool,
    pub upsert: bool,
    pub upsert_fields: Vec<String>,
    pub ignore_blanks: bool,
    pub stop_on_error: bool,
    pub maintain_insertion_order: bool,
    pub write_concern: String,
    pub batch_size: usize,
    pub num_decoding_workers: usize,
    pub num_insertion_workers: usize,
}

impl PipelineConfig {
    /// Validate cross-field constraints that can't be expressed by `clap` alone:
    /// header-line and an explicit field list are mutually exclusive, ordered
    /// mode pins the insertion worker count to one, and every worker/batch
    /// count must be positive.
    pub fn validate(&self) -> Result<()> {
        if self.input_type.is_tabular() && self.header_line && !self.fields.is_empty() {
            return Err(ImportError::InvalidConfiguration(
                "header-line and an explicit field list are mutually exclusive".into(),
            ));
        }
        if !self.input_type.is_tabular() && self.header_line {
            return Err(ImportError::InvalidConfiguration(
                "header-line only applies to csv/tsv input".into(),
            ));
        }
        if self.input_type.is_tabular() && !self.header_line && self.fields.is_empty() {
            return Err(ImportError::InvalidConfiguration(
                "csv/tsv input requires either header-line or an explicit field list".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ImportError::InvalidConfiguration(
                "batch-size must be at least 1".into(),
            ));
        }
        if self.num_decoding_workers == 0 {
            return Err(ImportError::InvalidConfiguration(
                "num-decoding-workers must be at least 1".into(),
            ));
        }
        if self.num_insertion_workers == 0 {
            return Err(ImportError::InvalidConfiguration(
                "num-insertion-workers must be at least 1".into(),
            ));
        }
        if self.maintain_insertion_order && self.num_insertion_workers > 1 {
            return Err(ImportError::InvalidConfiguration(
                "maintain-insertion-order requires exactly one insertion worker".into(),
            ));
        }
        if self.upsert && self.upsert_fields.is_empty() {
            return Err(ImportError::InvalidConfiguration(
                "upsert requires at least one upsert-fields entry".into(),
            ));
        }
        if !crate::utils::validate::is_valid_database_name(&self.db) {
            return Err(ImportError::InvalidConfiguration(format!(
                "invalid database name '{}'",
                self.db
            )));
        }
        if !crate::utils::validate::is_valid_collection_name(&self.collection) {
            return Err(ImportError::InvalidConfiguration(format!(
                "invalid collection name '{}'",
                self.collection
            )));
        }
        Ok(())
    }

    /// Number of decoding workers to use when not overridden: the host's
    /// available parallelism.
    pub fn default_worker_count() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    /// Derive a collection name from an input file's basename, stripping the
    /// last extension.
    pub fn collection_name_from_path(path: &Path) -> Option<String> {
        let stem = path.file_stem()?.to_str()?;
        if stem.is_empty() { None } else { Some(stem.to_string()) }
    }
}

/// Optional defaults read from a TOML config file. Any field left unset
/// falls through to the hard-coded default; any field the CLI sets
/// explicitly overrides this file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileDefaults {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub write_concern: Option<String>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub num_decoding_workers: Option<usize>,
    #[serde(default)]
    pub num_insertion_workers: Option<usize>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FileDefaults {
    /// Load defaults from a TOML file. A missing path is not an error: it
    /// simply yields the all-default `FileDefaults`.
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let Some(config_path) = path else {
            return Ok(Self::default());
        };
        if !config_path.exists() {
            return Err(ImportError::InvalidConfiguration(format!(
                "config file '{}' does not exist",
                config_path.display()
            )));
        }
        let content = fs::read_to_string(config_path).map_err(|e| {
            ImportError::InvalidConfiguration(format!(
                "failed to read config file '{}': {e}",
                config_path.display()
            ))
        })?;
        let defaults: FileDefaults = toml::from_str(&content).map_err(|e| {
            ImportError::InvalidConfiguration(format!(
                "failed to parse config file '{}': {e}",
                config_path.display()
            ))
        })?;
        Ok(defaults)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

/// Log level options.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[inline]
fn default_log_level() -> LogLevel {
    LogLevel::Info
}

#[inline]
fn default_log_timestamps() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> PipelineConfig {
        PipelineConfig {
            uri: "mongodb://localhost:27017".into(),
            db: "test".into(),
            collection: "coll".into(),
            input_type: InputType::Json,
            file: None,
            header_line: false,
            fields: Vec::new(),
            json_array: false,
            drop: false,
            upsert: false,
            upsert_fields: Vec::new(),
            ignore_blanks: false,
            stop_on_error: false,
            maintain_insertion_order: false,
            write_concern: "1".into(),
            batch_size: 1000,
            num_decoding_workers: 4,
            num_insertion_workers: 4,
        }
    }

    #[test]
    fn rejects_header_line_with_explicit_fields() {
        let mut cfg = base_config();
        cfg.input_type = InputType::Csv;
        cfg.header_line = true;
        cfg.fields = vec!["a".into()];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_ordered_mode_with_multiple_inserters() {
        let mut cfg = base_config();
        cfg.maintain_insertion_order = true;
        cfg.num_insertion_workers = 4;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_upsert_without_fields() {
        let mut cfg = base_config();
        cfg.upsert = true;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn accepts_well_formed_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn derives_collection_from_path() {
        let path = Path::new("/data/imports/customers.csv");
        assert_eq!(
            PipelineConfig::collection_name_from_path(path),
            Some("customers".to_string())
        );
    }

    #[test]
    fn loads_defaults_when_no_path_given() {
        let defaults = FileDefaults::load_from_file(None).unwrap();
        assert!(defaults.uri.is_none());
        assert_eq!(defaults.logging.level, LogLevel::Info);
    }
}
