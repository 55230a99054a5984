//! mongoimport-rs
//!
//! A concurrent bulk import pipeline for loading CSV/TSV/JSON records into a
//! MongoDB collection.

use std::io::IsTerminal;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

mod cli;
mod config;
mod connection;
mod document;
mod error;
mod fields;
mod pipeline;
mod reader;
mod record;
mod source;
mod upsert;
mod utils;
mod value_parser;
mod write_concern;
mod writer;

use cli::CliArgs;
use config::FileDefaults;
use connection::ConnectionManager;
use error::Result;
use pipeline::{PipelineCoordinator, ProgressTracker};
use reader::csv::CsvReader;
use reader::json::JsonReader;
use reader::tsv::TsvReader;
use reader::RecordReader;
use writer::{MongoWriter, Writer};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = CliArgs::parse();
    let defaults = FileDefaults::load_from_file(args.config.as_deref())?;

    initialize_logging(&args, &defaults);

    let pipeline_config = args.resolve(&defaults)?;

    let connection = ConnectionManager::connect(&pipeline_config.uri).await?;
    let writer: Arc<dyn Writer> = Arc::new(MongoWriter::new(
        &connection,
        &pipeline_config.db,
        &pipeline_config.collection,
    ));

    if pipeline_config.drop {
        info!(collection = %pipeline_config.collection, "dropping destination collection");
        writer.drop_collection().await?;
    }

    let source_path = source::resolve_path(
        pipeline_config
            .file
            .as_ref()
            .and_then(|p| p.to_str()),
    );
    let stream = source::open(source_path.as_deref()).await?;

    let reader: Box<dyn RecordReader> = match pipeline_config.input_type {
        config::InputType::Csv => {
            Box::new(CsvReader::new(stream, fields_for(&pipeline_config)))
        }
        config::InputType::Tsv => {
            Box::new(TsvReader::new(stream, fields_for(&pipeline_config)))
        }
        config::InputType::Json => Box::new(JsonReader::new(stream, pipeline_config.json_array)),
    };

    let progress_enabled = !args.quiet && std::io::stdout().is_terminal();
    let progress = ProgressTracker::new(progress_enabled);

    let coordinator = PipelineCoordinator::new(pipeline_config, reader, writer, progress);
    let outcome = coordinator.run().await?;

    println!("{} document(s) imported", outcome.documents_imported);

    if let Some(err) = outcome.error {
        Err(err)
    } else {
        Ok(())
    }
}

fn fields_for(config: &config::PipelineConfig) -> Option<fields::FieldList> {
    if config.header_line {
        None
    } else {
        Some(fields::FieldList::new(config.fields.clone()))
    }
}

fn initialize_logging(args: &CliArgs, defaults: &FileDefaults) {
    let level = args.log_level(defaults);

    let subscriber = tracing_subscriber::fmt().with_max_level(level).with_target(false);

    if defaults.logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
