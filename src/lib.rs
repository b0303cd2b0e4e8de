pub mod aggregate;
pub mod analyzer;
pub mod chart;
pub mod clean;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod io_utils;
pub mod preview;
pub mod records;
pub mod report;
pub mod sample;
pub mod schema;
pub mod session;
pub mod table;
pub mod timeseries;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{CleanArgs, Cli, Commands, GenerateArgs},
    config::Settings,
    session::Session,
};

pub use crate::{
    analyzer::HealthAnalyzer,
    clean::{clean, clean_with_report},
    error::AnalysisError,
    records::{PatientTable, RawTable},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("health_analyzer", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => handle_generate(&args),
        Commands::Clean(args) => handle_clean(&args),
        Commands::Summary(args) => report::execute_summary(&args),
        Commands::Aggregate(args) => report::execute_aggregate(&args),
        Commands::Admissions(args) => report::execute_admissions(&args),
        Commands::Satisfaction(args) => report::execute_satisfaction(&args),
        Commands::Stay(args) => report::execute_stay(&args),
        Commands::Chart(args) => report::execute_chart(&args),
        Commands::Preview(args) => preview::execute(&args),
    }
}

fn handle_generate(args: &GenerateArgs) -> Result<()> {
    let settings = Settings::load_optional(args.config.as_deref())?;
    let rows = args.rows.unwrap_or(settings.sample.rows);
    let seed = args.seed.unwrap_or(settings.sample.seed);
    let table = sample::generate_sample(rows, seed).context("Generating sample dataset")?;
    let output = args.output.as_deref();
    let delimiter = io_utils::resolve_output_delimiter(
        output,
        args.output_delimiter,
        io_utils::DEFAULT_CSV_DELIMITER,
    );
    let encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
    io_utils::write_csv(output, &table, delimiter, encoding)?;
    info!(
        "Generated {} sample row(s) with seed {} -> {}",
        table.len(),
        seed,
        describe_output(output)
    );
    Ok(())
}

fn handle_clean(args: &CleanArgs) -> Result<()> {
    let session = Session::open(&args.source, &args.filters)?;
    let cleaned = session.analyzer.table();
    if args.table {
        table::print_table(&cleaned.headers(), &cleaned.display_rows());
    } else {
        let output = args.output.as_deref();
        let delimiter =
            io_utils::resolve_output_delimiter(output, args.output_delimiter, session.delimiter);
        let encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
        io_utils::write_csv(output, &cleaned.to_raw(), delimiter, encoding)?;
        info!(
            "Wrote {} cleaned row(s) to {} (delimiter '{}')",
            cleaned.len(),
            describe_output(output),
            printable_delimiter(delimiter)
        );
    }
    Ok(())
}

fn describe_output(path: Option<&std::path::Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdout".into())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
