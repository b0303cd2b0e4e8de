use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    analyzer::HealthAnalyzer,
    cli::{FilterArgs, InputArgs},
    config::Settings,
    filter::RowFilter,
    io_utils,
    records::RawTable,
    sample::generate_sample,
};

/// A loaded, cleaned and filtered dataset plus the settings it was loaded with.
pub struct Session {
    pub settings: Settings,
    pub analyzer: HealthAnalyzer,
    pub delimiter: u8,
}

impl Session {
    pub fn open(source: &InputArgs, filters: &FilterArgs) -> Result<Self> {
        let settings = Settings::load_optional(source.config.as_deref())?;
        let (raw, delimiter) = load_raw(source, &settings)?;
        let analyzer = HealthAnalyzer::new(&raw);
        let report = analyzer.cleaning_report();
        info!(
            "Cleaned {} row(s) into {} row(s) ({} duplicate(s) dropped)",
            report.rows_in, report.rows_out, report.duplicates_dropped
        );
        if !report.discarded_columns.is_empty() {
            debug!(
                "Discarded input column(s) recomputed during cleaning: {:?}",
                report.discarded_columns
            );
        }

        let filter = build_filter(filters)?;
        let analyzer = if filter.is_empty() {
            analyzer
        } else {
            let filtered = analyzer.filtered(&filter);
            info!(
                "Filters kept {} of {} row(s)",
                filtered.table().len(),
                analyzer.table().len()
            );
            filtered
        };
        Ok(Self {
            settings,
            analyzer,
            delimiter,
        })
    }
}

fn load_raw(source: &InputArgs, settings: &Settings) -> Result<(RawTable, u8)> {
    match &source.input {
        Some(path) => {
            let delimiter = io_utils::resolve_input_delimiter(path, source.delimiter);
            let encoding = io_utils::resolve_encoding(source.input_encoding.as_deref())?;
            info!(
                "Reading '{}' with delimiter '{}'",
                path.display(),
                crate::printable_delimiter(delimiter)
            );
            let raw = io_utils::read_raw_table_from_path(path, delimiter, encoding)?;
            Ok((raw, delimiter))
        }
        None => {
            info!(
                "No input given; generating {} sample row(s) with seed {}",
                settings.sample.rows, settings.sample.seed
            );
            let raw = generate_sample(settings.sample.rows, settings.sample.seed)
                .context("Generating sample dataset")?;
            Ok((
                raw,
                source.delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER),
            ))
        }
    }
}

pub fn build_filter(args: &FilterArgs) -> Result<RowFilter> {
    Ok(RowFilter::default()
        .with_age_bounds(args.age_min, args.age_max)?
        .with_genders(&args.genders)
        .with_departments(&args.departments))
}
