use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    aggregate::{AggregateVerb, GroupKey},
    timeseries::Frequency,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Clean hospital patient records and summarize outcomes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a seeded synthetic patient dataset as CSV
    Generate(GenerateArgs),
    /// Clean a dataset and write the normalized table
    Clean(CleanArgs),
    /// Outcome counts and percentages, optionally grouped
    Summary(SummaryArgs),
    /// Group rows and aggregate them with count, mean, sum, min, max, or median
    Aggregate(AggregateArgs),
    /// Admissions per calendar period, with empty periods included
    Admissions(AdmissionsArgs),
    /// Average satisfaction per department
    Satisfaction(SatisfactionArgs),
    /// Length-of-stay statistics
    Stay(StayArgs),
    /// Emit a JSON chart description
    Chart(ChartArgs),
    /// Preview the first rows of the cleaned, filtered dataset
    Preview(PreviewArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct InputArgs {
    /// Input CSV file (`-` for stdin); the sample dataset is used when omitted
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML settings file
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Keep rows with age at or above this value
    #[arg(long = "age-min")]
    pub age_min: Option<f64>,
    /// Keep rows with age at or below this value
    #[arg(long = "age-max")]
    pub age_max: Option<f64>,
    /// Genders to keep (repeatable or comma-separated)
    #[arg(long = "gender", action = clap::ArgAction::Append)]
    pub genders: Vec<String>,
    /// Departments to keep (repeatable or comma-separated)
    #[arg(long = "department", action = clap::ArgAction::Append)]
    pub departments: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum GroupBy {
    Department,
    Gender,
    Outcome,
    Diagnosis,
    AgeBucket,
}

impl GroupBy {
    pub fn to_key(self, age_bin_width: f64) -> GroupKey {
        match self {
            GroupBy::Department => GroupKey::Department,
            GroupBy::Gender => GroupKey::Gender,
            GroupBy::Outcome => GroupKey::Outcome,
            GroupBy::Diagnosis => GroupKey::Diagnosis,
            GroupBy::AgeBucket => GroupKey::AgeBucket {
                width: age_bin_width,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum Aggregation {
    Count,
    Mean,
    Sum,
    Min,
    Max,
    Median,
}

impl From<Aggregation> for AggregateVerb {
    fn from(value: Aggregation) -> Self {
        match value {
            Aggregation::Count => AggregateVerb::Count,
            Aggregation::Mean => AggregateVerb::Mean,
            Aggregation::Sum => AggregateVerb::Sum,
            Aggregation::Min => AggregateVerb::Min,
            Aggregation::Max => AggregateVerb::Max,
            Aggregation::Median => AggregateVerb::Median,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum ChartKind {
    OutcomesByAge,
    Admissions,
    Satisfaction,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Number of rows to generate
    #[arg(long)]
    pub rows: Option<usize>,
    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,
    /// YAML settings file
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Delimiter to use for output
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding for the output file/stdout (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub source: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Delimiter to use for output (defaults to input delimiter)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding for the output file/stdout (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
    /// Render the cleaned rows as a text table on stdout
    #[arg(long = "table")]
    pub table: bool,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub source: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Break outcome counts down by this key
    #[arg(long = "by", value_enum)]
    pub by: Option<GroupBy>,
    /// Bucket width when grouping by age bucket
    #[arg(long = "age-bin-width")]
    pub age_bin_width: Option<f64>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct AggregateArgs {
    #[command(flatten)]
    pub source: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Group key
    #[arg(long = "by", value_enum)]
    pub by: GroupBy,
    /// Aggregation to apply to each group
    #[arg(long = "agg", value_enum, default_value_t = Aggregation::Count)]
    pub agg: Aggregation,
    /// Numeric column aggregated by every verb except count
    #[arg(long = "value")]
    pub value: Option<String>,
    /// Bucket width when grouping by age bucket
    #[arg(long = "age-bin-width")]
    pub age_bin_width: Option<f64>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct AdmissionsArgs {
    #[command(flatten)]
    pub source: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Bucket size for the time axis
    #[arg(long = "freq", value_enum)]
    pub frequency: Option<Frequency>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct SatisfactionArgs {
    #[command(flatten)]
    pub source: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct StayArgs {
    #[command(flatten)]
    pub source: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct ChartArgs {
    #[command(flatten)]
    pub source: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Which chart to describe
    #[arg(long = "kind", value_enum)]
    pub kind: ChartKind,
    /// Bucket size for the admissions chart
    #[arg(long = "freq", value_enum)]
    pub frequency: Option<Frequency>,
    /// Bucket width for the age chart
    #[arg(long = "age-bin-width")]
    pub age_bin_width: Option<f64>,
    /// Output JSON file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub source: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Number of rows to display
    #[arg(long)]
    pub rows: Option<usize>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_delimiter_accepts_names() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("pipe"), Ok(b'|'));
        assert!(parse_delimiter("ab").is_err());
    }

    #[test]
    fn aggregate_args_parse_verb_and_key() {
        let cli = Cli::try_parse_from([
            "health-analyzer",
            "aggregate",
            "--by",
            "age-bucket",
            "--agg",
            "mean",
            "--value",
            "satisfaction",
            "--gender",
            "Male,Female",
        ])
        .unwrap();
        let Commands::Aggregate(args) = cli.command else {
            panic!("expected aggregate command");
        };
        assert_eq!(args.by, GroupBy::AgeBucket);
        assert_eq!(AggregateVerb::from(args.agg), AggregateVerb::Mean);
        assert_eq!(args.filters.genders, vec!["Male,Female".to_string()]);
        assert!(args.source.input.is_none());
    }
}
