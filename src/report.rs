//! Command handlers that print aggregate reports.
//!
//! Each handler opens a [`Session`], runs one query and prints either a text
//! table or the serialized result.

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use serde_json::json;

use crate::{
    aggregate::{AggregateVerb, GroupAggregate, OutcomeCrosstab, OutcomeSummary, StaySummary},
    chart::ChartSpec,
    cli::{
        AdmissionsArgs, AggregateArgs, ChartArgs, ChartKind, OutputFormat, SatisfactionArgs,
        StayArgs, SummaryArgs,
    },
    data::{Value, format_number},
    io_utils,
    session::Session,
    table,
    timeseries::PeriodCount,
};

pub const NO_CHART_DATA: &str = "Insufficient data for this chart.";
pub const NO_ADMISSION_DATES: &str = "No admission_date available.";
pub const NO_SATISFACTION_DATA: &str = "No satisfaction data available.";

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Serializing report")?;
    println!("{rendered}");
    Ok(())
}

fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

fn format_optional(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}

pub fn execute_summary(args: &SummaryArgs) -> Result<()> {
    let session = Session::open(&args.source, &args.filters)?;
    match args.by {
        None => {
            let summary = session.analyzer.summarize_outcomes()?;
            match args.format {
                OutputFormat::Json => print_json(&summary)?,
                OutputFormat::Table => print_outcome_summary(&summary),
            }
            info!(
                "Summarized {} outcome value(s) over {} row(s)",
                summary.outcomes.len(),
                summary.total
            );
        }
        Some(by) => {
            let width = args.age_bin_width.unwrap_or(session.settings.age_bin_width);
            let crosstab = session.analyzer.summarize_outcomes_by(by.to_key(width))?;
            match args.format {
                OutputFormat::Json => print_json(&json!({
                    "counts": crosstab,
                    "percentages": crosstab.percentages(),
                }))?,
                OutputFormat::Table => print_crosstab(&crosstab),
            }
            info!(
                "Summarized outcomes across {} {} group(s)",
                crosstab.groups.len(),
                crosstab.key
            );
        }
    }
    Ok(())
}

fn print_outcome_summary(summary: &OutcomeSummary) {
    let headers = vec![
        "outcome".to_string(),
        "count".to_string(),
        "percent".to_string(),
    ];
    let rows: Vec<Vec<String>> = summary
        .outcomes
        .iter()
        .map(|entry| {
            vec![
                entry.label().to_string(),
                entry.count.to_string(),
                format_percent(entry.fraction),
            ]
        })
        .collect();
    table::print_table(&headers, &rows);
}

fn print_crosstab(crosstab: &OutcomeCrosstab) {
    let mut headers = vec![crosstab.key.clone()];
    headers.extend(crosstab.outcomes.iter().cloned());

    let counts: Vec<Vec<String>> = crosstab
        .groups
        .iter()
        .zip(&crosstab.counts)
        .map(|(group, row)| {
            std::iter::once(group.as_display())
                .chain(row.iter().map(|count| count.to_string()))
                .collect()
        })
        .collect();
    table::print_table(&headers, &counts);
    println!();

    let percentages: Vec<Vec<String>> = crosstab
        .groups
        .iter()
        .zip(crosstab.percentages())
        .map(|(group, row)| {
            std::iter::once(group.as_display())
                .chain(row.into_iter().map(format_percent))
                .collect()
        })
        .collect();
    table::print_table(&headers, &percentages);
}

pub fn execute_aggregate(args: &AggregateArgs) -> Result<()> {
    let session = Session::open(&args.source, &args.filters)?;
    let width = args.age_bin_width.unwrap_or(session.settings.age_bin_width);
    let key = args.by.to_key(width);
    let verb = AggregateVerb::from(args.agg);
    let results = session
        .analyzer
        .aggregate_by(key, verb, args.value.as_deref())?;
    let value_header = match (verb, args.value.as_deref()) {
        (AggregateVerb::Count, _) | (_, None) => verb.name().to_string(),
        (_, Some(column)) => format!("{}_{}", verb.name(), column.trim().to_lowercase()),
    };
    match args.format {
        OutputFormat::Json => print_json(&results)?,
        OutputFormat::Table => print_group_values(key.label(), &value_header, &results),
    }
    info!(
        "Aggregated {} group(s) by {} with '{}'",
        results.len(),
        key.label(),
        verb.name()
    );
    Ok(())
}

fn print_group_values(key: &str, value_header: &str, results: &[GroupAggregate]) {
    let headers = vec![key.to_string(), value_header.to_string()];
    let rows: Vec<Vec<String>> = results
        .iter()
        .map(|entry| vec![entry.group.as_display(), format_optional(entry.value)])
        .collect();
    table::print_table(&headers, &rows);
}

pub fn execute_admissions(args: &AdmissionsArgs) -> Result<()> {
    let session = Session::open(&args.source, &args.filters)?;
    let frequency = args.frequency.unwrap_or(session.settings.frequency);
    let series = session.analyzer.admissions_over_time(frequency)?;
    match args.format {
        OutputFormat::Json => print_json(&series)?,
        OutputFormat::Table => print_series(&series),
    }
    info!("Computed {} {:?} admission bucket(s)", series.len(), frequency);
    Ok(())
}

fn print_series(series: &[PeriodCount]) {
    let headers = vec!["period_end".to_string(), "admissions".to_string()];
    let rows: Vec<Vec<String>> = series
        .iter()
        .map(|point| {
            vec![
                Value::Date(point.period_end).as_display(),
                point.admissions.to_string(),
            ]
        })
        .collect();
    table::print_table(&headers, &rows);
}

pub fn execute_satisfaction(args: &SatisfactionArgs) -> Result<()> {
    let session = Session::open(&args.source, &args.filters)?;
    let averages = session.analyzer.average_satisfaction_by_department();
    match args.format {
        OutputFormat::Json => print_json(&averages)?,
        OutputFormat::Table if averages.is_empty() => println!("{NO_SATISFACTION_DATA}"),
        OutputFormat::Table => print_group_values("department", "satisfaction", &averages),
    }
    info!("Averaged satisfaction for {} department(s)", averages.len());
    Ok(())
}

pub fn execute_stay(args: &StayArgs) -> Result<()> {
    let session = Session::open(&args.source, &args.filters)?;
    let summary = session.analyzer.length_of_stay_summary()?;
    match args.format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Table => print_stay_summary(&summary),
    }
    info!("Summarized {} known length(s) of stay", summary.count);
    Ok(())
}

fn print_stay_summary(summary: &StaySummary) {
    let headers = vec!["metric".to_string(), "days".to_string()];
    let rows = vec![
        vec!["count".to_string(), summary.count.to_string()],
        vec!["mean".to_string(), format_optional(summary.mean)],
        vec!["median".to_string(), format_optional(summary.median)],
        vec!["min".to_string(), format_optional(summary.min)],
        vec!["max".to_string(), format_optional(summary.max)],
    ];
    table::print_table(&headers, &rows);
}

pub fn execute_chart(args: &ChartArgs) -> Result<()> {
    let session = Session::open(&args.source, &args.filters)?;
    let analyzer = &session.analyzer;
    let (chart, notice): (Option<ChartSpec>, &str) = match args.kind {
        ChartKind::OutcomesByAge => {
            let width = args.age_bin_width.unwrap_or(session.settings.age_bin_width);
            (analyzer.outcomes_by_age_chart(width)?, NO_CHART_DATA)
        }
        ChartKind::Admissions => {
            let frequency = args.frequency.unwrap_or(session.settings.frequency);
            (analyzer.admissions_chart(frequency), NO_ADMISSION_DATES)
        }
        ChartKind::Satisfaction => (analyzer.satisfaction_chart(), NO_SATISFACTION_DATA),
    };
    let Some(chart) = chart else {
        println!("{notice}");
        info!("No {:?} chart produced", args.kind);
        return Ok(());
    };
    let mut rendered = chart.to_json().context("Serializing chart")?;
    rendered.push('\n');
    io_utils::write_text(args.output.as_deref(), &rendered, encoding_rs::UTF_8)?;
    info!(
        "Described {:?} chart with {} data point(s)",
        args.kind,
        chart.data.len()
    );
    Ok(())
}
