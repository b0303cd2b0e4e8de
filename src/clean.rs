//! Cleaning pass that turns a [`RawTable`] into a typed [`PatientTable`].
//!
//! The pass never fails: cells that cannot be parsed for their column kind
//! become absent values and are tallied in the [`CleaningReport`].

use std::collections::BTreeMap;

use itertools::Itertools;
use log::debug;

use crate::{
    data::{Value, is_missing_token, parse_naive_date, parse_number},
    records::{PatientTable, RawTable, Row},
    schema::{ColumnKind, ColumnMeta, Field, Schema, infer_kind, resolve_headers},
};

pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub duplicates_dropped: usize,
    /// Non-empty cells per column that could not be parsed.
    pub degraded_cells: BTreeMap<String, usize>,
    /// Absent cells replaced with the `Unknown` label.
    pub filled_unknown: BTreeMap<String, usize>,
    pub discarded_columns: Vec<String>,
}

pub fn clean(raw: &RawTable) -> PatientTable {
    clean_with_report(raw).0
}

pub fn clean_with_report(raw: &RawTable) -> (PatientTable, CleaningReport) {
    let mut report = CleaningReport {
        rows_in: raw.len(),
        ..CleaningReport::default()
    };
    let headers = resolve_headers(&raw.headers);

    let mut sources = Vec::with_capacity(headers.len());
    let mut columns = Vec::with_capacity(headers.len() + 1);
    for (idx, name) in headers.iter().enumerate() {
        let meta = match Field::from_name(name) {
            Some(Field::LengthOfStay) => {
                report.discarded_columns.push(name.clone());
                continue;
            }
            Some(field) => ColumnMeta::for_field(field),
            None => ColumnMeta::passthrough(name.clone(), infer_kind(raw.column_values(idx))),
        };
        sources.push(idx);
        columns.push(meta);
    }

    let mut rows: Vec<Row> = raw
        .rows
        .iter()
        .map(|raw_row| {
            sources
                .iter()
                .zip(&columns)
                .map(|(&source, column)| {
                    let cell = raw_row.get(source).map(String::as_str).unwrap_or("");
                    clean_cell(cell, column, &mut report)
                })
                .collect()
        })
        .collect();

    let mut schema = Schema { columns };
    derive_length_of_stay(&mut schema, &mut rows);

    let before = rows.len();
    let rows = deduplicate(&schema, rows);
    report.duplicates_dropped = before - rows.len();
    report.rows_out = rows.len();

    for (column, count) in &report.degraded_cells {
        debug!("Column '{column}': {count} value(s) could not be parsed and were marked unknown");
    }
    for (column, count) in &report.filled_unknown {
        debug!("Column '{column}': filled {count} missing value(s) with '{UNKNOWN_LABEL}'");
    }
    if report.duplicates_dropped > 0 {
        debug!("Dropped {} duplicate row(s)", report.duplicates_dropped);
    }

    (PatientTable::new(schema, rows), report)
}

fn clean_cell(raw: &str, column: &ColumnMeta, report: &mut CleaningReport) -> Option<Value> {
    let missing = is_missing_token(raw);
    let value = match column.kind {
        _ if missing => None,
        ColumnKind::Date => parse_naive_date(raw).ok().map(Value::Date),
        ColumnKind::Number => parse_number(raw).map(Value::number),
        ColumnKind::Text => match column.field {
            Some(Field::Outcome) => {
                let lowered = raw.trim().to_lowercase();
                (!lowered.is_empty()).then_some(Value::Text(lowered))
            }
            _ => Some(Value::text(raw)),
        },
    };
    if value.is_none() && !missing {
        *report.degraded_cells.entry(column.name.clone()).or_insert(0) += 1;
    }
    match (value, column.field) {
        (None, Some(Field::Gender | Field::Department)) => {
            *report.filled_unknown.entry(column.name.clone()).or_insert(0) += 1;
            Some(Value::text(UNKNOWN_LABEL))
        }
        (value, _) => value,
    }
}

fn derive_length_of_stay(schema: &mut Schema, rows: &mut [Row]) {
    let (Some(admitted), Some(discharged)) = (
        schema.field_index(Field::AdmissionDate),
        schema.field_index(Field::DischargeDate),
    ) else {
        return;
    };
    schema.columns.push(ColumnMeta::for_field(Field::LengthOfStay));
    for row in rows.iter_mut() {
        let stay = match (
            PatientTable::cell(row, admitted).and_then(Value::as_date),
            PatientTable::cell(row, discharged).and_then(Value::as_date),
        ) {
            (Some(start), Some(end)) => Some(Value::number((end - start).num_days() as f64)),
            _ => None,
        };
        row.push(stay);
    }
}

/// First occurrence wins. Keyed on `(patient_id, admission_date)` when both
/// columns exist, on the whole row otherwise.
fn deduplicate(schema: &Schema, rows: Vec<Row>) -> Vec<Row> {
    match (
        schema.field_index(Field::PatientId),
        schema.field_index(Field::AdmissionDate),
    ) {
        (Some(patient), Some(admitted)) => rows
            .into_iter()
            .unique_by(|row| (row[patient].clone(), row[admitted].clone()))
            .collect(),
        _ => rows.into_iter().unique().collect(),
    }
}
