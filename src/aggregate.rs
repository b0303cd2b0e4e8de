//! Grouped queries over a cleaned [`PatientTable`].
//!
//! Every query reads the table without modifying it and returns an owned
//! result. Queries that need a column the table lacks return an
//! [`AnalysisError`]; the satisfaction report is the one exception and comes
//! back empty instead.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::debug;
use serde::Serialize;

use crate::{
    data::Value,
    error::AnalysisError,
    records::{PatientTable, Row},
    schema::{ColumnKind, Field, normalize_header},
};

pub const MISSING_LABEL: &str = "missing";
pub const DEFAULT_AGE_BIN_WIDTH: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroupKey {
    Department,
    Gender,
    Outcome,
    Diagnosis,
    AgeBucket { width: f64 },
}

impl GroupKey {
    pub fn field(&self) -> Field {
        match self {
            GroupKey::Department => Field::Department,
            GroupKey::Gender => Field::Gender,
            GroupKey::Outcome => Field::Outcome,
            GroupKey::Diagnosis => Field::Diagnosis,
            GroupKey::AgeBucket { .. } => Field::Age,
        }
    }

    /// Header used for the group column in rendered results.
    pub fn label(&self) -> &'static str {
        match self {
            GroupKey::AgeBucket { .. } => "age_bin",
            other => other.field().name(),
        }
    }

    fn resolve(&self, table: &PatientTable, operation: &'static str) -> Result<KeyColumn, AnalysisError> {
        if let GroupKey::AgeBucket { width } = self
            && !(width.is_finite() && *width > 0.0)
        {
            return Err(AnalysisError::InvalidBinWidth(*width));
        }
        let idx = table.require(self.field(), operation)?;
        Ok(KeyColumn { key: *self, idx })
    }
}

struct KeyColumn {
    key: GroupKey,
    idx: usize,
}

impl KeyColumn {
    fn value(&self, row: &Row) -> Option<Value> {
        let cell = PatientTable::cell(row, self.idx)?;
        match self.key {
            GroupKey::AgeBucket { width } => cell
                .as_number()
                .map(|age| Value::number(age_bin(age, width))),
            _ => Some(cell.clone()),
        }
    }
}

/// Lower edge of the fixed-width bucket holding `age`.
pub fn age_bin(age: f64, width: f64) -> f64 {
    (age / width).floor() * width
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateVerb {
    Count,
    Mean,
    Sum,
    Min,
    Max,
    Median,
}

impl AggregateVerb {
    pub fn name(self) -> &'static str {
        match self {
            AggregateVerb::Count => "count",
            AggregateVerb::Mean => "mean",
            AggregateVerb::Sum => "sum",
            AggregateVerb::Min => "min",
            AggregateVerb::Max => "max",
            AggregateVerb::Median => "median",
        }
    }

    fn reduce(self, values: &[f64], group_size: usize) -> Option<f64> {
        match self {
            AggregateVerb::Count => Some(group_size as f64),
            _ if values.is_empty() => None,
            AggregateVerb::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
            AggregateVerb::Sum => Some(values.iter().sum()),
            AggregateVerb::Min => values.iter().copied().reduce(f64::min),
            AggregateVerb::Max => values.iter().copied().reduce(f64::max),
            AggregateVerb::Median => median(values),
        }
    }

    /// Count and mean rank groups by value; the generic reductions keep key order.
    fn ranks_by_value(self) -> bool {
        matches!(self, AggregateVerb::Count | AggregateVerb::Mean)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAggregate {
    pub group: Value,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeCount {
    pub outcome: Option<String>,
    pub count: usize,
    pub fraction: f64,
}

impl OutcomeCount {
    pub fn label(&self) -> &str {
        self.outcome.as_deref().unwrap_or(MISSING_LABEL)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeSummary {
    pub total: usize,
    pub outcomes: Vec<OutcomeCount>,
}

/// Outcome counts per group: `counts[group][outcome]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeCrosstab {
    pub key: String,
    pub groups: Vec<Value>,
    pub outcomes: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl OutcomeCrosstab {
    pub fn row_total(&self, group: usize) -> usize {
        self.counts.get(group).map(|row| row.iter().sum()).unwrap_or(0)
    }

    /// Row-normalized fractions; a group with no outcomes is all zeros.
    pub fn percentages(&self) -> Vec<Vec<f64>> {
        self.counts
            .iter()
            .map(|row| {
                let total: usize = row.iter().sum();
                row.iter()
                    .map(|&count| {
                        if total == 0 {
                            0.0
                        } else {
                            count as f64 / total as f64
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StaySummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

pub fn summarize_outcomes(table: &PatientTable) -> Result<OutcomeSummary, AnalysisError> {
    let idx = table.require(Field::Outcome, "outcome summary")?;
    let mut order: Vec<(Option<String>, usize)> = Vec::new();
    let mut positions: HashMap<Option<String>, usize> = HashMap::new();
    for row in table.rows() {
        let outcome = PatientTable::cell(row, idx).map(Value::as_display);
        let slot = *positions.entry(outcome.clone()).or_insert_with(|| {
            order.push((outcome, 0));
            order.len() - 1
        });
        order[slot].1 += 1;
    }
    order.sort_by(|a, b| b.1.cmp(&a.1));
    let total = table.len();
    let outcomes = order
        .into_iter()
        .map(|(outcome, count)| OutcomeCount {
            outcome,
            count,
            fraction: if total == 0 {
                0.0
            } else {
                count as f64 / total as f64
            },
        })
        .collect();
    Ok(OutcomeSummary { total, outcomes })
}

pub fn summarize_outcomes_by(
    table: &PatientTable,
    key: GroupKey,
) -> Result<OutcomeCrosstab, AnalysisError> {
    let outcome_idx = table.require(Field::Outcome, "grouped outcome summary")?;
    let key_column = key.resolve(table, "grouped outcome summary")?;

    let mut tally: BTreeMap<Value, BTreeMap<String, usize>> = BTreeMap::new();
    let mut outcomes = BTreeSet::new();
    for row in table.rows() {
        let (Some(group), Some(outcome)) = (
            key_column.value(row),
            PatientTable::cell(row, outcome_idx).map(Value::as_display),
        ) else {
            continue;
        };
        outcomes.insert(outcome.clone());
        *tally.entry(group).or_default().entry(outcome).or_insert(0) += 1;
    }

    let outcomes: Vec<String> = outcomes.into_iter().collect();
    let mut groups = Vec::with_capacity(tally.len());
    let mut counts = Vec::with_capacity(tally.len());
    for (group, per_outcome) in tally {
        groups.push(group);
        counts.push(
            outcomes
                .iter()
                .map(|outcome| per_outcome.get(outcome).copied().unwrap_or(0))
                .collect(),
        );
    }
    Ok(OutcomeCrosstab {
        key: key.label().to_string(),
        groups,
        outcomes,
        counts,
    })
}

pub fn aggregate_by(
    table: &PatientTable,
    key: GroupKey,
    verb: AggregateVerb,
    value_column: Option<&str>,
) -> Result<Vec<GroupAggregate>, AnalysisError> {
    let key_column = key.resolve(table, "aggregate")?;
    let value_idx = match verb {
        AggregateVerb::Count => None,
        _ => {
            let name = value_column.ok_or(AnalysisError::MissingValueColumn { verb: verb.name() })?;
            Some(resolve_value_column(table, name, verb)?)
        }
    };

    // (group, group size, present values) in first-encounter order
    let mut groups: Vec<(Value, usize, Vec<f64>)> = Vec::new();
    let mut positions: HashMap<Value, usize> = HashMap::new();
    for row in table.rows() {
        let Some(group) = key_column.value(row) else {
            continue;
        };
        let slot = *positions.entry(group.clone()).or_insert_with(|| {
            groups.push((group, 0, Vec::new()));
            groups.len() - 1
        });
        let entry = &mut groups[slot];
        entry.1 += 1;
        if let Some(value) = value_idx
            .and_then(|idx| PatientTable::cell(row, idx))
            .and_then(Value::as_number)
        {
            entry.2.push(value);
        }
    }

    let mut results: Vec<GroupAggregate> = groups
        .into_iter()
        .map(|(group, size, values)| GroupAggregate {
            group,
            value: verb.reduce(&values, size),
        })
        .collect();
    if verb.ranks_by_value() {
        results.sort_by(|a, b| descending(a.value, b.value));
    } else {
        results.sort_by(|a, b| a.group.cmp(&b.group));
    }
    Ok(results)
}

pub fn average_satisfaction_by_department(table: &PatientTable) -> Vec<GroupAggregate> {
    if !table.has_field(Field::Satisfaction) || !table.has_field(Field::Department) {
        return Vec::new();
    }
    match aggregate_by(
        table,
        GroupKey::Department,
        AggregateVerb::Mean,
        Some(Field::Satisfaction.name()),
    ) {
        Ok(averages) => averages,
        Err(err) => {
            debug!("Satisfaction by department unavailable: {err}");
            Vec::new()
        }
    }
}

pub fn length_of_stay_summary(table: &PatientTable) -> Result<StaySummary, AnalysisError> {
    let idx = table.require(Field::LengthOfStay, "length of stay summary")?;
    let values: Vec<f64> = table
        .rows()
        .iter()
        .filter_map(|row| PatientTable::cell(row, idx).and_then(Value::as_number))
        .collect();
    Ok(StaySummary {
        count: values.len(),
        mean: AggregateVerb::Mean.reduce(&values, values.len()),
        median: AggregateVerb::Median.reduce(&values, values.len()),
        min: AggregateVerb::Min.reduce(&values, values.len()),
        max: AggregateVerb::Max.reduce(&values, values.len()),
    })
}

fn resolve_value_column(
    table: &PatientTable,
    name: &str,
    verb: AggregateVerb,
) -> Result<usize, AnalysisError> {
    let normalized = normalize_header(name);
    let idx = table
        .schema()
        .column_index(&normalized)
        .ok_or_else(|| AnalysisError::missing(normalized.clone(), "aggregate"))?;
    let kind = table.schema().columns[idx].kind;
    if kind != ColumnKind::Number {
        return Err(AnalysisError::NonNumericColumn {
            column: normalized,
            kind: kind.to_string(),
            verb: verb.name(),
        });
    }
    Ok(idx)
}

fn descending(a: Option<f64>, b: Option<f64>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(left), Some(right)) => right.total_cmp(&left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len().is_multiple_of(2) {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
