//! Declarative chart descriptions built from aggregate results.
//!
//! Specs serialize to a Vega-Lite-like JSON document. Builders return
//! `None` when the table lacks the columns or rows a chart needs.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};

use crate::{
    aggregate::{age_bin, average_satisfaction_by_department},
    data::Value,
    error::AnalysisError,
    records::PatientTable,
    schema::Field,
    timeseries::{Frequency, admissions_over_time},
};

const CHART_WIDTH: u32 = 700;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Mark {
    Bar,
    Line { point: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Nominal,
    Ordinal,
    Quantitative,
    Temporal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Channel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

impl Channel {
    fn field(name: &str, field_type: FieldType) -> Self {
        Self {
            field: Some(name.to_string()),
            aggregate: None,
            field_type,
            title: None,
            sort: None,
        }
    }

    fn count() -> Self {
        Self {
            field: None,
            aggregate: Some("count".to_string()),
            field_type: FieldType::Quantitative,
            title: None,
            sort: None,
        }
    }

    fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    fn sorted(mut self, sort: &str) -> Self {
        self.sort = Some(sort.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Encoding {
    pub x: Channel,
    pub y: Channel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Channel>,
    pub tooltip: Vec<Channel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub mark: Mark,
    pub width: u32,
    pub encoding: Encoding,
    pub data: Vec<Map<String, JsonValue>>,
}

impl ChartSpec {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn json_cell(value: Option<&Value>) -> JsonValue {
    match value {
        Some(Value::Number(n)) => json!(n),
        Some(other) => json!(other.as_display()),
        None => JsonValue::Null,
    }
}

/// Bars of patient counts per age bucket, stacked by outcome.
pub fn outcomes_by_age(
    table: &PatientTable,
    bin_width: f64,
) -> Result<Option<ChartSpec>, AnalysisError> {
    if !(bin_width.is_finite() && bin_width > 0.0) {
        return Err(AnalysisError::InvalidBinWidth(bin_width));
    }
    let (Some(age_idx), Some(outcome_idx)) = (
        table.field_index(Field::Age),
        table.field_index(Field::Outcome),
    ) else {
        return Ok(None);
    };
    let patient_idx = table.field_index(Field::PatientId);

    let mut data = Vec::new();
    for row in table.rows() {
        let (Some(age), Some(outcome)) = (
            PatientTable::cell(row, age_idx).and_then(Value::as_number),
            PatientTable::cell(row, outcome_idx),
        ) else {
            continue;
        };
        let mut record = Map::new();
        record.insert("age".into(), json!(age));
        record.insert("age_bin".into(), json!(age_bin(age, bin_width)));
        record.insert("outcome".into(), json_cell(Some(outcome)));
        if let Some(idx) = patient_idx {
            record.insert(
                "patient_id".into(),
                json_cell(PatientTable::cell(row, idx)),
            );
        }
        data.push(record);
    }
    if data.is_empty() {
        return Ok(None);
    }

    let mut tooltip = vec![
        Channel::field("age", FieldType::Quantitative),
        Channel::field("outcome", FieldType::Nominal),
    ];
    if patient_idx.is_some() {
        tooltip.push(Channel::field("patient_id", FieldType::Nominal));
    }
    Ok(Some(ChartSpec {
        title: "Outcome distribution by age".to_string(),
        mark: Mark::Bar,
        width: CHART_WIDTH,
        encoding: Encoding {
            x: Channel::field("age_bin", FieldType::Ordinal)
                .titled(format!("Age bins ({})", bin_width)),
            y: Channel::count().titled("Patients"),
            color: Some(Channel::field("outcome", FieldType::Nominal)),
            tooltip,
        },
        data,
    }))
}

/// Line of admissions per period. No chart without admission dates.
pub fn admissions(table: &PatientTable, frequency: Frequency) -> Option<ChartSpec> {
    let series = admissions_over_time(table, frequency).ok()?;
    if series.is_empty() {
        return None;
    }
    let data = series
        .iter()
        .map(|point| {
            let mut record = Map::new();
            record.insert(
                "date".into(),
                json!(point.period_end.format("%Y-%m-%d").to_string()),
            );
            record.insert("admissions".into(), json!(point.admissions));
            record
        })
        .collect();
    Some(ChartSpec {
        title: "Admissions over time".to_string(),
        mark: Mark::Line { point: true },
        width: CHART_WIDTH,
        encoding: Encoding {
            x: Channel::field("date", FieldType::Temporal),
            y: Channel::field("admissions", FieldType::Quantitative),
            color: None,
            tooltip: vec![
                Channel::field("date", FieldType::Temporal),
                Channel::field("admissions", FieldType::Quantitative),
            ],
        },
        data,
    })
}

pub fn satisfaction_by_department(table: &PatientTable) -> Option<ChartSpec> {
    let averages = average_satisfaction_by_department(table);
    if averages.is_empty() {
        return None;
    }
    let data = averages
        .iter()
        .map(|entry| {
            let mut record = Map::new();
            record.insert("department".into(), json_cell(Some(&entry.group)));
            record.insert("satisfaction".into(), json!(entry.value));
            record
        })
        .collect();
    Some(ChartSpec {
        title: "Average service satisfaction by department".to_string(),
        mark: Mark::Bar,
        width: CHART_WIDTH,
        encoding: Encoding {
            x: Channel::field("department", FieldType::Nominal).sorted("-y"),
            y: Channel::field("satisfaction", FieldType::Quantitative).titled("Avg satisfaction"),
            color: None,
            tooltip: vec![
                Channel::field("department", FieldType::Nominal),
                Channel::field("satisfaction", FieldType::Quantitative),
            ],
        },
        data,
    })
}
