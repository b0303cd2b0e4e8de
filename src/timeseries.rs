//! Admission counts resampled onto a dense calendar axis.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{data::Value, error::AnalysisError, records::PatientTable, schema::Field};

/// Calendar period used to bucket admissions. Buckets are labeled by the
/// last day they cover; weeks end on Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[value(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    Day,
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl Frequency {
    pub fn period_end(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Day => Some(date),
            Frequency::Week => {
                let remaining = 6 - date.weekday().num_days_from_monday();
                date.checked_add_days(Days::new(u64::from(remaining)))
            }
            Frequency::Month => month_end(date.year(), date.month()),
            Frequency::Quarter => month_end(date.year(), date.month().div_ceil(3) * 3),
            Frequency::Year => NaiveDate::from_ymd_opt(date.year(), 12, 31),
        }
    }

    fn next_period_end(self, period_end: NaiveDate) -> Option<NaiveDate> {
        self.period_end(period_end.succ_opt()?)
    }
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodCount {
    pub period_end: NaiveDate,
    pub admissions: usize,
}

pub fn admissions_over_time(
    table: &PatientTable,
    frequency: Frequency,
) -> Result<Vec<PeriodCount>, AnalysisError> {
    let idx = table.require(Field::AdmissionDate, "admissions over time")?;
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for row in table.rows() {
        if let Some(bucket) = PatientTable::cell(row, idx)
            .and_then(Value::as_date)
            .and_then(|date| frequency.period_end(date))
        {
            *counts.entry(bucket).or_insert(0) += 1;
        }
    }

    let (Some(&first), Some(&last)) = (counts.keys().next(), counts.keys().next_back()) else {
        return Ok(Vec::new());
    };
    let mut series = Vec::new();
    let mut cursor = Some(first);
    while let Some(period_end) = cursor
        && period_end <= last
    {
        series.push(PeriodCount {
            period_end,
            admissions: counts.get(&period_end).copied().unwrap_or(0),
        });
        cursor = frequency.next_period_end(period_end);
    }
    Ok(series)
}
