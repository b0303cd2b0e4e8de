use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// A typed cell of a cleaned table. Absent cells are `None` at the row level.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn number(value: f64) -> Self {
        // -0.0 and 0.0 must hash and compare alike.
        if value == 0.0 {
            Value::Number(0.0)
        } else {
            Value::Number(value)
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Lossless rendering; parsing the output again yields an equal value.
    pub fn as_display(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{n:.0}")
                } else {
                    n.to_string()
                }
            }
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Number(_) => 0,
            Value::Date(_) => 1,
            Value::Text(_) => 2,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Text(s) => s.hash(state),
            Value::Number(n) => {
                let normalized = if *n == 0.0 { 0.0f64 } else { *n };
                normalized.to_bits().hash(state);
            }
            Value::Date(d) => d.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Tokens that stand for "no value" in exported spreadsheets.
pub fn is_missing_token(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return true;
    }
    matches!(
        trimmed.to_ascii_lowercase().as_str(),
        "na" | "n/a" | "#n/a" | "#na" | "<na>" | "nan" | "-nan" | "null" | "none"
    )
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y"];
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    let trimmed = value.trim();
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(parsed.date());
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

/// Parses a finite number; missing tokens, NaN and infinities yield `None`.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if is_missing_token(trimmed) {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
}

/// True for numeric-looking tokens that are really identifiers, such as `007`.
pub fn has_leading_zero(value: &str) -> bool {
    let digits = value.trim().trim_start_matches(['-', '+']);
    let integer_part = digits.split('.').next().unwrap_or("");
    integer_part.len() > 1 && integer_part.starts_with('0')
}

/// Report formatting: whole numbers without decimals, otherwise four places.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_naive_date_supports_multiple_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(parse_naive_date("2024-05-06").unwrap(), expected);
        assert_eq!(parse_naive_date(" 2024/05/06 ").unwrap(), expected);
        assert_eq!(parse_naive_date("05/06/2024").unwrap(), expected);
        assert_eq!(parse_naive_date("2024-05-06T14:30:00").unwrap(), expected);
        assert_eq!(parse_naive_date("2024-05-06 14:30").unwrap(), expected);
        assert!(parse_naive_date("next tuesday").is_err());
    }

    #[test]
    fn ambiguous_slash_dates_read_month_first() {
        assert_eq!(
            parse_naive_date("03/04/2020").unwrap(),
            NaiveDate::from_ymd_opt(2020, 3, 4).unwrap()
        );
        assert_eq!(
            parse_naive_date("25/12/2020").unwrap(),
            NaiveDate::from_ymd_opt(2020, 12, 25).unwrap()
        );
    }

    #[test]
    fn parse_number_rejects_placeholders_and_non_finite() {
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("3.5"), Some(3.5));
        assert_eq!(parse_number("N/A"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("forty"), None);
    }

    #[test]
    fn missing_tokens_are_case_insensitive() {
        assert!(is_missing_token(""));
        assert!(is_missing_token("  "));
        assert!(is_missing_token("NULL"));
        assert!(is_missing_token("#N/A"));
        assert!(!is_missing_token("Unknown"));
        assert!(!is_missing_token("0"));
    }

    #[test]
    fn leading_zero_tokens_are_identifiers() {
        assert!(has_leading_zero("007"));
        assert!(has_leading_zero("-01.5"));
        assert!(!has_leading_zero("0"));
        assert!(!has_leading_zero("0.25"));
        assert!(!has_leading_zero("105"));
    }

    #[test]
    fn display_round_trips_numbers() {
        for raw in ["5", "45.5", "0.1", "-3"] {
            let value = Value::number(parse_number(raw).unwrap());
            assert_eq!(parse_number(&value.as_display()), value.as_number());
        }
        assert_eq!(Value::number(-0.0).as_display(), "0");
    }

    #[test]
    fn ordering_groups_variants_before_comparing() {
        assert!(Value::number(10.0) < Value::number(20.0));
        assert!(Value::number(99.0) < Value::text("a"));
        assert_eq!(Value::number(-0.0), Value::number(0.0));
    }
}
