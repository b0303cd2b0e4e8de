//! Column model for patient record tables.
//!
//! Input files carry free-form headers. This module owns the closed set of
//! semantic [`Field`]s the analyzer understands, the alias table that maps
//! alternative date headers onto them, and the [`ColumnKind`] inference used
//! for every column the analyzer does not recognize.
//!
//! ## Responsibilities
//!
//! - Header normalization (trim + lowercase) and collision suffixing
//! - Alias resolution for admission and discharge date headers
//! - Kind inference for passthrough columns
//! - Column lookup by name or by semantic field

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

use crate::data::{has_leading_zero, is_missing_token, parse_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Number,
    Date,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnKind::Text => "text",
            ColumnKind::Number => "number",
            ColumnKind::Date => "date",
        };
        f.write_str(label)
    }
}

/// Semantic columns with fixed names and kinds once a table is cleaned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    PatientId,
    AdmissionDate,
    DischargeDate,
    Outcome,
    Age,
    Gender,
    Department,
    Satisfaction,
    Diagnosis,
    LengthOfStay,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::PatientId,
        Field::AdmissionDate,
        Field::DischargeDate,
        Field::Outcome,
        Field::Age,
        Field::Gender,
        Field::Department,
        Field::Satisfaction,
        Field::Diagnosis,
        Field::LengthOfStay,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::PatientId => "patient_id",
            Field::AdmissionDate => "admission_date",
            Field::DischargeDate => "discharge_date",
            Field::Outcome => "outcome",
            Field::Age => "age",
            Field::Gender => "gender",
            Field::Department => "department",
            Field::Satisfaction => "satisfaction",
            Field::Diagnosis => "diagnosis",
            Field::LengthOfStay => "length_of_stay",
        }
    }

    pub fn kind(self) -> ColumnKind {
        match self {
            Field::AdmissionDate | Field::DischargeDate => ColumnKind::Date,
            Field::Age | Field::Satisfaction | Field::LengthOfStay => ColumnKind::Number,
            Field::PatientId
            | Field::Outcome
            | Field::Gender
            | Field::Department
            | Field::Diagnosis => ColumnKind::Text,
        }
    }

    /// Accepted header spellings in priority order; the canonical name comes first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::AdmissionDate => &["admission_date", "admit_date", "date_admitted"],
            Field::DischargeDate => &["discharge_date", "date_discharged"],
            _ => &[],
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub kind: ColumnKind,
    pub field: Option<Field>,
}

impl ColumnMeta {
    pub fn for_field(field: Field) -> Self {
        Self {
            name: field.name().to_string(),
            kind: field.kind(),
            field: Some(field),
        }
    }

    pub fn passthrough(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            field: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub columns: Vec<ColumnMeta>,
}

impl Schema {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn field_index(&self, field: Field) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.field == Some(field))
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.field_index(field).is_some()
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }
}

pub fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Normalizes headers, suffixes collisions (`age`, `age_2`, ...) and renames
/// the first present alias of each date field to its canonical name.
pub fn resolve_headers(headers: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(headers.len());
    for header in headers {
        let base = normalize_header(header);
        let mut candidate = base.clone();
        let mut suffix = 2;
        while !seen.insert(candidate.clone()) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        resolved.push(candidate);
    }

    for field in [Field::AdmissionDate, Field::DischargeDate] {
        let Some(alias_idx) = field
            .aliases()
            .iter()
            .find_map(|alias| resolved.iter().position(|name| name == alias))
        else {
            continue;
        };
        resolved[alias_idx] = field.name().to_string();
    }
    resolved
}

/// Passthrough columns are numeric only when every present cell is a finite
/// number and none looks like a zero-padded identifier.
pub fn infer_kind<'a>(values: impl IntoIterator<Item = &'a str>) -> ColumnKind {
    let mut saw_value = false;
    for value in values {
        if is_missing_token(value) {
            continue;
        }
        saw_value = true;
        if parse_number(value).is_none() || has_leading_zero(value) {
            return ColumnKind::Text;
        }
    }
    if saw_value {
        ColumnKind::Number
    } else {
        ColumnKind::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn resolve_headers_normalizes_case_and_whitespace() {
        let resolved = resolve_headers(&strings(&[" Patient_ID", "OUTCOME ", "Age"]));
        assert_eq!(resolved, strings(&["patient_id", "outcome", "age"]));
    }

    #[test]
    fn resolve_headers_renames_first_alias_only() {
        let resolved = resolve_headers(&strings(&["Date_Admitted", "admit_date", "date_discharged"]));
        assert_eq!(
            resolved,
            strings(&["date_admitted", "admission_date", "discharge_date"])
        );
    }

    #[test]
    fn resolve_headers_keeps_canonical_name_when_present() {
        let resolved = resolve_headers(&strings(&["admit_date", "admission_date"]));
        assert_eq!(resolved, strings(&["admit_date", "admission_date"]));
    }

    #[test]
    fn resolve_headers_suffixes_collisions() {
        let resolved = resolve_headers(&strings(&["Age", "age ", "AGE"]));
        assert_eq!(resolved, strings(&["age", "age_2", "age_3"]));
    }

    #[test]
    fn infer_kind_detects_numeric_columns() {
        assert_eq!(infer_kind(["1", "2.5", "", "NA"]), ColumnKind::Number);
        assert_eq!(infer_kind(["1", "two"]), ColumnKind::Text);
        assert_eq!(infer_kind(["007", "8"]), ColumnKind::Text);
        assert_eq!(infer_kind(["", "null"]), ColumnKind::Text);
    }

    #[test]
    fn field_lookup_by_name() {
        assert_eq!(Field::from_name("length_of_stay"), Some(Field::LengthOfStay));
        assert_eq!(Field::from_name("admit_date"), None);
        assert_eq!(Field::Age.kind(), ColumnKind::Number);
    }
}
