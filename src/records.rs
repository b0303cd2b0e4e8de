//! Raw and cleaned record tables.
//!
//! A [`RawTable`] is what a file or the sample generator produces: headers
//! and string cells. A [`PatientTable`] is the cleaned, typed form every
//! query reads from. Absent cells are `None`.

use crate::{
    data::Value,
    error::AnalysisError,
    schema::{Field, Schema},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Pads short rows with empty cells and drops cells past the last header.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(idx).map(String::as_str).unwrap_or(""))
    }
}

pub type Row = Vec<Option<Value>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientTable {
    schema: Schema,
    rows: Vec<Row>,
}

impl PatientTable {
    pub fn new(schema: Schema, rows: Vec<Row>) -> Self {
        Self { schema, rows }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> Vec<String> {
        self.schema.headers()
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.schema.has_field(field)
    }

    pub fn field_index(&self, field: Field) -> Option<usize> {
        self.schema.field_index(field)
    }

    /// Index of `field`, or the precondition error `operation` reports without it.
    pub fn require(&self, field: Field, operation: &'static str) -> Result<usize, AnalysisError> {
        self.field_index(field)
            .ok_or_else(|| AnalysisError::missing(field.name(), operation))
    }

    pub fn cell(row: &Row, idx: usize) -> Option<&Value> {
        row.get(idx).and_then(Option::as_ref)
    }

    pub fn filter_rows<F>(&self, mut keep: F) -> PatientTable
    where
        F: FnMut(&Row) -> bool,
    {
        PatientTable {
            schema: self.schema.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }

    pub fn head(&self, count: usize) -> PatientTable {
        PatientTable {
            schema: self.schema.clone(),
            rows: self.rows.iter().take(count).cloned().collect(),
        }
    }

    /// Renders cells as strings; absent cells become empty strings.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_ref().map(Value::as_display).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    pub fn to_raw(&self) -> RawTable {
        RawTable {
            headers: self.headers(),
            rows: self.display_rows(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnKind, ColumnMeta};

    #[test]
    fn push_row_pads_and_truncates() {
        let mut raw = RawTable::new(vec!["a".into(), "b".into()]);
        raw.push_row(vec!["1".into()]);
        raw.push_row(vec!["1".into(), "2".into(), "3".into()]);
        assert_eq!(raw.rows[0], vec!["1".to_string(), String::new()]);
        assert_eq!(raw.rows[1].len(), 2);
    }

    #[test]
    fn require_reports_operation_and_column() {
        let table = PatientTable::new(
            Schema {
                columns: vec![ColumnMeta::passthrough("notes", ColumnKind::Text)],
            },
            Vec::new(),
        );
        let err = table
            .require(Field::AdmissionDate, "admissions over time")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "admissions over time requires the 'admission_date' column"
        );
    }

    #[test]
    fn to_raw_renders_absent_cells_as_empty() {
        let table = PatientTable::new(
            Schema {
                columns: vec![
                    ColumnMeta::for_field(Field::Age),
                    ColumnMeta::for_field(Field::Outcome),
                ],
            },
            vec![vec![Some(Value::number(40.0)), None]],
        );
        let raw = table.to_raw();
        assert_eq!(raw.headers, vec!["age".to_string(), "outcome".to_string()]);
        assert_eq!(raw.rows, vec![vec!["40".to_string(), String::new()]]);
    }
}
