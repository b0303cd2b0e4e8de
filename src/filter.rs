use std::collections::BTreeSet;

use anyhow::{Result, anyhow};
use log::debug;

use crate::{data::Value, records::PatientTable, schema::Field};

/// Sidebar-style row selection: inclusive age range plus gender and
/// department allow-lists. `None` means "no constraint".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowFilter {
    pub age_range: Option<(f64, f64)>,
    pub genders: Option<BTreeSet<String>>,
    pub departments: Option<BTreeSet<String>>,
}

impl RowFilter {
    pub fn is_empty(&self) -> bool {
        self.age_range.is_none() && self.genders.is_none() && self.departments.is_none()
    }

    /// Builds a filter from optional bounds; a single bound leaves the other side open.
    pub fn with_age_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Result<Self> {
        self.age_range = match (min, max) {
            (None, None) => None,
            (min, max) => {
                let low = min.unwrap_or(f64::NEG_INFINITY);
                let high = max.unwrap_or(f64::INFINITY);
                if low > high {
                    return Err(anyhow!("Age range minimum {low} exceeds maximum {high}"));
                }
                Some((low, high))
            }
        };
        Ok(self)
    }

    pub fn with_genders(mut self, values: &[String]) -> Self {
        self.genders = parse_selection(values);
        self
    }

    pub fn with_departments(mut self, values: &[String]) -> Self {
        self.departments = parse_selection(values);
        self
    }

    /// Keeps matching rows. Constraints on columns the table lacks are ignored.
    pub fn apply(&self, table: &PatientTable) -> PatientTable {
        if self.is_empty() {
            return table.clone();
        }
        let age = self.age_range.and_then(|range| {
            let idx = table.field_index(Field::Age);
            if idx.is_none() {
                debug!("Ignoring age filter: table has no age column");
            }
            idx.map(|idx| (idx, range))
        });
        let gender = selection_column(table, Field::Gender, self.genders.as_ref());
        let department = selection_column(table, Field::Department, self.departments.as_ref());

        table.filter_rows(|row| {
            if let Some((idx, (low, high))) = age {
                match PatientTable::cell(row, idx).and_then(Value::as_number) {
                    Some(value) if value >= low && value <= high => {}
                    _ => return false,
                }
            }
            for (idx, allowed) in [gender, department].into_iter().flatten() {
                match PatientTable::cell(row, idx).and_then(Value::as_text) {
                    Some(value) if allowed.contains(value) => {}
                    _ => return false,
                }
            }
            true
        })
    }
}

fn selection_column<'a>(
    table: &PatientTable,
    field: Field,
    selection: Option<&'a BTreeSet<String>>,
) -> Option<(usize, &'a BTreeSet<String>)> {
    let allowed = selection?;
    match table.field_index(field) {
        Some(idx) => Some((idx, allowed)),
        None => {
            debug!("Ignoring {field} filter: table has no {field} column");
            None
        }
    }
}

/// Flattens repeated, comma-separated CLI values. No values means no constraint.
fn parse_selection(values: &[String]) -> Option<BTreeSet<String>> {
    let selected: BTreeSet<String> = values
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect();
    (!selected.is_empty()).then_some(selected)
}
