//! Seeded synthetic patient records for demos and tests.

use anyhow::{Result, anyhow};
use chrono::{Days, NaiveDate};
use rand::{
    Rng, SeedableRng,
    distr::{Distribution, weighted::WeightedIndex},
    rngs::StdRng,
};

use crate::records::RawTable;

pub const DEFAULT_SAMPLE_ROWS: usize = 500;
pub const DEFAULT_SAMPLE_SEED: u64 = 42;

const ADMISSION_WINDOW_DAYS: u64 = 1000;
const MAX_STAY_DAYS: u64 = 30;
const OUTCOMES: [(&str, f64); 3] = [("discharge", 0.85), ("dama", 0.10), ("death", 0.05)];
const GENDERS: [(&str, f64); 3] = [("Male", 0.48), ("Female", 0.50), ("Other", 0.02)];
const DEPARTMENTS: [&str; 5] = ["Cardiology", "Oncology", "Emergency", "Pediatrics", "General"];
const DIAGNOSES: [&str; 5] = ["Flu", "COVID-19", "Fracture", "Cancer", "Infection"];

pub const SAMPLE_HEADERS: [&str; 9] = [
    "patient_id",
    "admission_date",
    "discharge_date",
    "outcome",
    "age",
    "gender",
    "department",
    "satisfaction",
    "diagnosis",
];

struct WeightedLabels {
    labels: Vec<&'static str>,
    index: WeightedIndex<f64>,
}

impl WeightedLabels {
    fn new(choices: &[(&'static str, f64)]) -> Result<Self> {
        let index = WeightedIndex::new(choices.iter().map(|(_, weight)| *weight))
            .map_err(|err| anyhow!("Invalid sample weights: {err}"))?;
        Ok(Self {
            labels: choices.iter().map(|(label, _)| *label).collect(),
            index,
        })
    }

    fn pick(&self, rng: &mut StdRng) -> &'static str {
        self.labels[self.index.sample(rng)]
    }
}

fn pick_uniform(rng: &mut StdRng, labels: &[&'static str]) -> &'static str {
    labels[rng.random_range(0..labels.len())]
}

/// Generates `rows` records; the same seed always yields the same table.
pub fn generate_sample(rows: usize, seed: u64) -> Result<RawTable> {
    let epoch = NaiveDate::from_ymd_opt(2020, 1, 1).ok_or_else(|| anyhow!("Invalid sample epoch"))?;
    let outcomes = WeightedLabels::new(&OUTCOMES)?;
    let genders = WeightedLabels::new(&GENDERS)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut table = RawTable::new(SAMPLE_HEADERS.iter().map(|h| h.to_string()).collect());
    for idx in 0..rows {
        let admitted = epoch
            .checked_add_days(Days::new(rng.random_range(0..ADMISSION_WINDOW_DAYS)))
            .ok_or_else(|| anyhow!("Admission date out of range"))?;
        let discharged = admitted
            .checked_add_days(Days::new(rng.random_range(0..MAX_STAY_DAYS)))
            .ok_or_else(|| anyhow!("Discharge date out of range"))?;
        let age: u32 = rng.random_range(0..100);
        let satisfaction: u32 = rng.random_range(1..=5);
        table.push_row(vec![
            format!("P{idx:05}"),
            admitted.format("%Y-%m-%d").to_string(),
            discharged.format("%Y-%m-%d").to_string(),
            outcomes.pick(&mut rng).to_string(),
            age.to_string(),
            genders.pick(&mut rng).to_string(),
            pick_uniform(&mut rng, &DEPARTMENTS).to_string(),
            satisfaction.to_string(),
            pick_uniform(&mut rng, &DIAGNOSES).to_string(),
        ]);
    }
    Ok(table)
}
