//! Optional YAML settings shared by every subcommand.
//!
//! ```yaml
//! age_bin_width: 5
//! frequency: week
//! preview_rows: 20
//! sample:
//!   rows: 1000
//!   seed: 7
//! ```
//!
//! Every key is optional; command-line flags take precedence.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::DEFAULT_AGE_BIN_WIDTH,
    sample::{DEFAULT_SAMPLE_ROWS, DEFAULT_SAMPLE_SEED},
    timeseries::Frequency,
};

pub const DEFAULT_PREVIEW_ROWS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub age_bin_width: f64,
    pub frequency: Frequency,
    pub preview_rows: usize,
    pub sample: SampleSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SampleSettings {
    pub rows: usize,
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            age_bin_width: DEFAULT_AGE_BIN_WIDTH,
            frequency: Frequency::default(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
            sample: SampleSettings::default(),
        }
    }
}

impl Default for SampleSettings {
    fn default() -> Self {
        Self {
            rows: DEFAULT_SAMPLE_ROWS,
            seed: DEFAULT_SAMPLE_SEED,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening settings file {path:?}"))?;
        let settings: Settings = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing settings file {path:?}"))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(text).context("Parsing settings")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.age_bin_width.is_finite() && self.age_bin_width > 0.0,
            "age_bin_width must be a positive number"
        );
        Ok(())
    }
}
