#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use health_analyzer::RawTable;
use tempfile::{TempDir, tempdir};

/// Messy admissions extract: a duplicate visit, aliased headers, missing
/// tokens and an outcome with stray case and whitespace.
pub const MESSY_CSV: &str = "\
Patient_ID,Admit_Date,Date_Discharged,Outcome,Age,Gender,Department,Satisfaction
P1,2020-01-05,2020-01-10,Discharge ,34,Male,Cardiology,4
P1,2020-01-05,2020-01-10,death,34,Male,Cardiology,1
P2,2020-01-20,2020-01-21,discharge,71,Female,Oncology,5
P3,2020-03-02,2020-03-12,Death,NaN,,Oncology,2
P4,2020-03-15,not a date,DAMA,45,Female,,n/a
";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("write temp file contents");
        path
    }
}

pub fn raw_table(headers: &[&str], rows: &[Vec<String>]) -> RawTable {
    let mut table = RawTable::new(headers.iter().map(|h| h.to_string()).collect());
    for row in rows {
        table.push_row(row.clone());
    }
    table
}

pub fn raw_from_strs(headers: &[&str], rows: &[&[&str]]) -> RawTable {
    let owned: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();
    raw_table(headers, &owned)
}

pub fn analyzer_cmd() -> Command {
    let mut cmd = Command::cargo_bin("health-analyzer").expect("binary exists");
    cmd.env("RUST_LOG", "off");
    cmd
}
