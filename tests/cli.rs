mod common;

use common::{MESSY_CSV, TestWorkspace, analyzer_cmd};
use predicates::prelude::*;
use predicates::str::contains;

fn stdout_of(args: &[&str]) -> String {
    let output = analyzer_cmd().args(args).output().expect("run binary");
    assert!(
        output.status.success(),
        "command {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("utf8 stdout")
}

fn json_of(args: &[&str]) -> serde_json::Value {
    serde_json::from_str(&stdout_of(args)).expect("json stdout")
}

#[test]
fn clean_writes_deduplicated_csv_with_length_of_stay() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("visits.csv", MESSY_CSV);
    let output = workspace.path().join("clean.csv");

    analyzer_cmd()
        .args(["clean", "-i", input.to_str().unwrap(), "-o", output.to_str().unwrap()])
        .assert()
        .success();

    let cleaned = std::fs::read_to_string(&output).expect("cleaned file");
    let lines: Vec<&str> = cleaned.lines().collect();
    assert_eq!(
        lines[0],
        "patient_id,admission_date,discharge_date,outcome,age,gender,department,satisfaction,length_of_stay"
    );
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[1], "P1,2020-01-05,2020-01-10,discharge,34,Male,Cardiology,4,5");
    assert_eq!(lines[3], "P3,2020-03-02,2020-03-12,death,,Unknown,Oncology,2,10");
    assert_eq!(lines[4], "P4,2020-03-15,,dama,45,Female,Unknown,,");
}

#[test]
fn clean_to_tsv_uses_tab_delimiter() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("visits.csv", MESSY_CSV);
    let output = workspace.path().join("clean.tsv");

    analyzer_cmd()
        .args(["clean", "-i", input.to_str().unwrap(), "-o", output.to_str().unwrap()])
        .assert()
        .success();

    let cleaned = std::fs::read_to_string(&output).expect("cleaned file");
    assert!(cleaned.starts_with("patient_id\tadmission_date\t"));
}

#[test]
fn summary_reports_outcome_shares() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("visits.csv", MESSY_CSV);

    analyzer_cmd()
        .args(["summary", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("discharge").and(contains("50.00%")))
        .stdout(contains("dama").and(contains("25.00%")));

    let json = json_of(&["summary", "-i", input.to_str().unwrap(), "--format", "json"]);
    assert_eq!(json["total"], 4);
    assert_eq!(json["outcomes"][0]["outcome"], "discharge");
    assert_eq!(json["outcomes"][0]["count"], 2);
}

#[test]
fn summary_by_gender_prints_counts_and_percentages() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("visits.csv", MESSY_CSV);

    let json = json_of(&[
        "summary",
        "-i",
        input.to_str().unwrap(),
        "--by",
        "gender",
        "--format",
        "json",
    ]);
    assert_eq!(json["counts"]["key"], "gender");
    assert_eq!(
        json["counts"]["groups"],
        serde_json::json!(["Female", "Male", "Unknown"])
    );
    assert_eq!(json["counts"]["outcomes"], serde_json::json!(["dama", "death", "discharge"]));
    assert_eq!(json["counts"]["counts"][0], serde_json::json!([1, 0, 1]));
}

#[test]
fn filters_apply_before_summaries() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("visits.csv", MESSY_CSV);

    let json = json_of(&[
        "summary",
        "-i",
        input.to_str().unwrap(),
        "--gender",
        "Female",
        "--format",
        "json",
    ]);
    assert_eq!(json["total"], 2);

    let json = json_of(&[
        "summary",
        "-i",
        input.to_str().unwrap(),
        "--age-min",
        "40",
        "--age-max",
        "80",
        "--format",
        "json",
    ]);
    assert_eq!(json["total"], 2);
}

#[test]
fn inverted_age_range_is_rejected() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("visits.csv", MESSY_CSV);

    analyzer_cmd()
        .args(["summary", "-i", input.to_str().unwrap(), "--age-min", "60", "--age-max", "10"])
        .assert()
        .failure()
        .stderr(contains("exceeds maximum"));
}

#[test]
fn aggregate_mean_age_by_department() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("visits.csv", MESSY_CSV);

    analyzer_cmd()
        .args([
            "aggregate",
            "-i",
            input.to_str().unwrap(),
            "--by",
            "department",
            "--agg",
            "mean",
            "--value",
            "age",
        ])
        .assert()
        .success()
        .stdout(contains("mean_age"))
        .stdout(contains("Oncology").and(contains("71")));
}

#[test]
fn aggregate_without_value_column_fails() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("visits.csv", MESSY_CSV);

    analyzer_cmd()
        .args(["aggregate", "-i", input.to_str().unwrap(), "--by", "gender", "--agg", "sum"])
        .assert()
        .failure()
        .stderr(contains("requires a value column"));
}

#[test]
fn admissions_are_bucketed_by_month_end() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("visits.csv", MESSY_CSV);

    let json = json_of(&["admissions", "-i", input.to_str().unwrap(), "--format", "json"]);
    assert_eq!(
        json,
        serde_json::json!([
            {"period_end": "2020-01-31", "admissions": 2},
            {"period_end": "2020-02-29", "admissions": 0},
            {"period_end": "2020-03-31", "admissions": 2},
        ])
    );
}

#[test]
fn admissions_without_dates_fails() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("outcomes.csv", "patient_id,outcome\nP1,death\n");

    analyzer_cmd()
        .args(["admissions", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("requires the 'admission_date' column"));
}

#[test]
fn charts_without_data_print_notices() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("outcomes.csv", "patient_id,outcome\nP1,death\n");
    let path = input.to_str().unwrap();

    analyzer_cmd()
        .args(["chart", "-i", path, "--kind", "admissions"])
        .assert()
        .success()
        .stdout(contains("No admission_date available."));
    analyzer_cmd()
        .args(["chart", "-i", path, "--kind", "satisfaction"])
        .assert()
        .success()
        .stdout(contains("No satisfaction data available."));
    analyzer_cmd()
        .args(["chart", "-i", path, "--kind", "outcomes-by-age"])
        .assert()
        .success()
        .stdout(contains("Insufficient data for this chart."));
    analyzer_cmd()
        .args(["satisfaction", "-i", path])
        .assert()
        .success()
        .stdout(contains("No satisfaction data available."));
}

#[test]
fn satisfaction_chart_is_written_as_json() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("visits.csv", MESSY_CSV);
    let output = workspace.path().join("chart.json");

    analyzer_cmd()
        .args([
            "chart",
            "-i",
            input.to_str().unwrap(),
            "--kind",
            "satisfaction",
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let chart: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).expect("chart file"))
            .expect("chart json");
    assert_eq!(chart["title"], "Average service satisfaction by department");
    assert_eq!(chart["data"][0]["department"], "Cardiology");
    assert_eq!(chart["data"][0]["satisfaction"], 4.0);
}

#[test]
fn stay_summary_reports_known_stays() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("visits.csv", MESSY_CSV);

    let json = json_of(&["stay", "-i", input.to_str().unwrap(), "--format", "json"]);
    assert_eq!(json["count"], 3);
    assert_eq!(json["median"], 5.0);
    assert_eq!(json["min"], 1.0);
    assert_eq!(json["max"], 10.0);
}

#[test]
fn preview_limits_rows() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("visits.csv", MESSY_CSV);

    analyzer_cmd()
        .args(["preview", "-i", input.to_str().unwrap(), "--rows", "2"])
        .assert()
        .success()
        .stdout(contains("P2").and(contains("P3").not()));
}

#[test]
fn generate_is_deterministic_for_a_seed() {
    let first = stdout_of(&["generate", "--rows", "20", "--seed", "7"]);
    let second = stdout_of(&["generate", "--rows", "20", "--seed", "7"]);
    assert_eq!(first, second);
    assert_eq!(first.lines().count(), 21);
    assert!(first.starts_with("patient_id,admission_date,discharge_date,outcome,"));
}

#[test]
fn sample_data_is_used_without_input() {
    let workspace = TestWorkspace::new();
    let config = workspace.write("settings.yaml", "sample:\n  rows: 12\n  seed: 3\n");

    let json = json_of(&[
        "summary",
        "--config",
        config.to_str().unwrap(),
        "--format",
        "json",
    ]);
    assert_eq!(json["total"], 12);
}

#[test]
fn unknown_settings_keys_are_rejected() {
    let workspace = TestWorkspace::new();
    let config = workspace.write("settings.yaml", "bin_width: 5\n");

    analyzer_cmd()
        .args(["summary", "--config", config.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("Parsing settings file"));
}
