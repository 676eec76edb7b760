use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::fs;

mod common;
use common::{LAP_LOG, RATED_LOG, Scratch};

/// Scratch dir with `rated.log` imported as session 1.
fn imported() -> Scratch {
    let s = Scratch::new();
    let log = s.write("rated.log", RATED_LOG);
    s.cmd()
        .args(["import", log.to_str().unwrap(), "--name", "Laguna", "--notes", "dry"])
        .assert()
        .success()
        .stderr(contains("Imported 10 records"));
    s
}

#[test]
fn test_init_creates_database() {
    let s = Scratch::new();
    s.cmd()
        .arg("init")
        .assert()
        .success()
        .stderr(contains("Database initialized"));

    assert!(std::path::Path::new(&s.db()).exists());
}

#[test]
fn test_import_then_list_sessions() {
    let s = imported();
    s.cmd()
        .arg("sessions")
        .assert()
        .success()
        .stdout(contains("Laguna").and(contains("dry")).and(contains("10")));
}

#[test]
fn test_empty_store_has_no_sessions() {
    let s = Scratch::new();
    s.cmd()
        .arg("sessions")
        .assert()
        .success()
        .stderr(contains("No sessions recorded"));
}

#[test]
fn test_import_missing_file_fails() {
    let s = Scratch::new();
    s.cmd()
        .args(["import", s.path("missing.log").to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("Unable to open file"));
}

#[test]
fn test_query_writes_csv() {
    let s = imported();
    s.cmd()
        .args(["query", "--session", "1", "--channel", "RPM", "--where", "RPM > 5800"])
        .assert()
        .success()
        .stdout("session_id,RPM\n1,5900\n");
}

#[test]
fn test_query_unknown_channel_fails() {
    let s = imported();
    s.cmd()
        .args(["query", "--session", "1", "--channel", "Boost"])
        .assert()
        .failure()
        .stderr(contains("Boost"));
}

#[test]
fn test_export_to_file_round_trips() {
    let s = imported();
    let out = s.path("out.log");
    s.cmd()
        .args(["export", "1", "--file", out.to_str().unwrap()])
        .assert()
        .success()
        .stderr(contains("10 samples"));

    assert_eq!(fs::read_to_string(&out).unwrap(), RATED_LOG);
}

#[test]
fn test_export_to_stdout() {
    let s = imported();
    s.cmd()
        .args(["export", "1", "--file", "-"])
        .assert()
        .success()
        .stdout(RATED_LOG);
}

#[test]
fn test_export_unknown_session_fails() {
    let s = imported();
    s.cmd()
        .args(["export", "42", "--file", "-"])
        .assert()
        .failure()
        .stderr(contains("No session with id 42"));
}

#[test]
fn test_delete_with_yes() {
    let s = imported();
    s.cmd()
        .args(["delete", "1", "--yes"])
        .assert()
        .success()
        .stderr(contains("Session #1 deleted (10 samples"));

    s.cmd()
        .arg("sessions")
        .assert()
        .success()
        .stdout(contains("Laguna").not());
}

#[test]
fn test_session_update_renames() {
    let s = imported();
    s.cmd()
        .args(["session", "update", "1", "--name", "Sonoma"])
        .assert()
        .success();

    s.cmd()
        .arg("sessions")
        .assert()
        .success()
        .stdout(contains("Sonoma").and(contains("Laguna").not()));
}

#[test]
fn test_stats_and_unknown_channel() {
    let s = imported();
    s.cmd()
        .args(["stats", "RPM", "--session", "1"])
        .assert()
        .success()
        .stdout(contains("5450.000").and(contains("5000.000")).and(contains("5900.000")));

    s.cmd()
        .args(["stats", "Boost"])
        .assert()
        .failure()
        .stderr(contains("Boost"));
}

#[test]
fn test_channels_as_json() {
    let s = imported();
    let out = s
        .cmd()
        .args(["channels", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let names: Vec<&str> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Coolant"));
    assert!(names.contains(&"RPM"));
}

#[test]
fn test_smoothing_set_and_show() {
    let s = imported();
    s.cmd()
        .args(["smoothing", "RPM", "0"])
        .assert()
        .success()
        .stderr(contains("Smoothing for RPM set to 1"));

    s.cmd().args(["smoothing", "RPM", "5"]).assert().success();
    s.cmd()
        .args(["smoothing", "RPM"])
        .assert()
        .success()
        .stdout("5\n");

    s.cmd()
        .args(["smoothing", "Boost", "3"])
        .assert()
        .failure();
}

#[test]
fn test_laps_listing() {
    let s = Scratch::new();
    let log = s.write("laps.log", LAP_LOG);
    s.cmd()
        .args(["import", log.to_str().unwrap()])
        .assert()
        .success();

    s.cmd()
        .args(["laps", "1"])
        .assert()
        .success()
        .stdout(contains("1.500").and(contains("1.400")));
}

#[test]
fn test_center_without_gps() {
    let s = imported();
    s.cmd()
        .arg("center")
        .assert()
        .success()
        .stdout("0.000, 0.000\n");
}

#[test]
fn test_db_info_and_check() {
    let s = imported();
    s.cmd()
        .args(["db", "--info", "--check"])
        .assert()
        .success()
        .stdout(contains("Sessions    : 1").and(contains("Samples     : 10")))
        .stderr(contains("Integrity check passed"));
}

#[test]
fn test_log_lists_operations() {
    let s = imported();
    s.cmd()
        .arg("log")
        .assert()
        .success()
        .stdout(contains("import").and(contains("migration_applied")));
}
