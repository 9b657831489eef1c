//! End-to-end runs of the `schoolrec` binary against a temporary database

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn schoolrec(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("schoolrec").unwrap();
    cmd.env_remove("SCHOOLREC_LOG_DIR")
        .env_remove("SCHOOLREC_LOG_LEVEL")
        .arg("--db")
        .arg(db);
    cmd
}

fn seed_class_and_student(db: &Path) {
    schoolrec(db)
        .args(["class", "add", "--name", "J2-01", "--level", "J2"])
        .assert()
        .success();
    schoolrec(db)
        .args([
            "student",
            "add",
            "--name",
            "Ben",
            "--age",
            "18",
            "--year-enrolled",
            "2022",
            "--grad-year",
            "2023",
            "--class",
            "J2-01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"student_id\": 1"));
}

#[test]
fn test_student_help_lists_operations() {
    let dir = tempfile::tempdir().unwrap();
    schoolrec(&dir.path().join("records.sqlite3"))
        .args(["student", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("delete"));
}

#[test]
fn test_student_round_trip_prints_class_name() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("records.sqlite3");
    seed_class_and_student(&db);

    schoolrec(&db)
        .args(["student", "get", "Be"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"class_name\": \"J2-01\""));
}

#[test]
fn test_duplicate_cca_reports_sentence_and_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("records.sqlite3");

    schoolrec(&db)
        .args(["cca", "add", "--name", "Choir", "--type", "Performing"])
        .assert()
        .success();
    schoolrec(&db)
        .args(["cca", "add", "--name", "Choir", "--type", "Performing"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("The CCA Choir already exists"));
}

#[test]
fn test_cca_delete_cascades_memberships() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("records.sqlite3");
    seed_class_and_student(&db);

    schoolrec(&db)
        .args(["cca", "add", "--name", "Choir", "--type", "Performing"])
        .assert()
        .success();
    schoolrec(&db)
        .args([
            "cca",
            "add-student",
            "--student",
            "Ben",
            "--cca",
            "Choir",
            "--role",
            "Member",
        ])
        .assert()
        .success();
    schoolrec(&db)
        .args(["cca", "memberships", "Ben"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"role\": \"Member\""));

    schoolrec(&db)
        .args(["cca", "delete", "Choir"])
        .assert()
        .success();
    schoolrec(&db)
        .args(["cca", "memberships", "Ben"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_unknown_class_is_reported_as_invalid_reference() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("records.sqlite3");

    schoolrec(&db)
        .args([
            "student",
            "add",
            "--name",
            "Ben",
            "--age",
            "18",
            "--year-enrolled",
            "2022",
            "--grad-year",
            "2023",
            "--class",
            "NoSuchClass",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No Class matches NoSuchClass"));
}

#[test]
fn test_subject_enroll_accepts_repeated_subjects() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("records.sqlite3");
    seed_class_and_student(&db);

    for (name, level) in [("Physics", "H2"), ("Economics", "H1")] {
        schoolrec(&db)
            .args(["subject", "add", "--name", name, "--level", level])
            .assert()
            .success();
    }
    schoolrec(&db)
        .args([
            "subject",
            "enroll",
            "Ben",
            "--subject",
            "Physics:H2",
            "--subject",
            "Economics:H1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"enrolled\": 2"));
    schoolrec(&db)
        .args(["subject", "enrollments", "Ben"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Economics"));
}

#[test]
fn test_invalid_activity_date_is_malformed_input() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("records.sqlite3");

    schoolrec(&db)
        .args([
            "activity",
            "add",
            "--name",
            "Open House",
            "--start",
            "2023-13-01",
            "--description",
            "Guide visitors",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn test_import_students_reports_counts() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("records.sqlite3");
    let csv = dir.path().join("students.csv");
    std::fs::write(
        &csv,
        "student_name,class_id,year_enrolled\nBen,J2-01,2022\nCara,J2-02,2022\n",
    )
    .unwrap();

    schoolrec(&db)
        .arg("import")
        .arg("students")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"added\": 2"))
        .stdout(predicate::str::contains("\"classes_created\": 2"));
}

#[test]
fn test_log_dir_receives_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("records.sqlite3");
    let log_dir = dir.path().join("logs");

    schoolrec(&db)
        .arg("--log-dir")
        .arg(&log_dir)
        .args(["--log-level", "info", "class", "list"])
        .assert()
        .success();

    let has_log = std::fs::read_dir(&log_dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .any(|entry| entry.file_name().to_string_lossy().starts_with("schoolrec"));
    assert!(has_log);
}
