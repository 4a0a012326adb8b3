use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn home() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.json"),
        r#"{"submission_delay_ms":0}"#,
    )
    .unwrap();
    dir
}

fn cli(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("student_form_cli").unwrap();
    cmd.env("STUDENT_FORM_CLI_SCRIPT", "1")
        .env("STUDENT_FORM_HOME", home.path())
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn save_persists_draft_to_storage_file() {
    let home = home();

    cli(&home)
        .write_stdin("set firstName Jo\nset school \"Central High\"\nsave\nexit\n")
        .assert()
        .success()
        .stdout(contains("Draft saved automatically"));

    let stored = fs::read_to_string(home.path().join("storage.json")).unwrap();
    assert!(stored.contains("studentFormDraft"));
    assert!(stored.contains("Central High"));
}

#[test]
fn pending_autosave_is_flushed_on_exit() {
    let home = home();

    cli(&home)
        .write_stdin("set lastName Doe\n")
        .assert()
        .success();

    cli(&home)
        .write_stdin("show\nexit\n")
        .assert()
        .success()
        .stdout(contains("Draft loaded successfully").and(contains("Doe")));
}

#[test]
fn unknown_command_suggests_closest_match() {
    let home = home();

    cli(&home)
        .write_stdin("sbumit\nexit\n")
        .assert()
        .success()
        .stdout(contains("Unknown command `sbumit`").and(contains("Suggestion: `submit`?")));
}

#[test]
fn incomplete_form_is_not_submitted() {
    let home = home();

    cli(&home)
        .write_stdin("set firstName Jo\nsubmit\nexit\n")
        .assert()
        .success()
        .stdout(
            contains("Please fill in all required fields correctly")
                .and(contains("email: This field is required"))
                .and(contains("Submission Summary").not()),
        );
}

#[test]
fn complete_form_shows_submission_summary() {
    let home = home();
    let script = [
        "set firstName Jo",
        "set lastName Doe",
        "set email jo@school.edu",
        "set dateOfBirth 2008-03-14",
        "set studentId S-1042",
        "set school \"Central High\"",
        "change grade 11",
        "submit",
        "close",
        "exit",
    ]
    .join("\n");

    cli(&home)
        .write_stdin(script)
        .assert()
        .success()
        .stdout(
            contains("Submission Summary")
                .and(contains("Jo Doe"))
                .and(contains("Dialog closed.")),
        );

    let stored = fs::read_to_string(home.path().join("storage.json")).unwrap();
    assert!(!stored.contains("studentFormDraft"));
}

#[test]
fn export_and_print_render_current_values() {
    let home = home();
    let target = home.path().join("out.json");
    let script = format!(
        "set firstName Jo\nset lastName Doe\nexport {}\nprint\nexit\n",
        target.display()
    );

    cli(&home)
        .write_stdin(script)
        .assert()
        .success()
        .stdout(contains("Student Information").and(contains("Phone: N/A")));

    let json = fs::read_to_string(target).unwrap();
    assert!(json.contains("\"firstName\": \"Jo\""));
}

#[test]
fn fill_requires_interactive_terminal() {
    let home = home();

    cli(&home)
        .write_stdin("fill\nexit\n")
        .assert()
        .success()
        .stdout(contains("`fill` requires an interactive terminal"));
}
