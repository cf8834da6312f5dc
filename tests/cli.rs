//! Tests for the command line, run against the built binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn spinweave_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_spinweave"));
    // Keep the user's real config out of the tests.
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("SPINWEAVE_LOG")
        .env("RUST_LOG", "warn");
    cmd
}

fn json_lines(output: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout line is JSON"))
        .collect()
}

#[test]
fn test_help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    let output = spinweave_cmd(home.path())
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    for subcommand in ["slots", "spin", "decode", "encode", "count", "generate"] {
        assert!(stdout.contains(subcommand), "missing {}", subcommand);
    }
}

#[test]
fn test_slots_reports_total() {
    let home = TempDir::new().unwrap();
    let output = spinweave_cmd(home.path())
        .args(["slots", "{Hello|Hi} {World|Friend|{Universe|Cosmos}}"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines[0]["total_combinations"], 12);
    assert_eq!(lines[0]["distinct_combinations"], 8);
    assert_eq!(lines[0]["slots"].as_array().map(Vec::len), Some(3));
}

#[test]
fn test_spin_with_seed_is_reproducible() {
    let home = TempDir::new().unwrap();
    let run = || {
        spinweave_cmd(home.path())
            .args(["spin", "{a|b|c} {d|e|f} {{who}}", "--seed", "42", "-n", "3"])
            .args(["--var", "who=you"])
            .output()
            .expect("Failed to execute command")
    };

    let first = json_lines(&run());
    let second = json_lines(&run());
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert!(first[0]["text"].as_str().unwrap().ends_with(" you"));
}

#[test]
fn test_decode_and_encode() {
    let home = TempDir::new().unwrap();
    let output = spinweave_cmd(home.path())
        .args(["decode", "23", "--sizes", "2,3,4"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    assert_eq!(json_lines(&output)[0]["address"], serde_json::json!([1, 2, 3]));

    let output = spinweave_cmd(home.path())
        .args(["encode", "1,2,3", "--sizes", "2,3,4"])
        .output()
        .expect("Failed to execute command");
    assert_eq!(json_lines(&output)[0]["index"], 23);
}

#[test]
fn test_decode_out_of_range_exits_with_error() {
    let home = TempDir::new().unwrap();
    let output = spinweave_cmd(home.path())
        .args(["decode", "24", "--sizes", "2,3,4"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Invalid configuration"));
}

fn write_campaign(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("campaign.toml");
    fs::write(
        &path,
        "site_id = \"cli\"\ntemplate = \"{Call|Hire} a {{niche}} pro\"\nniches = [\"roofing\", \"hvac\", \"siding\"]\n",
    )
    .unwrap();
    path
}

#[test]
fn test_count_describes_campaign() {
    let home = TempDir::new().unwrap();
    let campaign = write_campaign(home.path());
    let output = spinweave_cmd(home.path())
        .arg("count")
        .arg("--campaign")
        .arg(&campaign)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let metadata = &json_lines(&output)[0];
    assert_eq!(metadata["total_possible_combinations"], 6);
    assert_eq!(metadata["generated_count"], 0);
}

#[test]
fn test_generate_with_file_ledger_resumes() {
    let home = TempDir::new().unwrap();
    let campaign = write_campaign(home.path());
    let ledger = home.path().join("ledger.log");

    let generate = |offset: &str| {
        spinweave_cmd(home.path())
            .arg("generate")
            .arg("--campaign")
            .arg(&campaign)
            .arg("--ledger")
            .arg(&ledger)
            .args(["--offset", offset, "--batch-size", "4"])
            .output()
            .expect("Failed to execute command")
    };

    let first = json_lines(&generate("0"));
    assert_eq!(first.len(), 5);
    assert_eq!(first[0]["text"], "Call a roofing pro");
    let metadata = &first[4]["metadata"];
    assert_eq!(metadata["next_offset"], 4);

    let second = json_lines(&generate("0"));
    let metadata = &second.last().unwrap()["metadata"];
    assert_eq!(metadata["generated_count"], 0);
    assert_eq!(metadata["skipped_duplicates"], 4);

    let third = json_lines(&generate("4"));
    assert_eq!(third.len(), 3);
    assert!(third[1]["metadata"].is_null());
    assert_eq!(third[2]["metadata"]["next_offset"], 6);
}
