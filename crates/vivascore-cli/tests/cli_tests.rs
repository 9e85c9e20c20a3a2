//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const BANK: &str = "../../question-banks/data-structures.toml";
const ANSWERS: &str = "../../answers/sample-session.toml";

fn vivascore() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("vivascore").unwrap()
}

#[test]
fn validate_valid_bank() {
    vivascore()
        .arg("validate")
        .arg("--bank")
        .arg(BANK)
        .assert()
        .success()
        .stdout(predicate::str::contains("4 questions"))
        .stdout(predicate::str::contains("All question banks valid"));
}

#[test]
fn validate_directory() {
    vivascore()
        .arg("validate")
        .arg("--bank")
        .arg("../../question-banks")
        .assert()
        .success()
        .stdout(predicate::str::contains("Data Structures"))
        .stdout(predicate::str::contains("Operating Systems"));
}

#[test]
fn validate_bank_with_answers() {
    vivascore()
        .args(["validate", "--bank", BANK, "--answers", ANSWERS])
        .assert()
        .success()
        .stdout(predicate::str::contains("session sample-session (3 answers)"))
        .stdout(predicate::str::contains("All question banks valid"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let bank = dir.path().join("bank.toml");
    std::fs::write(
        &bank,
        r#"
[bank]
id = "dup"
name = "Duplicates"

[[questions]]
id = 1
question = "Explain recursion."
must_have_concepts = ["base case"]

[[questions]]
id = 1
question = "Explain iteration."
must_have_concepts = ["loop"]
"#,
    )
    .unwrap();

    vivascore()
        .arg("validate")
        .arg("--bank")
        .arg(&bank)
        .assert()
        .success()
        .stdout(predicate::str::contains("duplicate question ID: 1"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    vivascore()
        .arg("validate")
        .arg("--bank")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn evaluate_text_with_rubric() {
    let dir = TempDir::new().unwrap();
    let transcript = dir.path().join("answer.txt");
    std::fs::write(
        &transcript,
        "A hash map is a data structure for key value pairs. It works by using a hash \
         function to pick a bucket. A collision is handled by chaining. For example, a \
         phone book. In summary, lookups are fast.",
    )
    .unwrap();

    vivascore()
        .arg("evaluate")
        .arg("--transcript")
        .arg(&transcript)
        .args(["--bank", BANK, "--question", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Technical"))
        .stdout(predicate::str::contains("excellent_structure"))
        .stdout(predicate::str::contains("Overall score:"));
}

#[test]
fn evaluate_json_from_stdin() {
    let output = vivascore()
        .args(["evaluate", "--transcript", "-", "--format", "json"])
        .write_stdin("Um, a stack is, like, a list. Uh, you push things.")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["status"], "complete");
    let overall = value["overall_score"].as_f64().unwrap();
    assert!((0.0..=10.0).contains(&overall));
    assert!(value["suggestions"].as_array().unwrap().len() <= 5);
}

#[test]
fn evaluate_markdown_with_audio_file() {
    let dir = TempDir::new().unwrap();
    let transcript = dir.path().join("answer.txt");
    std::fs::write(&transcript, "A queue is first in first out. It is definitely useful.")
        .unwrap();
    let audio = dir.path().join("audio.json");
    std::fs::write(&audio, r#"{"speaking_rate": 90.0, "long_pauses": 5}"#).unwrap();

    vivascore()
        .arg("evaluate")
        .arg("--transcript")
        .arg(&transcript)
        .arg("--audio")
        .arg(&audio)
        .args(["--format", "markdown"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Interview answer feedback"))
        .stdout(predicate::str::contains("## Suggestions"));
}

#[test]
fn evaluate_unknown_question() {
    let dir = TempDir::new().unwrap();
    let transcript = dir.path().join("answer.txt");
    std::fs::write(&transcript, "Some answer.").unwrap();

    vivascore()
        .arg("evaluate")
        .arg("--transcript")
        .arg(&transcript)
        .args(["--bank", BANK, "--question", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("question 99 not found"));
}

#[test]
fn evaluate_empty_transcript() {
    vivascore()
        .args(["evaluate", "--transcript", "-"])
        .write_stdin("   \n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("transcript is empty"));
}

#[test]
fn batch_writes_reports() {
    let dir = TempDir::new().unwrap();

    vivascore()
        .args(["batch", "--answers", ANSWERS, "--bank", BANK, "--format", "all"])
        .arg("--output")
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Complete: 3/3 evaluated"));

    let files: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(files.iter().any(|f| f.ends_with(".json")));
    assert!(files.iter().any(|f| f.ends_with(".html")));
}

#[test]
fn batch_without_bank_fails() {
    let dir = TempDir::new().unwrap();

    vivascore()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("batch")
        .arg("--answers")
        .arg(std::fs::canonicalize(ANSWERS).unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no question bank given"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    vivascore()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created vivascore.toml"))
        .stdout(predicate::str::contains("Created question-banks/example.toml"))
        .stdout(predicate::str::contains("Created answers/example.toml"));

    assert!(dir.path().join("vivascore.toml").exists());
    assert!(dir.path().join("question-banks/example.toml").exists());
    assert!(dir.path().join("answers/example.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    vivascore()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    vivascore()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn init_output_is_usable() {
    let dir = TempDir::new().unwrap();

    vivascore()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    vivascore()
        .current_dir(dir.path())
        .args([
            "validate",
            "--bank",
            "question-banks/example.toml",
            "--answers",
            "answers/example.toml",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("All question banks valid"));

    vivascore()
        .current_dir(dir.path())
        .args(["batch", "--answers", "answers/example.toml"])
        .assert()
        .success();
    assert!(dir.path().join("vivascore-results").is_dir());
}
