//! Behavioural tests for the `kumo` command line.

use std::fs;
use std::str;

use assert_cmd::Command;
use camino::Utf8PathBuf;
use clap::Parser;
use kumo::config::MapConfiguration;
use kumo::{Registry, RegistryBuilder, StepError};
use kumo_cli::cli::Cli;
use rstest::{fixture, rstest};
use serial_test::serial;
use tempfile::TempDir;

const GREETINGS: &str = "\
Feature: Greetings
  @smoke
  Scenario: Hello
    Given a greeting for ${name}
    Then the greeting has 11 characters

  Scenario: Rude
    Given a greeting for nobody
    Then the greeting has 99 characters
";

struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    fn write(&self, name: &str, text: &str) -> Utf8PathBuf {
        let path = self.root.join(name);
        fs::write(&path, text).unwrap_or_else(|error| panic!("write {path}: {error}"));
        path
    }
}

#[fixture]
fn workspace() -> Workspace {
    let dir = TempDir::new().unwrap_or_else(|error| panic!("temp dir: {error}"));
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .unwrap_or_else(|path| panic!("non UTF-8 temp dir {}", path.display()));
    Workspace { _dir: dir, root }
}

fn greetings() -> RegistryBuilder {
    let mut builder = Registry::builder();
    builder
        .step("a greeting for {name:word}", |step| {
            let greeting = format!("hello {}", step.string(0)?);
            step.context_mut().insert("greeting", greeting.clone().into());
            Ok(Some(greeting.into()))
        })
        .step("the greeting has {count:integer} characters", |step| {
            let expected = step.integer(0)?;
            let length = step
                .context()
                .get("greeting")
                .and_then(serde_json::Value::as_str)
                .map_or(0, |greeting| greeting.chars().count());
            if i64::try_from(length).ok() == Some(expected) {
                Ok(None)
            } else {
                Err(StepError::assertion(format!("greeting has {length} characters")))
            }
        });
    builder
}

fn execute(argv: &[&str], environment: &[(&str, &str)]) -> (bool, String) {
    let cli = Cli::try_parse_from(argv.iter().copied()).unwrap_or_else(|error| panic!("{error}"));
    let environment: MapConfiguration = environment.iter().copied().collect();
    let mut stdout = Vec::new();
    let succeeded = cli
        .execute(&environment, greetings(), &mut stdout)
        .unwrap_or_else(|error| panic!("{error}"));
    let stdout = String::from_utf8(stdout).unwrap_or_else(|error| panic!("{error}"));
    (succeeded, stdout)
}

#[rstest]
fn check_reports_clean_documents(workspace: Workspace) {
    workspace.write("greetings.feature", GREETINGS);
    let (succeeded, stdout) = execute(&["kumo", "check", workspace.root.as_str()], &[]);
    assert!(succeeded);
    assert_eq!(stdout, "1 documents, 2 test cases, no problems found\n");
}

#[rstest]
fn check_lists_every_parse_error(workspace: Workspace) {
    let path = workspace.write(
        "broken.feature",
        "Feature: Broken\n  Scenario Outline: o\n    Given <x>\n  Background:\n    Given b\n",
    );
    let (succeeded, stdout) = execute(&["kumo", "check", path.as_str()], &[]);
    assert!(!succeeded);
    let lines: Vec<_> = stdout.lines().collect();
    assert!(lines.len() >= 2, "{stdout}");
    assert!(lines.iter().all(|line| line.starts_with(path.as_str())), "{stdout}");
}

#[rstest]
fn run_passes_with_tag_filter_and_properties(workspace: Workspace) {
    workspace.write("greetings.feature", GREETINGS);
    let output = workspace.root.join("results.json");
    let (succeeded, stdout) = execute(
        &[
            "kumo",
            "run",
            workspace.root.as_str(),
            "--tag-filter",
            "@smoke",
            "--output",
            output.as_str(),
        ],
        &[("kumo.property.name", "world")],
    );
    assert!(succeeded);
    assert!(stdout.is_empty());
    let text = fs::read_to_string(&output).unwrap_or_else(|error| panic!("{error}"));
    let results: serde_json::Value =
        serde_json::from_str(&text).unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(results.pointer("/result"), Some(&"PASSED".into()));
    assert_eq!(
        results.pointer("/children/0/children/0/children/0/name"),
        Some(&"a greeting for world".into())
    );
}

#[rstest]
fn run_fails_when_any_scenario_fails(workspace: Workspace) {
    workspace.write("greetings.feature", GREETINGS);
    let (succeeded, stdout) = execute(
        &["kumo", "run", workspace.root.as_str()],
        &[("kumo.property.name", "world")],
    );
    assert!(!succeeded);
    let results: serde_json::Value =
        serde_json::from_str(&stdout).unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(results.pointer("/result"), Some(&"FAILED".into()));
    assert_eq!(results.pointer("/test_cases/FAILED"), Some(&serde_json::json!(1)));
}

#[rstest]
fn plan_writes_the_compiled_tree(workspace: Workspace) {
    workspace.write("greetings.feature", GREETINGS);
    let (succeeded, stdout) = execute(&["kumo", "plan", workspace.root.as_str()], &[]);
    assert!(succeeded);
    let plan: serde_json::Value =
        serde_json::from_str(&stdout).unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(plan.pointer("/kind"), Some(&"PLAN".into()));
    assert_eq!(
        plan.pointer("/children/0/children/1/name"),
        Some(&"Rude".into())
    );
}

#[rstest]
#[serial]
fn binary_check_exits_with_failure_on_errors(workspace: Workspace) {
    let path = workspace.write("broken.feature", "Feature: A\nFeature: B\n");
    let output = Command::cargo_bin("kumo")
        .unwrap_or_else(|error| panic!("binary exists: {error}"))
        .args(["check", path.as_str()])
        .env("KUMO_LOG_LEVEL", "error")
        .output()
        .unwrap_or_else(|error| panic!("runs: {error}"));
    assert!(!output.status.success());
    let stdout = str::from_utf8(&output.stdout).unwrap_or_else(|error| panic!("utf8: {error}"));
    assert!(stdout.contains("only one Feature"), "{stdout}");
}

#[rstest]
#[serial]
fn binary_rejects_missing_paths(workspace: Workspace) {
    let missing = workspace.root.join("missing");
    let output = Command::cargo_bin("kumo")
        .unwrap_or_else(|error| panic!("binary exists: {error}"))
        .args(["plan", missing.as_str()])
        .output()
        .unwrap_or_else(|error| panic!("runs: {error}"));
    assert!(!output.status.success());
    let stderr = str::from_utf8(&output.stderr).unwrap_or_else(|error| panic!("utf8: {error}"));
    assert!(stderr.contains("failed to search"), "{stderr}");
}
