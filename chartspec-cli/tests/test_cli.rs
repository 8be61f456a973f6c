use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn run(args: &[&str]) -> Value {
    let output = Command::cargo_bin("chartspec")
        .unwrap()
        .args(args)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_synthesizes_from_columns() {
    let columns = write_file(
        ".json",
        &json!({
            "columns": [
                {"name": "day", "type": "date"},
                {"name": "count", "type": "integer"}
            ],
            "rows": [{"day": "2024-01-01", "count": 4}]
        })
        .to_string(),
    );
    let handoff = run(&[
        "--columns",
        columns.path().to_str().unwrap(),
        "--context",
        "editor",
        "--width",
        "1000",
        "--height",
        "900",
    ]);

    // Clamped to 800x536, less the default padding and the editor's vertical padding
    assert_eq!(handoff["width"], json!(790.0));
    assert_eq!(handoff["height"], json!(506.0));
    assert_eq!(handoff["spec"]["data"][0]["name"], json!("query_results"));
    assert_eq!(handoff["spec"]["data"][0]["values"][0]["count"], json!(4));
    assert!(handoff["spec"].get("width").is_none());
}

#[test]
fn test_yaml_spec_with_theme() {
    let spec = write_file(
        ".yaml",
        "width: 300\nmark: bar\nencoding:\n  x:\n    field: a\n    type: nominal\n",
    );
    let handoff = run(&[
        "--spec",
        spec.path().to_str().unwrap(),
        "--theme",
        "dark",
        "--context",
        "query",
    ]);
    assert_eq!(handoff["width"], json!(300.0));
    assert_eq!(handoff["spec"]["width"], json!(300));
    assert_eq!(handoff["spec"]["config"]["background"], json!("#333"));
}

#[test]
fn test_invalid_spec_warns() {
    let spec = write_file(".json", "{\"mark\": ");
    Command::cargo_bin("chartspec")
        .unwrap()
        .args(["--spec", spec.path().to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("warning:"))
        .stdout(predicate::str::contains("\"spec\""));
}

#[test]
fn test_empty_container_fails() {
    Command::cargo_bin("chartspec")
        .unwrap()
        .args(["--width", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Container size must be positive"));
}
