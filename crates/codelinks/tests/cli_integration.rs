//! Integration tests that run the codelinks binary

use std::path::{Path, PathBuf};
use std::process::Command;

fn codelinks_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_codelinks"))
}

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("demo")
}

fn read_json(path: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_json::from_str(&content).expect("output should be valid JSON")
}

#[test]
fn test_analyse_command_writes_outputs() {
    let outdir = tempfile::tempdir().unwrap();
    let output = codelinks_bin()
        .arg("analyse")
        .arg(fixtures_dir().join("config.yaml"))
        .arg("-o")
        .arg(outdir.path())
        .output()
        .expect("Failed to run codelinks");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "Command should succeed: {}", stderr);
    assert!(stderr.contains("firmware"), "Should report the project: {}", stderr);
    assert!(stderr.contains("too_many_fields"), "Should print warnings: {}", stderr);

    let content = read_json(&outdir.path().join("marked_content.json"));
    let firmware = content["firmware"].as_array().unwrap();
    let types: Vec<&str> = firmware
        .iter()
        .map(|r| r["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["need-id-refs", "need", "rst"]);
    assert_eq!(firmware[0]["need_ids"], serde_json::json!(["REQ_UART_1"]));
    assert_eq!(firmware[1]["need"]["id"], "IMPL_UART_TX");
    assert_eq!(firmware[1]["need"]["links"], serde_json::json!(["REQ_UART_2"]));
    assert_eq!(firmware[2]["need"]["id"], "IMPL_UART_RX");
    assert!(
        firmware
            .iter()
            .all(|r| !r["filepath"].as_str().unwrap().contains("generated")),
        "excluded files are not analysed"
    );

    let tools = content["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["need_ids"], serde_json::json!(["REQ_TOOL_FLASH"]));
    assert!(
        tools[0]["tagged_scope"]
            .as_str()
            .unwrap()
            .starts_with("def flash(image):")
    );

    let warnings = read_json(&outdir.path().join("warnings/codelinks_warnings.json"));
    let warnings = warnings.as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["type"], "need");
    assert_eq!(warnings[0]["sub_type"], "too_many_fields");
    assert_eq!(warnings[0]["lineno"], 16);
}

#[test]
fn test_analyse_command_single_project() {
    let outdir = tempfile::tempdir().unwrap();
    let output = codelinks_bin()
        .arg("analyse")
        .arg(fixtures_dir().join("config.yaml"))
        .arg("-o")
        .arg(outdir.path())
        .arg("-p")
        .arg("tools")
        .output()
        .expect("Failed to run codelinks");
    assert!(output.status.success());

    let content = read_json(&outdir.path().join("marked_content.json"));
    let keys: Vec<&String> = content.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["tools"]);
}

#[test]
fn test_analyse_command_unknown_project() {
    let outdir = tempfile::tempdir().unwrap();
    let output = codelinks_bin()
        .arg("analyse")
        .arg(fixtures_dir().join("config.yaml"))
        .arg("-o")
        .arg(outdir.path())
        .arg("-p")
        .arg("nope")
        .output()
        .expect("Failed to run codelinks");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Project 'nope' is not defined"), "{}", stderr);
    assert!(!outdir.path().join("marked_content.json").exists());
}

#[test]
fn test_analyse_command_reports_every_config_error() {
    let outdir = tempfile::tempdir().unwrap();
    let output = codelinks_bin()
        .arg("analyse")
        .arg(fixtures_dir().join("invalid.yaml"))
        .arg("-o")
        .arg(outdir.path())
        .output()
        .expect("Failed to run codelinks");

    assert!(!output.status.success(), "Invalid config should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Project 'broken' has the following errors:"), "{}", stderr);
    assert!(stderr.contains("Unknown language 'cobol'"), "{}", stderr);
    assert!(stderr.contains("Project 'conflicting' has the following errors:"), "{}", stderr);
    assert!(stderr.contains("Marker @rst is defined multiple times"), "{}", stderr);
    assert!(!outdir.path().join("marked_content.json").exists());
}

#[test]
fn test_analyse_command_missing_config() {
    let dir = tempfile::tempdir().unwrap();
    let output = codelinks_bin()
        .arg("analyse")
        .arg(dir.path().join("config.yaml"))
        .output()
        .expect("Failed to run codelinks");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Config file not found"), "{}", stderr);
}

#[test]
fn test_discover_command() {
    let src = fixtures_dir().join("src");
    let output = codelinks_bin()
        .arg("discover")
        .arg(&src)
        .arg("-e")
        .arg("generated/*")
        .arg("-l")
        .arg("cpp")
        .output()
        .expect("Failed to run codelinks");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "1 files discovered");
    assert!(lines[1].ends_with("uart.cpp"), "{}", stdout);
}

#[test]
fn test_discover_command_unknown_language() {
    let output = codelinks_bin()
        .arg("discover")
        .arg(fixtures_dir())
        .arg("-l")
        .arg("cobol")
        .output()
        .expect("Failed to run codelinks");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown language 'cobol'"), "{}", stderr);
}

#[test]
fn test_write_command_renders_needextend() {
    let outdir = tempfile::tempdir().unwrap();
    let outpath = outdir.path().join("needextend.rst");
    let output = codelinks_bin()
        .arg("write")
        .arg(fixtures_dir().join("marked_content.json"))
        .arg("-o")
        .arg(&outpath)
        .arg("--title")
        .arg("Code links")
        .output()
        .expect("Failed to run codelinks");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "Command should succeed: {}", stderr);
    assert!(stderr.contains("Wrote 2 needextend directives"), "{}", stderr);

    let text = std::fs::read_to_string(&outpath).unwrap();
    assert_eq!(
        text,
        "Code links\n==========\n\n\
         .. needextend:: REQ_UART_1\n   \
         :remote-url: https://github.com/acme/firmware/blob/4f2a9c1/src/uart.cpp#L3,\
         https://github.com/acme/firmware/blob/4f2a9c1/tools/flash.py#L1\n\n\
         .. needextend:: REQ_TOOL_FLASH\n   \
         :remote-url: https://github.com/acme/firmware/blob/4f2a9c1/tools/flash.py#L1\n\n"
    );
}

#[test]
fn test_write_command_single_project_and_field() {
    let outdir = tempfile::tempdir().unwrap();
    let outpath = outdir.path().join("tools.rst");
    let output = codelinks_bin()
        .arg("write")
        .arg(fixtures_dir().join("marked_content.json"))
        .arg("-o")
        .arg(&outpath)
        .arg("-p")
        .arg("tools")
        .arg("--remote-url-field")
        .arg("source")
        .output()
        .expect("Failed to run codelinks");
    assert!(output.status.success());

    let text = std::fs::read_to_string(&outpath).unwrap();
    assert!(text.starts_with(".. needextend:: REQ_TOOL_FLASH\n   :source: "), "{}", text);
    assert!(!text.contains("uart.cpp"), "{}", text);
}

#[test]
fn test_write_command_rejects_invalid_records() {
    let dir = tempfile::tempdir().unwrap();
    let marked = dir.path().join("marked_content.json");
    std::fs::write(
        &marked,
        r#"{"demo": [{"filepath": "a.c", "remote_url": null,
            "source_map": {"start": {"row": 0, "column": 0}, "end": {"row": 0, "column": 1}},
            "type": "need-id-refs", "need_ids": []}]}"#,
    )
    .unwrap();
    let outpath = dir.path().join("needextend.rst");
    let output = codelinks_bin()
        .arg("write")
        .arg(&marked)
        .arg("-o")
        .arg(&outpath)
        .output()
        .expect("Failed to run codelinks");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Marked content #0 (a.c) has the following errors:"), "{}", stderr);
    assert!(stderr.contains("Marker is required"), "{}", stderr);
    assert!(!outpath.exists(), "nothing is written for invalid records");
}
