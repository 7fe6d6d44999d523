//! Integration tests for the `scriptloc` binary

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// Helper function to get the path to the scriptloc binary
fn scriptloc_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_scriptloc"))
}

/// Helper function to create a test file
fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_inspect_reports_matches() {
    let temp_dir = TempDir::new().unwrap();
    let file = create_test_file(
        &temp_dir,
        "m.scr",
        "fn greet() {\n    t(\"hello\")\n}\n",
    );

    let output = Command::new(scriptloc_bin())
        .arg("inspect")
        .arg(&file)
        .arg("--funcs")
        .arg("t")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"hello\""));
    assert!(stdout.contains("greet()"));
    // inspection never rewrites
    let source = fs::read_to_string(&file).unwrap();
    assert!(source.contains("t(\"hello\")"));
}

#[test]
fn test_extract_dry_run_prints_instead_of_writing() {
    let temp_dir = TempDir::new().unwrap();
    let file = create_test_file(
        &temp_dir,
        "m.scr",
        "fn greet() {\n    t(\"hello\")\n}\n",
    );

    let output = Command::new(scriptloc_bin())
        .arg("extract")
        .arg(&file)
        .arg("--funcs")
        .arg("t")
        .arg("--catalog-root")
        .arg(temp_dir.path().join("trans"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("loc.lookup(lang,"));
    assert!(stdout.contains("\"counter\": 1"));
    assert!(!temp_dir.path().join("trans").exists());
    assert!(fs::read_to_string(&file).unwrap().contains("t(\"hello\")"));
}

#[test]
fn test_extract_apply_writes_source_and_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let file = create_test_file(
        &temp_dir,
        "m.scr",
        "fn greet() {\n    t(\"hello\")\n}\n",
    );

    let output = Command::new(scriptloc_bin())
        .arg("extract")
        .arg(&file)
        .arg("--apply")
        .arg("--funcs")
        .arg("t")
        .arg("--catalog-root")
        .arg(temp_dir.path().join("trans"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let source = fs::read_to_string(&file).unwrap();
    assert!(source.contains("loc.lookup(lang,"));
    assert!(temp_dir.path().join("trans/en-GB").exists());
}

#[test]
fn test_check_exits_nonzero_on_violation() {
    let temp_dir = TempDir::new().unwrap();
    let trans = temp_dir.path().join("trans");
    fs::create_dir_all(trans.join("en-GB")).unwrap();
    fs::create_dir_all(trans.join("fr-FR")).unwrap();
    fs::write(
        trans.join("en-GB/m.json"),
        "{\n  \"counter\": 1,\n  \"rows\": [\n    {\n      \"id\": 1,\n      \"name\": \"m.scr:1\",\n      \"value\": \"Hello {1}\",\n      \"comment\": \"m.scr:1\"\n    }\n  ]\n}\n",
    )
    .unwrap();
    fs::write(
        trans.join("fr-FR/m.json"),
        "{\n  \"counter\": 1,\n  \"rows\": [\n    {\n      \"id\": 1,\n      \"name\": \"m.scr:1\",\n      \"value\": \"Bonjour\",\n      \"comment\": \"Hello {1}\"\n    }\n  ]\n}\n",
    )
    .unwrap();

    let output = Command::new(scriptloc_bin())
        .arg("check")
        .arg("fr-FR")
        .arg("--catalog-root")
        .arg(&trans)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing placeholder {1}"));
}

#[test]
fn test_check_passes_on_clean_catalogs() {
    let temp_dir = TempDir::new().unwrap();
    let trans = temp_dir.path().join("trans");
    fs::create_dir_all(trans.join("en-GB")).unwrap();
    fs::create_dir_all(trans.join("fr-FR")).unwrap();
    fs::write(
        trans.join("en-GB/m.json"),
        "{\n  \"counter\": 1,\n  \"rows\": [\n    {\n      \"id\": 1,\n      \"name\": \"m.scr:1\",\n      \"value\": \"Hello {1}\",\n      \"comment\": \"m.scr:1\"\n    }\n  ]\n}\n",
    )
    .unwrap();
    fs::write(
        trans.join("fr-FR/m.json"),
        "{\n  \"counter\": 1,\n  \"rows\": [\n    {\n      \"id\": 1,\n      \"name\": \"m.scr:1\",\n      \"value\": \"Bonjour {1}\",\n      \"comment\": \"Hello {1}\"\n    }\n  ]\n}\n",
    )
    .unwrap();

    let output = Command::new(scriptloc_bin())
        .arg("check-all")
        .arg("--catalog-root")
        .arg(&trans)
        .output()
        .unwrap();

    assert!(output.status.success());
}

#[test]
fn test_create_bootstraps_locale() {
    let temp_dir = TempDir::new().unwrap();
    let trans = temp_dir.path().join("trans");
    fs::create_dir_all(trans.join("en-GB")).unwrap();
    fs::write(
        trans.join("en-GB/m.json"),
        "{\n  \"counter\": 1,\n  \"rows\": [\n    {\n      \"id\": 1,\n      \"name\": \"m.scr:1\",\n      \"value\": \"Hello\",\n      \"comment\": \"m.scr:1\"\n    }\n  ]\n}\n",
    )
    .unwrap();

    let output = Command::new(scriptloc_bin())
        .arg("create")
        .arg("de-DE")
        .arg("--catalog-root")
        .arg(&trans)
        .output()
        .unwrap();

    assert!(output.status.success());
    let created = fs::read_to_string(trans.join("de-DE/m.json")).unwrap();
    assert!(created.contains("\"value\": \"\""));
    assert!(created.contains("\"comment\": \"Hello\""));
}

#[test]
fn test_unsupported_directive_skips_file_but_run_succeeds() {
    let temp_dir = TempDir::new().unwrap();
    let bad = create_test_file(&temp_dir, "bad.scr", "fn f(p) {\n    tf(\"%p\", p)\n}\n");
    let good = create_test_file(&temp_dir, "good.scr", "fn f() {\n    t(\"ok\")\n}\n");

    let output = Command::new(scriptloc_bin())
        .arg("extract")
        .arg(&bad)
        .arg(&good)
        .arg("--apply")
        .arg("--funcs")
        .arg("t")
        .arg("--fmt-funcs")
        .arg("tf")
        .arg("--catalog-root")
        .arg(temp_dir.path().join("trans"))
        .output()
        .unwrap();

    // the batch continues past the failing file
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("'%p'"));
    assert!(fs::read_to_string(&bad).unwrap().contains("tf(\"%p\", p)"));
    assert!(fs::read_to_string(&good).unwrap().contains("loc.lookup(lang,"));
}
