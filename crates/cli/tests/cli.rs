use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn repo_docs_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../docs")
}

/// `rtlscope` with an empty config in `dir`, so the user's own config never leaks in.
fn rtlscope(dir: &Path) -> Command {
    let config = dir.join("config.toml");
    if !config.exists() {
        fs::write(&config, "").expect("write config");
    }
    let mut cmd = Command::cargo_bin("rtlscope").expect("rtlscope binary");
    cmd.env_remove("RTLSCOPE_CONFIG")
        .env_remove("RTLSCOPE_MAKE")
        .env_remove("RTLSCOPE_RUN_TIMEOUT_SECS")
        .env("RTLSCOPE_DOCS_DIR", repo_docs_dir())
        .arg("--config")
        .arg(config);
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command run");
    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

fn text_of(result: &Value) -> &str {
    result["content"][0]["text"].as_str().expect("text block")
}

#[test]
fn list_tools_keeps_declaration_order() {
    let tmp = tempdir().unwrap();
    let tools = stdout_json(rtlscope(tmp.path()).args(["list", "tools"]));
    let ids: Vec<&str> = tools
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec![
            "run-analysis",
            "analyze-source",
            "check-compatibility",
            "suggest-build-fixes",
            "check-compliance"
        ]
    );
    assert_eq!(tools[1]["inputSchema"]["properties"]["checkDependencies"]["default"], true);
}

#[test]
fn suggest_build_fixes_reports_missing_markers() {
    let tmp = tempdir().unwrap();
    let makefile = tmp.path().join("Makefile");
    fs::write(&makefile, "SIM=verilator\n").unwrap();

    let args = serde_json::json!({"buildScriptPath": makefile}).to_string();
    let result = stdout_json(rtlscope(tmp.path()).args(["call", "suggest-build-fixes", "--args", &args]));

    assert_eq!(result["isError"], false);
    let text = text_of(&result);
    assert!(text.contains("TOPLEVEL_LANG not specified"));
    assert!(text.contains("VERILOG_SOURCES not specified"));
    assert!(text.contains("TOPLEVEL_LANG ?= verilog"));
}

#[test]
fn unknown_tool_exits_with_protocol_error() {
    let tmp = tempdir().unwrap();
    rtlscope(tmp.path())
        .args(["call", "synthesize"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"kind\": \"UnknownCapability\""))
        .stderr(predicate::str::contains("Unknown tool `synthesize`"));
}

#[test]
fn missing_required_argument_names_it() {
    let tmp = tempdir().unwrap();
    let output = rtlscope(tmp.path())
        .args(["call", "run-analysis", "--args", r#"{"mode":"sim"}"#])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let envelope: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["kind"], "InvalidArguments");
    assert_eq!(envelope["parameter"], "analysisTarget");
}

#[test]
fn read_serves_bundled_docs_and_catalog() {
    let tmp = tempdir().unwrap();
    let guidelines = stdout_json(rtlscope(tmp.path()).args(["read", "rtlscope://docs/coding-guidelines"]));
    assert_eq!(guidelines["isError"], false);
    assert!(text_of(&guidelines).starts_with("# SystemVerilog coding guidelines"));

    let catalog = stdout_json(rtlscope(tmp.path()).args(["read", "rtlscope://catalog"]));
    let catalog: Value = serde_json::from_str(text_of(&catalog)).unwrap();
    assert_eq!(catalog["prompts"].as_array().unwrap().len(), 3);
}

#[test]
fn prompt_renders_with_defaults() {
    let tmp = tempdir().unwrap();
    let result = stdout_json(rtlscope(tmp.path()).args([
        "prompt",
        "explain-build-failure",
        "--args",
        r#"{"errorLog":"%Error: missing TOPLEVEL"}"#,
    ]));
    let text = text_of(&result);
    assert!(text.contains("%Error: missing TOPLEVEL"));
    assert!(text.contains("`Makefile`"));
}

#[test]
fn broken_config_file_is_fatal() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("config.toml"), "make_program = [").unwrap();
    rtlscope(tmp.path())
        .args(["list", "tools"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[cfg(unix)]
#[test]
fn run_analysis_reports_build_status() {
    let tmp = tempdir().unwrap();
    let args = serde_json::json!({"analysisTarget": tmp.path(), "mode": "lint"}).to_string();

    let ok = stdout_json(
        rtlscope(tmp.path())
            .env("RTLSCOPE_MAKE", "true")
            .args(["call", "run-analysis", "--args", &args]),
    );
    assert_eq!(ok["isError"], false);
    assert!(text_of(&ok).contains("`true lint`"));

    let failed = stdout_json(
        rtlscope(tmp.path())
            .env("RTLSCOPE_MAKE", "false")
            .args(["call", "run-analysis", "--args", &args]),
    );
    assert_eq!(failed["isError"], true);
    assert!(text_of(&failed).contains("exited with status 1"));
}
