//! End-to-end tests for the `acctpanel-rpc` binary: requests go in on stdin,
//! one JSON response per line comes back on stdout, and the process exits
//! cleanly at end of input.

use std::io::Write;
use std::process::{Command, Stdio};

use serde_json::{json, Value};
use tempfile::TempDir;

/// Writes a local-mode settings file under `dir` and returns its path.
fn write_settings(dir: &TempDir) -> String {
    let settings = json!({
        "backend": {
            "mode": "local",
            "database_path": dir.path().join("panel.db").to_string_lossy(),
        },
        "export": { "directory": dir.path().join("exports").to_string_lossy() },
        "logging": { "filter": "off" },
    });
    let path = dir.path().join("settings.json");
    std::fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();
    path.to_string_lossy().to_string()
}

/// Runs the server over `requests` and returns every stdout line as JSON.
fn run_server(config: &str, requests: &[Value]) -> (bool, Vec<Value>) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_acctpanel-rpc"))
        .arg(config)
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn acctpanel-rpc");

    {
        let mut stdin = child.stdin.take().unwrap();
        for request in requests {
            writeln!(stdin, "{}", request).unwrap();
        }
    }

    let output = child.wait_with_output().expect("wait for acctpanel-rpc");
    let lines = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    (output.status.success(), lines)
}

#[test]
fn test_server_answers_and_exits_cleanly_at_eof() {
    let dir = TempDir::new().unwrap();
    let config = write_settings(&dir);

    let (ok, lines) = run_server(
        &config,
        &[
            json!({"id": 1, "method": "ping"}),
            json!({"id": 2, "method": "session.state"}),
        ],
    );

    assert!(ok, "server must exit with success after stdin closes");
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["event"], "ready");
    assert_eq!(lines[1]["id"], 1);
    assert_eq!(lines[1]["result"]["pong"], true);
    assert_eq!(lines[2]["id"], 2);
    assert_eq!(lines[2]["result"]["folders"].as_array().unwrap().len(), 1);
}

#[test]
fn test_server_reports_parse_errors_and_unknown_methods() {
    let dir = TempDir::new().unwrap();
    let config = write_settings(&dir);

    let mut child = Command::new(env!("CARGO_BIN_EXE_acctpanel-rpc"))
        .arg(&config)
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    {
        let mut stdin = child.stdin.take().unwrap();
        writeln!(stdin, "not json").unwrap();
        writeln!(stdin, "{}", json!({"id": 7, "method": "nope"})).unwrap();
    }
    let output = child.wait_with_output().unwrap();
    let lines: Vec<Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert!(output.status.success());
    assert_eq!(lines[1]["id"], Value::Null);
    assert!(lines[1]["error"].as_str().unwrap().starts_with("parse error"));
    assert_eq!(lines[2]["id"], 7);
    assert_eq!(lines[2]["error"], "unknown method: nope");
}

#[test]
fn test_uploaded_accounts_survive_restart() {
    let dir = TempDir::new().unwrap();
    let config = write_settings(&dir);

    let (ok, lines) = run_server(
        &config,
        &[json!({"id": 1, "method": "account.upload", "params": {"accounts_text": "a@x|p|bob|s3cret|RU"}})],
    );
    assert!(ok);
    assert_eq!(lines[1]["result"]["count"], 1);

    let (ok, lines) = run_server(&config, &[json!({"id": 1, "method": "account.list"})]);
    assert!(ok);
    let accounts = lines[1]["result"].as_array().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0]["login"], "bob");
}
