use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_daemon() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_feebookd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn feebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request_with_events(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> (Vec<serde_json::Value>, serde_json::Value) {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut events = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("read response line");
        assert!(!line.trim().is_empty(), "empty response for {}", method);
        let value: serde_json::Value =
            serde_json::from_str(line.trim()).expect("parse response json");
        if value.get("id").is_none() {
            events.push(value);
            continue;
        }
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
        return (events, value);
    }
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let (_events, value) = request_with_events(stdin, reader, id, method, params);
    assert!(
        value.get("success").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("data").cloned().unwrap_or_else(|| json!({}))
}

#[test]
fn get_returns_the_static_defaults() {
    let data_dir = temp_dir("feebook-settings-get");
    let (_child, mut stdin, mut reader) = spawn_daemon();
    request_ok(
        &mut stdin,
        &mut reader,
        "init",
        "app:init",
        json!({ "dataDir": data_dir.to_string_lossy() }),
    );

    let settings = request_ok(&mut stdin, &mut reader, "1", "settings:get", json!({}));
    assert_eq!(settings["schoolName"].as_str(), Some("Your School Name"));
    assert_eq!(settings["currency"].as_str(), Some("INR"));
    assert_eq!(settings["darkMode"].as_bool(), Some(false));
}

#[test]
fn update_echoes_but_does_not_persist() {
    let data_dir = temp_dir("feebook-settings-update");
    let (_child, mut stdin, mut reader) = spawn_daemon();
    request_ok(
        &mut stdin,
        &mut reader,
        "init",
        "app:init",
        json!({ "dataDir": data_dir.to_string_lossy() }),
    );

    let update = json!({ "schoolName": "Sunrise Public School", "currency": "INR", "darkMode": true });
    let (events, resp) = request_with_events(
        &mut stdin,
        &mut reader,
        "1",
        "settings:update",
        update.clone(),
    );
    assert_eq!(resp["success"].as_bool(), Some(true));
    assert_eq!(resp["data"], update);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"].as_str(), Some("success"));
    assert_eq!(
        events[0]["message"].as_str(),
        Some("Settings updated successfully")
    );

    // Still the defaults on the next read.
    let settings = request_ok(&mut stdin, &mut reader, "2", "settings:get", json!({}));
    assert_eq!(settings["schoolName"].as_str(), Some("Your School Name"));
    assert_eq!(settings["darkMode"].as_bool(), Some(false));
}
