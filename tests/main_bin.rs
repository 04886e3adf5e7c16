//! Integration tests that lock replay-binary startup behavior and smoke paths.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_insight-voice")
}

fn temp_store(suffix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("insight-voice-bin-{suffix}-{nanos}"))
}

#[test]
fn main_lists_catalog_screens() {
    let output = Command::new(bin())
        .arg("--list-screens")
        .output()
        .expect("run insight-voice");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Available screens:"));
    assert!(stdout.contains("Home"));
    assert!(stdout.contains("TasksManagement"));
    assert!(stdout.contains("NoteDescription"));
}

#[test]
fn one_shot_transcript_navigates_and_prints_result() {
    let store = temp_store("navigate");
    let output = Command::new(bin())
        .args([
            "--screen",
            "Home",
            "--no-prompts",
            "--transcript",
            "i want to go to schedule",
        ])
        .arg("--store-dir")
        .arg(&store)
        .output()
        .expect("run insight-voice");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[navigate] ScheduleHome"), "stdout: {stdout}");
    assert!(stdout.contains("\"matched_intent\":\"GoToSchedule\""));
    let _ = fs::remove_dir_all(&store);
}

#[test]
fn one_shot_unrecognized_speaks_retry_prompt() {
    let store = temp_store("unrecognized");
    let output = Command::new(bin())
        .args([
            "--screen",
            "Home",
            "--no-prompts",
            "--transcript",
            "purple elephant",
        ])
        .arg("--store-dir")
        .arg(&store)
        .output()
        .expect("run insight-voice");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[speak] Sorry, I didn't understand. Please say it again."));
    assert!(stdout.contains("\"matched_intent\":null"));
    let _ = fs::remove_dir_all(&store);
}

#[test]
fn one_shot_delete_removes_task_from_store() {
    let store = temp_store("delete");
    fs::create_dir_all(&store).expect("create store dir");
    fs::write(
        store.join("tasks.jsonl"),
        concat!(
            r#"{"id":"t1","data":{"title":"Buy groceries","description":"milk","due_date":"2026-03-01","due_time":"10:00","status":"pending"}}"#,
            "\n",
        ),
    )
    .expect("seed tasks");

    let output = Command::new(bin())
        .args([
            "--screen",
            "TasksManagement",
            "--no-prompts",
            "--transcript",
            "delete buy groceries",
        ])
        .arg("--store-dir")
        .arg(&store)
        .output()
        .expect("run insight-voice");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[speak] Buy groceries has been deleted."), "stdout: {stdout}");

    let remaining = fs::read_to_string(store.join("tasks.jsonl")).expect("read store");
    assert!(remaining.trim().is_empty(), "task should be gone: {remaining}");
    let _ = fs::remove_dir_all(&store);
}

#[test]
fn stdin_replay_follows_screen_changes() {
    let store = temp_store("replay");
    let mut child = Command::new(bin())
        .args(["--screen", "Home", "--no-prompts"])
        .arg("--store-dir")
        .arg(&store)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn insight-voice");
    child
        .stdin
        .as_mut()
        .expect("stdin")
        .write_all(b"i want to go to schedule\ntask please\n")
        .expect("write transcripts");
    let output = child.wait_with_output().expect("wait");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let first = stdout.find("[navigate] ScheduleHome").expect("first hop");
    let second = stdout
        .find("[navigate] TasksManagement")
        .expect("second hop matched on the new screen");
    assert!(first < second);
    let _ = fs::remove_dir_all(&store);
}

#[test]
fn welcome_prompt_plays_unless_suppressed() {
    let store = temp_store("prompt");
    let output = Command::new(bin())
        .args(["--screen", "Home", "--transcript", "purple elephant"])
        .arg("--store-dir")
        .arg(&store)
        .output()
        .expect("run insight-voice");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[speak] Welcome to InsightEye"), "stdout: {stdout}");
    let _ = fs::remove_dir_all(&store);
}
