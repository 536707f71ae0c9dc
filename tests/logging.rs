use std::{fs, thread::sleep, time::Duration};

use serial_test::serial;
use tempfile::tempdir;

#[test]
#[serial]
fn file_layer_writes_plain_canvas_events() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("canvas.log");

    card_canvas::logging::init(true, Some(path.clone()));
    tracing::info!(card_id = "clock-1", "canvas layout saved");
    tracing::warn!("grid layout without every card ignored");

    sleep(Duration::from_millis(100));

    assert!(path.exists(), "log file was not created");
    let contents = fs::read_to_string(&path).unwrap();
    let saved = contents
        .lines()
        .find(|line| line.contains("canvas layout saved"))
        .expect("info event missing from log file");
    assert!(saved.contains("INFO"));
    assert!(saved.contains("clock-1"));
    assert!(contents.lines().any(|line| line.contains("WARN")));
    assert!(
        !contents.contains('\u{1b}'),
        "file log must not carry ANSI escapes: {contents:?}"
    );
}
