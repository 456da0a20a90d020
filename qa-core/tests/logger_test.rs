//! Integration test for [`qa_core::logger::init_tracing`].

use qa_core::logger::init_tracing;

/// **Test: init creates the log directory and tees events into the file.**
///
/// **Setup:** Temp dir with a not-yet-existing `logs/` subdirectory.
/// **Action:** `init_tracing`, then emit one info event.
/// **Expected:** The event text lands in the file; a second init fails
/// because the global subscriber is already set.
#[test]
fn test_init_writes_events_to_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let log_path = dir.path().join("logs").join("engine.log");
    let log_path = log_path.to_str().expect("utf-8 temp path");

    init_tracing(log_path).expect("Failed to init tracing");
    tracing::info!(family = "washer", "turn finished");

    let contents = std::fs::read_to_string(log_path).expect("Failed to read log file");
    assert!(contents.contains("turn finished"));
    assert!(contents.contains("washer"));

    assert!(init_tracing(log_path).is_err());
}
