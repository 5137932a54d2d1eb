//! The subscriber is process-global, so this file holds a single test.

use feedwatch::logging;

#[test]
fn init_writes_lines_to_the_log_file() {
    std::env::remove_var("RUST_LOG");
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("logs");

    let guard = logging::init(log_dir.to_str().unwrap(), "feedwatch.log").unwrap();
    tracing::info!(target: "feedwatch", source = "p", "Fetched feed entries");
    tracing::debug!(target: "feedwatch", "below the default level");
    tracing::info!(target: "other_crate", "filtered out");
    // Dropping the guard flushes the non-blocking writer.
    drop(guard);

    let contents = std::fs::read_to_string(log_dir.join("feedwatch.log")).unwrap();
    assert!(contents.contains("INFO"));
    assert!(contents.contains("Fetched feed entries"));
    assert!(contents.contains("source=\"p\""));
    assert!(!contents.contains("below the default level"));
    assert!(!contents.contains("filtered out"));
    // The file layer never writes colour codes.
    assert!(!contents.contains('\u{1b}'));

    // A second subscriber cannot be installed.
    assert!(logging::init(log_dir.to_str().unwrap(), "feedwatch.log").is_err());
}
