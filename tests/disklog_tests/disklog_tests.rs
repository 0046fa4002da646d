//! Tests for DiskLog
//!
//! These tests verify:
//! - Lazy file creation on first append
//! - Append/read through the in-memory index
//! - Overwrites point the index at the newest frame
//! - Remove, keys, iteration and clear
//! - I/O and corrupt-frame failures surface to the caller
//! - Disposal deletes (or keeps) the spill file

use std::collections::HashSet;
use std::fs::{self, OpenOptions};

use spillmap::config::SpillConfig;
use spillmap::disklog::{DiskLog, LEN_PREFIX_SIZE};
use spillmap::{SpillError, StringConverter};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, DiskLog<String, StringConverter>) {
    let temp_dir = TempDir::new().unwrap();
    let config = SpillConfig::builder().base_dir(temp_dir.path()).build();
    let log = DiskLog::new(&config, StringConverter);
    (temp_dir, log)
}

fn key(s: &str) -> String {
    s.to_string()
}

fn frame_len(key: &str, value: &[u8]) -> u64 {
    2 * LEN_PREFIX_SIZE + key.len() as u64 + value.len() as u64
}

// =============================================================================
// Creation Tests
// =============================================================================

#[test]
fn test_new_log_does_not_touch_disk() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join("not_yet");
    let config = SpillConfig::builder().base_dir(&base).build();

    let log: DiskLog<String, StringConverter> = DiskLog::new(&config, StringConverter);

    assert!(!base.exists());
    assert!(!log.path().exists());
    assert_eq!(log.num_entries(), 0);
    assert_eq!(log.bytes_written(), 0);
}

#[test]
fn test_first_append_creates_directory_and_file() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join("nested").join("spill");
    let config = SpillConfig::builder().base_dir(&base).build();
    let mut log = DiskLog::new(&config, StringConverter);

    log.append(key("k1"), b"v1").unwrap();

    assert!(base.is_dir());
    assert!(log.path().is_file());
    assert!(log.path().starts_with(&base));
}

#[test]
fn test_distinct_logs_use_distinct_files() {
    let (temp, mut a) = setup_temp_log();
    let config = SpillConfig::builder().base_dir(temp.path()).build();
    let mut b = DiskLog::new(&config, StringConverter);

    a.append(key("k"), b"a").unwrap();
    b.append(key("k"), b"b").unwrap();

    assert_ne!(a.path(), b.path());
    assert_eq!(&a.read(&key("k")).unwrap().unwrap()[..], b"a");
    assert_eq!(&b.read(&key("k")).unwrap().unwrap()[..], b"b");
}

// =============================================================================
// Append / Read Tests
// =============================================================================

#[test]
fn test_append_returns_sequential_offsets() {
    let (_temp, mut log) = setup_temp_log();

    let first = log.append(key("apple"), b"red").unwrap();
    let second = log.append(key("banana"), b"yellow").unwrap();

    assert_eq!(first, 0);
    assert_eq!(second, frame_len("apple", b"red"));
    assert_eq!(
        log.bytes_written(),
        frame_len("apple", b"red") + frame_len("banana", b"yellow")
    );
    assert_eq!(fs::metadata(log.path()).unwrap().len(), log.bytes_written());
}

#[test]
fn test_read_returns_value_bytes() {
    let (_temp, mut log) = setup_temp_log();

    log.append(key("apple"), b"red").unwrap();
    log.append(key("banana"), b"yellow").unwrap();

    assert_eq!(&log.read(&key("apple")).unwrap().unwrap()[..], b"red");
    assert_eq!(&log.read(&key("banana")).unwrap().unwrap()[..], b"yellow");
}

#[test]
fn test_read_missing_key() {
    let (_temp, mut log) = setup_temp_log();
    assert!(log.read(&key("nope")).unwrap().is_none());

    log.append(key("k"), b"v").unwrap();
    assert!(log.read(&key("nope")).unwrap().is_none());
}

#[test]
fn test_arbitrary_value_bytes() {
    let (_temp, mut log) = setup_temp_log();
    let value: Vec<u8> = (0..=255u8).chain([0, 0, b'\n', 0xff]).collect();

    log.append(key("binary"), &value).unwrap();
    log.append(key("empty"), b"").unwrap();

    assert_eq!(&log.read(&key("binary")).unwrap().unwrap()[..], &value[..]);
    assert!(log.read(&key("empty")).unwrap().unwrap().is_empty());
}

#[test]
fn test_overwrite_points_at_newest_frame() {
    let (_temp, mut log) = setup_temp_log();

    log.append(key("k"), b"old").unwrap();
    let newest = log.append(key("k"), b"newer").unwrap();

    assert_eq!(log.num_entries(), 1);
    assert_eq!(log.frame_pointer(&key("k")).unwrap().offset, newest);
    assert_eq!(&log.read(&key("k")).unwrap().unwrap()[..], b"newer");
    assert_eq!(log.garbage_bytes(), frame_len("k", b"old"));
}

// =============================================================================
// Remove / Keys Tests
// =============================================================================

#[test]
fn test_remove_drops_index_entry_only() {
    let (_temp, mut log) = setup_temp_log();
    log.append(key("k1"), b"v1").unwrap();
    log.append(key("k2"), b"v2").unwrap();
    let written = log.bytes_written();

    assert!(log.remove(&key("k1")));
    assert!(!log.remove(&key("k1")));

    assert!(!log.contains_key(&key("k1")));
    assert!(log.contains_key(&key("k2")));
    assert_eq!(log.num_entries(), 1);
    assert_eq!(log.bytes_written(), written);
    assert_eq!(fs::metadata(log.path()).unwrap().len(), written);
    assert_eq!(log.garbage_bytes(), frame_len("k1", b"v1"));
}

#[test]
fn test_keys_snapshot() {
    let (_temp, mut log) = setup_temp_log();
    for i in 0..5 {
        log.append(format!("k{}", i), b"v").unwrap();
    }
    log.remove(&key("k3"));

    let keys = log.keys();
    let expected: HashSet<String> = ["k0", "k1", "k2", "k4"].iter().map(|s| s.to_string()).collect();
    assert_eq!(keys, expected);
}

// =============================================================================
// Iterator Tests
// =============================================================================

#[test]
fn test_iter_yields_each_indexed_key_once() {
    let (_temp, mut log) = setup_temp_log();
    for i in 0..10 {
        log.append(format!("k{}", i), format!("v{}", i).as_bytes()).unwrap();
    }
    log.append(key("k0"), b"updated").unwrap();
    log.remove(&key("k9"));

    let mut seen = Vec::new();
    for item in log.iter() {
        let (k, v) = item.unwrap();
        seen.push((k.clone(), String::from_utf8(v.to_vec()).unwrap()));
    }
    seen.sort();

    assert_eq!(seen.len(), 9);
    assert_eq!(seen[0], (key("k0"), "updated".to_string()));
    assert!(seen.iter().all(|(k, _)| k != "k9"));
}

#[test]
fn test_iter_is_restartable() {
    let (_temp, mut log) = setup_temp_log();
    log.append(key("a"), b"1").unwrap();
    log.append(key("b"), b"2").unwrap();

    assert_eq!(log.iter().count(), 2);
    assert_eq!(log.iter().count(), 2);
}

#[test]
fn test_iter_empty_log() {
    let (_temp, log) = setup_temp_log();
    assert_eq!(log.iter().count(), 0);
}

// =============================================================================
// Clear Tests
// =============================================================================

#[test]
fn test_clear_deletes_file_and_index() {
    let (_temp, mut log) = setup_temp_log();
    log.append(key("k1"), b"v1").unwrap();
    log.append(key("k2"), b"v2").unwrap();
    let path = log.path().to_path_buf();

    log.clear().unwrap();

    assert!(!path.exists());
    assert_eq!(log.num_entries(), 0);
    assert_eq!(log.bytes_written(), 0);
    assert_eq!(log.iter().count(), 0);
    assert!(log.read(&key("k1")).unwrap().is_none());
}

#[test]
fn test_clear_without_file() {
    let (_temp, mut log) = setup_temp_log();
    log.clear().unwrap();
    assert!(log.is_empty());
}

#[test]
fn test_append_after_clear_starts_fresh_file() {
    let (_temp, mut log) = setup_temp_log();
    log.append(key("k1"), b"v1").unwrap();
    log.clear().unwrap();

    let offset = log.append(key("k2"), b"v2").unwrap();

    assert_eq!(offset, 0);
    assert_eq!(fs::metadata(log.path()).unwrap().len(), frame_len("k2", b"v2"));
    assert_eq!(&log.read(&key("k2")).unwrap().unwrap()[..], b"v2");
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_append_into_file_path_fails_with_io() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();

    let config = SpillConfig::builder().base_dir(&blocker).build();
    let mut log = DiskLog::new(&config, StringConverter);

    let result = log.append(key("k"), b"v");

    assert!(matches!(result, Err(SpillError::Io(_))));
    assert_eq!(log.num_entries(), 0);
    assert_eq!(log.bytes_written(), 0);
    assert!(!log.contains_key(&key("k")));
}

#[test]
fn test_truncated_file_reports_corrupt_frame() {
    let (_temp, mut log) = setup_temp_log();
    log.append(key("k1"), b"v1").unwrap();
    let offset = log.append(key("k2"), b"value-two").unwrap();

    let file = OpenOptions::new().write(true).open(log.path()).unwrap();
    file.set_len(log.bytes_written() - 3).unwrap();

    let err = log.read(&key("k2")).unwrap_err();
    match err {
        SpillError::CorruptFrame { offset: at, .. } => assert_eq!(at, offset),
        other => panic!("expected CorruptFrame, got {:?}", other),
    }

    // Earlier frames are still readable
    assert_eq!(&log.read(&key("k1")).unwrap().unwrap()[..], b"v1");
}

// =============================================================================
// Disposal Tests
// =============================================================================

#[test]
fn test_close_deletes_file() {
    let (_temp, mut log) = setup_temp_log();
    log.append(key("k"), b"v").unwrap();
    let path = log.path().to_path_buf();

    log.close().unwrap();

    assert!(!path.exists());
}

#[test]
fn test_drop_deletes_file() {
    let (_temp, mut log) = setup_temp_log();
    log.append(key("k"), b"v").unwrap();
    let path = log.path().to_path_buf();

    drop(log);

    assert!(!path.exists());
}

#[test]
fn test_close_keeps_file_when_configured() {
    let temp_dir = TempDir::new().unwrap();
    let config = SpillConfig::builder()
        .base_dir(temp_dir.path())
        .delete_on_close(false)
        .build();
    let mut log = DiskLog::new(&config, StringConverter);
    log.append(key("k"), b"v").unwrap();
    let path = log.path().to_path_buf();
    let written = log.bytes_written();

    log.close().unwrap();

    assert!(path.exists());
    assert_eq!(fs::metadata(&path).unwrap().len(), written);
}

#[test]
fn test_sync_on_append() {
    let temp_dir = TempDir::new().unwrap();
    let config = SpillConfig::builder()
        .base_dir(temp_dir.path())
        .sync_on_append(true)
        .build();
    let mut log = DiskLog::new(&config, StringConverter);

    log.append(key("k"), b"durable").unwrap();

    assert_eq!(&log.read(&key("k")).unwrap().unwrap()[..], b"durable");
}
