//! Tests for sequential spill file replay
//!
//! These tests verify:
//! - Frames come back in write order with their offsets
//! - Last-frame-wins replay matches what the index points at
//! - A truncated tail is reported as a corrupt frame

use std::fs::OpenOptions;

use spillmap::config::SpillConfig;
use spillmap::disklog::{replay_latest, DiskLog, FrameReader};
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

// =============================================================================
// FrameReader Tests
// =============================================================================

#[test]
fn test_frames_in_write_order() {
    let (_temp, mut log) = setup_temp_log();
    let o1 = log.append("a".to_string(), b"1").unwrap();
    let o2 = log.append("b".to_string(), b"22").unwrap();
    let o3 = log.append("a".to_string(), b"333").unwrap();

    let frames: Vec<_> = FrameReader::open(log.path())
        .unwrap()
        .map(|f| f.unwrap())
        .collect();

    assert_eq!(frames.len(), 3);
    assert_eq!(
        frames.iter().map(|f| f.offset).collect::<Vec<_>>(),
        vec![o1, o2, o3]
    );
    assert_eq!(frames[0].key, b"a");
    assert_eq!(frames[1].value, b"22");
    assert_eq!(frames[2].value, b"333");
}

#[test]
fn test_empty_file_has_no_frames() {
    let (_temp, mut log) = setup_temp_log();
    log.append("k".to_string(), b"v").unwrap();
    let file = OpenOptions::new().write(true).open(log.path()).unwrap();
    file.set_len(0).unwrap();

    assert_eq!(FrameReader::open(log.path()).unwrap().count(), 0);
}

#[test]
fn test_truncated_tail_is_corrupt() {
    let (_temp, mut log) = setup_temp_log();
    log.append("k1".to_string(), b"v1").unwrap();
    let last = log.append("k2".to_string(), b"value-two").unwrap();

    let file = OpenOptions::new().write(true).open(log.path()).unwrap();
    file.set_len(log.bytes_written() - 1).unwrap();

    let results: Vec<_> = FrameReader::open(log.path()).unwrap().collect();

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(SpillError::CorruptFrame { offset, .. }) if offset == last
    ));
}

#[test]
fn test_open_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = FrameReader::open(&temp_dir.path().join("missing.log"));
    assert!(matches!(result, Err(SpillError::Io(_))));
}

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_replay_matches_index_for_live_keys() {
    let (_temp, mut log) = setup_temp_log();
    for round in 0..3 {
        for i in 0..20 {
            let value = format!("v{}-{}", i, round);
            log.append(format!("k{:02}", i), value.as_bytes()).unwrap();
        }
    }
    log.remove(&"k05".to_string());

    let latest = replay_latest(log.path()).unwrap();

    for k in log.keys() {
        let indexed = log.read(&k).unwrap().unwrap();
        assert_eq!(latest.get(k.as_bytes()).unwrap(), &indexed.to_vec());
    }
    assert_eq!(latest.get(b"k07".as_slice()).unwrap(), b"v7-2");
}

#[test]
fn test_replay_propagates_corruption() {
    let (_temp, mut log) = setup_temp_log();
    log.append("k".to_string(), b"value").unwrap();
    let file = OpenOptions::new().write(true).open(log.path()).unwrap();
    file.set_len(6).unwrap();

    assert!(matches!(
        replay_latest(log.path()),
        Err(SpillError::CorruptFrame { .. })
    ));
}
