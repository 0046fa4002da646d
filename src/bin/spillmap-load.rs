//! spillmap load generator
//!
//! Upserts synthetic records into a SpillableMap and reports where they landed.

use clap::Parser;
use serde::{Deserialize, Serialize};
use spillmap::{BincodeConverter, SpillConfig, SpillableMap, StringConverter};
use tracing_subscriber::{fmt, EnvFilter};

/// spillmap load generator
#[derive(Parser, Debug)]
#[command(name = "spillmap-load")]
#[command(about = "Upsert synthetic records through a spillable map")]
#[command(version)]
struct Args {
    /// Directory for the spill file
    #[arg(short, long, default_value = "./spillmap_data")]
    dir: String,

    /// Resident footprint budget in bytes
    #[arg(short, long, default_value = "1048576")]
    threshold_bytes: u64,

    /// Number of distinct records to insert
    #[arg(short, long, default_value = "10000")]
    records: usize,

    /// Payload size of each record in bytes
    #[arg(short, long, default_value = "128")]
    payload_bytes: usize,

    /// Number of records to update after the initial load
    #[arg(short, long, default_value = "100")]
    updates: usize,

    /// Entries measured before the average size is frozen
    #[arg(short, long, default_value = "100")]
    sample_window: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Record {
    key: String,
    commit_time: u64,
    payload: Vec<u8>,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,spillmap=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    tracing::info!("spillmap-load v{}", spillmap::VERSION);
    tracing::info!("Spill directory: {}", args.dir);

    if let Err(e) = run(&args) {
        tracing::error!("Load failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> spillmap::Result<()> {
    let config = SpillConfig::builder()
        .base_dir(&args.dir)
        .size_threshold_bytes(args.threshold_bytes)
        .sample_window(args.sample_window)
        .build();

    let mut map = SpillableMap::with_config(
        config,
        StringConverter,
        BincodeConverter::<Record>::new(),
    )?;

    for i in 0..args.records {
        let record = Record {
            key: format!("key{:08}", i),
            commit_time: 1,
            payload: vec![(i % 251) as u8; args.payload_bytes],
        };
        map.put(record.key.clone(), record)?;
    }

    tracing::info!(
        resident = map.resident_entry_count(),
        on_disk = map.disk_entry_count(),
        footprint = map.current_footprint(),
        average = map.average_entry_size(),
        "Initial load complete"
    );

    // Update the newest records, which are the most likely to be on disk
    let first_update = args.records.saturating_sub(args.updates);
    for i in first_update..args.records {
        let key = format!("key{:08}", i);
        if let Some(mut record) = map.get(&key)? {
            record.commit_time += 1;
            map.put(key, record)?;
        }
    }

    let mut verified = 0usize;
    for i in first_update..args.records {
        let key = format!("key{:08}", i);
        if matches!(map.get(&key)?, Some(r) if r.commit_time == 2) {
            verified += 1;
        }
    }

    tracing::info!(
        entries = map.len(),
        updated = verified,
        file_bytes = map.disk_bytes_written(),
        garbage_bytes = map.disk_garbage_bytes(),
        path = %map.disk_file_path().display(),
        "Update pass complete"
    );

    map.close()
}
