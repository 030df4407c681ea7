//! slotstore Inspect Binary
//!
//! Walks a data file slot by slot and reports what each slot holds.

use std::path::PathBuf;

use clap::Parser;
use slotstore::config::FileOptions;
use slotstore::{SlottedFile, StoreError};
use tracing_subscriber::{fmt, EnvFilter};

/// slotstore data file inspector
#[derive(Parser, Debug)]
#[command(name = "slotstore-inspect")]
#[command(about = "Inspect the slots of a slotstore data file")]
#[command(version)]
struct Args {
    /// Path to the .db file
    file: PathBuf,

    /// Slot width in bytes (the record type's RECORD_SIZE)
    #[arg(short, long)]
    record_size: usize,

    /// Print the payload text of active slots
    #[arg(short, long)]
    payload: bool,

    /// Only print the summary line
    #[arg(short, long)]
    summary: bool,
}

#[derive(Default)]
struct Summary {
    active: u64,
    deleted: u64,
    empty: u64,
    corrupt: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,slotstore=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        tracing::error!("Inspect failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> slotstore::Result<()> {
    // Never create a file that is not there
    if !args.file.is_file() {
        return Err(StoreError::Config(format!(
            "{} is not a data file",
            args.file.display()
        )));
    }

    let file = SlottedFile::open(&args.file, args.record_size, FileOptions::default())?;

    tracing::info!(
        "Inspecting {} ({} bytes, {} slots of {} bytes)",
        args.file.display(),
        file.len()?,
        file.slot_count()?,
        file.record_size()
    );

    let mut summary = Summary::default();

    for (offset, read) in file.scan()? {
        let line = match read {
            Ok(payload) => {
                summary.active += 1;
                if args.payload {
                    format!(
                        "active   {} bytes  {}",
                        payload.len(),
                        String::from_utf8_lossy(&payload)
                    )
                } else {
                    format!("active   {} bytes", payload.len())
                }
            }
            Err(StoreError::RecordDeleted { .. }) => {
                summary.deleted += 1;
                "deleted".to_string()
            }
            Err(StoreError::EmptySlot { .. }) => {
                summary.empty += 1;
                "empty".to_string()
            }
            Err(e) => {
                summary.corrupt += 1;
                format!("corrupt  {}", e)
            }
        };

        if !args.summary {
            println!("{:>10}  {}", offset, line);
        }
    }

    println!(
        "active={} deleted={} empty={} corrupt={}",
        summary.active, summary.deleted, summary.empty, summary.corrupt
    );

    file.close()
}
