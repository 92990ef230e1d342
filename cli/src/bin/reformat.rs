// SPDX-License-Identifier: MIT OR Apache-2.0

//! Re-chunk source tables into CSV/binary pairs for downstream consumption.
//!
//! Both arguments are required; invoking with the wrong count exits non-zero.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sipmpos_core::reformat::reformat_dir;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "sipmpos-reformat",
    about = "Re-chunk SiPM source tables into metadata CSV / image tensor pairs",
    version
)]
struct Args {
    /// Directory of .jsonl source tables
    input_dir: PathBuf,

    /// Output directory, created if absent
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let chunks = reformat_dir(&args.input_dir, &args.output_dir)?;

    let events: usize = chunks.iter().map(|c| c.len).sum();
    println!(
        "wrote {} chunk pair(s), {} event(s), to {}",
        chunks.len(),
        events,
        args.output_dir.display()
    );
    Ok(())
}
