// SPDX-License-Identifier: MIT OR Apache-2.0

//! Re-chunking of source tables into CSV/binary pairs.
//!
//! Downstream consumers take events in fixed-size chunks: for each run of at
//! most [`CHUNK_SIZE`] events this module writes `metadata_NN.csv` (event id
//! and true position) alongside `images_NN.bin` (the image tensor for the
//! same events), with event ids monotonically increasing across all chunks.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::table::{discover_tables, read_table, EventRecord};
use crate::{Result, SipmError, GRID_SIZE, PIXELS_PER_EVENT};

/// Maximum number of events per output chunk.
pub const CHUNK_SIZE: usize = 10_000;

/// Key under which a source table describes its own layout; excluded from the
/// simulation-parameters dump.
const SCHEMA_KEY: &str = "schema";

/// Binary image tensor for one chunk, bincode-encoded on disk.
#[derive(Debug, Serialize, Deserialize)]
pub struct ImageChunk {
    /// `(chunk_len, 8, 8)`.
    pub shape: [u64; 3],
    /// Row-major pixel data.
    pub data: Vec<f32>,
}

/// Paths of one written chunk pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFiles {
    pub metadata_csv: PathBuf,
    pub images_bin: PathBuf,
    /// Events in this chunk.
    pub len: usize,
    /// First event id in this chunk.
    pub first_event_id: u64,
}

/// Re-chunk every source table under `input_dir` into `output_dir`.
///
/// Events are taken in sorted file order and re-grouped into runs of exactly
/// [`CHUNK_SIZE`] (final run shorter), regardless of how they were spread
/// across input files. Also writes `simulation_parameters.txt` from the first
/// source file's metadata. Creates `output_dir` if absent.
pub fn reformat_dir(input_dir: &Path, output_dir: &Path) -> Result<Vec<ChunkFiles>> {
    std::fs::create_dir_all(output_dir).map_err(|source| SipmError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let files = discover_tables(input_dir)?;
    if files.is_empty() {
        warn!(dir = %input_dir.display(), "no source tables to reformat");
        return Ok(Vec::new());
    }

    let mut written = Vec::new();
    let mut pending: Vec<EventRecord> = Vec::with_capacity(CHUNK_SIZE);
    let mut next_event_id: u64 = 0;
    let mut chunk_no: usize = 0;
    let mut first_metadata = None;

    for file in &files {
        let table = read_table(file)?;
        if first_metadata.is_none() {
            first_metadata = Some(table.metadata.clone());
        }
        for (row, event) in table.events.into_iter().enumerate() {
            if event.photon_counts.len() != PIXELS_PER_EVENT {
                return Err(SipmError::MalformedInput {
                    file: file.clone(),
                    row,
                    got: event.photon_counts.len(),
                    expected: PIXELS_PER_EVENT,
                });
            }
            pending.push(event);
            if pending.len() == CHUNK_SIZE {
                let chunk =
                    write_chunk(output_dir, chunk_no, next_event_id, &pending)?;
                next_event_id += pending.len() as u64;
                pending.clear();
                chunk_no += 1;
                written.push(chunk);
            }
        }
    }

    if !pending.is_empty() {
        let chunk = write_chunk(output_dir, chunk_no, next_event_id, &pending)?;
        next_event_id += pending.len() as u64;
        written.push(chunk);
    }

    if let Some(metadata) = first_metadata {
        write_simulation_parameters(output_dir, &metadata)?;
    }

    info!(
        chunks = written.len(),
        events = next_event_id,
        out = %output_dir.display(),
        "reformatting complete"
    );
    Ok(written)
}

fn write_chunk(
    output_dir: &Path,
    chunk_no: usize,
    first_event_id: u64,
    events: &[EventRecord],
) -> Result<ChunkFiles> {
    let metadata_csv = output_dir.join(format!("metadata_{chunk_no:02}.csv"));
    let images_bin = output_dir.join(format!("images_{chunk_no:02}.bin"));

    let mut writer = csv::Writer::from_path(&metadata_csv)?;
    writer.write_record(["event_id", "initial_x", "initial_y", "initial_z"])?;
    for (i, event) in events.iter().enumerate() {
        writer.write_record([
            (first_event_id + i as u64).to_string(),
            event.x.to_string(),
            event.y.to_string(),
            event.z.to_string(),
        ])?;
    }
    writer.flush().map_err(|source| SipmError::Io {
        path: metadata_csv.clone(),
        source,
    })?;

    let mut data = Vec::with_capacity(events.len() * PIXELS_PER_EVENT);
    for event in events {
        data.extend_from_slice(&event.photon_counts);
    }
    let chunk = ImageChunk {
        shape: [events.len() as u64, GRID_SIZE as u64, GRID_SIZE as u64],
        data,
    };
    let file = File::create(&images_bin).map_err(|source| SipmError::Io {
        path: images_bin.clone(),
        source,
    })?;
    bincode::serialize_into(BufWriter::new(file), &chunk)?;

    Ok(ChunkFiles {
        metadata_csv,
        images_bin,
        len: events.len(),
        first_event_id,
    })
}

/// Dump file-level metadata as `key  => value` lines, sorted by key, skipping
/// the schema-description entry.
fn write_simulation_parameters(
    output_dir: &Path,
    metadata: &std::collections::BTreeMap<String, String>,
) -> Result<()> {
    let path = output_dir.join("simulation_parameters.txt");
    let mut out = String::new();
    for (key, value) in metadata {
        if key == SCHEMA_KEY {
            continue;
        }
        out.push_str(&format!("{key}  => {value}\n"));
    }
    let mut file = File::create(&path).map_err(|source| SipmError::Io {
        path: path.clone(),
        source,
    })?;
    file.write_all(out.as_bytes()).map_err(|source| SipmError::Io {
        path,
        source,
    })?;
    Ok(())
}

/// Read back a bincode image chunk.
pub fn read_image_chunk(path: &Path) -> Result<ImageChunk> {
    let file = File::open(path).map_err(|source| SipmError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let chunk: ImageChunk = bincode::deserialize_from(std::io::BufReader::new(file))?;
    Ok(chunk)
}
