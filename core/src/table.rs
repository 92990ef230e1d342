// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-lines source-table reading.
//!
//! A source table is a `.jsonl` file with one event record per line:
//!
//! ```text
//! {"metadata": {"seed": "42", "crystal": "CsI"}}   <- optional, first line only
//! {"x": 1.5, "y": -2.0, "z": 10.0, "photon_counts": [0.0, 3.0, ...]}
//! ```
//!
//! The optional leading object carries file-level key/value metadata; the
//! `schema` key within it describes the table layout and is excluded from
//! reformatter output.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Result, SipmError};

/// One event row of a source table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// True lateral x position, millimetres.
    pub x: f32,
    /// True lateral y position, millimetres.
    pub y: f32,
    /// True depth, millimetres.
    pub z: f32,
    /// Flattened per-pixel intensities, row-major, length 64.
    pub photon_counts: Vec<f32>,
}

/// Optional first-line header of a source table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableHeader {
    metadata: BTreeMap<String, String>,
}

/// A fully parsed source table: metadata plus event rows.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    /// File-level key/value metadata, empty if the file carried no header.
    pub metadata: BTreeMap<String, String>,
    /// Event rows in file order.
    pub events: Vec<EventRecord>,
}

impl SourceTable {
    /// Number of event rows.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if the table holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Parse one `.jsonl` source table.
pub fn read_table(path: &Path) -> Result<SourceTable> {
    let file = File::open(path).map_err(|source| SipmError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut table = SourceTable::default();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| SipmError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        if line_no == 0 {
            if let Ok(header) = serde_json::from_str::<TableHeader>(&line) {
                table.metadata = header.metadata;
                continue;
            }
        }
        let record: EventRecord =
            serde_json::from_str(&line).map_err(|source| SipmError::Table {
                file: path.to_path_buf(),
                source,
            })?;
        table.events.push(record);
    }

    debug!(
        file = %path.display(),
        events = table.events.len(),
        "parsed source table"
    );
    Ok(table)
}

/// Enumerate `.jsonl` source files in a directory, sorted by file name.
///
/// Sorting fixes the dataset assembly order across filesystems; a missing
/// directory yields an empty list rather than an error so that the caller can
/// surface the empty-dataset condition itself.
pub fn discover_tables(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(files),
    };
    for entry in entries {
        let entry = entry.map_err(|source| SipmError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
