// SPDX-License-Identifier: MIT OR Apache-2.0

//! SiPM Position Reconstruction Core
//!
//! This crate provides the offline data pipeline shared by the training and
//! reformatting binaries:
//! - JSON-lines source-table reading and event extraction
//! - In-memory dataset assembly over a directory of source files
//! - Deterministic train/validation/test partitioning
//! - The classical intensity-weighted centroid baseline
//! - Re-chunking of source tables into CSV/binary pairs

#![deny(unsafe_code)]
#![deny(clippy::all)]

pub mod centroid;
pub mod dataset;
pub mod extract;
pub mod geometry;
pub mod partition;
pub mod reformat;
pub mod table;

use std::path::PathBuf;

use thiserror::Error;

/// Side length of the sensor grid, in pixels.
pub const GRID_SIZE: usize = 8;

/// Number of pixels per event image.
pub const PIXELS_PER_EVENT: usize = GRID_SIZE * GRID_SIZE;

/// Errors produced by the core pipeline.
#[derive(Debug, Error)]
pub enum SipmError {
    /// A source-table row carried a photon_counts sequence that does not
    /// reshape into an 8x8 grid.
    #[error("malformed input in {file}: row {row} has {got} photon counts, expected {expected}")]
    MalformedInput {
        file: PathBuf,
        row: usize,
        got: usize,
        expected: usize,
    },

    /// Event index outside the dataset range.
    #[error("event index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The assembled dataset holds no events; partitioning and training
    /// refuse to proceed on a zero-length dataset.
    #[error("dataset is empty: no events loaded from {dir}")]
    EmptyDataset { dir: PathBuf },

    /// An all-zero image has no defined centroid.
    #[error("degenerate input: total image intensity is zero")]
    DegenerateInput,

    /// Failure reading or parsing a source table.
    #[error("failed to read source table {file}: {source}")]
    Table {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem failure.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failure writing a CSV output.
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    /// Failure encoding a binary image chunk.
    #[error("binary chunk encode failed: {0}")]
    Encode(#[from] bincode::Error),
}

/// Convenience alias used across the core crate.
pub type Result<T> = std::result::Result<T, SipmError>;

pub use centroid::{weighted_mean_and_sigma, CentroidEstimate};
pub use dataset::{EventSource, SipmDataset};
pub use geometry::PixelGeometry;
pub use partition::{partition, Split};
