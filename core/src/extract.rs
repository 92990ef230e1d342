// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extraction of position and image arrays from a parsed source table.

use std::path::Path;

use ndarray::{Array2, Array3};

use crate::table::SourceTable;
use crate::{Result, SipmError, GRID_SIZE, PIXELS_PER_EVENT};

/// Extract ground-truth positions and sensor images from a source table.
///
/// Returns an `(N, 3)` array of positions in column order `[x, y, z]` and an
/// `(N, 8, 8)` array of images, each row's 64 flattened photon counts
/// reshaped row-major into the grid. A row whose photon_counts length is not
/// 64 is a fatal [`SipmError::MalformedInput`].
pub fn extract_events(table: &SourceTable, file: &Path) -> Result<(Array2<f32>, Array3<f32>)> {
    let n = table.len();
    let mut positions = Array2::<f32>::zeros((n, 3));
    let mut images = Array3::<f32>::zeros((n, GRID_SIZE, GRID_SIZE));

    for (row, event) in table.events.iter().enumerate() {
        if event.photon_counts.len() != PIXELS_PER_EVENT {
            return Err(SipmError::MalformedInput {
                file: file.to_path_buf(),
                row,
                got: event.photon_counts.len(),
                expected: PIXELS_PER_EVENT,
            });
        }

        positions[[row, 0]] = event.x;
        positions[[row, 1]] = event.y;
        positions[[row, 2]] = event.z;

        for (i, &count) in event.photon_counts.iter().enumerate() {
            images[[row, i / GRID_SIZE, i % GRID_SIZE]] = count;
        }
    }

    Ok((positions, images))
}
