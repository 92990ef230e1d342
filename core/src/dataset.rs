// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory dataset assembly over a directory of source tables.

use std::path::{Path, PathBuf};

use ndarray::{Array2, Array3, ArrayView2};
use tracing::{info, warn};

use crate::extract::extract_events;
use crate::geometry::PixelGeometry;
use crate::table::{discover_tables, read_table};
use crate::{Result, SipmError, GRID_SIZE};

/// Read access to an ordered collection of events.
///
/// The eager in-memory [`SipmDataset`] is the only backing store today; the
/// trait is the seam where a streamed or memory-mapped store would plug in
/// without touching the partitioner or training loop.
pub trait EventSource {
    /// Number of events.
    fn len(&self) -> usize;

    /// True if the source holds no events.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch one event: the image with an explicit single-channel dimension
    /// `(1, 8, 8)` and the ground-truth `[x, y, z]` position.
    fn get(&self, index: usize) -> Result<(Array3<f32>, [f32; 3])>;
}

/// Overlay marker for one event, consumed by an external plotting tool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventOverlay {
    /// Horizontal marker position in fractional pixel coordinates.
    pub x_pixel: f32,
    /// Vertical marker position in fractional pixel coordinates.
    pub y_pixel: f32,
    /// True depth in millimetres, used as the panel label.
    pub depth_mm: f32,
}

/// All events from a directory of source tables, held in two parallel arrays.
///
/// Invariant: `images` is `(N, 8, 8)`, `positions` is `(N, 3)`, and row `i`
/// of each describes the same event. Built once, never mutated.
pub struct SipmDataset {
    images: Array3<f32>,
    positions: Array2<f32>,
    dir: PathBuf,
}

impl SipmDataset {
    /// Load every `.jsonl` table under `dir`, optionally capped to the first
    /// `max_files` files in sorted order, and concatenate the extractions.
    ///
    /// A missing or empty directory produces an N=0 dataset; callers that
    /// need events should check [`EventSource::is_empty`] (the partitioner
    /// rejects zero-length datasets explicitly).
    pub fn from_dir(dir: &Path, max_files: Option<usize>) -> Result<Self> {
        let mut files = discover_tables(dir)?;
        if let Some(cap) = max_files {
            files.truncate(cap);
        }
        if files.is_empty() {
            warn!(dir = %dir.display(), "no source tables found");
        }

        let mut position_blocks = Vec::with_capacity(files.len());
        let mut image_blocks = Vec::with_capacity(files.len());
        for file in &files {
            let table = read_table(file)?;
            let (positions, images) = extract_events(&table, file)?;
            info!(file = %file.display(), events = table.len(), "loaded source table");
            position_blocks.push(positions);
            image_blocks.push(images);
        }

        let total: usize = position_blocks.iter().map(|b| b.nrows()).sum();
        let mut positions = Array2::<f32>::zeros((total, 3));
        let mut images = Array3::<f32>::zeros((total, GRID_SIZE, GRID_SIZE));
        let mut offset = 0;
        for (pos_block, img_block) in position_blocks.iter().zip(&image_blocks) {
            let n = pos_block.nrows();
            positions
                .slice_mut(ndarray::s![offset..offset + n, ..])
                .assign(pos_block);
            images
                .slice_mut(ndarray::s![offset..offset + n, .., ..])
                .assign(img_block);
            offset += n;
        }

        info!(events = total, files = files.len(), "assembled dataset");
        Ok(Self {
            images,
            positions,
            dir: dir.to_path_buf(),
        })
    }

    /// Build a dataset directly from pre-extracted arrays.
    ///
    /// Panics if the array lengths disagree; used by alternative sources and
    /// by tests that bypass the filesystem.
    pub fn from_arrays(images: Array3<f32>, positions: Array2<f32>) -> Self {
        assert_eq!(images.shape()[0], positions.nrows());
        assert_eq!(&images.shape()[1..], [GRID_SIZE, GRID_SIZE]);
        Self {
            images,
            positions,
            dir: PathBuf::new(),
        }
    }

    /// Directory this dataset was assembled from.
    pub fn source_dir(&self) -> &Path {
        &self.dir
    }

    /// Number of events (also available through [`EventSource`]).
    pub fn len(&self) -> usize {
        self.positions.nrows()
    }

    /// True if no events were loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the full `(N, 8, 8)` image stack.
    pub fn images(&self) -> &Array3<f32> {
        &self.images
    }

    /// Borrow the full `(N, 3)` position table.
    pub fn positions(&self) -> ArrayView2<'_, f32> {
        self.positions.view()
    }

    /// Fail with [`SipmError::EmptyDataset`] if no events were loaded.
    pub fn ensure_nonempty(&self) -> Result<()> {
        if self.positions.nrows() == 0 {
            return Err(SipmError::EmptyDataset {
                dir: self.dir.clone(),
            });
        }
        Ok(())
    }

    /// Marker and label for plotting one event over its image.
    ///
    /// The axes are swapped relative to the position vector: the image's
    /// horizontal axis tracks the detector's y coordinate and vice versa.
    pub fn event_overlay(&self, index: usize, geometry: &PixelGeometry) -> Result<EventOverlay> {
        let n = self.positions.nrows();
        if index >= n {
            return Err(SipmError::IndexOutOfRange { index, len: n });
        }
        let x = self.positions[[index, 0]];
        let y = self.positions[[index, 1]];
        let z = self.positions[[index, 2]];
        Ok(EventOverlay {
            x_pixel: geometry.mm_to_pixel(y),
            y_pixel: geometry.mm_to_pixel(x),
            depth_mm: z,
        })
    }
}

impl EventSource for SipmDataset {
    fn len(&self) -> usize {
        self.positions.nrows()
    }

    fn get(&self, index: usize) -> Result<(Array3<f32>, [f32; 3])> {
        let n = self.len();
        if index >= n {
            return Err(SipmError::IndexOutOfRange { index, len: n });
        }
        let image = self
            .images
            .index_axis(ndarray::Axis(0), index)
            .to_owned()
            .insert_axis(ndarray::Axis(0));
        let position = [
            self.positions[[index, 0]],
            self.positions[[index, 1]],
            self.positions[[index, 2]],
        ];
        Ok((image, position))
    }
}
