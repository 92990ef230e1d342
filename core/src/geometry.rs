// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sensor pixel geometry.

use serde::{Deserialize, Serialize};

use crate::GRID_SIZE;

/// Physical layout of the SiPM sensor plane.
///
/// Passed explicitly to the dataset helpers and the evaluation stage; there is
/// deliberately no module-level geometry state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelGeometry {
    /// Pixel pitch in millimetres.
    pub pixel_size_mm: f32,
    /// Number of pixels along one side of the square grid.
    pub grid_size: usize,
}

impl Default for PixelGeometry {
    fn default() -> Self {
        Self {
            pixel_size_mm: 6.0,
            grid_size: GRID_SIZE,
        }
    }
}

impl PixelGeometry {
    /// Offset that centres pixel indices on the grid's geometric middle:
    /// half the grid size minus half a pixel.
    pub fn center_offset(&self) -> f32 {
        self.grid_size as f32 / 2.0 - 0.5
    }

    /// Map a lateral coordinate in millimetres to a fractional pixel index.
    pub fn mm_to_pixel(&self, mm: f32) -> f32 {
        (mm + self.pixel_size_mm * self.grid_size as f32 / 2.0) / self.pixel_size_mm - 0.5
    }

    /// Map a centred fractional pixel index back to millimetres.
    pub fn pixel_to_mm(&self, pixel: f32) -> f32 {
        pixel * self.pixel_size_mm
    }
}
