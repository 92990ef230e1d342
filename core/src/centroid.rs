// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classical intensity-weighted centroid baseline.

use ndarray::ArrayView2;

use crate::{Result, SipmError};

/// Intensity-weighted mean and spread of one sensor image, in centred
/// fractional pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentroidEstimate {
    pub mean_x: f32,
    pub mean_y: f32,
    pub sigma_x: f32,
    pub sigma_y: f32,
}

/// Compute the intensity-weighted mean pixel coordinate and per-axis
/// standard deviation of an image.
///
/// Pixel indices are offset so that (0, 0) is the geometric middle of the
/// grid: index minus (grid/2 - 0.5), i.e. -3.5 for an 8x8 sensor. The x axis
/// runs along rows and y along columns, matching the reference estimator.
///
/// An all-zero image has no defined centroid and returns
/// [`SipmError::DegenerateInput`] rather than propagating NaN into downstream
/// statistics.
pub fn weighted_mean_and_sigma(image: ArrayView2<'_, f32>) -> Result<CentroidEstimate> {
    let total: f32 = image.sum();
    if total == 0.0 {
        return Err(SipmError::DegenerateInput);
    }

    let (rows, cols) = image.dim();
    let row_offset = rows as f32 / 2.0 - 0.5;
    let col_offset = cols as f32 / 2.0 - 0.5;

    let mut mean_x = 0.0f32;
    let mut mean_y = 0.0f32;
    for ((r, c), &w) in image.indexed_iter() {
        mean_x += (r as f32 - row_offset) * w;
        mean_y += (c as f32 - col_offset) * w;
    }
    mean_x /= total;
    mean_y /= total;

    let mut var_x = 0.0f32;
    let mut var_y = 0.0f32;
    for ((r, c), &w) in image.indexed_iter() {
        let dx = r as f32 - row_offset - mean_x;
        let dy = c as f32 - col_offset - mean_y;
        var_x += w * dx * dx;
        var_y += w * dy * dy;
    }

    Ok(CentroidEstimate {
        mean_x,
        mean_y,
        sigma_x: (var_x / total).sqrt(),
        sigma_y: (var_y / total).sqrt(),
    })
}
