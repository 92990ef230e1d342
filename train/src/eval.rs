// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test-split evaluation of the trained model against the centroid baseline.

use std::ops::Range;

use anyhow::{anyhow, Result};
use burn::tensor::backend::Backend;
use sipmpos_core::{weighted_mean_and_sigma, PixelGeometry, SipmDataset, SipmError};
use tracing::{info, warn};

use crate::batch::PosBatch;
use crate::model::PosNet;

/// One evaluated test event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalRow {
    /// Ground truth [x, y, z], millimetres.
    pub truth: [f32; 3],
    /// Network estimate [x, y, z], millimetres.
    pub predicted: [f32; 3],
    /// Centroid estimate of x in millimetres; `None` for an all-zero image.
    pub classical_x: Option<f32>,
    /// Centroid estimate of y in millimetres; `None` for an all-zero image.
    pub classical_y: Option<f32>,
}

/// Evaluation summary over the test split.
#[derive(Debug, Clone)]
pub struct EvalReport {
    pub rows: Vec<EvalRow>,
    /// Standard deviation of (true - predicted) per axis, [x, y, z].
    pub nn_residual_sigma: [f32; 3],
    /// Standard deviation of (true - centroid) for the lateral axes, [x, y].
    pub classical_residual_sigma: [f32; 2],
}

/// Run the model over the test range in eval mode and compare its residuals
/// with the classical centroid estimate on the same images.
pub fn evaluate<B: Backend>(
    model: &PosNet<B>,
    dataset: &SipmDataset,
    test: &Range<usize>,
    geometry: &PixelGeometry,
    batch_size: usize,
    device: &B::Device,
) -> Result<EvalReport> {
    let indices: Vec<usize> = test.clone().collect();
    let mut rows = Vec::with_capacity(indices.len());

    for chunk in indices.chunks(batch_size.max(1)) {
        let batch = PosBatch::<B>::from_indices(dataset, chunk, device);
        let outputs = model
            .forward(batch.images)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("failed to read predictions off the device: {e:?}"))?;

        for (k, &idx) in chunk.iter().enumerate() {
            let truth = [
                dataset.positions()[[idx, 0]],
                dataset.positions()[[idx, 1]],
                dataset.positions()[[idx, 2]],
            ];
            let predicted = [outputs[k * 3], outputs[k * 3 + 1], outputs[k * 3 + 2]];

            let image = dataset.images().index_axis(ndarray::Axis(0), idx);
            let (classical_x, classical_y) = match weighted_mean_and_sigma(image) {
                Ok(est) => (
                    Some(geometry.pixel_to_mm(est.mean_x)),
                    Some(geometry.pixel_to_mm(est.mean_y)),
                ),
                Err(SipmError::DegenerateInput) => {
                    warn!(event = idx, "all-zero image, skipping centroid estimate");
                    (None, None)
                }
                Err(e) => return Err(e.into()),
            };

            rows.push(EvalRow {
                truth,
                predicted,
                classical_x,
                classical_y,
            });
        }
    }

    let nn_residual_sigma = [
        std_dev(rows.iter().map(|r| r.truth[0] - r.predicted[0])),
        std_dev(rows.iter().map(|r| r.truth[1] - r.predicted[1])),
        std_dev(rows.iter().map(|r| r.truth[2] - r.predicted[2])),
    ];
    let classical_residual_sigma = [
        std_dev(rows.iter().filter_map(|r| r.classical_x.map(|c| r.truth[0] - c))),
        std_dev(rows.iter().filter_map(|r| r.classical_y.map(|c| r.truth[1] - c))),
    ];

    info!(
        events = rows.len(),
        nn_sigma_x = nn_residual_sigma[0],
        nn_sigma_y = nn_residual_sigma[1],
        nn_sigma_z = nn_residual_sigma[2],
        classical_sigma_x = classical_residual_sigma[0],
        classical_sigma_y = classical_residual_sigma[1],
        "test-split evaluation"
    );

    Ok(EvalReport {
        rows,
        nn_residual_sigma,
        classical_residual_sigma,
    })
}

/// Population standard deviation.
fn std_dev(values: impl Iterator<Item = f32> + Clone) -> f32 {
    let n = values.clone().count();
    if n == 0 {
        return f32::NAN;
    }
    let mean = values.clone().sum::<f32>() / n as f32;
    let var = values.map(|v| (v - mean) * (v - mean)).sum::<f32>() / n as f32;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_dev_of_constant_is_zero() {
        let vals = [2.5f32, 2.5, 2.5];
        assert_eq!(std_dev(vals.iter().copied()), 0.0);
    }

    #[test]
    fn std_dev_matches_population_formula() {
        let vals = [1.0f32, 3.0];
        assert!((std_dev(vals.iter().copied()) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn std_dev_of_empty_is_nan() {
        assert!(std_dev(std::iter::empty()).is_nan());
    }
}
