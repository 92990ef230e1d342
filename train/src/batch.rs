// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tensor batch assembly from dataset index slices.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use sipmpos_core::{SipmDataset, GRID_SIZE, PIXELS_PER_EVENT};

/// One batch of events as device tensors.
pub struct PosBatch<B: Backend> {
    /// `[batch, 1, 8, 8]` images.
    pub images: Tensor<B, 4>,
    /// `[batch, 3]` ground-truth positions.
    pub targets: Tensor<B, 2>,
}

impl<B: Backend> PosBatch<B> {
    /// Gather the given dataset indices into one batch.
    ///
    /// Indices must be in range; batching happens after the pipeline has
    /// validated the dataset and split, so an out-of-range index here is a
    /// programming error.
    pub fn from_indices(dataset: &SipmDataset, indices: &[usize], device: &B::Device) -> Self {
        let n = indices.len();
        let images = dataset.images();
        let positions = dataset.positions();

        let mut image_data = Vec::with_capacity(n * PIXELS_PER_EVENT);
        let mut target_data = Vec::with_capacity(n * 3);
        for &idx in indices {
            image_data.extend(images.index_axis(ndarray::Axis(0), idx).iter().copied());
            target_data.extend(positions.row(idx).iter().copied());
        }

        let images = Tensor::<B, 1>::from_floats(image_data.as_slice(), device)
            .reshape([n, 1, GRID_SIZE, GRID_SIZE]);
        let targets =
            Tensor::<B, 1>::from_floats(target_data.as_slice(), device).reshape([n, 3]);

        Self { images, targets }
    }
}
