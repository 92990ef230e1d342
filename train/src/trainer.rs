// SPDX-License-Identifier: MIT OR Apache-2.0

//! Epoch-driven training and validation loop.

use burn::module::AutodiffModule;
use burn::nn::loss::{MseLoss, Reduction};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use sipmpos_core::{SipmDataset, Split};
use tracing::{info, warn};

use crate::batch::PosBatch;
use crate::model::{PosNet, PosNetConfig};

/// Training-loop knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Number of full passes over the training split.
    pub epochs: usize,
    /// Events per batch.
    pub batch_size: usize,
    /// Adam learning rate.
    pub learning_rate: f64,
    /// Seed for the per-epoch shuffle of training indices.
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 3,
            batch_size: 1000,
            learning_rate: 1e-3,
            seed: 0,
        }
    }
}

/// Per-epoch mean losses, appended once per epoch and never rewritten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LossTrace {
    pub train: Vec<f32>,
    pub val: Vec<f32>,
}

impl LossTrace {
    /// Number of completed epochs.
    pub fn epochs(&self) -> usize {
        debug_assert_eq!(self.train.len(), self.val.len());
        self.train.len()
    }
}

/// Owns the model and drives gradient-descent training over a dataset split.
pub struct Trainer<B: AutodiffBackend> {
    model: PosNet<B>,
    config: TrainConfig,
    device: B::Device,
}

impl<B: AutodiffBackend> Trainer<B> {
    /// Initialise a fresh model on `device`.
    pub fn new(model_config: &PosNetConfig, config: TrainConfig, device: B::Device) -> Self {
        Self {
            model: PosNet::new(model_config, &device),
            config,
            device,
        }
    }

    /// Borrow the current model parameters (read-only evaluation use).
    pub fn model(&self) -> &PosNet<B> {
        &self.model
    }

    /// The model on the inner (non-autodiff) backend, for evaluation.
    pub fn valid_model(&self) -> PosNet<B::InnerBackend> {
        self.model.valid()
    }

    /// Run the configured number of epochs over the train/validation splits.
    ///
    /// Each epoch shuffles the training indices, steps Adam on the MSE of
    /// every batch, then sweeps the validation split in fixed order with
    /// updates disabled, and appends both epoch means to the trace. With
    /// `epochs = 0` the trace stays empty and no parameter is touched.
    pub fn fit(&mut self, dataset: &SipmDataset, split: &Split) -> LossTrace {
        let mut optim = AdamConfig::new().init();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut trace = LossTrace::default();

        let mut train_indices: Vec<usize> = split.train.clone().collect();
        let val_indices: Vec<usize> = split.val.clone().collect();
        if train_indices.is_empty() {
            warn!("training split is empty; epoch means will be undefined");
        }

        for epoch in 0..self.config.epochs {
            // Training phase: freshly shuffled batch order, parameters updated.
            train_indices.shuffle(&mut rng);
            let n_batches = train_indices.chunks(self.config.batch_size).count();
            let report_every = (n_batches / 10).max(1);

            let mut epoch_losses = Vec::with_capacity(n_batches);
            for (i, chunk) in train_indices.chunks(self.config.batch_size).enumerate() {
                let batch = PosBatch::<B>::from_indices(dataset, chunk, &self.device);
                let output = self.model.forward(batch.images);
                let loss = MseLoss::new().forward(output, batch.targets, Reduction::Mean);

                let grads = GradientsParams::from_grads(loss.backward(), &self.model);
                self.model = optim.step(self.config.learning_rate, self.model.clone(), grads);

                let loss_value: f32 = loss.into_scalar().elem();
                epoch_losses.push(loss_value);
                if (i + 1) % report_every == 0 {
                    info!(epoch, step = i + 1, total = n_batches, loss = loss_value, "train step");
                }
            }

            // Validation phase: fixed order, no gradients, running batch-norm
            // statistics via the inner backend.
            let model = self.model.valid();
            let n_val_batches = val_indices.chunks(self.config.batch_size).count();
            let val_report_every = (n_val_batches / 10).max(1);
            let mut val_losses = Vec::with_capacity(n_val_batches);
            for (i, chunk) in val_indices.chunks(self.config.batch_size).enumerate() {
                let batch = PosBatch::<B::InnerBackend>::from_indices(dataset, chunk, &self.device);
                let output = model.forward(batch.images);
                let loss = MseLoss::new().forward(output, batch.targets, Reduction::Mean);
                let loss_value: f32 = loss.into_scalar().elem();
                val_losses.push(loss_value);
                if (i + 1) % val_report_every == 0 {
                    info!(epoch, step = i + 1, total = n_val_batches, loss = loss_value, "validation step");
                }
            }

            let train_mean = mean(&epoch_losses);
            let val_mean = mean(&val_losses);
            trace.train.push(train_mean);
            trace.val.push(val_mean);
            info!(epoch, train_loss = train_mean, val_loss = val_mean, "epoch complete");
        }

        trace
    }
}

fn mean(values: &[f32]) -> f32 {
    values.iter().sum::<f32>() / values.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use ndarray::{Array2, Array3};
    use sipmpos_core::partition;

    type B = Autodiff<NdArray<f32>>;

    fn small_dataset(n: usize) -> SipmDataset {
        let mut images = Array3::<f32>::zeros((n, 8, 8));
        let mut positions = Array2::<f32>::zeros((n, 3));
        for i in 0..n {
            images[[i, i % 8, (i * 3) % 8]] = 1.0 + i as f32;
            positions[[i, 0]] = (i % 8) as f32;
            positions[[i, 1]] = ((i * 3) % 8) as f32;
            positions[[i, 2]] = 5.0;
        }
        SipmDataset::from_arrays(images, positions)
    }

    fn tiny_net() -> PosNetConfig {
        PosNetConfig {
            channels: 4,
            dropout: 0.0,
        }
    }

    #[test]
    fn zero_epochs_leaves_empty_traces() {
        let dataset = small_dataset(10);
        let split = partition(dataset.len()).unwrap();
        let config = TrainConfig {
            epochs: 0,
            ..Default::default()
        };
        let mut trainer = Trainer::<B>::new(&tiny_net(), config, Default::default());
        let trace = trainer.fit(&dataset, &split);
        assert!(trace.train.is_empty());
        assert!(trace.val.is_empty());
        assert_eq!(trace.epochs(), 0);
    }

    #[test]
    fn one_epoch_records_one_mean_per_phase() {
        let dataset = small_dataset(20);
        let split = partition(dataset.len()).unwrap();
        let config = TrainConfig {
            epochs: 1,
            batch_size: 4,
            learning_rate: 1e-3,
            seed: 7,
        };
        let mut trainer = Trainer::<B>::new(&tiny_net(), config, Default::default());
        let trace = trainer.fit(&dataset, &split);
        assert_eq!(trace.train.len(), 1);
        assert_eq!(trace.val.len(), 1);
        assert!(trace.train[0].is_finite());
        assert!(trace.val[0].is_finite());
    }
}
