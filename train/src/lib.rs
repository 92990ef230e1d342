// SPDX-License-Identifier: MIT OR Apache-2.0

//! Convolutional position regression for SiPM events.
//!
//! This crate holds the learned half of the pipeline:
//! - [`model::PosNet`], the fixed-topology CNN mapping one 8x8 sensor image
//!   to an (x, y, z) estimate
//! - [`batch::PosBatch`], tensor assembly from dataset index slices
//! - [`trainer::Trainer`], the epoch loop with MSE loss and Adam updates
//! - [`eval`], test-split evaluation against the classical centroid baseline
//! - [`report`], CSV emission of the loss trace and residuals

#![deny(unsafe_code)]

pub mod batch;
pub mod eval;
pub mod model;
pub mod report;
pub mod trainer;

pub use model::{PosNet, PosNetConfig};
pub use trainer::{LossTrace, TrainConfig, Trainer};
