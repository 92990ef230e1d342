// SPDX-License-Identifier: MIT OR Apache-2.0

//! SiPM position reconstruction pipeline.
//!
//! Loads a directory of source tables, trains the convolutional regression
//! network, evaluates it on the held-out test split against the classical
//! centroid baseline, and writes the loss trace and residual tables for
//! external plotting.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sipmpos_core::{partition, PixelGeometry, SipmDataset};
use sipmpos_train::eval::evaluate;
use sipmpos_train::report::{write_loss_trace, write_residuals};
use sipmpos_train::{PosNetConfig, TrainConfig, Trainer};

#[cfg(feature = "wgpu")]
type Inner = burn::backend::Wgpu;
#[cfg(not(feature = "wgpu"))]
type Inner = burn::backend::NdArray<f32>;

type Backend = burn::backend::Autodiff<Inner>;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "sipmpos", about = "Train and evaluate the SiPM position network", version)]
struct Args {
    /// Directory of .jsonl source tables
    data_dir: PathBuf,

    /// Limit the number of source files loaded
    #[arg(long)]
    max_files: Option<usize>,

    /// Number of training epochs
    #[arg(long, default_value = "3")]
    epochs: usize,

    /// Events per batch
    #[arg(long, default_value = "1000")]
    batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value = "0.001")]
    learning_rate: f64,

    /// Shuffle seed for reproducible batch order
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Base channel width of the network
    #[arg(long, default_value = "128")]
    channels: usize,

    /// Dropout probability on the flattened features (0 disables the stage)
    #[arg(long, default_value = "0.0")]
    dropout: f64,

    /// Directory for loss_trace.csv and residuals.csv
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Print the plot-overlay marker for one event and continue
    #[arg(long)]
    show_event: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let geometry = PixelGeometry::default();

    let dataset = SipmDataset::from_dir(&args.data_dir, args.max_files)?;
    dataset.ensure_nonempty()?;
    info!(events = dataset.len(), "dataset loaded");

    if let Some(index) = args.show_event {
        let overlay = dataset.event_overlay(index, &geometry)?;
        println!(
            "event {index}: marker at ({:.2}, {:.2}) px, z = {:.1} mm",
            overlay.x_pixel, overlay.y_pixel, overlay.depth_mm
        );
    }

    let split = partition(dataset.len())?;

    let model_config = PosNetConfig {
        channels: args.channels,
        dropout: args.dropout,
    };
    let train_config = TrainConfig {
        epochs: args.epochs,
        batch_size: args.batch_size,
        learning_rate: args.learning_rate,
        seed: args.seed,
    };

    let device = <Backend as burn::tensor::backend::Backend>::Device::default();
    let mut trainer = Trainer::<Backend>::new(&model_config, train_config, device.clone());
    let trace = trainer.fit(&dataset, &split);

    let model = trainer.valid_model();
    let report = evaluate(&model, &dataset, &split.test, &geometry, args.batch_size, &device)?;

    std::fs::create_dir_all(&args.out_dir)?;
    write_loss_trace(&args.out_dir.join("loss_trace.csv"), &trace)?;
    write_residuals(&args.out_dir.join("residuals.csv"), &report)?;

    println!(
        "NN residual sigma [x y z] = [{:.2} {:.2} {:.2}] mm; centroid [x y] = [{:.2} {:.2}] mm",
        report.nn_residual_sigma[0],
        report.nn_residual_sigma[1],
        report.nn_residual_sigma[2],
        report.classical_residual_sigma[0],
        report.classical_residual_sigma[1],
    );
    Ok(())
}
