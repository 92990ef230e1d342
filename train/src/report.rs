// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSV emission of the loss trace and per-event residuals.
//!
//! These files are the hand-off to external plotting: loss curves from
//! `loss_trace.csv`, residual histograms from `residuals.csv`. Neither is a
//! programmatic contract.

use std::path::Path;

use anyhow::Result;

use crate::eval::EvalReport;
use crate::trainer::LossTrace;

/// Write `epoch, train_loss, val_loss` rows.
pub fn write_loss_trace(path: &Path, trace: &LossTrace) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["epoch", "train_loss", "val_loss"])?;
    for (epoch, (train, val)) in trace.train.iter().zip(&trace.val).enumerate() {
        writer.write_record([
            epoch.to_string(),
            format!("{train:.6}"),
            format!("{val:.6}"),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write per-event truth, prediction and classical-estimate columns.
///
/// Events whose centroid was degenerate carry empty classical fields.
pub fn write_residuals(path: &Path, report: &EvalReport) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "true_x",
        "true_y",
        "true_z",
        "predicted_x",
        "predicted_y",
        "predicted_z",
        "classical_x",
        "classical_y",
    ])?;
    for row in &report.rows {
        writer.write_record([
            format!("{:.6}", row.truth[0]),
            format!("{:.6}", row.truth[1]),
            format!("{:.6}", row.truth[2]),
            format!("{:.6}", row.predicted[0]),
            format!("{:.6}", row.predicted[1]),
            format!("{:.6}", row.predicted[2]),
            row.classical_x.map(|v| format!("{v:.6}")).unwrap_or_default(),
            row.classical_y.map(|v| format!("{v:.6}")).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
