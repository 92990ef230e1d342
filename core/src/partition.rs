// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic train/validation/test partitioning.

use std::ops::Range;
use std::path::PathBuf;

use tracing::info;

use crate::{Result, SipmError};

/// Training-split fraction of the dataset.
pub const TRAIN_FRACTION: f64 = 0.70;

/// Validation-split fraction of the dataset.
pub const VAL_FRACTION: f64 = 0.20;

/// Contiguous, non-overlapping index ranges covering `[0, n)` exactly once,
/// in the order train, validation, test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Range<usize>,
    pub val: Range<usize>,
    pub test: Range<usize>,
}

impl Split {
    /// Total number of indices covered.
    pub fn len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    /// True when the split covers no indices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split `n` events 70/20/remainder.
///
/// Purely positional and deterministic; any shuffling happens downstream at
/// batch time. Refuses `n = 0` so the pipeline fails before the split-ratio
/// report divides by the dataset length.
pub fn partition(n: usize) -> Result<Split> {
    if n == 0 {
        return Err(SipmError::EmptyDataset {
            dir: PathBuf::new(),
        });
    }

    let train_size = (TRAIN_FRACTION * n as f64) as usize;
    let val_size = (VAL_FRACTION * n as f64) as usize;
    let split = Split {
        train: 0..train_size,
        val: train_size..train_size + val_size,
        test: train_size + val_size..n,
    };

    info!(
        train = split.train.len(),
        train_pct = 100.0 * split.train.len() as f64 / n as f64,
        val = split.val.len(),
        val_pct = 100.0 * split.val.len() as f64 / n as f64,
        test = split.test.len(),
        test_pct = 100.0 * split.test.len() as f64 / n as f64,
        "partitioned dataset"
    );
    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hundred_events_split_70_20_10() {
        let split = partition(100).unwrap();
        assert_eq!(split.train, 0..70);
        assert_eq!(split.val, 70..90);
        assert_eq!(split.test, 90..100);
    }

    #[test]
    fn ranges_cover_every_index_exactly_once() {
        for n in [1, 2, 3, 7, 10, 99, 100, 101, 12345] {
            let split = partition(n).unwrap();
            assert_eq!(split.len(), n, "n = {n}");
            assert_eq!(split.train.start, 0);
            assert_eq!(split.train.end, split.val.start);
            assert_eq!(split.val.end, split.test.start);
            assert_eq!(split.test.end, n);
        }
    }

    #[test]
    fn single_event_lands_in_test() {
        // floor(0.7) = floor(0.2) = 0, so the remainder range takes it.
        let split = partition(1).unwrap();
        assert!(split.train.is_empty());
        assert!(split.val.is_empty());
        assert_eq!(split.test, 0..1);
    }

    #[test]
    fn zero_events_is_an_error() {
        assert!(matches!(partition(0), Err(SipmError::EmptyDataset { .. })));
    }
}
