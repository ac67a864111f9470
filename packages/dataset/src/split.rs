//! Seeded, stratification-free train/test partitioning.

use rand::SeedableRng as _;
use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;

use crate::{DataError, Dataset};

/// A dataset partitioned into disjoint train and test sets.
#[derive(Debug, Clone)]
pub struct Split {
    /// Training partition.
    pub train: Dataset,
    /// Held-out test partition.
    pub test: Dataset,
}

/// Returns `(train, test)` row indices for a dataset of `rows` rows.
///
/// The indices `0..rows` are shuffled with `seed`; the first
/// `ceil(rows * test_fraction)` become the test set and the rest the train
/// set. The two partitions are disjoint and together cover every index.
///
/// # Errors
///
/// Returns [`DataError::InvalidTestFraction`] unless `0 < test_fraction < 1`,
/// or [`DataError::TooSmallToSplit`] if either partition would be empty.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn split_indices(
    rows: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), DataError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(DataError::InvalidTestFraction(test_fraction));
    }

    let n_test = (rows as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= rows {
        return Err(DataError::TooSmallToSplit { rows });
    }

    let mut indices: Vec<usize> = (0..rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}

/// Partitions `dataset` into train and test sets.
///
/// # Errors
///
/// See [`split_indices`].
pub fn train_test_split(
    dataset: &Dataset,
    test_fraction: f64,
    seed: u64,
) -> Result<Split, DataError> {
    let (train_idx, test_idx) = split_indices(dataset.len(), test_fraction, seed)?;
    log::info!(
        "Split {} rows into {} train / {} test (seed {seed})",
        dataset.len(),
        train_idx.len(),
        test_idx.len()
    );
    Ok(Split {
        train: dataset.select(&train_idx),
        test: dataset.select(&test_idx),
    })
}
