//! Numeric coercion, column-mean imputation, and row filtering.

use crate::{CleanRecord, DEFAULT_TARGET_COLUMN, DataError, Dataset, RawTable};

/// Normalises a [`RawTable`] into a complete numeric [`Dataset`].
///
/// Cleaning runs in three passes:
///
/// 1. Every cell is coerced to a finite number; anything else is missing.
/// 2. Missing cells are replaced by their column's mean over the rows that
///    do have a value. Means are computed once, before any row is dropped.
/// 3. Rows that are still missing a value (their column had no numeric
///    cells at all) are dropped.
#[derive(Debug, Clone)]
pub struct DataCleaner {
    target_column: String,
}

impl Default for DataCleaner {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_COLUMN)
    }
}

impl DataCleaner {
    /// Creates a cleaner that splits off `target_column` as the target.
    #[must_use]
    pub fn new(target_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
        }
    }

    /// Cleans `table` into a [`Dataset`].
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingTargetColumn`] if the target column is
    /// not in the header, or [`DataError::Empty`] if no rows survive.
    pub fn clean(&self, table: &RawTable) -> Result<Dataset, DataError> {
        let target_idx = table
            .columns
            .iter()
            .position(|c| *c == self.target_column)
            .ok_or_else(|| DataError::MissingTargetColumn(self.target_column.clone()))?;

        let width = table.columns.len();
        let numeric: Vec<Vec<Option<f64>>> = (0..table.rows.len())
            .map(|row| (0..width).map(|col| table.cell(row, col).to_number()).collect())
            .collect();

        let means = column_means(&numeric, width);

        for (col, name) in table.columns.iter().enumerate() {
            let missing = numeric.iter().filter(|row| row[col].is_none()).count();
            if missing == 0 {
                continue;
            }
            match means[col] {
                Some(mean) => log::warn!(
                    "Column '{name}': filled {missing} missing value(s) with mean {mean:.4}"
                ),
                None => log::warn!("Column '{name}': no numeric values, rows will be dropped"),
            }
        }

        let records: Vec<CleanRecord> = numeric
            .iter()
            .filter_map(|row| {
                let filled: Option<Vec<f64>> = row
                    .iter()
                    .zip(&means)
                    .map(|(cell, mean)| cell.or(*mean))
                    .collect();
                let mut filled = filled?;
                let target = filled.remove(target_idx);
                Some(CleanRecord {
                    features: filled,
                    target,
                })
            })
            .collect();

        let dropped = table.rows.len() - records.len();
        if dropped > 0 {
            log::warn!("Dropped {dropped} row(s) with unrecoverable values");
        }

        if records.is_empty() {
            return Err(DataError::Empty);
        }

        let feature_names = table
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_idx)
            .map(|(_, name)| name.clone())
            .collect();

        log::info!("Cleaned dataset: {} rows", records.len());

        Ok(Dataset {
            feature_names,
            target_name: self.target_column.clone(),
            records,
        })
    }
}

/// Mean of the present values in each column, `None` where a column has
/// no values.
#[allow(clippy::cast_precision_loss)]
fn column_means(numeric: &[Vec<Option<f64>>], width: usize) -> Vec<Option<f64>> {
    (0..width)
        .map(|col| {
            let (sum, count) = numeric
                .iter()
                .filter_map(|row| row[col])
                .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
            (count > 0).then(|| sum / count as f64)
        })
        .collect()
}
