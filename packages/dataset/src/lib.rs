#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tabular pollutant dataset loading, cleaning, and splitting.
//!
//! Raw rows come in as [`RawTable`]s (usually via [`csv::load_csv`]),
//! are normalised into a fully numeric [`Dataset`] by [`DataCleaner`],
//! and partitioned into train and test sets by [`split::train_test_split`].

pub mod clean;
pub mod csv;
pub mod split;

pub use clean::DataCleaner;
pub use csv::{load_csv, read_csv};
pub use split::{Split, train_test_split};

/// Column name holding the regression target unless configured otherwise.
pub const DEFAULT_TARGET_COLUMN: &str = "AQI";

/// Errors that can occur while loading or preparing a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// I/O error reading the source file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    /// The configured target column is not in the header.
    #[error("Target column '{0}' not found")]
    MissingTargetColumn(String),

    /// No usable rows remained after cleaning.
    #[error("Dataset is empty after cleaning")]
    Empty,

    /// The requested test fraction is outside `(0, 1)`.
    #[error("Invalid test fraction {0}: expected a value strictly between 0 and 1")]
    InvalidTestFraction(f64),

    /// Too few rows to produce non-empty train and test partitions.
    #[error("Cannot split {rows} rows into non-empty train and test sets")]
    TooSmallToSplit {
        /// Number of rows in the dataset.
        rows: usize,
    },
}

/// A single raw cell as read from a tabular source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Empty or absent cell.
    Missing,
    /// Already-numeric cell.
    Number(f64),
    /// Textual cell that may or may not hold a number.
    Text(String),
}

impl RawValue {
    /// Coerces the cell to a finite number, treating anything else as
    /// missing.
    #[must_use]
    pub fn to_number(&self) -> Option<f64> {
        let value = match self {
            Self::Missing => return None,
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        if s.trim().is_empty() {
            Self::Missing
        } else {
            Self::Text(s.to_owned())
        }
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// One raw row, positionally aligned with [`RawTable::columns`].
pub type RawRecord = Vec<RawValue>;

/// An ordered set of named columns and the raw rows beneath them.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Column names in source order.
    pub columns: Vec<String>,
    /// Rows of raw cells. A row shorter than `columns` is padded with
    /// [`RawValue::Missing`] when read.
    pub rows: Vec<RawRecord>,
}

impl RawTable {
    /// Creates an empty table with the given column names.
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row.
    pub fn push(&mut self, row: RawRecord) {
        self.rows.push(row);
    }

    /// Returns the cell at (`row`, `col`), or [`RawValue::Missing`] if the
    /// row is short.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> &RawValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&RawValue::Missing)
    }
}

/// A fully numeric row: pollutant features plus the AQI target.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    /// Feature values in [`Dataset::feature_names`] order.
    pub features: Vec<f64>,
    /// Target value.
    pub target: f64,
}

/// An ordered sequence of [`CleanRecord`]s sharing one feature layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Names of the feature columns, in order.
    pub feature_names: Vec<String>,
    /// Name of the target column.
    pub target_name: String,
    /// The records.
    pub records: Vec<CleanRecord>,
}

impl Dataset {
    /// Number of records.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of feature columns.
    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Target values in record order.
    #[must_use]
    pub fn targets(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.target).collect()
    }

    /// Returns a new dataset containing the records at `indices`, in that
    /// order.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            target_name: self.target_name.clone(),
            records: indices.iter().map(|&i| self.records[i].clone()).collect(),
        }
    }
}
