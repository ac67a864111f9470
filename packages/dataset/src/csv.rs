//! CSV reader producing [`RawTable`]s.
//!
//! Every cell is kept as text; numeric coercion happens later in
//! [`crate::DataCleaner`] so unparseable values can be imputed or dropped
//! there.

use std::io::Read;
use std::path::Path;

use crate::{DataError, RawRecord, RawTable, RawValue};

/// Loads a headed CSV file into a [`RawTable`].
///
/// # Errors
///
/// Returns [`DataError::Io`] if the file cannot be opened or
/// [`DataError::Csv`] if it is not valid CSV.
pub fn load_csv(path: &Path) -> Result<RawTable, DataError> {
    let file = std::fs::File::open(path)?;
    let table = read_csv(file)?;
    log::info!(
        "Loaded {} rows x {} columns from {}",
        table.rows.len(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

/// Reads headed CSV data from any reader into a [`RawTable`].
///
/// # Errors
///
/// Returns [`DataError::Csv`] if the data is not valid CSV.
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable, DataError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    let mut table = RawTable::new(columns);

    for result in reader.records() {
        let record = result?;
        let row: RawRecord = (0..table.columns.len())
            .map(|i| record.get(i).map_or(RawValue::Missing, RawValue::from))
            .collect();
        table.push(row);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_headers_and_cells() {
        let data = "PM2.5, PM10 ,AQI\n10,20,55\n11,,60\n12,22\n";
        let table = read_csv(data.as_bytes()).unwrap();
        assert_eq!(table.columns, ["PM2.5", "PM10", "AQI"]);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.cell(1, 1), &RawValue::Missing);
        assert_eq!(table.cell(2, 2), &RawValue::Missing);
        assert_eq!(table.cell(0, 2).to_number(), Some(55.0));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_csv(Path::new("/nonexistent/aqi/data.csv")).unwrap_err();
        assert!(matches!(err, DataError::Io(_)));
    }
}
