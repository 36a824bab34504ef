//! Numeric CSV tables: one header row of column names, one sample per row.

use std::fs::File;
use std::path::Path;

use nalgebra::DMatrix;

use crate::error::{AppError, AppResult};

/// A numeric table read from CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub values: DMatrix<f64>,
}

/// Read a CSV with a header row into a matrix.
///
/// Every cell must parse as a float; blank lines are skipped.
pub fn read_table(path: &Path) -> AppResult<Table> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.is_empty() {
        return Err(AppError::input(format!("CSV '{}' has no columns.", path.display())));
    }

    let mut cells = Vec::new();
    let mut rows = 0usize;
    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header, lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::input(format!("CSV parse error on line {line}: {e}")))?;
        if record.len() != headers.len() {
            return Err(AppError::data(format!(
                "Line {line} has {} fields, expected {}.",
                record.len(),
                headers.len()
            )));
        }
        for (col, field) in record.iter().enumerate() {
            let value: f64 = field.parse().map_err(|_| {
                AppError::data(format!(
                    "Line {line}, column '{}': '{field}' is not a number.",
                    headers[col]
                ))
            })?;
            cells.push(value);
        }
        rows += 1;
    }
    if rows == 0 {
        return Err(AppError::data(format!("CSV '{}' has no data rows.", path.display())));
    }

    Ok(Table {
        values: DMatrix::from_row_slice(rows, headers.len(), &cells),
        headers,
    })
}

/// Write a matrix as CSV with the given header row.
pub fn write_table(path: &Path, headers: &[String], values: &DMatrix<f64>) -> AppResult<()> {
    if headers.len() != values.ncols() {
        return Err(AppError::data(format!(
            "{} headers for {} columns.",
            headers.len(),
            values.ncols()
        )));
    }
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::input(format!("Failed to create CSV '{}': {e}", path.display())))?;
    writer
        .write_record(headers)
        .map_err(|e| AppError::input(format!("Failed to write CSV header: {e}")))?;
    for row in values.row_iter() {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(|e| AppError::input(format!("Failed to write CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to flush CSV '{}': {e}", path.display())))?;
    Ok(())
}

/// Column headers `prefix0, prefix1, ...`.
pub fn default_headers(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{prefix}{i}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_a_numeric_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mass, age").unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "1.0, 4.6").unwrap();
        writeln!(file, "1.2,3.0").unwrap();

        let table = read_table(file.path()).unwrap();
        assert_eq!(table.headers, vec!["mass", "age"]);
        assert_eq!(table.values, DMatrix::from_row_slice(2, 2, &[1.0, 4.6, 1.2, 3.0]));
    }

    #[test]
    fn bad_cell_is_a_data_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mass,age").unwrap();
        writeln!(file, "1.0,old").unwrap();

        let err = read_table(file.path()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_DATA);
        assert!(err.message().contains("'age'"));
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let m = DMatrix::from_row_slice(2, 3, &[1.0, 2.5, -3.0, 4.0, 5.0, 6.25]);
        let headers = default_headers("y", 3);
        write_table(&path, &headers, &m).unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.headers, headers);
        assert_eq!(table.values, m);
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = read_table(Path::new("/nonexistent/inputs.csv")).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }
}
