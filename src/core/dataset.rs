//! Loading the tracked dataset back after checkout.

use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};

/// Shape of a CSV dataset; `rows` excludes the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetShape {
    pub path: String,
    pub rows: usize,
    pub columns: usize,
}

pub fn load(path: &Path) -> Result<DatasetShape> {
    let display = path.display().to_string();
    if !path.is_file() {
        return Err(Error::dataset_not_found(display));
    }

    log_status!("dataset", "Loading data from {}...", display);
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::dataset_invalid(display.clone(), e.to_string()))?;

    let columns = reader
        .headers()
        .map_err(|e| Error::dataset_invalid(display.clone(), e.to_string()))?
        .len();

    let mut rows = 0usize;
    for record in reader.records() {
        record.map_err(|e| Error::dataset_invalid(display.clone(), e.to_string()))?;
        rows += 1;
    }

    log_status!("dataset", "Data shape: ({}, {})", rows, columns);
    Ok(DatasetShape {
        path: display,
        rows,
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn counts_rows_without_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("diabetes.csv");
        fs::write(&path, "Pregnancies,Glucose,Outcome\n6,148,1\n1,85,0\n8,183,1\n").unwrap();

        let shape = load(&path).unwrap();

        assert_eq!(shape.rows, 3);
        assert_eq!(shape.columns, 3);
    }

    #[test]
    fn header_only_file_has_zero_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "a,b\n").unwrap();

        let shape = load(&path).unwrap();

        assert_eq!((shape.rows, shape.columns), (0, 2));
    }

    #[test]
    fn ragged_rows_are_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "a,b\n1,2,3\n").unwrap();

        let err = load(&path).unwrap_err();

        assert_eq!(err.code.as_str(), "dataset.invalid");
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load(Path::new("/nonexistent/diabetes.csv")).unwrap_err();
        assert_eq!(err.code.as_str(), "dataset.not_found");
    }
}
