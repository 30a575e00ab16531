//! Normalized dataset loading and merging.
//!
//! The wire format is one JSON document mapping `YYYY-MM-DD` date strings to
//! per-asset records: `{"2020-10-01": {"BTC": {"price": .., "cap": ..,
//! "volume": ..}, ..}, ..}`. Per-asset downloads are merged date-wise, later
//! files updating the asset maps of earlier ones.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use indexlab_core::data::RawDataset;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse dataset {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("no input files given")]
    NoInputs,
}

/// Load one normalized dataset file.
pub fn load_dataset(path: &Path) -> Result<RawDataset, LoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset: RawDataset =
        serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    info!(
        "loaded {} dates from {}",
        dataset.len(),
        path.display()
    );
    Ok(dataset)
}

/// Merge several dataset files into one.
///
/// Files are applied in order; for a date present in several files the asset
/// maps are unioned, later files winning on asset collisions.
pub fn merge_datasets(paths: &[PathBuf]) -> Result<RawDataset, LoadError> {
    if paths.is_empty() {
        return Err(LoadError::NoInputs);
    }

    let mut merged = RawDataset::new();
    for path in paths {
        let dataset = load_dataset(path)?;
        for (date, assets) in dataset {
            merged.entry(date).or_default().extend(assets);
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_the_wire_format() {
        let file = write_temp(
            r#"{"2020-10-01": {"BTC": {"price": 10000.0, "cap": 2e11, "volume": 3e10}}}"#,
        );
        let dataset = load_dataset(file.path()).unwrap();
        assert_eq!(dataset.len(), 1);
        let day = dataset.values().next().unwrap();
        assert_eq!(day["BTC"].price, 10000.0);
    }

    #[test]
    fn sparse_records_parse_with_zero_defaults() {
        let file = write_temp(r#"{"2020-10-01": {"BTC": {"price": 10000.0}}}"#);
        let dataset = load_dataset(file.path()).unwrap();
        let record = dataset.values().next().unwrap()["BTC"];
        assert_eq!(record.cap, 0.0);
        assert_eq!(record.volume, 0.0);
    }

    #[test]
    fn merge_unions_dates_and_assets() {
        let first = write_temp(
            r#"{"2020-10-01": {"BTC": {"price": 1.0, "cap": 1.0, "volume": 1.0}}}"#,
        );
        let second = write_temp(
            r#"{"2020-10-01": {"ETH": {"price": 2.0, "cap": 2.0, "volume": 2.0}},
                "2020-10-02": {"ETH": {"price": 3.0, "cap": 3.0, "volume": 3.0}}}"#,
        );

        let merged = merge_datasets(&[
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ])
        .unwrap();

        assert_eq!(merged.len(), 2);
        let day_one = merged.values().next().unwrap();
        assert!(day_one.contains_key("BTC"));
        assert!(day_one.contains_key("ETH"));
    }

    #[test]
    fn later_files_win_on_collisions() {
        let first = write_temp(
            r#"{"2020-10-01": {"BTC": {"price": 1.0, "cap": 1.0, "volume": 1.0}}}"#,
        );
        let second = write_temp(
            r#"{"2020-10-01": {"BTC": {"price": 9.0, "cap": 9.0, "volume": 9.0}}}"#,
        );

        let merged = merge_datasets(&[
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ])
        .unwrap();
        assert_eq!(merged.values().next().unwrap()["BTC"].price, 9.0);
    }

    #[test]
    fn empty_input_list_is_an_error() {
        assert!(matches!(merge_datasets(&[]), Err(LoadError::NoInputs)));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let result = load_dataset(Path::new("/nonexistent/input.json"));
        match result {
            Err(LoadError::Io { path, .. }) => {
                assert!(path.to_string_lossy().contains("nonexistent"))
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
