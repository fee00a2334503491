//! CSV Data Loader Module
//! Locates the source files and reads them with Polars, every cell as text.
//! Type coercion is left to the cleaner so it follows the declared schema.

use crate::data::schema::TableSchema;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Depth of the last-resort recursive search for a source file.
const SEARCH_DEPTH: usize = 4;

#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("Could not find source file {0}")]
    NotFound(String),
    #[error("Source file is empty: {}", .0.display())]
    Empty(PathBuf),
    #[error("Source file {} is missing required column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("Failed to read CSV {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A source table as read from disk, all columns as strings.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub schema: &'static TableSchema,
    pub path: PathBuf,
    pub df: DataFrame,
}

impl RawTable {
    /// Get list of column names from the loaded DataFrame.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn get_row_count(&self) -> usize {
        self.df.height()
    }
}

/// Find a source file by name.
///
/// Search order:
///   1. `<data_dir>/<name>`, `<data_dir>/data/<name>` when a data directory is set
///   2. `<search_root>/<name>`, `<search_root>/data/<name>`
///   3. first hit of a recursive search under `search_root`
pub fn locate_source(
    name: &str,
    data_dir: Option<&Path>,
    search_root: &Path,
) -> Result<PathBuf, DataSourceError> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = data_dir {
        candidates.push(dir.join(name));
        candidates.push(dir.join("data").join(name));
    }
    candidates.push(search_root.join(name));
    candidates.push(search_root.join("data").join(name));

    if let Some(found) = candidates.into_iter().find(|p| p.is_file()) {
        return Ok(found);
    }

    WalkDir::new(search_root)
        .max_depth(SEARCH_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name() == name)
        .map(|entry| entry.into_path())
        .ok_or_else(|| DataSourceError::NotFound(name.to_string()))
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load one source table, checking it is present, non-empty and carries
    /// every required column of its schema.
    pub fn load_table(
        schema: &'static TableSchema,
        path: &Path,
    ) -> Result<RawTable, DataSourceError> {
        let meta = fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                DataSourceError::NotFound(path.display().to_string())
            }
            _ => DataSourceError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        if meta.len() == 0 {
            return Err(DataSourceError::Empty(path.to_path_buf()));
        }

        // Schema length 0 reads every column as String
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_ignore_errors(true)
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(|source| DataSourceError::Csv {
                path: path.to_path_buf(),
                source,
            })?;

        if df.height() == 0 {
            return Err(DataSourceError::Empty(path.to_path_buf()));
        }

        let present: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        if let Some(missing) = schema
            .required_columns()
            .find(|c| !present.iter().any(|p| p == c.name))
        {
            return Err(DataSourceError::MissingColumn {
                path: path.to_path_buf(),
                column: missing.name.to_string(),
            });
        }

        debug!(table = schema.name, columns = ?present, "source header");
        info!(
            "Loaded {}: {} rows x {} cols from {}",
            schema.name,
            df.height(),
            df.width(),
            path.display()
        );

        Ok(RawTable {
            schema,
            path: path.to_path_buf(),
            df,
        })
    }
}
