// ============================================================
// Layer 4 — Dataset Loader
// ============================================================
// Reads the raw job-market CSV into a polars `DataFrame`.
//
//   header row      → column names, in file order
//   every column    → read as text first (no type inference)
//   numeric column  → strictly cast to f64 (names from DatasetConfig)
//   empty field     → null
//
// Why read everything as text first?
//   Inference would type a column from its first rows, so a
//   salary column whose early rows are empty could come back as
//   text. Casting the configured columns explicitly gives the
//   same dtypes for every file, and a bad value fails loudly
//   with the column name instead of silently becoming null.
//
// Fields are not trimmed; a value is used exactly as written.
//
// Reference: polars documentation (CsvReadOptions, strict_cast)

use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::PathBuf;

use crate::data::frame::{has_column, put};
use crate::domain::dataset::DatasetId;
use crate::domain::traits::DatasetSource;

/// Loads a delimited text file with a header row.
pub struct CsvLoader {
    path:    PathBuf,
    dataset: DatasetId,
}

impl CsvLoader {
    /// A loader for `path`; the file is read only by `load`.
    pub fn new(path: impl Into<PathBuf>, dataset: DatasetId) -> Self {
        Self { path: path.into(), dataset }
    }
}

impl DatasetSource for CsvLoader {
    fn load(&self) -> Result<DataFrame> {
        // ── Read every column as text ────────────────────────────────────────
        let mut df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(self.path.clone()))
            .with_context(|| format!("Cannot open dataset '{}'", self.path.display()))?
            .finish()
            .with_context(|| format!("Cannot parse dataset '{}'", self.path.display()))?;

        // ── Cast the numeric columns ─────────────────────────────────────────
        for &name in self.dataset.config().numeric_columns {
            if !has_column(&df, name) {
                continue;
            }
            let typed = df
                .column(name)?
                .as_materialized_series()
                .strict_cast(&DataType::Float64)
                .with_context(|| format!("Column '{name}' holds a value that is not a number"))?;
            put(&mut df, typed)?;
        }

        tracing::info!(
            "Loaded {} rows x {} columns from '{}'",
            df.height(),
            df.width(),
            self.path.display()
        );
        Ok(df)
    }
}
