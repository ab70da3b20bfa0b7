// ============================================================
// Layer 4 — DataFrame Helpers
// ============================================================
// Every pipeline stage reads from and writes to a polars
// `DataFrame`. This module holds the few column accessors the
// stages share:
//
//   numbers / text      → typed cell vectors (None = missing)
//   number_column       → build an f64 column from cells
//   drop_if_present     → drop a column, ignoring absent names
//   to_matrix           → dense ndarray for the estimators
//
// Why convert to ndarray at all?
//   The estimators walk rows and columns by index thousands of
//   times per fit. A contiguous Array2<f64> makes that cheap,
//   and keeps the ML layer free of any dataframe type beyond
//   the column names it checks.
//
// Reference: polars documentation (DataFrame, ChunkedArray)

use ndarray::Array2;
use polars::prelude::*;
use thiserror::Error;

/// Failures of the dataframe stages.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error("column '{column}' has a missing value at row {row}")]
    UndefinedCell { column: String, row: usize },
}

pub type FrameResult<T> = std::result::Result<T, FrameError>;

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

/// Column names in frame order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Cells of an f64 column. Any other dtype is an error.
pub fn numbers(df: &DataFrame, name: &str) -> FrameResult<Vec<Option<f64>>> {
    Ok(df.column(name)?.f64()?.into_iter().collect())
}

/// Cells of a string column. Any other dtype is an error.
pub fn text(df: &DataFrame, name: &str) -> FrameResult<Vec<Option<String>>> {
    Ok(df
        .column(name)?
        .str()?
        .into_iter()
        .map(|cell| cell.map(str::to_string))
        .collect())
}

/// An f64 series named `name`.
pub fn number_column(name: &str, values: Vec<Option<f64>>) -> Series {
    Series::new(PlSmallStr::from(name), values)
}

/// Insert or replace a column. A replaced column keeps its position.
pub fn put(df: &mut DataFrame, column: Series) -> FrameResult<()> {
    df.with_column(column)?;
    Ok(())
}

/// Remove a column if present. Absent names are ignored.
pub fn drop_if_present(df: &mut DataFrame, name: &str) -> FrameResult<()> {
    if has_column(df, name) {
        df.drop_in_place(name)?;
    }
    Ok(())
}

/// Row-major numeric matrix of every column. Non-f64 columns and
/// missing cells are errors.
pub fn to_matrix(df: &DataFrame) -> FrameResult<Array2<f64>> {
    let mut matrix = Array2::<f64>::zeros((df.height(), df.width()));
    for (j, column) in df.get_columns().iter().enumerate() {
        for (i, cell) in column.f64()?.into_iter().enumerate() {
            matrix[[i, j]] = cell.ok_or_else(|| FrameError::UndefinedCell {
                column: column.name().to_string(),
                row:    i,
            })?;
        }
    }
    Ok(matrix)
}

/// Rows at `indices`, in that order.
pub fn take_rows(df: &DataFrame, indices: &[usize]) -> FrameResult<DataFrame> {
    let idx = IdxCa::from_vec(
        PlSmallStr::from("rows"),
        indices.iter().map(|&i| i as IdxSize).collect(),
    );
    Ok(df.take(&idx)?)
}
