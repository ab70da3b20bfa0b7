// ============================================================
// Layer 4 — Column Alignment Stage
// ============================================================
// Forces a feature frame into the frozen, ordered feature
// schema the estimator was fitted on:
//
//   extra columns          → dropped
//   absent schema columns  → literal 0.0
//   missing cells          → 0.0
//   order                  → schema order
//
// Why is this needed at inference?
//   A one-row request frame carries at most one indicator per
//   one-hot column and only the skills it lists. Alignment
//   restores every other column as zeros so the estimator sees
//   the same 35 inputs, in the same order, as during training.

use polars::prelude::*;

use crate::data::frame::{column_names, has_column, FrameResult};

/// The frame restricted to `schema`, in schema order, with every
/// cell defined. Running it twice changes nothing.
pub fn align_to_model_schema<S: AsRef<str>>(df: &DataFrame, schema: &[S]) -> FrameResult<DataFrame> {
    let height = df.height();
    let mut columns: Vec<Column> = Vec::with_capacity(schema.len());

    for name in schema {
        let name = name.as_ref();
        let values = if has_column(df, name) {
            df.column(name)?.f64()?.fill_null_with_values(0.0)?
        } else {
            Float64Chunked::full(PlSmallStr::from(name), 0.0, height)
        };
        columns.push(values.with_name(PlSmallStr::from(name)).into_series().into());
    }

    let extras: Vec<String> = column_names(df)
        .into_iter()
        .filter(|c| !schema.iter().any(|s| s.as_ref() == c))
        .collect();
    if !extras.is_empty() {
        tracing::debug!("Alignment dropped {} column(s): {:?}", extras.len(), extras);
    }

    Ok(DataFrame::new(columns)?)
}
