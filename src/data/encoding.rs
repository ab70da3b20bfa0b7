// ============================================================
// Layer 4 — Mean Target Encoding Table
// ============================================================
// column name → (raw categorical value → mean target)
//
// Fitted once on the training frame with a polars group-by,
// persisted through the registry as `mte_<dataset>`, and
// applied verbatim at inference as a plain lookup.
//
// Why not re-run the group-by at inference?
//   A single request row has no target, and even if it had one
//   its "mean" would just be itself. The encoding has to come
//   from the training data, so it is frozen into this table.
//
// A value the table has never seen encodes to null; the
// alignment stage later turns it into 0.0.

use indexmap::IndexMap;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::frame::{drop_if_present, has_column, number_column, put, FrameResult};
use crate::domain::dataset::DatasetConfig;

/// Frozen mean-target encodings, keyed by column then by raw value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodingTable(IndexMap<String, IndexMap<String, f64>>);

impl EncodingTable {
    /// Mean of `target` grouped by each of `columns`.
    ///
    /// Null keys and null targets do not contribute, so a level
    /// whose targets are all null gets no entry. Levels are stored
    /// in sorted order so the persisted JSON is stable.
    pub fn fit(df: &DataFrame, columns: &[&str], target: &str) -> FrameResult<Self> {
        let mut encodings = IndexMap::new();

        for &column in columns {
            let grouped = df
                .clone()
                .lazy()
                .group_by([col(column)])
                .agg([col(target).mean()])
                .collect()?;

            let keys  = grouped.column(column)?.str()?;
            let means = grouped.column(target)?.f64()?;

            let mut levels: Vec<(String, f64)> = keys
                .into_iter()
                .zip(means)
                .filter_map(|(key, mean)| Some((key?.to_string(), mean?)))
                .collect();
            levels.sort_by(|a, b| a.0.cmp(&b.0));

            tracing::debug!("Fitted {} levels for '{}'", levels.len(), column);
            encodings.insert(column.to_string(), levels.into_iter().collect());
        }

        Ok(Self(encodings))
    }

    /// Encoded value of `value` in `column`, if it was seen in training.
    pub fn lookup(&self, column: &str, value: &str) -> Option<f64> {
        self.0.get(column)?.get(value).copied()
    }

    /// Names of the encoded columns, in fit order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of distinct levels recorded for `column`.
    pub fn levels(&self, column: &str) -> usize {
        self.0.get(column).map_or(0, IndexMap::len)
    }

    /// Replace every encoded column present in `df` with `<col>_mte`.
    /// Encoded columns the frame lacks are skipped.
    pub fn apply(&self, df: &mut DataFrame) -> FrameResult<()> {
        for column in self.0.keys() {
            if !has_column(df, column) {
                tracing::debug!("Column '{}' absent, skipping its encoding", column);
                continue;
            }

            let encoded: Vec<Option<f64>> = df
                .column(column)?
                .str()?
                .into_iter()
                .map(|cell| cell.and_then(|v| self.lookup(column, v)))
                .collect();

            let unseen = encoded.iter().filter(|v| v.is_none()).count();
            if unseen > 0 {
                tracing::debug!("{} value(s) of '{}' have no encoding", unseen, column);
            }

            put(df, number_column(&DatasetConfig::mte_column_name(column), encoded))?;
            drop_if_present(df, column)?;
        }
        Ok(())
    }
}
