// ============================================================
// Layer 4 — Preprocessing Stage
// ============================================================
// Turns a raw job-market frame into an all-numeric frame (plus
// the target when training).
//
// Train mode, in order:
//   1. Drop unused columns          (publication_date)
//   2. Remove IQR outliers          (salary_max, then salary_min)
//   3. Fill nulls                   ("Unknown" / column median)
//   4. Build target                 salary_mean = (min + max) / 2
//   5. One-hot encode               job_type, category
//   6. Mean-target encode           job_title, company, location
//   7. Explode skills               one indicator per distinct skill
//
// Inference mode:
//   rename request fields → 3 → 5 → 6 (if a table was given) → 7
//
// Why can training and inference share these functions?
//   Every statistic (quartiles, medians, one-hot levels, skill
//   vocabulary) is taken from the frame being processed. The
//   one exception is the mean-target encoding, which is applied
//   from a supplied table whenever one is given. A single
//   inference row therefore gets exactly the treatment a
//   training row gets, and alignment fills in whatever levels
//   the row did not produce.
//
// Reference: polars documentation (ChunkQuantile, ChunkCompare)

use std::collections::BTreeSet;

use polars::prelude::*;

use crate::data::encoding::EncodingTable;
use crate::data::frame::{
    drop_if_present, has_column, number_column, put, text, FrameResult,
};
use crate::domain::dataset::{DatasetConfig, DatasetId};

/// Whether encodings are fitted (training) or applied (inference).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Inference,
}

/// Output of `preprocess`.
#[derive(Debug)]
pub struct Preprocessed {
    pub frame:  DataFrame,
    /// Names of the skill indicator columns added in step 7.
    pub skills: Vec<String>,
    /// Set only when the encodings were fitted during this call.
    /// Persisting them is the caller's job.
    pub fitted_encodings: Option<EncodingTable>,
}

/// Run the preprocessing steps for `mode` on a raw frame.
///
/// In train mode without `encodings`, the mean-target encodings
/// are fitted on this frame and returned in `fitted_encodings`.
/// With `encodings`, they are applied instead and nothing is fitted.
pub fn preprocess(
    df:        DataFrame,
    dataset:   DatasetId,
    encodings: Option<&EncodingTable>,
    mode:      Mode,
) -> FrameResult<Preprocessed> {
    let cfg    = dataset.config();
    let mut df = df;
    let mut fitted_encodings = None;

    match mode {
        Mode::Train => {
            drop_unused_columns(&mut df, cfg)?;
            df = clean_outliers(df, cfg)?;
            handle_nulls(&mut df, cfg)?;
            add_target(&mut df, cfg)?;
            one_hot_encode(&mut df, cfg)?;
            match encodings {
                Some(encodings) => encodings.apply(&mut df)?,
                None => fitted_encodings = Some(mean_target_encode(&mut df, cfg)?),
            }
        }
        Mode::Inference => {
            rename_request_columns(&mut df, cfg)?;
            handle_nulls(&mut df, cfg)?;
            one_hot_encode(&mut df, cfg)?;
            if let Some(encodings) = encodings {
                encodings.apply(&mut df)?;
            }
        }
    }
    let skills = explode_skills(&mut df, cfg)?;

    tracing::debug!(
        "Preprocessed {:?}: {} rows x {} columns ({} skills)",
        mode,
        df.height(),
        df.width(),
        skills.len()
    );
    Ok(Preprocessed { frame: df, skills, fitted_encodings })
}

// ─── Renames & Drops ──────────────────────────────────────────────────────────

/// Map request-facing field names onto the dataset's column names.
/// Fields the frame lacks are skipped.
pub fn rename_request_columns(df: &mut DataFrame, cfg: &DatasetConfig) -> FrameResult<()> {
    for &(from, to) in cfg.request_renames {
        if has_column(df, from) {
            df.rename(from, PlSmallStr::from(to))?;
        }
    }
    Ok(())
}

/// Drop the configured unused columns that are present.
pub fn drop_unused_columns(df: &mut DataFrame, cfg: &DatasetConfig) -> FrameResult<()> {
    for &column in cfg.unused_columns {
        drop_if_present(df, column)?;
    }
    Ok(())
}

// ─── Outliers ─────────────────────────────────────────────────────────────────

/// Keep rows whose `column` lies in [Q1 − t·IQR, Q3 + t·IQR], bounds
/// included. Quartiles use the nearest-rank rule over non-null
/// values; a null is never inside the band.
pub fn remove_outliers_iqr(df: &DataFrame, column: &str, threshold: f64) -> FrameResult<DataFrame> {
    let values = df.column(column)?.f64()?;

    let q1 = values.quantile(0.25, QuantileMethod::Nearest)?;
    let q3 = values.quantile(0.75, QuantileMethod::Nearest)?;

    let filtered = match q1.zip(q3) {
        Some((q1, q3)) => {
            let iqr  = q3 - q1;
            let keep = &values.gt_eq(q1 - threshold * iqr) & &values.lt_eq(q3 + threshold * iqr);
            df.filter(&keep)?
        }
        // no non-null value at all: nothing is inside the band
        None => df.clear(),
    };

    tracing::debug!(
        "Outlier filter on '{}': {} -> {} rows",
        column,
        df.height(),
        filtered.height()
    );
    Ok(filtered)
}

/// Filters run one after another; each sees the rows the previous
/// filters kept.
pub fn clean_outliers(df: DataFrame, cfg: &DatasetConfig) -> FrameResult<DataFrame> {
    let mut result = df;
    for &column in cfg.outlier_columns {
        if !has_column(&result, column) {
            continue;
        }
        result = remove_outliers_iqr(&result, column, cfg.outlier_threshold)?;
    }
    Ok(result)
}

// ─── Nulls ────────────────────────────────────────────────────────────────────

/// Categorical nulls become the sentinel; numeric nulls become the
/// column median. A column with no values at all is left alone.
pub fn handle_nulls(df: &mut DataFrame, cfg: &DatasetConfig) -> FrameResult<()> {
    for &column in cfg.categorical_fill {
        if !has_column(df, column) {
            continue;
        }
        let filled: Vec<String> = text(df, column)?
            .into_iter()
            .map(|cell| cell.unwrap_or_else(|| cfg.fill_sentinel.to_string()))
            .collect();
        put(df, Series::new(PlSmallStr::from(column), filled))?;
    }

    for &column in cfg.numeric_fill {
        if !has_column(df, column) {
            continue;
        }
        let values = df.column(column)?.f64()?;
        let Some(median) = values.median() else {
            continue;
        };
        let filled = values.fill_null_with_values(median)?;
        put(df, filled.into_series())?;
    }
    Ok(())
}

// ─── Target ───────────────────────────────────────────────────────────────────

/// `salary_mean = (salary_min + salary_max) / 2`; a null on either
/// side gives a null target. The two bounds are dropped.
pub fn add_target(df: &mut DataFrame, cfg: &DatasetConfig) -> FrameResult<()> {
    let target = &cfg.target;
    let min    = df.column(target.min)?.f64()?;
    let max    = df.column(target.max)?.f64()?;
    let mean   = ((min + max) / 2.0).with_name(PlSmallStr::from(target.name));

    put(df, mean.into_series())?;
    drop_if_present(df, target.min)?;
    drop_if_present(df, target.max)?;
    Ok(())
}

// ─── One-Hot ──────────────────────────────────────────────────────────────────

/// Expand each configured column into `<col>_<level>` indicators.
/// Levels are sorted; the first is dropped when there is more than one.
pub fn one_hot_encode(df: &mut DataFrame, cfg: &DatasetConfig) -> FrameResult<()> {
    for &column in cfg.one_hot_columns {
        if !has_column(df, column) {
            continue;
        }
        let values = df.column(column)?.str()?.clone();

        let levels: BTreeSet<&str> = values.into_iter().flatten().collect();
        let skip = usize::from(levels.len() > 1);

        for level in levels.into_iter().skip(skip) {
            let indicator = values
                .equal_missing(level)
                .into_series()
                .cast(&DataType::Float64)?
                .with_name(PlSmallStr::from(format!("{column}_{level}")));
            put(df, indicator)?;
        }
        drop_if_present(df, column)?;
    }
    Ok(())
}

// ─── Mean-Target Encoding ─────────────────────────────────────────────────────

/// Fit encodings on this frame, apply them, and hand them back.
pub fn mean_target_encode(df: &mut DataFrame, cfg: &DatasetConfig) -> FrameResult<EncodingTable> {
    let columns: Vec<&str> = cfg
        .mte_columns
        .iter()
        .copied()
        .filter(|c| has_column(df, c))
        .collect();

    let encodings = EncodingTable::fit(df, &columns, cfg.target.name)?;
    encodings.apply(df)?;
    Ok(encodings)
}

// ─── Skills ───────────────────────────────────────────────────────────────────

/// Split one raw skills field into trimmed, non-empty tokens.
pub fn parse_skills(raw: Option<&str>, separator: char) -> Vec<String> {
    raw.unwrap_or("")
        .trim_matches(|c| c == '"' || c == ' ')
        .split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// One 0/1 indicator column per distinct skill in this frame, named
/// after the skill. Returns the names of the columns it added.
///
/// The vocabulary is whatever the current rows contain, so a
/// single-row frame only gets columns for its own skills.
pub fn explode_skills(df: &mut DataFrame, cfg: &DatasetConfig) -> FrameResult<Vec<String>> {
    if !has_column(df, cfg.skills_column) {
        return Ok(Vec::new());
    }
    let rows: Vec<Vec<String>> = text(df, cfg.skills_column)?
        .iter()
        .map(|cell| parse_skills(cell.as_deref(), cfg.skills_separator))
        .collect();
    drop_if_present(df, cfg.skills_column)?;

    let vocabulary: BTreeSet<&str> = rows.iter().flatten().map(String::as_str).collect();

    let mut added = Vec::with_capacity(vocabulary.len());
    for skill in vocabulary {
        if has_column(df, skill) {
            tracing::warn!("Skill '{}' collides with a column of that name, skipped", skill);
            continue;
        }
        let indicator = rows
            .iter()
            .map(|skills| Some(if skills.iter().any(|s| s == skill) { 1.0 } else { 0.0 }))
            .collect();
        put(df, number_column(skill, indicator))?;
        added.push(skill.to_string());
    }

    tracing::debug!("Exploded {} distinct skills over {} rows", added.len(), rows.len());
    Ok(added)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::frame::{column_names, numbers};
    use crate::domain::dataset::JOB_MARKET;
    use polars::df;

    fn raw_training_frame() -> DataFrame {
        df![
            "job_title"           => &["Dev", "Dev", "Ops", "PM"],
            "company"             => &["Acme", "Beta", "Acme", "Beta"],
            "location"            => &[Some("Berlin"), Some("Berlin"), Some("Munich"), None],
            "job_type"            => &[Some("Remote"), Some("Full-time"), None, Some("Remote")],
            "category"            => &["Technology", "HR", "HR", "HR"],
            "experience_required" => &[Some(1.0), None, Some(5.0), Some(3.0)],
            "skills"              => &[Some("Python, SQL"), Some("\"Java,Docker\""), None, Some(" AWS ,, Git")],
            "salary_min"          => &[40.0, 50.0, 60.0, 70.0],
            "salary_max"          => &[60.0, 70.0, 80.0, 90.0],
            "publication_date"    => &["2024-01-01"; 4],
        ]
        .unwrap()
    }

    #[test]
    fn test_outlier_bounds_are_inclusive() {
        let df = df!["x" => &[2.0, 2.0, 4.0, 4.0, 7.0, 7.1]].unwrap();
        // n = 6: Q1 = sorted[round(1.25)] = 2, Q3 = sorted[round(3.75)] = 7
        // threshold 0 → band [2, 7]
        let kept = remove_outliers_iqr(&df, "x", 0.0).unwrap();
        assert_eq!(
            numbers(&kept, "x").unwrap(),
            vec![Some(2.0), Some(2.0), Some(4.0), Some(4.0), Some(7.0)]
        );
    }

    #[test]
    fn test_outlier_filter_drops_missing_values() {
        let df = df!["x" => &[Some(1.0), None, Some(1.0)]].unwrap();
        let kept = remove_outliers_iqr(&df, "x", 1.5).unwrap();
        assert_eq!(numbers(&kept, "x").unwrap(), vec![Some(1.0), Some(1.0)]);
    }

    #[test]
    fn test_outlier_filter_on_all_null_column_keeps_nothing() {
        let df = df!["x" => &[None::<f64>, None]].unwrap();
        assert_eq!(remove_outliers_iqr(&df, "x", 1.5).unwrap().height(), 0);
    }

    #[test]
    fn test_outlier_filters_are_sequential() {
        let df = df![
            "a" => &[1.0, 1.0, 1.0, 1.0, 100.0],
            "b" => &[1.0, 2.0, 3.0, 4.0, 5.0],
        ]
        .unwrap();
        let df = remove_outliers_iqr(&df, "a", 1.5).unwrap();
        assert_eq!(df.height(), 4);
        // b's quartiles are now taken over [1, 2, 3, 4]
        let df = remove_outliers_iqr(&df, "b", 0.0).unwrap();
        // Q1 = sorted[round(0.75)] = 2, Q3 = sorted[round(2.25)] = 3
        assert_eq!(numbers(&df, "b").unwrap(), vec![Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_handle_nulls() {
        let mut df = raw_training_frame();
        handle_nulls(&mut df, &JOB_MARKET).unwrap();
        assert_eq!(text(&df, "job_type").unwrap()[2].as_deref(), Some("Unknown"));
        // median of 1, 5, 3
        assert_eq!(numbers(&df, "experience_required").unwrap()[1], Some(3.0));
        // not configured → untouched
        assert_eq!(text(&df, "location").unwrap()[3], None);
    }

    #[test]
    fn test_add_target() {
        let mut df = df![
            "salary_min" => &[Some(10.0), None],
            "salary_max" => &[Some(20.0), Some(5.0)],
        ]
        .unwrap();
        add_target(&mut df, &JOB_MARKET).unwrap();
        assert_eq!(numbers(&df, "salary_mean").unwrap(), vec![Some(15.0), None]);
        assert_eq!(column_names(&df), vec!["salary_mean"]);
    }

    #[test]
    fn test_one_hot_drops_reference_level() {
        let mut df = df!["job_type" => &["Remote", "Full-time", "Internship"]].unwrap();
        one_hot_encode(&mut df, &JOB_MARKET).unwrap();
        // "Full-time" sorts first and is the reference level
        assert_eq!(column_names(&df), vec!["job_type_Internship", "job_type_Remote"]);
        assert_eq!(
            numbers(&df, "job_type_Remote").unwrap(),
            vec![Some(1.0), Some(0.0), Some(0.0)]
        );
    }

    #[test]
    fn test_one_hot_single_level_is_kept() {
        let mut df = df!["category" => &["Technology"]].unwrap();
        one_hot_encode(&mut df, &JOB_MARKET).unwrap();
        assert_eq!(numbers(&df, "category_Technology").unwrap(), vec![Some(1.0)]);
    }

    #[test]
    fn test_parse_skills() {
        assert_eq!(parse_skills(Some("\"Python, SQL \""), ','), vec!["Python", "SQL"]);
        assert_eq!(parse_skills(Some(" , ,"), ','), Vec::<String>::new());
        assert!(parse_skills(None, ',').is_empty());
    }

    #[test]
    fn test_explode_skills_vocabulary_is_row_data() {
        let mut df = df!["skills" => &[Some("Python, SQL"), Some("SQL"), None]].unwrap();
        let added = explode_skills(&mut df, &JOB_MARKET).unwrap();

        assert_eq!(added, vec!["Python", "SQL"]);
        assert!(!has_column(&df, "skills"));
        assert_eq!(numbers(&df, "SQL").unwrap(), vec![Some(1.0), Some(1.0), Some(0.0)]);
        assert_eq!(numbers(&df, "Python").unwrap(), vec![Some(1.0), Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_explode_skills_skips_colliding_names() {
        let mut df = df![
            "company" => &["Acme"],
            "skills"  => &["company, Git"],
        ]
        .unwrap();
        let added = explode_skills(&mut df, &JOB_MARKET).unwrap();
        assert_eq!(text(&df, "company").unwrap()[0].as_deref(), Some("Acme"));
        assert_eq!(added, vec!["Git"]);
    }

    #[test]
    fn test_train_mode_end_to_end() {
        let out = preprocess(raw_training_frame(), DatasetId::JobMarket, None, Mode::Train).unwrap();
        let df  = out.frame;

        assert!(!has_column(&df, "publication_date"));
        assert!(!has_column(&df, "job_title"));
        assert!(has_column(&df, "job_title_mte"));
        assert!(has_column(&df, "salary_mean"));
        assert!(out.skills.contains(&"Python".to_string()));

        // job_type levels: Full-time, Remote, Unknown → Full-time dropped
        assert!(!has_column(&df, "job_type_Full-time"));
        assert!(has_column(&df, "job_type_Remote"));
        assert!(has_column(&df, "job_type_Unknown"));

        let enc = out.fitted_encodings.unwrap();
        assert_eq!(enc.lookup("job_title", "Dev"), Some(55.0));
        assert_eq!(enc.levels("location"), 2);
        // the null location encodes to missing
        assert_eq!(numbers(&df, "location_mte").unwrap()[3], None);
    }

    #[test]
    fn test_train_with_supplied_encodings_fits_nothing() {
        let first = preprocess(raw_training_frame(), DatasetId::JobMarket, None, Mode::Train).unwrap();
        let enc = first.fitted_encodings.unwrap();

        let second =
            preprocess(raw_training_frame(), DatasetId::JobMarket, Some(&enc), Mode::Train).unwrap();
        assert!(second.fitted_encodings.is_none());
        assert_eq!(
            numbers(&second.frame, "company_mte").unwrap(),
            numbers(&first.frame, "company_mte").unwrap()
        );
    }

    #[test]
    fn test_inference_mode_renames_and_tolerates_missing_keys() {
        let df = df![
            "work_type"  => &["Remote"],
            "experience" => &[2.0],
            "skills"     => &["Go"],
        ]
        .unwrap();

        let out = preprocess(df, DatasetId::JobMarket, None, Mode::Inference).unwrap();
        assert!(has_column(&out.frame, "experience_required"));
        assert!(has_column(&out.frame, "job_type_Remote"));
        assert_eq!(out.skills, vec!["Go"]);
        assert!(out.fitted_encodings.is_none());

        // no renamable keys at all is fine too
        let bare = df!["skills" => &[None::<&str>]].unwrap();
        let out = preprocess(bare, DatasetId::JobMarket, None, Mode::Inference).unwrap();
        assert_eq!(out.frame.width(), 0);
    }
}
