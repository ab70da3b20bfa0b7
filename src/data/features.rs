// ============================================================
// Layer 4 — Feature Engineering Stage
// ============================================================
// Runs after preprocessing, identically for training and
// inference:
//
//   skill indicators ──► one count per skill group
//                    ──► skill_count (every group skill)
//                    ──► dropped
//
//   experience_required ──► experience_sq  = e²
//                       ──► experience_log = ln(1 + e)
//                       ──► dropped
//
// Why count only group skills?
//   The vocabulary is rebuilt from whatever rows are present, so
//   a skill outside the groups exists in training but vanishes
//   at inference for every posting that does not list it. The
//   group lists are fixed configuration; counting only them
//   keeps skill_count equal to the sum of the group columns and
//   identical across the two modes.
//
// A group skill with no indicator column (the usual case for a
// single inference row) counts as zero.

use polars::prelude::*;

use crate::data::frame::{drop_if_present, has_column, number_column, put, FrameResult};
use crate::domain::dataset::{DatasetConfig, DatasetId};

/// Derive the engineered features from a preprocessed frame.
/// `skills` names the indicator columns the preprocessing stage
/// added; they are all dropped here.
pub fn build_features(df: DataFrame, skills: &[String], dataset: DatasetId) -> FrameResult<DataFrame> {
    let cfg    = dataset.config();
    let mut df = df;

    aggregate_skills(&mut df, skills, cfg)?;
    add_skill_count(&mut df, skills, cfg)?;
    for skill in skills {
        drop_if_present(&mut df, skill)?;
    }
    add_experience_features(&mut df, cfg)?;
    drop_if_present(&mut df, cfg.experience_column)?;

    tracing::debug!("Built features: {} rows x {} columns", df.height(), df.width());
    Ok(df)
}

/// Cell-wise sum of the named skill columns. Names that are not
/// indicator columns add zero; missing cells stay missing.
fn sum_skills(df: &DataFrame, skills: &[String], names: &[&str]) -> FrameResult<Vec<Option<f64>>> {
    let mut total = vec![Some(0.0); df.height()];
    for &name in names {
        if !skills.iter().any(|s| s == name) {
            continue;
        }
        for (acc, cell) in total.iter_mut().zip(df.column(name)?.f64()?) {
            *acc = acc.zip(cell).map(|(a, b)| a + b);
        }
    }
    Ok(total)
}

/// One count column per configured skill group.
pub fn aggregate_skills(df: &mut DataFrame, skills: &[String], cfg: &DatasetConfig) -> FrameResult<()> {
    for group in cfg.skill_groups {
        let counts = sum_skills(df, skills, group.skills)?;
        put(df, number_column(group.name, counts))?;
    }
    Ok(())
}

/// Total of every group skill's indicator. A skill listed in two
/// groups is counted twice.
pub fn add_skill_count(df: &mut DataFrame, skills: &[String], cfg: &DatasetConfig) -> FrameResult<()> {
    let grouped: Vec<&str> = cfg.skill_groups.iter().flat_map(|g| g.skills.iter().copied()).collect();
    let counts = sum_skills(df, skills, &grouped)?;
    put(df, number_column(cfg.skill_count, counts))
}

/// `experience_sq` and `experience_log`; a null experience stays null.
pub fn add_experience_features(df: &mut DataFrame, cfg: &DatasetConfig) -> FrameResult<()> {
    if !has_column(df, cfg.experience_column) {
        return Ok(());
    }
    let experience = df.column(cfg.experience_column)?.f64()?;
    let squared: Vec<Option<f64>> = experience.into_iter().map(|e| e.map(|e| e * e)).collect();
    let logged:  Vec<Option<f64>> = experience.into_iter().map(|e| e.map(f64::ln_1p)).collect();

    put(df, number_column(cfg.experience_sq, squared))?;
    put(df, number_column(cfg.experience_log, logged))?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::frame::{column_names, numbers};
    use polars::df;

    /// A one-row preprocessed frame carrying the given skills.
    fn preprocessed_row(skills: &[&str], experience: f64) -> (DataFrame, Vec<String>) {
        let mut df = df!["experience_required" => &[experience]].unwrap();
        for skill in skills {
            put(&mut df, number_column(skill, vec![Some(1.0)])).unwrap();
        }
        (df, skills.iter().map(|s| s.to_string()).collect())
    }

    fn built(skills: &[&str], experience: f64) -> DataFrame {
        let (df, skills) = preprocessed_row(skills, experience);
        build_features(df, &skills, DatasetId::JobMarket).unwrap()
    }

    fn value(df: &DataFrame, name: &str) -> f64 {
        numbers(df, name).unwrap()[0].unwrap()
    }

    #[test]
    fn test_group_counts_and_skill_count() {
        let df = built(&["Python", "SQL", "AWS", "Go", "Rust"], 3.0);

        assert_eq!(value(&df, "backend_skills"), 2.0);
        assert_eq!(value(&df, "db_skills"), 1.0);
        assert_eq!(value(&df, "infra_skills"), 1.0);
        assert_eq!(value(&df, "frontend_skills"), 0.0);
        // "Rust" is in no group and is not counted
        assert_eq!(value(&df, "skill_count"), 4.0);
    }

    #[test]
    fn test_individual_skill_columns_are_dropped() {
        let df = built(&["Python", "Rust"], 1.0);
        let names = column_names(&df);
        assert!(!names.contains(&"Python".to_string()));
        assert!(!names.contains(&"Rust".to_string()));
        assert!(!names.contains(&"experience_required".to_string()));
    }

    #[test]
    fn test_group_accounting_matches_count() {
        // "Excel" and "Rust" belong to no group
        let skills = ["Java", "React", "MongoDB", "TensorFlow", "Docker", "Git", "Agile", "Excel", "Rust"];
        let df  = built(&skills, 0.0);
        let cfg = DatasetId::JobMarket.config();
        let group_total: f64 = cfg.skill_groups.iter().map(|g| value(&df, g.name)).sum();
        assert_eq!(group_total, value(&df, "skill_count"));
        assert_eq!(group_total, 7.0);
    }

    #[test]
    fn test_only_listed_indicators_are_counted() {
        // a column that happens to share a skill's name is not a skill
        let mut df = df!["experience_required" => &[1.0], "Python" => &[1.0]].unwrap();
        put(&mut df, number_column("SQL", vec![Some(1.0)])).unwrap();
        let df = build_features(df, &["SQL".to_string()], DatasetId::JobMarket).unwrap();
        assert_eq!(value(&df, "backend_skills"), 0.0);
        assert_eq!(value(&df, "skill_count"), 1.0);
    }

    #[test]
    fn test_experience_transforms() {
        let df = built(&[], 3.0);
        assert_eq!(value(&df, "experience_sq"), 9.0);
        assert!((value(&df, "experience_log") - 4f64.ln()).abs() < 1e-12);

        let zero = built(&[], 0.0);
        assert_eq!(value(&zero, "experience_log"), 0.0);
    }

    #[test]
    fn test_experience_transforms_are_monotonic() {
        let mut previous = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for years in 0..40 {
            let df  = built(&[], f64::from(years));
            let sq  = value(&df, "experience_sq");
            let log = value(&df, "experience_log");
            assert!(sq >= previous.0 && log >= previous.1);
            previous = (sq, log);
        }
    }

    #[test]
    fn test_missing_experience_stays_missing() {
        let df = df!["experience_required" => &[None::<f64>]].unwrap();
        let df = build_features(df, &[], DatasetId::JobMarket).unwrap();
        assert_eq!(numbers(&df, "experience_sq").unwrap(), vec![None]);
    }
}
