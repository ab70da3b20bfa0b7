// ============================================================
// Layer 3 — Dataset Configuration
// ============================================================
// Every column decision the pipeline makes for a dataset lives
// in one static `DatasetConfig` record, selected by `DatasetId`.
// Supporting a new dataset means adding a variant and a record.
//
// Why a static record instead of a config file?
//   The feature schema is a contract with every saved model. A
//   typo in a column name should fail at compile time or in a
//   unit test, not halfway through a training run.

use serde::{Deserialize, Serialize};

/// Datasets the pipeline knows how to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetId {
    JobMarket,
}

impl DatasetId {
    /// The static configuration of this dataset.
    pub fn config(self) -> &'static DatasetConfig {
        match self {
            DatasetId::JobMarket => &JOB_MARKET,
        }
    }

    pub fn name(self) -> &'static str {
        self.config().name
    }
}

impl std::str::FromStr for DatasetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job_market" | "job-market" => Ok(DatasetId::JobMarket),
            other => Err(format!("unknown dataset '{other}' (expected: job_market)")),
        }
    }
}

impl std::fmt::Display for DatasetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the regression target comes from.
#[derive(Debug)]
pub struct TargetSpec {
    pub name: &'static str,
    pub min:  &'static str,
    pub max:  &'static str,
}

#[derive(Debug)]
pub struct SkillGroup {
    pub name:   &'static str,
    pub skills: &'static [&'static str],
}

/// Column names, groupings and thresholds for one dataset.
#[derive(Debug)]
pub struct DatasetConfig {
    pub name: &'static str,

    /// Request-facing name → internal name, applied at inference.
    pub request_renames: &'static [(&'static str, &'static str)],

    /// Columns parsed as numbers when reading the raw file.
    pub numeric_columns: &'static [&'static str],

    pub unused_columns: &'static [&'static str],

    /// Filtered in this order, each against the already-narrowed table.
    pub outlier_columns:   &'static [&'static str],
    pub outlier_threshold: f64,

    pub categorical_fill: &'static [&'static str],
    pub numeric_fill:     &'static [&'static str],
    pub fill_sentinel:    &'static str,

    pub target: TargetSpec,

    pub one_hot_columns: &'static [&'static str],
    pub mte_columns:     &'static [&'static str],

    pub skills_column:    &'static str,
    pub skills_separator: char,
    pub skill_groups:     &'static [SkillGroup],
    pub skill_count:      &'static str,

    pub experience_column: &'static str,
    pub experience_sq:     &'static str,
    pub experience_log:    &'static str,

    /// Ordered feature names the estimator is fitted on.
    pub feature_schema: &'static [&'static str],
}

impl DatasetConfig {
    pub fn mte_column_name(column: &str) -> String {
        format!("{column}_mte")
    }

    /// Registry name of this dataset's encoding table.
    pub fn registry_mte_name(&self) -> String {
        format!("mte_{}", self.name)
    }
}

pub static JOB_MARKET: DatasetConfig = DatasetConfig {
    name: "job_market",

    request_renames: &[
        ("experience", "experience_required"),
        ("work_type", "job_type"),
    ],

    numeric_columns: &["experience_required", "salary_min", "salary_max"],

    unused_columns: &["publication_date"],

    outlier_columns:   &["salary_max", "salary_min"],
    outlier_threshold: 1.5,

    categorical_fill: &["job_type", "category"],
    numeric_fill:     &["experience_required"],
    fill_sentinel:    "Unknown",

    target: TargetSpec {
        name: "salary_mean",
        min:  "salary_min",
        max:  "salary_max",
    },

    one_hot_columns: &["job_type", "category"],
    mte_columns:     &["job_title", "company", "location"],

    skills_column:    "skills",
    skills_separator: ',',
    skill_groups: &[
        SkillGroup {
            name:   "backend_skills",
            skills: &["Python", "Java", "Go", "Ruby", "Node.js"],
        },
        SkillGroup {
            name:   "frontend_skills",
            skills: &["JavaScript", "TypeScript", "React"],
        },
        SkillGroup {
            name:   "db_skills",
            skills: &["SQL", "MongoDB"],
        },
        SkillGroup {
            name:   "ml_skills",
            skills: &["Machine Learning", "TensorFlow"],
        },
        SkillGroup {
            name:   "infra_skills",
            skills: &["AWS", "Docker", "Kubernetes", "CI/CD"],
        },
        SkillGroup {
            name:   "tools_skills",
            skills: &["Git", "Agile", "REST APIs"],
        },
    ],
    skill_count: "skill_count",

    experience_column: "experience_required",
    experience_sq:     "experience_sq",
    experience_log:    "experience_log",

    feature_schema: &[
        "job_type_Full_time",
        "job_type_Full-time",
        "job_type_Internship",
        "job_type_Part-time",
        "job_type_Remote",
        "job_type_Unknown",
        "job_type_Working_student",
        "job_type_berufseinstieg",
        "job_type_berufserfahren",
        "job_type_manager",
        "job_type_professional_/_experienced",
        "category_HR",
        "category_Helpdesk",
        "category_Marketing_and_Communication",
        "category_Media_Planning",
        "category_Process_Engineering",
        "category_Recruitment_and_Selection",
        "category_Remote",
        "category_SAP/ERP_Consulting",
        "category_Social_Media_Manager",
        "category_Software_Development",
        "category_Technology",
        "category_Unknown",
        "job_title_mte",
        "company_mte",
        "location_mte",
        "backend_skills",
        "frontend_skills",
        "db_skills",
        "ml_skills",
        "infra_skills",
        "tools_skills",
        "skill_count",
        "experience_sq",
        "experience_log",
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_schema_has_no_duplicates() {
        let cfg = DatasetId::JobMarket.config();
        let unique: HashSet<_> = cfg.feature_schema.iter().collect();
        assert_eq!(unique.len(), cfg.feature_schema.len());
        assert_eq!(cfg.feature_schema.len(), 35);
    }

    #[test]
    fn test_schema_covers_every_skill_group() {
        let cfg = DatasetId::JobMarket.config();
        for group in cfg.skill_groups {
            assert!(cfg.feature_schema.contains(&group.name), "{}", group.name);
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(DatasetId::JobMarket.to_string(), "job_market");
        assert_eq!(JOB_MARKET.registry_mte_name(), "mte_job_market");
        assert_eq!(DatasetConfig::mte_column_name("company"), "company_mte");
        assert_eq!("job_market".parse::<DatasetId>(), Ok(DatasetId::JobMarket));
        assert!("titanic".parse::<DatasetId>().is_err());
    }
}
