// ============================================================
// Layer 6 — Model Registry
// ============================================================
// Saves and restores trained artefacts as JSON blobs, one file
// per name, inside a single directory.
//
// What gets saved per training run:
//   1. <model_name>.json     — SalaryModel (feature names + estimator)
//   2. mte_<dataset>.json    — mean-target encoding table
//   3. train_config.json     — the TrainConfig that produced them
//
// Names are given without extension; ".json" is appended when
// missing, so "model" and "model.json" refer to the same blob.
//
// File layout:
//   models/
//     model.json
//     mte_job_market.json
//     train_config.json
//     evaluations.csv        ← written by the evaluation logger
//
// Why JSON blobs?
//   Every artefact is a serde type already, and a JSON file can
//   be inspected by hand when a prediction looks wrong. The
//   encoding table in particular reads as a plain nested map.
//
// Reference: Rust Book §9 (Error Handling)
//            serde_json documentation (to_writer / from_reader)

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::data::encoding::EncodingTable;
use crate::domain::dataset::DatasetId;
use crate::domain::traits::BlobStore;
use crate::ml::model::SalaryModel;

const EXTENSION:         &str = "json";
const TRAIN_CONFIG_NAME: &str = "train_config";

/// File-backed named-blob store.
pub struct ModelRegistry {
    dir: PathBuf,
}

impl ModelRegistry {
    /// Open a registry rooted at `dir`, creating the directory
    /// (and its parents) if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create model directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Directory every blob lives in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the blob stored under `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let suffix = format!(".{EXTENSION}");
        if name.ends_with(&suffix) {
            self.dir.join(name)
        } else {
            self.dir.join(format!("{name}{suffix}"))
        }
    }

    /// Whether a blob is stored under `name`.
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Whether a training config was saved alongside the model.
    pub fn has_config(&self) -> bool {
        self.exists(TRAIN_CONFIG_NAME)
    }

    // ── Typed helpers ─────────────────────────────────────────────────────────

    /// Persist a fitted model under `name`.
    pub fn save_model(&self, model: &SalaryModel, name: &str) -> Result<()> {
        self.save(model, name)?;
        tracing::info!(
            "Saved {} model ({} features) as '{}'",
            model.estimator.kind(),
            model.feature_names.len(),
            name
        );
        Ok(())
    }

    /// Restore the model saved under `name`.
    pub fn load_model(&self, name: &str) -> Result<SalaryModel> {
        self.load(name)
            .with_context(|| format!("Cannot load model '{name}'. Have you run 'train --save' first?"))
    }

    /// Persist the encoding table as `mte_<dataset>`.
    pub fn save_encodings(&self, encodings: &EncodingTable, dataset: DatasetId) -> Result<()> {
        let name = dataset.config().registry_mte_name();
        self.save(encodings, &name)?;
        tracing::info!("Saved mean-target encodings as '{}'", name);
        Ok(())
    }

    /// Restore the encoding table saved for `dataset`.
    pub fn load_encodings(&self, dataset: DatasetId) -> Result<EncodingTable> {
        let name = dataset.config().registry_mte_name();
        self.load(&name)
            .with_context(|| format!("Cannot load encoding table '{name}'"))
    }

    /// Write the training config, pretty-printed.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.path_for(TRAIN_CONFIG_NAME);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Read back the training config.
    pub fn load_config(&self) -> Result<TrainConfig> {
        self.load(TRAIN_CONFIG_NAME)
    }
}

impl BlobStore for ModelRegistry {
    fn save<T: Serialize>(&self, blob: &T, name: &str) -> Result<()> {
        let path = self.path_for(name);
        let file = File::create(&path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, blob)
            .with_context(|| format!("Cannot serialise blob '{name}'"))?;
        writer.flush()?;

        tracing::debug!("Saved blob '{}' to '{}'", name, path.display());
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.path_for(name);
        let file = File::open(&path)
            .with_context(|| format!("Cannot open '{}'", path.display()))?;

        let blob = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Malformed blob '{}'", path.display()))?;
        tracing::debug!("Loaded blob '{}' from '{}'", name, path.display());
        Ok(blob)
    }
}
