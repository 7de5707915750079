//! Persistence of trained models
//!
//! A trained model is written as a single JSON artifact so a restarted
//! service can keep serving predictions without retraining.

use crate::error::{ForecastError, Result};
use crate::models::{ModelKind, TrainedForecastModel, TrainedModel, TrainingReport};
use chrono::{DateTime, NaiveDate, Utc};
use sales_math::RegressionMetrics;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

/// Artifact layout version understood by this build
pub const ARTIFACT_VERSION: u32 = 1;

const ARTIFACT_FILE: &str = "model.json";

/// A trained model together with its training summary
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub trained_at: DateTime<Utc>,
    pub metrics: RegressionMetrics,
    pub train_size: usize,
    pub test_size: usize,
    pub observations: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub model: TrainedModel,
}

impl ModelArtifact {
    /// Wrap a fresh training report
    pub fn from_report(report: TrainingReport) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            trained_at: Utc::now(),
            metrics: report.metrics,
            train_size: report.train_size,
            test_size: report.test_size,
            observations: report.observations,
            first_date: report.first_date,
            last_date: report.last_date,
            model: report.model,
        }
    }

    /// Model family of the stored model
    pub fn kind(&self) -> ModelKind {
        self.model.kind()
    }
}

/// Directory-backed store holding the current model artifact
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory the artifact lives in
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the artifact file
    pub fn artifact_path(&self) -> PathBuf {
        self.dir.join(ARTIFACT_FILE)
    }

    /// Write the artifact, replacing any previous one
    pub fn save(&self, artifact: &ModelArtifact) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.artifact_path();
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_vec(artifact)?)?;
        fs::rename(&staging, &path)?;

        info!(path = %path.display(), model = %artifact.kind(), "model artifact saved");
        Ok(())
    }

    /// Read the artifact if one has been saved
    pub fn load(&self) -> Result<Option<ModelArtifact>> {
        let path = self.artifact_path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let artifact: ModelArtifact = serde_json::from_slice(&bytes)?;
        if artifact.version != ARTIFACT_VERSION {
            return Err(ForecastError::SerializationError(format!(
                "Unsupported artifact version {} (expected {})",
                artifact.version, ARTIFACT_VERSION
            )));
        }

        info!(path = %path.display(), model = %artifact.kind(), "model artifact loaded");
        Ok(Some(artifact))
    }

    /// Remove the artifact; succeeds when there is nothing to remove
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(self.artifact_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
