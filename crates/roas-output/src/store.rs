//! Model store.
//!
//! One directory holds the artifacts of every channel:
//!
//! | File | Content |
//! |------|---------|
//! | `roas_model_<channel>.json` | gradient-boosted model |
//! | `roas_model_<channel>.linear.json` | ridge model with its scaler |
//! | `roas_model_<channel>.meta.json` | [`ModelMetadata`] |
//! | `training_metrics.json` | [`TrainingReport`] of the last run |
//!
//! A channel holds at most one model file. A baseline winner has none.

use crate::error::{OutputError, Result};
use crate::metadata::ModelMetadata;
use crate::report::TrainingReport;
use roas_data::Channel;
use roas_model::{ModelKind, TrainedModel};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the training report.
pub const REPORT_FILE: &str = "training_metrics.json";

/// Directory-backed storage of per-channel artifacts.
#[derive(Debug, Clone)]
pub struct ModelStore {
    model_dir: PathBuf,
}

impl ModelStore {
    /// Store rooted at `model_dir`; the directory is created on first write.
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    /// Root directory.
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Path of the gradient-boosted artifact.
    pub fn gbdt_path(&self, channel: Channel) -> PathBuf {
        self.model_dir
            .join(format!("roas_model_{}.json", channel.as_str()))
    }

    /// Path of the ridge artifact.
    pub fn linear_path(&self, channel: Channel) -> PathBuf {
        self.model_dir
            .join(format!("roas_model_{}.linear.json", channel.as_str()))
    }

    /// Path of the metadata record.
    pub fn metadata_path(&self, channel: Channel) -> PathBuf {
        self.model_dir
            .join(format!("roas_model_{}.meta.json", channel.as_str()))
    }

    /// Path of the training report.
    pub fn report_path(&self) -> PathBuf {
        self.model_dir.join(REPORT_FILE)
    }

    /// Artifact path for a model kind; the baseline has none.
    pub fn model_path(&self, channel: Channel, kind: ModelKind) -> Option<PathBuf> {
        match kind {
            ModelKind::GradientBoosted => Some(self.gbdt_path(channel)),
            ModelKind::Linear => Some(self.linear_path(channel)),
            ModelKind::Baseline => None,
        }
    }

    /// Persist a channel's winner and remove the artifact of the other kind.
    ///
    /// Returns the written path, or `None` for a baseline winner.
    pub fn save_model(&self, channel: Channel, model: &TrainedModel) -> Result<Option<PathBuf>> {
        let kind = model.kind();
        for other in ModelKind::all().into_iter().filter(|k| *k != kind) {
            if let Some(stale) = self.model_path(channel, other) {
                remove_if_exists(&stale)?;
            }
        }

        let Some(path) = self.model_path(channel, kind) else {
            debug!(channel = %channel, "baseline selected, no model artifact");
            return Ok(None);
        };

        write_json(&path, model, false)?;
        info!(channel = %channel, kind = %kind, path = %path.display(), "saved model");
        Ok(Some(path))
    }

    /// Load a channel's persisted model, if any.
    ///
    /// The gradient-boosted artifact is preferred when both exist.
    pub fn load_model(&self, channel: Channel) -> Result<Option<TrainedModel>> {
        for kind in [ModelKind::GradientBoosted, ModelKind::Linear] {
            let Some(path) = self.model_path(channel, kind) else {
                continue;
            };
            if let Some(model) = read_json::<TrainedModel>(&path)? {
                if model.kind() != kind {
                    return Err(OutputError::KindMismatch {
                        path: path.display().to_string(),
                        expected: kind.to_string(),
                        found: model.kind().to_string(),
                    });
                }
                debug!(channel = %channel, kind = %kind, "loaded model");
                return Ok(Some(model));
            }
        }
        Ok(None)
    }

    /// Remove every model artifact of a channel.
    pub fn remove_models(&self, channel: Channel) -> Result<()> {
        remove_if_exists(&self.gbdt_path(channel))?;
        remove_if_exists(&self.linear_path(channel))
    }

    /// Write a channel's metadata record.
    pub fn save_metadata(&self, metadata: &ModelMetadata) -> Result<PathBuf> {
        let path = self.metadata_path(metadata.channel);
        write_json(&path, metadata, true)?;
        Ok(path)
    }

    /// Read a channel's metadata record, if any.
    pub fn load_metadata(&self, channel: Channel) -> Result<Option<ModelMetadata>> {
        read_json(&self.metadata_path(channel))
    }

    /// Write the training report.
    pub fn save_report(&self, report: &TrainingReport) -> Result<PathBuf> {
        let path = self.report_path();
        write_json(&path, report, true)?;
        info!(path = %path.display(), "saved training report");
        Ok(path)
    }

    /// Read the last training report, if any.
    pub fn load_report(&self) -> Result<Option<TrainingReport>> {
        read_json(&self.report_path())
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writer.flush()?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match File::open(path) {
        Ok(file) => Ok(Some(serde_json::from_reader(BufReader::new(file))?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed stale artifact");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_names() {
        let store = ModelStore::new("models");
        assert_eq!(
            store.gbdt_path(Channel::GoogleAds),
            Path::new("models/roas_model_google_ads.json")
        );
        assert_eq!(
            store.linear_path(Channel::MetaAds),
            Path::new("models/roas_model_meta_ads.linear.json")
        );
        assert_eq!(
            store.metadata_path(Channel::GoogleAds),
            Path::new("models/roas_model_google_ads.meta.json")
        );
        assert_eq!(store.report_path(), Path::new("models/training_metrics.json"));
        assert!(store.model_path(Channel::GoogleAds, ModelKind::Baseline).is_none());
    }

    #[test]
    fn test_missing_artifacts_are_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("absent"));
        assert!(store.load_model(Channel::GoogleAds).unwrap().is_none());
        assert!(store.load_metadata(Channel::GoogleAds).unwrap().is_none());
        assert!(store.load_report().unwrap().is_none());
        store.remove_models(Channel::GoogleAds).unwrap();
    }
}
