//! Training pipeline.
//!
//! For every channel the cleaned dataset is split by date, three candidates
//! are fitted on the training window and scored on the test window, and the
//! one with the lowest test RMSE is persisted together with its metadata.

use crate::config::RoasConfig;
use crate::error::{Result, RoasError};
use roas_data::{Channel, RecordSource, records_to_frame};
use roas_features::{Dataset, FeatureBuilder, TemporalSplit, channel_features};
use roas_model::{BaselineTable, GbdtModel, LinearModel, Metrics, ModelKind, TrainedModel};
use roas_output::{
    CandidateMetrics, ChannelReport, ModelMetadata, ModelStore, SkipReason, SplitCounts,
    TrainingReport,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Pick the candidate with the lowest test RMSE.
///
/// Ties keep the earlier kind in [`ModelKind::all`] order.
pub fn select_best(metrics: &CandidateMetrics) -> ModelKind {
    let mut best = ModelKind::GradientBoosted;
    for kind in ModelKind::all() {
        if metrics.get(kind).rmse < metrics.get(best).rmse {
            best = kind;
        }
    }
    best
}

/// Trains and persists one model per channel.
#[derive(Debug)]
pub struct Trainer {
    config: RoasConfig,
    source: Arc<dyn RecordSource>,
    builder: FeatureBuilder,
    store: ModelStore,
}

impl Trainer {
    /// Trainer reading from `source` and writing under `config.model_dir`.
    pub fn new(config: RoasConfig, source: Arc<dyn RecordSource>) -> Self {
        let builder = FeatureBuilder::new(config.features);
        let store = ModelStore::new(config.model_dir.clone());
        Self {
            config,
            source,
            builder,
            store,
        }
    }

    /// Active configuration.
    pub const fn config(&self) -> &RoasConfig {
        &self.config
    }

    /// Artifact store.
    pub const fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Fetch the lookback window and run the feature builder over it.
    pub fn build_dataset(&self, lookback_days: u32) -> Result<Dataset> {
        let records = self.source.fetch(lookback_days)?;
        info!(
            source = self.source.name(),
            lookback_days,
            records = records.len(),
            "fetched records"
        );
        let frame = records_to_frame(&records)?;
        Ok(self.builder.build(&frame)?)
    }

    /// Train every channel and write the run report.
    ///
    /// Fails only when nothing survives cleaning; individual channels report
    /// skips and failures instead.
    pub fn train_all(&self, lookback_days: u32) -> Result<TrainingReport> {
        self.train_all_with(lookback_days, |_, _| {})
    }

    /// [`Trainer::train_all`], calling `on_channel` after each channel.
    pub fn train_all_with<F>(
        &self,
        lookback_days: u32,
        mut on_channel: F,
    ) -> Result<TrainingReport>
    where
        F: FnMut(Channel, &ChannelReport),
    {
        let dataset = self.build_dataset(lookback_days)?;
        if dataset.is_empty() {
            return Err(RoasError::EmptyDataset { lookback_days });
        }
        info!(rows = dataset.len(), "cleaned dataset");

        let mut report = TrainingReport::new(lookback_days, dataset.len());
        for channel in Channel::all() {
            let outcome = self.train_channel(&dataset, channel);
            on_channel(channel, &outcome);
            report.push(outcome);
        }

        self.store.save_report(&report)?;
        Ok(report)
    }

    /// Train, select and persist the model of one channel.
    pub fn train_channel(&self, dataset: &Dataset, channel: Channel) -> ChannelReport {
        match self.try_train_channel(dataset, channel) {
            Ok(report) => report,
            Err(e) => {
                warn!(channel = %channel, error = %e, "channel training failed");
                ChannelReport::Failed {
                    channel,
                    reason: e.to_string(),
                }
            }
        }
    }

    fn try_train_channel(&self, dataset: &Dataset, channel: Channel) -> Result<ChannelReport> {
        let data = dataset.for_channel(channel)?;
        let rows = data.len();
        if rows < self.config.selection.min_channel_rows {
            warn!(
                channel = %channel,
                rows,
                required = self.config.selection.min_channel_rows,
                "skipping channel with insufficient data"
            );
            return Ok(ChannelReport::Skipped {
                channel,
                reason: SkipReason::InsufficientData,
                rows,
            });
        }

        let split = self.config.split.split(&data)?;
        let (train, valid, test) = split.counts();
        debug!(channel = %channel, train, valid, test, "temporal split");
        if split.train.is_empty() || split.test.is_empty() {
            return Ok(ChannelReport::Failed {
                channel,
                reason: format!("empty split window (train {train}, test {test})"),
            });
        }

        let features = channel_features(channel);
        let candidates = fit_candidates(&split, features, &self.config)?;
        let metrics = candidates.evaluate(&split)?;
        let best = select_best(&metrics);

        let importances = if best == ModelKind::GradientBoosted {
            candidates.gbdt.top_features(self.config.selection.top_features)
        } else {
            Vec::new()
        };
        let model = candidates.into_model(best);
        let path = self.store.save_model(channel, &model)?;

        let metadata = ModelMetadata::new(
            channel,
            best,
            features.iter().map(|f| f.to_string()).collect(),
            SplitCounts::from(split.counts()),
            metrics,
            importances,
        )
        .with_model_path(path.map(|p| p.display().to_string()));
        self.store.save_metadata(&metadata)?;

        info!(
            channel = %channel,
            model = %best,
            rmse = metadata.best_metrics().rmse,
            r2 = metadata.best_metrics().r2,
            improvement_pct = metadata.improvement_pct,
            "selected model"
        );
        Ok(ChannelReport::Trained(metadata))
    }
}

/// The three fitted candidates of one channel.
struct Candidates {
    features: Vec<String>,
    baseline: BaselineTable,
    gbdt: GbdtModel,
    linear: LinearModel,
}

fn fit_candidates(
    split: &TemporalSplit,
    features: &[&str],
    config: &RoasConfig,
) -> Result<Candidates> {
    let x_train = split.train.feature_matrix(features)?;
    let y_train = split.train.target()?;

    let baseline = BaselineTable::from_dataset(&split.train)?;

    let valid = if split.valid.is_empty() {
        None
    } else {
        Some((split.valid.feature_matrix(features)?, split.valid.target()?))
    };
    let gbdt = GbdtModel::fit_with_validation(
        &x_train,
        &y_train,
        valid.as_ref().map(|(x, y)| (x, y)),
        features,
        config.gbdt,
    )?;

    let linear = LinearModel::fit(&x_train, &y_train, features, config.ridge)?;

    Ok(Candidates {
        features: features.iter().map(|f| f.to_string()).collect(),
        baseline,
        gbdt,
        linear,
    })
}

impl Candidates {
    fn evaluate(&self, split: &TemporalSplit) -> Result<CandidateMetrics> {
        let features: Vec<&str> = self.features.iter().map(String::as_str).collect();
        let x_test = split.test.feature_matrix(&features)?;
        let y_test = split.test.target()?;

        Ok(CandidateMetrics {
            gradient_boosted: Metrics::evaluate(&y_test, &self.gbdt.predict(&x_test)?)?,
            linear: Metrics::evaluate(&y_test, &self.linear.predict(&x_test)?)?,
            baseline: Metrics::evaluate(&y_test, &self.baseline.predict_dataset(&split.test)?)?,
        })
    }

    fn into_model(self, kind: ModelKind) -> TrainedModel {
        match kind {
            ModelKind::GradientBoosted => self.gbdt.into(),
            ModelKind::Linear => self.linear.into(),
            ModelKind::Baseline => self.baseline.into(),
        }
    }
}
