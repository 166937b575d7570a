//! Prediction service.
//!
//! Answers point predictions per channel. A channel served by a learned
//! model uses its persisted artifact; otherwise, or while no artifact
//! exists, the historical baseline answers with a confidence that reflects
//! how specific the matching mean is.
//!
//! Loaded models, their metadata records and the baseline table are cached
//! in the service. Models and metadata are cached once found; a missing
//! artifact is looked up again on the next request. An unreadable metadata
//! record is logged and treated as absent. The baseline is built on first use
//! and kept until [`PredictionService::invalidate_baseline`].

use crate::config::RoasConfig;
use crate::error::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use polars::prelude::*;
use roas_data::{Channel, RecordSource, ServingStrategy, records_to_frame};
use roas_features::FeatureVector;
use roas_model::{BaselineSource, BaselineTable, ModelKind, TrainedModel};
use roas_output::{ModelMetadata, ModelStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Inputs of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Campaign identifier
    pub campaign_id: String,
    /// Channel identifier, e.g. `google_ads`
    pub channel: String,
    /// Planned impressions
    #[serde(default)]
    pub impressions: f64,
    /// Planned clicks
    #[serde(default)]
    pub clicks: f64,
    /// Planned spend
    #[serde(default)]
    pub cost: f64,
    /// Day of week, 1 = Sunday through 7 = Saturday
    #[serde(default = "default_day_of_week")]
    pub day_of_week: u32,
    /// Month, 1 through 12
    #[serde(default = "default_month")]
    pub month: u32,
}

const fn default_day_of_week() -> u32 {
    3
}

const fn default_month() -> u32 {
    11
}

impl PredictionRequest {
    /// Request with no traffic, on a Tuesday in November.
    pub fn new(campaign_id: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            channel: channel.into(),
            impressions: 0.0,
            clicks: 0.0,
            cost: 0.0,
            day_of_week: default_day_of_week(),
            month: default_month(),
        }
    }

    /// Set planned impressions, clicks and spend.
    pub const fn with_traffic(mut self, impressions: f64, clicks: f64, cost: f64) -> Self {
        self.impressions = impressions;
        self.clicks = clicks;
        self.cost = cost;
        self
    }

    /// Set the calendar position.
    pub const fn with_date(mut self, day_of_week: u32, month: u32) -> Self {
        self.day_of_week = day_of_week;
        self.month = month;
        self
    }

    /// Why the request cannot be scored, if it cannot.
    ///
    /// Counters must be finite and non-negative, the day of week in 1..=7
    /// and the month in 1..=12.
    pub fn invalid_reason(&self) -> Option<String> {
        if !(1..=7).contains(&self.day_of_week) {
            return Some(format!("day_of_week must be in 1..=7, got {}", self.day_of_week));
        }
        if !(1..=12).contains(&self.month) {
            return Some(format!("month must be in 1..=12, got {}", self.month));
        }
        [
            ("impressions", self.impressions),
            ("clicks", self.clicks),
            ("cost", self.cost),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite() || *value < 0.0)
        .map(|(name, value)| format!("{name} must be finite and non-negative, got {value}"))
    }
}

/// How a prediction was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMethod {
    /// A persisted learned model
    Learned,
    /// The historical baseline
    Baseline,
}

/// Qualitative trust in a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Learned model, or a campaign's own history where the baseline is the
    /// chosen method
    High,
    /// Campaign history used as a fallback, or a channel mean
    Medium,
    /// Global mean
    Low,
}

/// A successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Campaign identifier
    pub campaign_id: String,
    /// Channel
    pub channel: Channel,
    /// Predicted ROAS, rounded
    pub predicted_roas: f64,
    /// Learned model or baseline
    pub method: PredictionMethod,
    /// Confidence qualifier
    pub confidence: Confidence,
    /// Model kind for learned predictions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_kind: Option<ModelKind>,
    /// Baseline level for baseline predictions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<BaselineSource>,
    /// Explanation of the method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Stored test performance of the channel's model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_performance: Option<String>,
}

/// Answer to a prediction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    /// A prediction
    Prediction(Prediction),
    /// The request named a channel that is not modeled, or carried inputs
    /// that cannot be scored
    Unrecognized {
        /// What was rejected
        error: String,
    },
}

impl PredictionResponse {
    /// The prediction, if the request was recognized.
    pub const fn prediction(&self) -> Option<&Prediction> {
        match self {
            Self::Prediction(p) => Some(p),
            Self::Unrecognized { .. } => None,
        }
    }
}

/// Historical performance of one campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSummary {
    /// Campaign identifier
    pub campaign_id: String,
    /// Campaign display name
    pub campaign_name: String,
    /// Channel identifier
    pub channel: String,
    /// Mean daily ROAS, rounded
    pub predicted_roas: f64,
    /// Spend over the window
    pub total_cost: f64,
    /// Revenue over the window
    pub total_revenue: f64,
}

/// How one channel is currently served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    /// Channel
    pub channel: Channel,
    /// Configured strategy
    pub strategy: ServingStrategy,
    /// Method answering requests right now
    pub method: PredictionMethod,
    /// Human readable model description
    pub model: String,
    /// Stored test performance
    pub performance: Option<String>,
    /// When the stored model was trained
    pub trained_at: Option<DateTime<Utc>>,
    /// Short status line
    pub status: String,
}

#[derive(Debug)]
struct LoadedModel {
    model: TrainedModel,
    performance: Option<String>,
}

/// Serves ROAS predictions from persisted models and the baseline.
#[derive(Debug)]
pub struct PredictionService {
    config: RoasConfig,
    source: Arc<dyn RecordSource>,
    store: ModelStore,
    models: RwLock<HashMap<Channel, Arc<LoadedModel>>>,
    metadata: RwLock<HashMap<Channel, Arc<ModelMetadata>>>,
    baseline: RwLock<Option<Arc<BaselineTable>>>,
}

impl PredictionService {
    /// Service reading artifacts from `config.model_dir` and history from
    /// `source`.
    pub fn new(config: RoasConfig, source: Arc<dyn RecordSource>) -> Self {
        let store = ModelStore::new(config.model_dir.clone());
        Self {
            config,
            source,
            store,
            models: RwLock::new(HashMap::new()),
            metadata: RwLock::new(HashMap::new()),
            baseline: RwLock::new(None),
        }
    }

    /// Artifact store.
    pub const fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Predict ROAS for a request.
    ///
    /// An unknown channel or invalid request inputs yield
    /// [`PredictionResponse::Unrecognized`] rather than an error.
    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse> {
        let channel = match request.channel.parse::<Channel>() {
            Ok(channel) => channel,
            Err(e) => {
                warn!(channel = %request.channel, "unrecognized channel");
                return Ok(PredictionResponse::Unrecognized {
                    error: e.to_string(),
                });
            }
        };

        let features = FeatureVector::from_request(
            channel,
            request.impressions,
            request.clicks,
            request.cost,
            request.day_of_week,
            request.month,
        );
        let invalid = request.invalid_reason().or_else(|| {
            (!features.is_finite()).then(|| "request features are not finite".to_string())
        });
        if let Some(error) = invalid {
            warn!(campaign_id = %request.campaign_id, %error, "rejected prediction request");
            return Ok(PredictionResponse::Unrecognized { error });
        }

        let prediction = match channel.serving_strategy() {
            ServingStrategy::Learned => match self.model(channel)? {
                Some(loaded) => self.predict_learned(request, channel, &features, &loaded)?,
                None => {
                    debug!(channel = %channel, "no persisted model, using baseline");
                    self.predict_baseline(request, channel)?
                }
            },
            ServingStrategy::BaselineOnly => self.predict_baseline(request, channel)?,
        };
        Ok(PredictionResponse::Prediction(prediction))
    }

    fn predict_learned(
        &self,
        request: &PredictionRequest,
        channel: Channel,
        features: &FeatureVector,
        loaded: &LoadedModel,
    ) -> Result<Prediction> {
        let raw = loaded
            .model
            .predict_one(&request.campaign_id, channel.as_str(), features)?;
        let clipped = clip(raw, self.config.serving.prediction_clip);

        Ok(Prediction {
            campaign_id: request.campaign_id.clone(),
            channel,
            predicted_roas: self.round(clipped),
            method: PredictionMethod::Learned,
            confidence: Confidence::High,
            model_kind: Some(loaded.model.kind()),
            source: None,
            note: None,
            model_performance: loaded.performance.clone(),
        })
    }

    fn predict_baseline(&self, request: &PredictionRequest, channel: Channel) -> Result<Prediction> {
        let table = self.baseline()?;
        let (value, source) = table.predict(&request.campaign_id, channel.as_str());
        let by_design = channel.serving_strategy() == ServingStrategy::BaselineOnly;

        let confidence = match source {
            BaselineSource::CampaignHistory if by_design => Confidence::High,
            BaselineSource::CampaignHistory | BaselineSource::ChannelMean => Confidence::Medium,
            BaselineSource::GlobalMean => Confidence::Low,
        };
        let metadata = self.metadata(channel);
        let note = match (by_design, &metadata) {
            (true, _) => "historical mean outperforms learned models on this channel",
            (false, Some(_)) => "baseline won model selection",
            (false, None) => "no trained model available",
        };
        let model_performance = metadata.map(|meta| meta.model_performance());

        Ok(Prediction {
            campaign_id: request.campaign_id.clone(),
            channel,
            predicted_roas: self.round(value.max(0.0)),
            method: PredictionMethod::Baseline,
            confidence,
            model_kind: None,
            source: Some(source),
            note: Some(note.to_string()),
            model_performance,
        })
    }

    /// Campaigns ranked by mean historical ROAS over the lookback window.
    pub fn top_campaigns(
        &self,
        channel: Option<Channel>,
        top_n: usize,
    ) -> Result<Vec<CampaignSummary>> {
        let records = self.source.fetch(self.config.lookback_days)?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut lf = records_to_frame(&records)?.lazy();
        if let Some(channel) = channel {
            lf = lf.filter(col("channel").eq(lit(channel.as_str())));
        }
        let grouped = lf
            .group_by([col("campaign_id"), col("campaign_name"), col("channel")])
            .agg([
                col("roas").mean().alias("mean_roas"),
                col("cost").sum().alias("total_cost"),
                col("revenue").sum().alias("total_revenue"),
            ])
            .collect()?;

        let ids = grouped.column("campaign_id")?.str()?;
        let names = grouped.column("campaign_name")?.str()?;
        let channels = grouped.column("channel")?.str()?;
        let roas = grouped.column("mean_roas")?.f64()?;
        let cost = grouped.column("total_cost")?.f64()?;
        let revenue = grouped.column("total_revenue")?.f64()?;

        let mut summaries: Vec<CampaignSummary> = (0..grouped.height())
            .filter_map(|i| {
                Some(CampaignSummary {
                    campaign_id: ids.get(i)?.to_string(),
                    campaign_name: names.get(i).unwrap_or_default().to_string(),
                    channel: channels.get(i)?.to_string(),
                    predicted_roas: self.round(roas.get(i)?),
                    total_cost: cost.get(i).unwrap_or(0.0),
                    total_revenue: revenue.get(i).unwrap_or(0.0),
                })
            })
            .collect();

        summaries.sort_by(|a, b| {
            b.predicted_roas
                .total_cmp(&a.predicted_roas)
                .then_with(|| a.campaign_id.cmp(&b.campaign_id))
        });
        summaries.truncate(top_n);
        Ok(summaries)
    }

    /// How every channel is currently served.
    pub fn summary(&self) -> Result<Vec<ChannelSummary>> {
        let mut channels = Vec::with_capacity(Channel::all().len());
        for channel in Channel::all() {
            let metadata = self.metadata(channel);
            let strategy = channel.serving_strategy();
            let loaded = match strategy {
                ServingStrategy::Learned => self.model(channel)?,
                ServingStrategy::BaselineOnly => None,
            };

            let (method, model, status) = match (&loaded, strategy) {
                (Some(loaded), _) => (
                    PredictionMethod::Learned,
                    loaded.model.kind().name().to_string(),
                    "learned model active".to_string(),
                ),
                (None, ServingStrategy::BaselineOnly) => (
                    PredictionMethod::Baseline,
                    ModelKind::Baseline.name().to_string(),
                    "baseline outperforms learned models".to_string(),
                ),
                (None, ServingStrategy::Learned) => (
                    PredictionMethod::Baseline,
                    ModelKind::Baseline.name().to_string(),
                    if metadata.is_some() {
                        "baseline won model selection".to_string()
                    } else {
                        "no trained model, serving baseline".to_string()
                    },
                ),
            };

            channels.push(ChannelSummary {
                channel,
                strategy,
                method,
                model,
                performance: metadata.as_ref().map(|m| m.model_performance()),
                trained_at: metadata.as_ref().map(|m| m.trained_at),
                status,
            });
        }
        Ok(channels)
    }

    /// Drop every cached model and metadata record.
    pub fn invalidate_models(&self) {
        self.models.write().clear();
        self.metadata.write().clear();
    }

    /// Drop the cached baseline table.
    pub fn invalidate_baseline(&self) {
        *self.baseline.write() = None;
    }

    /// Drop every cache.
    pub fn invalidate(&self) {
        self.invalidate_models();
        self.invalidate_baseline();
    }

    fn model(&self, channel: Channel) -> Result<Option<Arc<LoadedModel>>> {
        if let Some(loaded) = self.models.read().get(&channel) {
            return Ok(Some(Arc::clone(loaded)));
        }

        let Some(model) = self.store.load_model(channel)? else {
            return Ok(None);
        };
        let performance = self.metadata(channel).map(|meta| meta.model_performance());
        info!(channel = %channel, kind = %model.kind(), "loaded model");

        let loaded = Arc::new(LoadedModel { model, performance });
        Ok(Some(Arc::clone(
            self.models.write().entry(channel).or_insert(loaded),
        )))
    }

    /// Metadata record of a channel. Unreadable records count as missing.
    fn metadata(&self, channel: Channel) -> Option<Arc<ModelMetadata>> {
        if let Some(meta) = self.metadata.read().get(&channel) {
            return Some(Arc::clone(meta));
        }

        match self.store.load_metadata(channel) {
            Ok(Some(meta)) => Some(Arc::clone(
                self.metadata.write().entry(channel).or_insert(Arc::new(meta)),
            )),
            Ok(None) => None,
            Err(e) => {
                warn!(
                    channel = %channel,
                    path = %self.store.metadata_path(channel).display(),
                    error = %e,
                    "ignoring unreadable model metadata"
                );
                None
            }
        }
    }

    fn baseline(&self) -> Result<Arc<BaselineTable>> {
        if let Some(table) = self.baseline.read().as_ref() {
            return Ok(Arc::clone(table));
        }

        let records = self.source.fetch(self.config.lookback_days)?;
        let table = Arc::new(BaselineTable::from_frame(&records_to_frame(&records)?)?);
        info!(
            campaigns = table.n_campaigns(),
            global_mean = table.global_mean(),
            "built baseline"
        );

        Ok(Arc::clone(self.baseline.write().get_or_insert(table)))
    }

    fn round(&self, value: f64) -> f64 {
        let factor = 10_f64.powi(self.config.serving.decimals as i32);
        (value * factor).round() / factor
    }
}

fn clip(value: f64, upper: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, upper)
    } else {
        0.0
    }
}
