//! Training run reports.

use crate::error::Result;
use crate::export::{ExportFormat, Exporter, rows_to_csv};
use crate::metadata::ModelMetadata;
use chrono::{DateTime, Utc};
use roas_data::Channel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a channel was not trained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Too few cleaned rows for the channel
    InsufficientData,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientData => write!(f, "insufficient_data"),
        }
    }
}

/// Outcome of training one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChannelReport {
    /// A winner was selected and persisted
    Trained(ModelMetadata),

    /// The channel was not attempted
    Skipped {
        /// Channel
        channel: Channel,
        /// Why it was skipped
        reason: SkipReason,
        /// Cleaned rows available
        rows: usize,
    },

    /// Training was attempted and failed
    Failed {
        /// Channel
        channel: Channel,
        /// Error message
        reason: String,
    },
}

impl ChannelReport {
    /// Channel the outcome belongs to.
    pub const fn channel(&self) -> Channel {
        match self {
            Self::Trained(meta) => meta.channel,
            Self::Skipped { channel, .. } | Self::Failed { channel, .. } => *channel,
        }
    }

    /// Status label as serialized.
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Trained(_) => "trained",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }

    /// Whether a model was selected.
    pub const fn is_trained(&self) -> bool {
        matches!(self, Self::Trained(_))
    }

    /// Metadata of a trained channel.
    pub const fn metadata(&self) -> Option<&ModelMetadata> {
        match self {
            Self::Trained(meta) => Some(meta),
            _ => None,
        }
    }

    /// Short description used in summaries.
    pub fn describe(&self) -> String {
        match self {
            Self::Trained(meta) => format!(
                "Best: {:16} | R² test: {:.3} | vs baseline: {:+.1}%",
                meta.model_kind.as_str(),
                meta.best_metrics().r2,
                meta.improvement_pct
            ),
            Self::Skipped { reason, rows, .. } => format!("SKIPPED: {reason} ({rows} rows)"),
            Self::Failed { reason, .. } => format!("FAILED: {reason}"),
        }
    }
}

/// One flattened line of a report, used for CSV export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSummaryRow {
    /// Channel
    pub channel: String,
    /// trained, skipped or failed
    pub status: String,
    /// Winning model kind
    pub model_kind: Option<String>,
    /// Winner's test RMSE
    pub rmse: Option<f64>,
    /// Winner's test MAE
    pub mae: Option<f64>,
    /// Winner's test R²
    pub r2: Option<f64>,
    /// Improvement over the baseline in percent
    pub improvement_pct: Option<f64>,
    /// Training rows
    pub train_rows: Option<usize>,
    /// Validation rows
    pub valid_rows: Option<usize>,
    /// Test rows
    pub test_rows: Option<usize>,
    /// Skip or failure reason
    pub reason: Option<String>,
}

impl From<&ChannelReport> for ChannelSummaryRow {
    fn from(report: &ChannelReport) -> Self {
        let mut row = Self {
            channel: report.channel().to_string(),
            status: report.status().to_string(),
            model_kind: None,
            rmse: None,
            mae: None,
            r2: None,
            improvement_pct: None,
            train_rows: None,
            valid_rows: None,
            test_rows: None,
            reason: None,
        };
        match report {
            ChannelReport::Trained(meta) => {
                let best = meta.best_metrics();
                row.model_kind = Some(meta.model_kind.to_string());
                row.rmse = Some(best.rmse);
                row.mae = Some(best.mae);
                row.r2 = Some(best.r2);
                row.improvement_pct = Some(meta.improvement_pct);
                row.train_rows = Some(meta.splits.train);
                row.valid_rows = Some(meta.splits.valid);
                row.test_rows = Some(meta.splits.test);
            }
            ChannelReport::Skipped { reason, .. } => row.reason = Some(reason.to_string()),
            ChannelReport::Failed { reason, .. } => row.reason = Some(reason.clone()),
        }
        row
    }
}

/// Summary of one training run over every channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// When the run started
    pub timestamp: DateTime<Utc>,
    /// Lookback window in days
    pub lookback_days: u32,
    /// Cleaned rows across all channels
    pub total_rows: usize,
    /// Per-channel outcomes in training order
    pub channels: Vec<ChannelReport>,
}

impl TrainingReport {
    /// Start an empty report.
    pub fn new(lookback_days: u32, total_rows: usize) -> Self {
        Self {
            timestamp: Utc::now(),
            lookback_days,
            total_rows,
            channels: Vec::new(),
        }
    }

    /// Append a channel outcome.
    pub fn push(&mut self, report: ChannelReport) {
        self.channels.push(report);
    }

    /// Outcome for a channel.
    pub fn channel(&self, channel: Channel) -> Option<&ChannelReport> {
        self.channels.iter().find(|r| r.channel() == channel)
    }

    /// Number of channels with a selected model.
    pub fn trained_count(&self) -> usize {
        self.channels.iter().filter(|r| r.is_trained()).count()
    }

    /// Flattened rows, one per channel.
    pub fn summary_rows(&self) -> Vec<ChannelSummaryRow> {
        self.channels.iter().map(ChannelSummaryRow::from).collect()
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Format as ASCII table for terminal output.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str("\nROAS Training Report\n");
        output.push_str(&format!(
            "Run: {} | Lookback: {} days | Rows: {}\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.lookback_days,
            self.total_rows
        ));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        for report in &self.channels {
            output.push_str(&format!(
                "{:15} | {}\n",
                report.channel().as_str(),
                report.describe()
            ));
        }

        for meta in self.channels.iter().filter_map(ChannelReport::metadata) {
            output.push_str(&format!("\n{} candidates (test split):\n", meta.channel.name()));
            output.push_str(&"-".repeat(80));
            output.push('\n');
            output.push_str(&format!(
                "{:20} {:>10} {:>10} {:>10} {:>14}\n",
                "Model", "RMSE", "MAE", "R²", "vs Baseline"
            ));
            for kind in roas_model::ModelKind::all() {
                let m = meta.metrics.get(kind);
                let marker = if kind == meta.model_kind { "*" } else { " " };
                output.push_str(&format!(
                    "{marker}{:19} {:>10.4} {:>10.4} {:>10.4} {:>13.1}%\n",
                    kind.name(),
                    m.rmse,
                    m.mae,
                    m.r2,
                    meta.metrics.improvement(kind)
                ));
            }

            if !meta.feature_importance.is_empty() {
                output.push_str("\n  Top features:\n");
                for fi in meta.feature_importance.iter().take(5) {
                    output.push_str(&format!("    {:25} {:.4}\n", fi.feature, fi.importance));
                }
            }
        }

        output.push_str(&"=".repeat(80));
        output.push('\n');
        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("# ROAS Training Report\n\n");
        output.push_str(&format!(
            "**Run:** {}\n\n**Lookback:** {} days\n\n**Rows:** {}\n\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.lookback_days,
            self.total_rows
        ));

        output.push_str("## Channels\n\n");
        output.push_str("| Channel | Status | Model | R² | RMSE | vs Baseline |\n");
        output.push_str("|---------|--------|-------|----|------|-------------|\n");
        for report in &self.channels {
            match report {
                ChannelReport::Trained(meta) => {
                    let best = meta.best_metrics();
                    output.push_str(&format!(
                        "| {} | trained | {} | {:.3} | {:.4} | {:+.1}% |\n",
                        meta.channel.as_str(),
                        meta.model_kind.as_str(),
                        best.r2,
                        best.rmse,
                        meta.improvement_pct
                    ));
                }
                other => {
                    output.push_str(&format!(
                        "| {} | {} | - | - | - | - |\n",
                        other.channel().as_str(),
                        other.status()
                    ));
                }
            }
        }
        output.push('\n');

        for meta in self.channels.iter().filter_map(ChannelReport::metadata) {
            if meta.feature_importance.is_empty() {
                continue;
            }
            output.push_str(&format!("## Feature Importance: {}\n\n", meta.channel.name()));
            output.push_str("| Feature | Importance |\n");
            output.push_str("|---------|------------|\n");
            for fi in &meta.feature_importance {
                output.push_str(&format!("| {} | {:.4} |\n", fi.feature, fi.importance));
            }
            output.push('\n');
        }

        output
    }
}

impl Exporter for TrainingReport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => rows_to_csv(&self.summary_rows()),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => self.to_json(),
        }
    }
}
