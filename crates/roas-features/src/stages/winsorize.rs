//! Outlier control.

use super::CleaningStage;
use crate::error::Result;
use polars::prelude::*;

/// Traffic columns winsorized by [`FeatureWinsorizer`].
pub const WINSORIZED_FEATURES: [&str; 5] = ["impressions", "clicks", "cost", "ctr", "cpc"];

/// Clip `column` from above at `threshold`. Nulls stay null.
fn clip_upper(column: &str, threshold: Expr) -> Expr {
    when(col(column).gt(threshold.clone()))
        .then(threshold)
        .otherwise(col(column))
        .alias(column)
}

/// Winsorizes ROAS per channel, then caps and floors it.
///
/// Each channel is clipped at its own `percentile` quantile so a channel
/// with structurally higher ROAS keeps its level. The absolute `cap` then
/// bounds every channel, and negative ROAS (refunds) is floored at zero.
#[derive(Debug, Clone, Copy)]
pub struct RoasWinsorizer {
    percentile: f64,
    cap: f64,
}

impl RoasWinsorizer {
    /// Create a winsorizer with the given per-channel percentile and cap.
    pub const fn new(percentile: f64, cap: f64) -> Self {
        Self { percentile, cap }
    }
}

impl CleaningStage for RoasWinsorizer {
    fn name(&self) -> &str {
        "roas_winsorizer"
    }

    fn apply(&self, data: LazyFrame) -> Result<LazyFrame> {
        let channel_quantile = col("roas")
            .quantile(lit(self.percentile), QuantileMethod::Linear)
            .over([col("channel")]);

        Ok(data
            .with_columns([clip_upper("roas", channel_quantile)])
            .with_columns([when(col("roas").gt(lit(self.cap)))
                .then(lit(self.cap))
                .when(col("roas").lt(lit(0.0)))
                .then(lit(0.0))
                .otherwise(col("roas"))
                .alias("roas")]))
    }

    fn required_columns(&self) -> &[&str] {
        &["roas", "channel"]
    }
}

/// Winsorizes traffic features at a global percentile.
#[derive(Debug, Clone, Copy)]
pub struct FeatureWinsorizer {
    percentile: f64,
}

impl FeatureWinsorizer {
    /// Create a winsorizer clipping at the given percentile.
    pub const fn new(percentile: f64) -> Self {
        Self { percentile }
    }
}

impl CleaningStage for FeatureWinsorizer {
    fn name(&self) -> &str {
        "feature_winsorizer"
    }

    fn apply(&self, data: LazyFrame) -> Result<LazyFrame> {
        let clipped: Vec<Expr> = WINSORIZED_FEATURES
            .iter()
            .map(|&name| {
                clip_upper(
                    name,
                    col(name).quantile(lit(self.percentile), QuantileMethod::Linear),
                )
            })
            .collect();

        Ok(data.with_columns(clipped))
    }

    fn required_columns(&self) -> &[&str] {
        &WINSORIZED_FEATURES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn roas_frame() -> DataFrame {
        // Channel a: 1..=10, channel b: 100..=1000 in steps of 100
        let channel: Vec<&str> = (0..20_i32).map(|i| if i < 10 { "a" } else { "b" }).collect();
        let roas: Vec<f64> = (0..20_i32)
            .map(|i| if i < 10 { f64::from(i + 1) } else { f64::from(i - 9) * 100.0 })
            .collect();
        DataFrame::new(vec![
            Series::new("channel".into(), channel).into(),
            Series::new("roas".into(), roas).into(),
        ])
        .unwrap()
    }

    fn max_roas(df: &DataFrame, channel: &str) -> f64 {
        let channels = df.column("channel").unwrap().str().unwrap();
        let roas = df.column("roas").unwrap().f64().unwrap();
        channels
            .into_iter()
            .zip(roas)
            .filter(|(c, _)| *c == Some(channel))
            .filter_map(|(_, r)| r)
            .fold(f64::MIN, f64::max)
    }

    #[test]
    fn test_roas_clipped_per_channel() {
        let out = RoasWinsorizer::new(0.95, 1_000.0)
            .apply(roas_frame().lazy())
            .unwrap()
            .collect()
            .unwrap();

        // Linear quantile of 1..=10 at 0.95 is 9.55
        assert_relative_eq!(max_roas(&out, "a"), 9.55, epsilon = 1e-9);
        assert_relative_eq!(max_roas(&out, "b"), 955.0, epsilon = 1e-9);
    }

    #[test]
    fn test_roas_cap() {
        let out = RoasWinsorizer::new(0.95, 100.0)
            .apply(roas_frame().lazy())
            .unwrap()
            .collect()
            .unwrap();
        assert_relative_eq!(max_roas(&out, "b"), 100.0);
    }

    #[test]
    fn test_feature_winsorizer_keeps_nulls() {
        let values: Vec<f64> = (1..=100_i32).map(f64::from).collect();
        let ctr: Vec<Option<f64>> = (1..=100_i32)
            .map(|i| if i == 1 { None } else { Some(f64::from(i)) })
            .collect();
        let df = DataFrame::new(vec![
            Series::new("impressions".into(), values.clone()).into(),
            Series::new("clicks".into(), values.clone()).into(),
            Series::new("cost".into(), values.clone()).into(),
            Series::new("ctr".into(), ctr).into(),
            Series::new("cpc".into(), values).into(),
        ])
        .unwrap();

        let out = FeatureWinsorizer::new(0.99)
            .apply(df.lazy())
            .unwrap()
            .collect()
            .unwrap();

        let cost = out.column("cost").unwrap().f64().unwrap();
        assert_relative_eq!(cost.max().unwrap(), 99.01, epsilon = 1e-9);
        assert_eq!(out.column("ctr").unwrap().f64().unwrap().get(0), None);
    }
}
