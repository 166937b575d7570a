//! Derived features.

use super::CleaningStage;
use crate::error::Result;
use polars::prelude::*;
use roas_data::Channel;

/// `log(1 + x)` of a float column.
fn log1p(column: &str) -> Expr {
    col(column).apply(
        |c: Column| {
            let s = c.as_materialized_series();
            Ok(Some(s.f64()?.apply_values(f64::ln_1p).into_series().into()))
        },
        GetOutput::from_type(DataType::Float64),
    )
}

/// Adds log transforms, offset ratios and the channel indicator.
///
/// Ratios use `+ 1` offsets in the denominator so zero counters never
/// produce infinities.
#[derive(Debug, Clone, Copy)]
pub struct DerivedFeatures {
    primary: Channel,
}

impl DerivedFeatures {
    /// Create the stage with the channel that gets indicator value 1.
    pub const fn new(primary: Channel) -> Self {
        Self { primary }
    }
}

impl CleaningStage for DerivedFeatures {
    fn name(&self) -> &str {
        "derived_features"
    }

    fn apply(&self, data: LazyFrame) -> Result<LazyFrame> {
        Ok(data.with_columns([
            log1p("cost").alias("log_cost"),
            log1p("impressions").alias("log_impressions"),
            (col("clicks") / (col("impressions") + lit(1.0))).alias("click_impression_ratio"),
            when(col("channel").eq(lit(self.primary.as_str())))
                .then(lit(1.0))
                .otherwise(lit(0.0))
                .alias("is_primary_channel"),
            (col("cost") / (col("clicks") + lit(1.0))).alias("cost_per_click_ratio"),
            (col("clicks") * lit(100.0) / (col("impressions") + lit(1.0)))
                .alias("engagement_score"),
        ]))
    }

    fn required_columns(&self) -> &[&str] {
        &["impressions", "clicks", "cost", "channel"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_derived_columns() {
        let df = DataFrame::new(vec![
            Series::new("impressions".into(), [999.0, 0.0]).into(),
            Series::new("clicks".into(), [49.0, 0.0]).into(),
            Series::new("cost".into(), [99.0, 5.0]).into(),
            Series::new("channel".into(), ["google_ads", "meta_ads"]).into(),
        ])
        .unwrap();

        let out = DerivedFeatures::new(Channel::GoogleAds)
            .apply(df.lazy())
            .unwrap()
            .collect()
            .unwrap();

        let get = |name: &str, row: usize| -> f64 {
            out.column(name).unwrap().f64().unwrap().get(row).unwrap()
        };

        assert_relative_eq!(get("log_cost", 0), 100.0_f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(get("log_impressions", 0), 1000.0_f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(get("click_impression_ratio", 0), 0.049);
        assert_relative_eq!(get("cost_per_click_ratio", 0), 1.98);
        assert_relative_eq!(get("engagement_score", 0), 4.9);
        assert_eq!(get("is_primary_channel", 0), 1.0);

        // Zero counters stay finite
        assert_eq!(get("click_impression_ratio", 1), 0.0);
        assert_relative_eq!(get("cost_per_click_ratio", 1), 5.0);
        assert_eq!(get("is_primary_channel", 1), 0.0);
    }
}
