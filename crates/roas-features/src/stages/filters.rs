//! Row filters.

use super::CleaningStage;
use crate::error::Result;
use polars::prelude::*;

/// Drops rows without positive spend, where ROAS is undefined.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpendFilter;

impl CleaningStage for SpendFilter {
    fn name(&self) -> &str {
        "spend_filter"
    }

    fn apply(&self, data: LazyFrame) -> Result<LazyFrame> {
        Ok(data.filter(col("cost").gt(lit(0.0))))
    }

    fn required_columns(&self) -> &[&str] {
        &["cost"]
    }
}

/// Drops campaigns observed on fewer than `min_rows` rows.
#[derive(Debug, Clone, Copy)]
pub struct CampaignSupportFilter {
    min_rows: u32,
}

impl CampaignSupportFilter {
    /// Create a filter keeping campaigns with at least `min_rows` rows.
    pub const fn new(min_rows: u32) -> Self {
        Self { min_rows }
    }
}

impl CleaningStage for CampaignSupportFilter {
    fn name(&self) -> &str {
        "campaign_support_filter"
    }

    fn apply(&self, data: LazyFrame) -> Result<LazyFrame> {
        Ok(data.filter(
            col("campaign_id")
                .count()
                .over([col("campaign_id")])
                .gt_eq(lit(self.min_rows)),
        ))
    }

    fn required_columns(&self) -> &[&str] {
        &["campaign_id"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("campaign_id".into(), ["a", "a", "a", "b", "b", "c"]).into(),
            Series::new("cost".into(), [1.0, 0.0, 2.0, 3.0, 4.0, -1.0]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_spend_filter() {
        let out = SpendFilter.apply(frame().lazy()).unwrap().collect().unwrap();
        assert_eq!(out.height(), 4);
    }

    #[test]
    fn test_campaign_support_filter() {
        let out = CampaignSupportFilter::new(3)
            .apply(frame().lazy())
            .unwrap()
            .collect()
            .unwrap();
        let ids = out.column("campaign_id").unwrap().str().unwrap();
        assert_eq!(out.height(), 3);
        assert!(ids.into_iter().all(|id| id == Some("a")));
    }
}
