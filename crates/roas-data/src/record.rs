//! Daily campaign record.

use crate::metrics::ratio;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// One row of daily performance for a campaign on a channel.
///
/// Raw counters come from the upstream data-access layer; ratios and calendar
/// fields are derived on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCampaignRecord {
    /// Calendar day of the aggregate
    pub date: NaiveDate,
    /// Campaign identifier (unique within a channel)
    pub campaign_id: String,
    /// Campaign display name
    #[serde(default)]
    pub campaign_name: String,
    /// Channel identifier, e.g. `google_ads`
    pub channel: String,
    /// Impressions served
    #[serde(default, deserialize_with = "empty_as_zero")]
    pub impressions: f64,
    /// Clicks received
    #[serde(default, deserialize_with = "empty_as_zero")]
    pub clicks: f64,
    /// Spend in account currency
    #[serde(default, deserialize_with = "empty_as_zero")]
    pub cost: f64,
    /// Attributed conversions
    #[serde(default, deserialize_with = "empty_as_zero")]
    pub conversions: f64,
    /// Attributed revenue
    #[serde(default, deserialize_with = "empty_as_zero")]
    pub revenue: f64,
}

/// Exports leave counters blank when the platform reported nothing.
fn empty_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

impl DailyCampaignRecord {
    /// Create a record with zero conversions.
    pub fn new(
        date: NaiveDate,
        campaign_id: impl Into<String>,
        channel: impl Into<String>,
        impressions: f64,
        clicks: f64,
        cost: f64,
        revenue: f64,
    ) -> Self {
        let campaign_id = campaign_id.into();
        Self {
            date,
            campaign_name: campaign_id.clone(),
            campaign_id,
            channel: channel.into(),
            impressions,
            clicks,
            cost,
            conversions: 0.0,
            revenue,
        }
    }

    /// Click-through rate, undefined without impressions.
    pub fn ctr(&self) -> Option<f64> {
        ratio(self.clicks, self.impressions)
    }

    /// Cost per click, undefined without clicks.
    pub fn cpc(&self) -> Option<f64> {
        ratio(self.cost, self.clicks)
    }

    /// Conversions per click, undefined without clicks.
    pub fn conversion_rate(&self) -> Option<f64> {
        ratio(self.conversions, self.clicks)
    }

    /// Return on ad spend, undefined without spend.
    pub fn roas(&self) -> Option<f64> {
        ratio(self.revenue, self.cost)
    }

    /// Day of week, 1 = Sunday through 7 = Saturday.
    pub fn day_of_week(&self) -> u32 {
        self.date.weekday().number_from_sunday()
    }

    /// Whether the record falls on a Saturday or Sunday.
    pub fn is_weekend(&self) -> bool {
        matches!(self.day_of_week(), 1 | 7)
    }

    /// Month of year, 1 through 12.
    pub fn month(&self) -> u32 {
        self.date.month()
    }

    /// Whether the record has positive spend (ROAS is defined).
    pub fn has_spend(&self) -> bool {
        self.cost > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: NaiveDate, cost: f64) -> DailyCampaignRecord {
        DailyCampaignRecord::new(date, "c1", "google_ads", 1000.0, 50.0, cost, 400.0)
    }

    #[test]
    fn test_derived_ratios() {
        let r = record(NaiveDate::from_ymd_opt(2024, 11, 6).unwrap(), 100.0);
        assert_eq!(r.ctr(), Some(0.05));
        assert_eq!(r.cpc(), Some(2.0));
        assert_eq!(r.roas(), Some(4.0));
        assert_eq!(r.conversion_rate(), Some(0.0));
    }

    #[test]
    fn test_zero_cost_has_undefined_roas() {
        let r = record(NaiveDate::from_ymd_opt(2024, 11, 6).unwrap(), 0.0);
        assert_eq!(r.roas(), None);
        assert!(!r.has_spend());
    }

    #[test]
    fn test_calendar_fields() {
        // 2024-11-03 is a Sunday, 2024-11-09 a Saturday.
        let sunday = record(NaiveDate::from_ymd_opt(2024, 11, 3).unwrap(), 1.0);
        let wednesday = record(NaiveDate::from_ymd_opt(2024, 11, 6).unwrap(), 1.0);
        let saturday = record(NaiveDate::from_ymd_opt(2024, 11, 9).unwrap(), 1.0);

        assert_eq!(sunday.day_of_week(), 1);
        assert!(sunday.is_weekend());
        assert_eq!(wednesday.day_of_week(), 4);
        assert!(!wednesday.is_weekend());
        assert_eq!(saturday.day_of_week(), 7);
        assert!(saturday.is_weekend());
        assert_eq!(saturday.month(), 11);
    }
}
