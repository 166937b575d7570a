//! Conversion between campaign records and polars frames.
//!
//! The raw frame carries one row per record with the columns
//! `[date, campaign_id, campaign_name, channel, impressions, clicks, cost,
//! conversions, revenue, ctr, cpc, conversion_rate, roas, day_of_week,
//! is_weekend, month]`. Undefined ratios are nulls. Numeric columns are
//! `Float64` so downstream stages can treat every feature uniformly.

use crate::error::{DataError, Result};
use crate::record::DailyCampaignRecord;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

/// Days between 0001-01-01 (day 1 of the common era) and 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Convert a calendar date to days since the Unix epoch.
pub fn date_to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

/// Convert days since the Unix epoch back to a calendar date.
pub fn epoch_days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + EPOCH_DAYS_FROM_CE)
}

/// Build the raw frame from records, preserving input order.
pub fn records_to_frame(records: &[DailyCampaignRecord]) -> Result<DataFrame> {
    let dates: Vec<i32> = records.iter().map(|r| date_to_epoch_days(r.date)).collect();
    let campaign_ids: Vec<&str> = records.iter().map(|r| r.campaign_id.as_str()).collect();
    let campaign_names: Vec<&str> = records.iter().map(|r| r.campaign_name.as_str()).collect();
    let channels: Vec<&str> = records.iter().map(|r| r.channel.as_str()).collect();

    let date_series = Series::new("date".into(), dates).cast(&DataType::Date)?;

    let df = DataFrame::new(vec![
        date_series.into(),
        Series::new("campaign_id".into(), campaign_ids).into(),
        Series::new("campaign_name".into(), campaign_names).into(),
        Series::new("channel".into(), channels).into(),
        Series::new("impressions".into(), float_column(records, |r| r.impressions)).into(),
        Series::new("clicks".into(), float_column(records, |r| r.clicks)).into(),
        Series::new("cost".into(), float_column(records, |r| r.cost)).into(),
        Series::new("conversions".into(), float_column(records, |r| r.conversions)).into(),
        Series::new("revenue".into(), float_column(records, |r| r.revenue)).into(),
        Series::new("ctr".into(), optional_column(records, DailyCampaignRecord::ctr)).into(),
        Series::new("cpc".into(), optional_column(records, DailyCampaignRecord::cpc)).into(),
        Series::new(
            "conversion_rate".into(),
            optional_column(records, DailyCampaignRecord::conversion_rate),
        )
        .into(),
        Series::new("roas".into(), optional_column(records, DailyCampaignRecord::roas)).into(),
        Series::new("day_of_week".into(), float_column(records, |r| f64::from(r.day_of_week()))).into(),
        Series::new(
            "is_weekend".into(),
            float_column(records, |r| if r.is_weekend() { 1.0 } else { 0.0 }),
        )
        .into(),
        Series::new("month".into(), float_column(records, |r| f64::from(r.month()))).into(),
    ])?;

    Ok(df)
}

fn float_column<F>(records: &[DailyCampaignRecord], f: F) -> Vec<f64>
where
    F: Fn(&DailyCampaignRecord) -> f64,
{
    records.iter().map(f).collect()
}

fn optional_column<F>(records: &[DailyCampaignRecord], f: F) -> Vec<Option<f64>>
where
    F: Fn(&DailyCampaignRecord) -> Option<f64>,
{
    records.iter().map(f).collect()
}

/// Read the `date` column of a frame back into calendar dates.
pub fn frame_dates(df: &DataFrame) -> Result<Vec<NaiveDate>> {
    let days = df.column("date")?.cast(&DataType::Int32)?;
    let days = days.i32()?;

    days.into_iter()
        .map(|day| {
            day.and_then(epoch_days_to_date)
                .ok_or_else(|| DataError::Parse("Missing or invalid date".to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<DailyCampaignRecord> {
        vec![
            DailyCampaignRecord::new(
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                "c1",
                "google_ads",
                1000.0,
                20.0,
                50.0,
                150.0,
            ),
            DailyCampaignRecord::new(
                NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                "c2",
                "meta_ads",
                0.0,
                0.0,
                10.0,
                0.0,
            ),
        ]
    }

    #[test]
    fn test_epoch_days() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(date_to_epoch_days(epoch), 0);
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(epoch_days_to_date(date_to_epoch_days(date)), Some(date));
    }

    #[test]
    fn test_records_to_frame_shape() {
        let df = records_to_frame(&sample()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 16);
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn test_undefined_ratios_are_null() {
        let df = records_to_frame(&sample()).unwrap();
        let ctr = df.column("ctr").unwrap().f64().unwrap();
        assert_eq!(ctr.get(0), Some(0.02));
        assert_eq!(ctr.get(1), None);

        let roas = df.column("roas").unwrap().f64().unwrap();
        assert_eq!(roas.get(0), Some(3.0));
        assert_eq!(roas.get(1), Some(0.0));
    }

    #[test]
    fn test_frame_dates_round_trip() {
        let records = sample();
        let df = records_to_frame(&records).unwrap();
        let dates = frame_dates(&df).unwrap();
        assert_eq!(dates, vec![records[0].date, records[1].date]);
    }

    #[test]
    fn test_empty_frame() {
        let df = records_to_frame(&[]).unwrap();
        assert_eq!(df.height(), 0);
        assert!(frame_dates(&df).unwrap().is_empty());
    }
}
