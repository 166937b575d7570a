//! Marketing ratio helpers.
//!
//! Every ratio is undefined (`None`) when its denominator is zero, never zero
//! or infinite. The `calc_*` functions round for reporting; [`ratio`] is the
//! unrounded form used when deriving dataset columns.

/// Divide `numerator` by `denominator`, returning `None` for a zero or
/// non-finite denominator.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !denominator.is_finite() {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Click-through rate: clicks / impressions.
pub fn calc_ctr(clicks: f64, impressions: f64) -> Option<f64> {
    ratio(clicks, impressions).map(|v| round_to(v, 6))
}

/// Cost per click: cost / clicks.
pub fn calc_cpc(cost: f64, clicks: f64) -> Option<f64> {
    ratio(cost, clicks).map(|v| round_to(v, 4))
}

/// Cost per acquisition: cost / conversions.
pub fn calc_cpa(cost: f64, conversions: f64) -> Option<f64> {
    ratio(cost, conversions).map(|v| round_to(v, 4))
}

/// Return on ad spend: revenue / cost.
pub fn calc_roas(revenue: f64, cost: f64) -> Option<f64> {
    ratio(revenue, cost).map(|v| round_to(v, 4))
}

/// Cost per thousand impressions.
pub fn calc_cpm(cost: f64, impressions: f64) -> Option<f64> {
    ratio(cost, impressions).map(|v| round_to(v * 1000.0, 4))
}
