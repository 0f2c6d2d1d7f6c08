//! View types for the analytics report. All derived on demand, never persisted.

use serde::Serialize;

/// One calendar day in the trend series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// UTC calendar day, `YYYY-MM-DD`
    pub date: String,
    pub clicks: i64,
}

/// One of 24 hour-of-day buckets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourBucket {
    pub hour: u32,
    pub clicks: i64,
}

/// One of 7 day-of-week buckets, Sunday = 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayBucket {
    pub day: u32,
    pub label: String,
    pub clicks: i64,
}

/// A cluster of clicks at one exact coordinate pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
    pub city: Option<String>,
    pub clicks: i64,
    /// Share of the located total, rounded to 2 decimals
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferrerCount {
    pub referrer: String,
    pub clicks: i64,
    pub percentage: f64,
}

/// A single label on one classification axis (browser, device, or OS).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisCount {
    pub name: String,
    pub clicks: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceBreakdown {
    pub browsers: Vec<AxisCount>,
    pub devices: Vec<AxisCount>,
    pub operating_systems: Vec<AxisCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_clicks: i64,
    pub unique_visitors: i64,
    pub avg_clicks_per_day: f64,
    /// Trailing-24h clicks divided by 24
    pub clicks_per_hour: f64,
    pub top_country: Option<String>,
    pub top_city: Option<String>,
    pub peak_hour: u32,
    pub peak_day: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvancedReport {
    pub hourly: Vec<HourBucket>,
    pub weekly: Vec<WeekdayBucket>,
    pub geography: Vec<GeoPoint>,
    pub devices: DeviceBreakdown,
}

/// Full analytics payload for one link.
#[derive(Debug, Clone, Serialize)]
pub struct LinkAnalytics {
    pub summary: Summary,
    pub trend: Vec<TrendPoint>,
    pub top_referrers: Vec<ReferrerCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced: Option<AdvancedReport>,
}
