//! Click-log analytics.
//!
//! Everything here is a pure function of a click-event collection plus a
//! reference "now" timestamp: no side effects, no storage access, identical
//! output for identical input. Calendar derivations use UTC throughout.

pub mod aggregator;
pub mod models;
pub mod user_agent;

pub use aggregator::{
    daily_trend, device_breakdown, geo_distribution, hourly_distribution, report, summary,
    top_referrers, weekly_distribution,
};
pub use models::{
    AdvancedReport, AxisCount, DeviceBreakdown, GeoPoint, HourBucket, LinkAnalytics,
    ReferrerCount, Summary, TrendPoint, WeekdayBucket,
};
