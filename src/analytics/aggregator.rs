//! Pure aggregation over a click log.
//!
//! Every function takes the event collection and a reference `now` and
//! computes its view from scratch; calling twice with the same snapshot
//! yields identical output.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

use crate::analytics::models::{
    AdvancedReport, AxisCount, DeviceBreakdown, GeoPoint, HourBucket, LinkAnalytics,
    ReferrerCount, Summary, TrendPoint, WeekdayBucket,
};
use crate::analytics::user_agent::{classify_browser, classify_device, classify_os};
use crate::models::ClickEvent;

pub const DEFAULT_REFERRER_LIMIT: usize = 10;

const WEEKDAY_LABELS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const RAW_REFERRER_CAP: usize = 50;
const DIRECT_LABEL: &str = "Direct";

/// Round half-up to 2 decimal places on the scaled value.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn event_time(event: &ClickEvent) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(event.timestamp, 0)
}

/// One zero-filled point per UTC calendar day for a window of `days` days
/// ending at `now`, ordered oldest to newest.
pub fn daily_trend(events: &[ClickEvent], days: i64, now: DateTime<Utc>) -> Vec<TrendPoint> {
    let mut by_day: HashMap<chrono::NaiveDate, i64> = HashMap::new();
    for event in events {
        if let Some(time) = event_time(event) {
            *by_day.entry(time.date_naive()).or_insert(0) += 1;
        }
    }

    let today = now.date_naive();
    (0..days)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            TrendPoint {
                date: date.format("%Y-%m-%d").to_string(),
                clicks: by_day.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}

/// Dense 24-bucket histogram by UTC hour-of-day.
pub fn hourly_distribution(events: &[ClickEvent]) -> Vec<HourBucket> {
    let mut buckets = [0i64; 24];
    for event in events {
        if let Some(time) = event_time(event) {
            buckets[time.hour() as usize] += 1;
        }
    }
    buckets
        .iter()
        .enumerate()
        .map(|(hour, &clicks)| HourBucket {
            hour: hour as u32,
            clicks,
        })
        .collect()
}

/// Dense 7-bucket histogram by day of week, Sunday = 0.
pub fn weekly_distribution(events: &[ClickEvent]) -> Vec<WeekdayBucket> {
    let mut buckets = [0i64; 7];
    for event in events {
        if let Some(time) = event_time(event) {
            buckets[time.weekday().num_days_from_sunday() as usize] += 1;
        }
    }
    buckets
        .iter()
        .enumerate()
        .map(|(day, &clicks)| WeekdayBucket {
            day: day as u32,
            label: WEEKDAY_LABELS[day].to_string(),
            clicks,
        })
        .collect()
}

fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    if latitude == 0.0 && longitude == 0.0 {
        return false;
    }
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}

/// Clusters keyed by the exact coordinate pair. A city spanning multiple
/// reported coordinates yields multiple points. Percentages are of the
/// located total.
pub fn geo_distribution(events: &[ClickEvent]) -> Vec<GeoPoint> {
    let mut index: HashMap<(u64, u64), usize> = HashMap::new();
    let mut points: Vec<GeoPoint> = Vec::new();

    for event in events {
        let (lat, lon) = match (event.latitude, event.longitude) {
            (Some(lat), Some(lon)) if is_valid_coordinate(lat, lon) => (lat, lon),
            _ => continue,
        };
        let key = (lat.to_bits(), lon.to_bits());
        match index.get(&key) {
            Some(&i) => points[i].clicks += 1,
            None => {
                index.insert(key, points.len());
                points.push(GeoPoint {
                    latitude: lat,
                    longitude: lon,
                    country: event.country.clone(),
                    city: event.city.clone(),
                    clicks: 1,
                    percentage: 0.0,
                });
            }
        }
    }

    let total: i64 = points.iter().map(|p| p.clicks).sum();
    if total > 0 {
        for point in &mut points {
            point.percentage = round2(point.clicks as f64 / total as f64 * 100.0);
        }
    }
    points
}

fn referrer_label(referer: Option<&str>) -> String {
    let raw = match referer {
        Some(raw) if !raw.trim().is_empty() => raw.trim(),
        _ => return DIRECT_LABEL.to_string(),
    };
    match url::Url::parse(raw) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => host.to_string(),
            None => truncate_raw(raw),
        },
        Err(_) => truncate_raw(raw),
    }
}

fn truncate_raw(raw: &str) -> String {
    if raw.chars().count() <= RAW_REFERRER_CAP {
        return raw.to_string();
    }
    let truncated: String = raw.chars().take(RAW_REFERRER_CAP).collect();
    format!("{truncated}...")
}

/// Referrer hosts sorted descending by count, ties kept in first-encountered
/// order, truncated to `limit`.
pub fn top_referrers(events: &[ClickEvent], limit: usize) -> Vec<ReferrerCount> {
    let total = events.len() as i64;
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<ReferrerCount> = Vec::new();

    for event in events {
        let label = referrer_label(event.referer.as_deref());
        match index.get(&label) {
            Some(&i) => counts[i].clicks += 1,
            None => {
                index.insert(label.clone(), counts.len());
                counts.push(ReferrerCount {
                    referrer: label,
                    clicks: 1,
                    percentage: 0.0,
                });
            }
        }
    }

    // Stable sort keeps first-encountered order within equal counts
    counts.sort_by(|a, b| b.clicks.cmp(&a.clicks));
    counts.truncate(limit);
    if total > 0 {
        for entry in &mut counts {
            entry.percentage = round2(entry.clicks as f64 / total as f64 * 100.0);
        }
    }
    counts
}

fn axis_counts<F>(events: &[ClickEvent], classify: F) -> Vec<AxisCount>
where
    F: Fn(Option<&str>) -> &'static str,
{
    let mut index: HashMap<&'static str, usize> = HashMap::new();
    let mut counts: Vec<AxisCount> = Vec::new();
    for event in events {
        let name = classify(event.user_agent.as_deref());
        match index.get(name) {
            Some(&i) => counts[i].clicks += 1,
            None => {
                index.insert(name, counts.len());
                counts.push(AxisCount {
                    name: name.to_string(),
                    clicks: 1,
                });
            }
        }
    }
    counts.sort_by(|a, b| b.clicks.cmp(&a.clicks));
    counts
}

pub fn device_breakdown(events: &[ClickEvent]) -> DeviceBreakdown {
    DeviceBreakdown {
        browsers: axis_counts(events, classify_browser),
        devices: axis_counts(events, classify_device),
        operating_systems: axis_counts(events, classify_os),
    }
}

/// First-encountered maximum among present, non-empty values.
fn top_value<'a, I>(values: I) -> Option<String>
where
    I: Iterator<Item = Option<&'a str>>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut counts: Vec<(&'a str, i64)> = Vec::new();
    for value in values.flatten() {
        if value.is_empty() {
            continue;
        }
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }
    let mut best: Option<(&str, i64)> = None;
    for (value, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(value, _)| value.to_string())
}

/// Index of the first maximum in iteration order.
fn peak_index(counts: impl Iterator<Item = i64>) -> usize {
    let mut best_index = 0;
    let mut best = i64::MIN;
    for (i, count) in counts.enumerate() {
        if count > best {
            best = count;
            best_index = i;
        }
    }
    best_index
}

pub fn summary(events: &[ClickEvent], now: DateTime<Utc>) -> Summary {
    let total = events.len() as i64;

    let unique: HashSet<&str> = events.iter().map(|e| e.ip_address.as_str()).collect();

    let avg_clicks_per_day = if total == 0 {
        0.0
    } else {
        let oldest = events.iter().map(|e| e.timestamp).min().unwrap_or(0);
        let span_days = match DateTime::from_timestamp(oldest, 0) {
            Some(oldest_time) => (now - oldest_time).num_days().max(1),
            None => 1,
        };
        round2(total as f64 / span_days as f64)
    };

    let day_ago = now.timestamp() - 24 * 3600;
    let last_24h = events.iter().filter(|e| e.timestamp >= day_ago).count();
    let clicks_per_hour = round2(last_24h as f64 / 24.0);

    let hourly = hourly_distribution(events);
    let weekly = weekly_distribution(events);
    let peak_hour = peak_index(hourly.iter().map(|b| b.clicks)) as u32;
    let peak_day = WEEKDAY_LABELS[peak_index(weekly.iter().map(|b| b.clicks))].to_string();

    Summary {
        total_clicks: total,
        unique_visitors: unique.len() as i64,
        avg_clicks_per_day,
        clicks_per_hour,
        top_country: top_value(events.iter().map(|e| e.country.as_deref())),
        top_city: top_value(events.iter().map(|e| e.city.as_deref())),
        peak_hour,
        peak_day,
    }
}

/// Assemble the full report. `advanced` adds the hourly/weekly/geography/
/// device sections to the base summary + trend + referrers payload.
pub fn report(
    events: &[ClickEvent],
    days: i64,
    advanced: bool,
    now: DateTime<Utc>,
) -> LinkAnalytics {
    LinkAnalytics {
        summary: summary(events, now),
        trend: daily_trend(events, days, now),
        top_referrers: top_referrers(events, DEFAULT_REFERRER_LIMIT),
        advanced: advanced.then(|| AdvancedReport {
            hourly: hourly_distribution(events),
            weekly: weekly_distribution(events),
            geography: geo_distribution(events),
            devices: device_breakdown(events),
        }),
    }
}
