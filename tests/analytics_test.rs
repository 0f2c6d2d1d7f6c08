//! End-to-end analytics tests: click events written through storage, read
//! back, and aggregated with a fixed reference "now".

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use waypost::analytics;
use waypost::models::{NewClick, NewLink};
use waypost::storage::{SqliteStorage, Storage};

async fn create_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

// 2024-01-02 was a Tuesday
fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 20, 0, 0).unwrap()
}

struct ClickSpec<'a> {
    ip: &'a str,
    hours_ago: i64,
    referer: Option<&'a str>,
    user_agent: Option<&'a str>,
    country: Option<&'a str>,
    city: Option<&'a str>,
    coords: Option<(f64, f64)>,
}

impl Default for ClickSpec<'_> {
    fn default() -> Self {
        Self {
            ip: "203.0.113.1",
            hours_ago: 1,
            referer: None,
            user_agent: None,
            country: None,
            city: None,
            coords: None,
        }
    }
}

async fn insert_click(storage: &dyn Storage, link_id: i64, spec: ClickSpec<'_>) {
    let timestamp = reference_now().timestamp() - spec.hours_ago * 3600;
    storage
        .insert_click(&NewClick {
            link_id,
            ip_address: spec.ip.to_string(),
            user_agent: spec.user_agent.map(str::to_string),
            referer: spec.referer.map(str::to_string),
            country: spec.country.map(str::to_string),
            country_code: None,
            region: None,
            city: spec.city.map(str::to_string),
            latitude: spec.coords.map(|(lat, _)| lat),
            longitude: spec.coords.map(|(_, lon)| lon),
            timezone: None,
            isp: None,
            timestamp,
        })
        .await
        .unwrap();
}

async fn setup_link(storage: &dyn Storage) -> i64 {
    storage
        .create_link(&NewLink {
            short_code: "stats".to_string(),
            destination_url: "https://example.com/".to_string(),
            title: None,
            description: None,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn full_report_over_stored_events() {
    let storage = create_storage().await;
    let link_id = setup_link(&*storage).await;

    insert_click(
        &*storage,
        link_id,
        ClickSpec {
            ip: "203.0.113.1",
            hours_ago: 1,
            referer: Some("https://news.ycombinator.com/item?id=1"),
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/120.0.0.0 Safari/537.36",
            ),
            country: Some("United Kingdom"),
            city: Some("London"),
            coords: Some((51.5, -0.1)),
        },
    )
    .await;
    insert_click(
        &*storage,
        link_id,
        ClickSpec {
            ip: "203.0.113.2",
            hours_ago: 2,
            referer: Some("https://news.ycombinator.com/"),
            user_agent: Some("Mozilla/5.0 (Linux; Android 14) Chrome/120.0.0.0 Mobile Safari/537.36"),
            country: Some("United Kingdom"),
            city: Some("London"),
            coords: Some((51.5, -0.1)),
        },
    )
    .await;
    insert_click(
        &*storage,
        link_id,
        ClickSpec {
            ip: "203.0.113.1",
            hours_ago: 30,
            country: Some("France"),
            city: Some("Paris"),
            coords: Some((48.85, 2.35)),
            ..Default::default()
        },
    )
    .await;

    let events = storage.clicks_for_link(link_id, None).await.unwrap();
    let now = reference_now();
    let payload = analytics::report(&events, 7, true, now);

    assert_eq!(payload.summary.total_clicks, 3);
    assert_eq!(payload.summary.unique_visitors, 2);
    assert_eq!(payload.summary.top_country.as_deref(), Some("United Kingdom"));
    assert_eq!(payload.summary.top_city.as_deref(), Some("London"));

    assert_eq!(payload.trend.len(), 7);
    assert_eq!(payload.trend.iter().map(|p| p.clicks).sum::<i64>(), 3);

    assert_eq!(payload.top_referrers[0].referrer, "news.ycombinator.com");
    assert_eq!(payload.top_referrers[0].clicks, 2);

    let advanced = payload.advanced.expect("advanced sections requested");
    assert_eq!(advanced.hourly.len(), 24);
    assert_eq!(advanced.hourly.iter().map(|b| b.clicks).sum::<i64>(), 3);
    assert_eq!(advanced.weekly.len(), 7);
    assert_eq!(advanced.weekly.iter().map(|b| b.clicks).sum::<i64>(), 3);

    // Two London clicks share exact coordinates, one Paris click does not
    assert_eq!(advanced.geography.len(), 2);
    let london = advanced
        .geography
        .iter()
        .find(|p| p.latitude == 51.5)
        .unwrap();
    assert_eq!(london.clicks, 2);
    assert_eq!(london.percentage, 66.67);

    let browsers = &advanced.devices.browsers;
    assert_eq!(browsers[0].name, "Chrome");
    assert_eq!(browsers[0].clicks, 2);
    let devices = &advanced.devices.devices;
    assert!(devices.iter().any(|d| d.name == "Mobile" && d.clicks == 1));
    assert!(devices.iter().any(|d| d.name == "Desktop" && d.clicks == 1));
}

#[tokio::test]
async fn aggregation_is_idempotent_over_a_snapshot() {
    let storage = create_storage().await;
    let link_id = setup_link(&*storage).await;

    for i in 0..4 {
        insert_click(
            &*storage,
            link_id,
            ClickSpec {
                hours_ago: i,
                ..Default::default()
            },
        )
        .await;
    }

    let events = storage.clicks_for_link(link_id, None).await.unwrap();
    let now = reference_now();
    let first = serde_json::to_value(analytics::report(&events, 30, true, now)).unwrap();
    let second = serde_json::to_value(analytics::report(&events, 30, true, now)).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn sentinel_locations_stay_out_of_geography() {
    let storage = create_storage().await;
    let link_id = setup_link(&*storage).await;

    // Unknown sentinel: no coordinates at all
    insert_click(
        &*storage,
        link_id,
        ClickSpec {
            country: Some("Unknown"),
            city: Some("Unknown"),
            ..Default::default()
        },
    )
    .await;
    // Zero/zero is "no location"
    insert_click(
        &*storage,
        link_id,
        ClickSpec {
            coords: Some((0.0, 0.0)),
            ..Default::default()
        },
    )
    .await;

    let events = storage.clicks_for_link(link_id, None).await.unwrap();
    let payload = analytics::report(&events, 7, true, reference_now());
    assert!(payload.advanced.unwrap().geography.is_empty());
    // They still count toward totals
    assert_eq!(payload.summary.total_clicks, 2);
}
