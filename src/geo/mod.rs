//! Best-effort IP geolocation.
//!
//! The resolver never fails: private and unparseable addresses short-circuit,
//! a call-budget guard caps external provider traffic, and every error path
//! degrades to a sentinel lookup so the tracking pipeline is never blocked.

pub mod budget;
pub mod providers;
pub mod resolver;

pub use budget::CallBudget;
pub use providers::{GeoProvider, IpApiProvider, IpWhoIsProvider};
pub use resolver::GeoResolver;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoStatus {
    Success,
    PrivateIp,
    Unknown,
}

/// Transient geolocation result, folded into a click event at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoLookup {
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub isp: Option<String>,
    pub status: GeoStatus,
}

impl GeoLookup {
    pub fn private_ip() -> Self {
        Self {
            country: Some("Private Network".to_string()),
            country_code: None,
            region: None,
            city: Some("Local".to_string()),
            latitude: None,
            longitude: None,
            timezone: None,
            isp: None,
            status: GeoStatus::PrivateIp,
        }
    }

    pub fn unknown() -> Self {
        Self {
            country: Some("Unknown".to_string()),
            country_code: None,
            region: None,
            city: Some("Unknown".to_string()),
            latitude: None,
            longitude: None,
            timezone: None,
            isp: None,
            status: GeoStatus::Unknown,
        }
    }
}
