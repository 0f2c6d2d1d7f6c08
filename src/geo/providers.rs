//! External geolocation providers, normalized into [`GeoLookup`].

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::geo::{GeoLookup, GeoStatus};

#[async_trait]
pub trait GeoProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch and normalize a lookup for `ip`. Any transport error,
    /// non-success HTTP status, or provider-reported failure is an `Err`
    /// so the resolver can fall through to the next provider.
    async fn fetch(&self, client: &reqwest::Client, ip: &str) -> Result<GeoLookup>;
}

/// Primary provider: ip-api.com free tier.
pub struct IpApiProvider;

#[derive(Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    country: Option<String>,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
    city: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    timezone: Option<String>,
    isp: Option<String>,
}

#[async_trait]
impl GeoProvider for IpApiProvider {
    fn name(&self) -> &'static str {
        "ip-api.com"
    }

    async fn fetch(&self, client: &reqwest::Client, ip: &str) -> Result<GeoLookup> {
        let url = format!(
            "http://ip-api.com/json/{ip}?fields=status,message,country,countryCode,regionName,city,lat,lon,timezone,isp"
        );
        let response = client.get(&url).send().await?.error_for_status()?;
        let body: IpApiResponse = response.json().await?;

        if body.status != "success" {
            bail!(
                "provider reported failure: {}",
                body.message.unwrap_or_else(|| "no message".to_string())
            );
        }

        Ok(GeoLookup {
            country: body.country,
            country_code: body.country_code,
            region: body.region_name,
            city: body.city,
            latitude: body.lat,
            longitude: body.lon,
            timezone: body.timezone,
            isp: body.isp,
            status: GeoStatus::Success,
        })
    }
}

/// Secondary provider: ipwho.is.
pub struct IpWhoIsProvider;

#[derive(Deserialize)]
struct IpWhoIsResponse {
    success: bool,
    message: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
    region: Option<String>,
    city: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    timezone: Option<IpWhoIsTimezone>,
    connection: Option<IpWhoIsConnection>,
}

#[derive(Deserialize)]
struct IpWhoIsTimezone {
    id: Option<String>,
}

#[derive(Deserialize)]
struct IpWhoIsConnection {
    isp: Option<String>,
}

#[async_trait]
impl GeoProvider for IpWhoIsProvider {
    fn name(&self) -> &'static str {
        "ipwho.is"
    }

    async fn fetch(&self, client: &reqwest::Client, ip: &str) -> Result<GeoLookup> {
        let url = format!("https://ipwho.is/{ip}");
        let response = client.get(&url).send().await?.error_for_status()?;
        let body: IpWhoIsResponse = response.json().await?;

        if !body.success {
            bail!(
                "provider reported failure: {}",
                body.message.unwrap_or_else(|| "no message".to_string())
            );
        }

        Ok(GeoLookup {
            country: body.country,
            country_code: body.country_code,
            region: body.region,
            city: body.city,
            latitude: body.latitude,
            longitude: body.longitude,
            timezone: body.timezone.and_then(|t| t.id),
            isp: body.connection.and_then(|c| c.isp),
            status: GeoStatus::Success,
        })
    }
}
