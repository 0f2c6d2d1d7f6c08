//! The tracking pipeline: resolve a short code, hand back the redirect
//! target, and record the visit off the response path.

use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::geo::GeoResolver;
use crate::models::NewClick;
use crate::storage::Storage;

/// Outcome of a tracked visit, as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitOutcome {
    /// Redirect to the destination URL
    Redirect(String),
    /// No link with that code
    NotFound,
    /// Link exists but has been deactivated
    Gone,
}

/// Request-side context captured for the click record.
#[derive(Debug, Clone)]
pub struct VisitContext {
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

pub struct Tracker {
    storage: Arc<dyn Storage>,
    resolver: Arc<GeoResolver>,
}

impl Tracker {
    pub fn new(storage: Arc<dyn Storage>, resolver: Arc<GeoResolver>) -> Self {
        Self { storage, resolver }
    }

    /// Resolve a visit and detach the recording branch.
    ///
    /// Returns as soon as the link is resolved; the geolocation lookup and
    /// click append run in a spawned task whose failure is logged, never
    /// surfaced, never retried. Inactive links record nothing.
    pub async fn handle_visit(&self, code: &str, ctx: VisitContext) -> Result<VisitOutcome> {
        let link = match self.storage.get_link_by_code(code).await? {
            None => return Ok(VisitOutcome::NotFound),
            Some(link) => link,
        };
        if !link.is_active {
            return Ok(VisitOutcome::Gone);
        }

        let storage = Arc::clone(&self.storage);
        let resolver = Arc::clone(&self.resolver);
        let link_id = link.id;
        let code = code.to_string();
        tokio::spawn(async move {
            if let Err(err) = record_visit(&*storage, &resolver, link_id, ctx).await {
                warn!(short_code = %code, error = %err, "failed to record visit");
            }
        });

        Ok(VisitOutcome::Redirect(link.destination_url))
    }

    /// Synchronous variant for the API-invoked track endpoint: the click is
    /// recorded before this returns.
    pub async fn track_visit(&self, code: &str, ctx: VisitContext) -> Result<VisitOutcome> {
        let link = match self.storage.get_link_by_code(code).await? {
            None => return Ok(VisitOutcome::NotFound),
            Some(link) => link,
        };
        if !link.is_active {
            return Ok(VisitOutcome::Gone);
        }

        record_visit(&*self.storage, &self.resolver, link.id, ctx).await?;
        Ok(VisitOutcome::Redirect(link.destination_url))
    }
}

/// Recording branch: geolocation, click append, counter increment.
///
/// The counter increment and the click append are two separate writes with
/// no transaction between them; the click log is the authoritative count.
async fn record_visit(
    storage: &dyn Storage,
    resolver: &GeoResolver,
    link_id: i64,
    ctx: VisitContext,
) -> Result<()> {
    let lookup = resolver.resolve(&ctx.ip_address).await;
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs() as i64;

    let click = NewClick {
        link_id,
        ip_address: ctx.ip_address,
        user_agent: ctx.user_agent,
        referer: ctx.referer,
        country: lookup.country,
        country_code: lookup.country_code,
        region: lookup.region,
        city: lookup.city,
        latitude: lookup.latitude,
        longitude: lookup.longitude,
        timezone: lookup.timezone,
        isp: lookup.isp,
        timestamp,
    };

    storage.insert_click(&click).await?;
    storage.increment_clicks(link_id).await?;
    Ok(())
}
