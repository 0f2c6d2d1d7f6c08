use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::config::GeoConfig;
use crate::geo::{CallBudget, GeoLookup, GeoProvider, IpApiProvider, IpWhoIsProvider};

/// Best-effort geolocation resolver.
///
/// Tries an ordered chain of providers, each with the shared bounded-timeout
/// client. Private and unparseable addresses short-circuit without an
/// external call; an exhausted call budget or a fully failed chain degrades
/// to the unknown sentinel. `resolve` never returns an error.
pub struct GeoResolver {
    client: reqwest::Client,
    providers: Vec<Box<dyn GeoProvider>>,
    budget: CallBudget,
}

impl GeoResolver {
    pub fn new(config: &GeoConfig) -> Self {
        let budget = CallBudget::new(
            config.call_budget,
            Duration::from_secs(config.budget_window_secs),
        );
        Self::with_providers(
            vec![Box::new(IpApiProvider), Box::new(IpWhoIsProvider)],
            budget,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Explicit chain and budget, used by tests to avoid the live providers.
    pub fn with_providers(
        providers: Vec<Box<dyn GeoProvider>>,
        budget: CallBudget,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            providers,
            budget,
        }
    }

    pub async fn resolve(&self, ip: &str) -> GeoLookup {
        if is_private_ip(ip) {
            return GeoLookup::private_ip();
        }

        // Budget is consumed before the attempt; a failed call still burns it
        if !self.budget.try_consume() {
            debug!(ip, "geolocation call budget exhausted, skipping lookup");
            return GeoLookup::unknown();
        }

        for provider in &self.providers {
            match provider.fetch(&self.client, ip).await {
                Ok(lookup) => return lookup,
                Err(err) => {
                    debug!(ip, provider = provider.name(), error = %err, "geolocation provider failed");
                }
            }
        }

        GeoLookup::unknown()
    }
}

/// Addresses that must never be sent to a public geolocation API:
/// loopback, link-local, private ranges, and IPv6 special addresses.
/// Unparseable input is treated the same way.
pub fn is_private_ip(ip_str: &str) -> bool {
    // Strip IPv6-mapped IPv4 prefix: "::ffff:1.2.3.4" -> "1.2.3.4"
    let ip_str = ip_str.strip_prefix("::ffff:").unwrap_or(ip_str);

    match IpAddr::from_str(ip_str) {
        Ok(IpAddr::V4(addr)) => {
            let octets = addr.octets();
            addr.is_loopback()
                || addr.is_link_local()
                || addr.is_unspecified()
                || addr.is_broadcast()
                || octets[0] == 10
                || (octets[0] == 172 && (16..=31).contains(&octets[1]))
                || (octets[0] == 192 && octets[1] == 168)
        }
        Ok(IpAddr::V6(addr)) => {
            addr.is_loopback()
                || addr.is_unspecified()
                // fe80::/10 link-local
                || (addr.segments()[0] & 0xffc0) == 0xfe80
                // fc00::/7 unique-local
                || (addr.segments()[0] & 0xfe00) == 0xfc00
        }
        Err(_) => true,
    }
}
