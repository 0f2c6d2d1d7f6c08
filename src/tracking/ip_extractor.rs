//! Client IP extraction from HTTP headers.
//!
//! Headers are consulted in a fixed priority order: `x-forwarded-for`
//! (first hop only), `x-real-ip`, `cf-connecting-ip`, `x-client-ip`.
//! When none yields a value the development-default loopback address
//! is used so a visit can always be recorded.

use axum::http::HeaderMap;

const FALLBACK_IP: &str = "127.0.0.1";

pub fn extract_client_ip(headers: &HeaderMap) -> String {
    if let Some(ip) = extract_forwarded_for(headers) {
        return ip;
    }

    for name in ["x-real-ip", "cf-connecting-ip", "x-client-ip"] {
        if let Some(ip) = header_value(headers, name) {
            return ip;
        }
    }

    FALLBACK_IP.to_string()
}

/// First hop of a comma-separated X-Forwarded-For chain.
fn extract_forwarded_for(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    if first.is_empty() {
        return None;
    }
    Some(first.to_string())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}
