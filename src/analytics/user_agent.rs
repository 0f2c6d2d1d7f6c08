//! Fixed-vocabulary user-agent classification.
//!
//! Case-insensitive substring matching in a fixed priority order per axis.
//! Edge and Opera ship a "Chrome" token and must match first; Safari only
//! counts when "Chrome" is absent; Android UAs contain "Linux" so Android
//! is checked before it.

pub const UNKNOWN: &str = "Unknown";

pub fn classify_browser(user_agent: Option<&str>) -> &'static str {
    let ua = match user_agent {
        Some(ua) => ua.to_lowercase(),
        None => return UNKNOWN,
    };
    if ua.contains("edg") {
        "Edge"
    } else if ua.contains("opr") || ua.contains("opera") {
        "Opera"
    } else if ua.contains("chrome") {
        "Chrome"
    } else if ua.contains("firefox") {
        "Firefox"
    } else if ua.contains("safari") {
        "Safari"
    } else {
        UNKNOWN
    }
}

pub fn classify_device(user_agent: Option<&str>) -> &'static str {
    let ua = match user_agent {
        Some(ua) => ua.to_lowercase(),
        None => return UNKNOWN,
    };
    if ua.contains("ipad") || ua.contains("tablet") {
        "Tablet"
    } else if ua.contains("mobile") || ua.contains("iphone") || ua.contains("android") {
        "Mobile"
    } else {
        "Desktop"
    }
}

pub fn classify_os(user_agent: Option<&str>) -> &'static str {
    let ua = match user_agent {
        Some(ua) => ua.to_lowercase(),
        None => return UNKNOWN,
    };
    if ua.contains("android") {
        "Android"
    } else if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ipod") {
        "iOS"
    } else if ua.contains("windows") {
        "Windows"
    } else if ua.contains("mac os") || ua.contains("macintosh") {
        "macOS"
    } else if ua.contains("linux") {
        "Linux"
    } else {
        UNKNOWN
    }
}
