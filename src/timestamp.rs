//! Conversion of each source's native timestamp encoding into one canonical
//! local-time string.
//!
//! All functions are total: anything that cannot be represented comes back as
//! [`UNKNOWN`] instead of an error.

use chrono::{DateTime, Local, Months, TimeZone, Utc};

/// Sentinel rendered for zero, missing or unrepresentable timestamps.
pub const UNKNOWN: &str = "Unknown";

/// Canonical output format.
pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Seconds between 1601-01-01 (WebKit/Chrome epoch) and the unix epoch.
pub const WEBKIT_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// Unix time of 2001-01-01T00:00:00Z, the Apple reference epoch.
pub const APPLE_EPOCH_UNIX_SECS: i64 = 978_307_200;

/// The mail index stores dates shifted back by 31 calendar years.
const MAIL_OFFSET: Months = Months::new(31 * 12);

/// Render unix seconds (+ nanos) as local time.
pub fn format_local(unix_secs: i64, nanos: u32) -> Option<String> {
    Local
        .timestamp_opt(unix_secs, nanos)
        .earliest()
        .map(|dt| dt.format(FORMAT).to_string())
}

fn or_unknown(rendered: Option<String>) -> String {
    rendered.unwrap_or_else(|| UNKNOWN.to_string())
}

/// Browser history: microseconds since 1601-01-01.
pub fn from_webkit_micros(value: i64) -> String {
    if value == 0 {
        return UNKNOWN.to_string();
    }
    let secs = value.div_euclid(1_000_000);
    let nanos = (value.rem_euclid(1_000_000) * 1_000) as u32;
    let unix = secs.checked_sub(WEBKIT_EPOCH_OFFSET_SECS);
    or_unknown(unix.and_then(|unix| format_local(unix, nanos)))
}

/// Messaging database: nanoseconds since 2001-01-01.
pub fn from_apple_nanos(value: i64) -> String {
    if value == 0 {
        return UNKNOWN.to_string();
    }
    let secs = value.div_euclid(1_000_000_000);
    let nanos = value.rem_euclid(1_000_000_000) as u32;
    let unix = APPLE_EPOCH_UNIX_SECS.checked_add(secs);
    or_unknown(unix.and_then(|unix| format_local(unix, nanos)))
}

/// Mail index: unix seconds that must be moved forward by the 31-year offset.
pub fn from_mail_date_sent(value: Option<i64>) -> String {
    let shifted: Option<DateTime<Utc>> = value
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .and_then(|dt| dt.checked_add_months(MAIL_OFFSET));
    or_unknown(shifted.map(|dt| dt.with_timezone(&Local).format(FORMAT).to_string()))
}

/// Calendar cache: seconds since 2001-01-01. Zero is a real date here.
pub fn from_apple_seconds(value: Option<f64>) -> String {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return UNKNOWN.to_string();
    };
    // beyond chrono's range anyway
    if value.abs() > 1e15 {
        return UNKNOWN.to_string();
    }
    let secs = value.floor() as i64;
    let nanos = ((value - value.floor()) * 1e9) as u32;
    let unix = APPLE_EPOCH_UNIX_SECS.checked_add(secs);
    or_unknown(unix.and_then(|unix| format_local(unix, nanos)))
}

/// Chat export: plain unix seconds.
pub fn from_unix_seconds(value: i64) -> String {
    if value == 0 {
        return UNKNOWN.to_string();
    }
    or_unknown(format_local(value, 0))
}
