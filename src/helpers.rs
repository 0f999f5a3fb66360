//! Helper functions shared by adapters and the transport
//!
//! - Date normalization to ISO-8601
//! - Localized string selection
//! - Proxy URL wrapping and query-string parsing
//!
//! # Examples
//!
//! ```
//! use manga_extensions::helpers::{format_date, proxied_url};
//!
//! assert_eq!(
//!     format_date("2024-03-01T10:00:00+02:00").as_deref(),
//!     Some("2024-03-01T08:00:00.000Z")
//! );
//! assert_eq!(
//!     proxied_url("https://a.b/c?d=1", Some("https://proxy/?u=")),
//!     "https://proxy/?u=https%3A%2F%2Fa.b%2Fc%3Fd%3D1"
//! );
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use reqwest::Url;
use serde_json::Value;
use std::collections::HashMap;

/// Normalize a timestamp to UTC ISO-8601 with millisecond precision.
/// Returns `None` for empty or unparsable input.
pub fn format_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let utc: DateTime<Utc> = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        dt.with_timezone(&Utc)
    } else if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        naive.and_utc()
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0)?.and_utc()
    } else {
        return None;
    };
    Some(utc.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// `format_date` for a JSON value that may be missing or not a string.
pub fn format_date_value(value: &Value) -> Value {
    value
        .as_str()
        .and_then(format_date)
        .map(Value::String)
        .unwrap_or(Value::Null)
}

/// Pick a string out of a language-keyed map (`{"en": "...", "ja": "..."}`).
///
/// The first preferred language with a non-empty entry wins, otherwise the
/// first non-empty entry of any language.
pub fn pick_localized(map: &Value, preferred: &[&str]) -> Option<String> {
    let obj = map.as_object()?;
    preferred
        .iter()
        .filter_map(|lang| obj.get(*lang).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .or_else(|| obj.values().filter_map(Value::as_str).find(|s| !s.is_empty()))
        .map(str::to_string)
}

/// Route a request through a CORS-style proxy that takes the target URL as a suffix.
pub fn proxied_url(url: &str, proxy: Option<&str>) -> String {
    match proxy {
        Some(prefix) if !prefix.is_empty() => format!("{}{}", prefix, urlencoding::encode(url)),
        _ => url.to_string(),
    }
}

/// Query parameters of `url`. Repeated keys keep the last value.
pub fn extract_query_params(url: &str) -> HashMap<String, String> {
    match Url::parse(url) {
        Ok(parsed) => parsed.query_pairs().into_owned().collect(),
        Err(e) => {
            log::warn!("Cannot parse URL {}: {}", url, e);
            HashMap::new()
        }
    }
}
