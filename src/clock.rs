/// Timestamps for the lastUpdated storage key
use chrono::{DateTime, Duration, SecondsFormat, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock; on wasm chrono reads js_sys::Date under the hood
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Millisecond ISO-8601 UTC, same shape as JS Date.toISOString()
pub fn to_iso8601(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_iso8601(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|time| time.with_timezone(&Utc))
}

/// lastUpdated must strictly increase across writes. When the clock has
/// not advanced past the stored stamp (burst of messages within one
/// millisecond, or a clock step backwards), derive the next stamp from
/// the stored one instead.
pub fn strictly_after(previous: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous.and_then(parse_iso8601) {
        Some(prev) if now <= prev => prev + Duration::milliseconds(1),
        _ => now,
    }
}
