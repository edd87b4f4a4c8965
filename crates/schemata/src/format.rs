//! `format` assertions
//!
//! Unknown formats always pass. Only string values are checked.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use regex::Regex;
use url::Url;
use uuid::Uuid;

use crate::error::ErrorCode;

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:\d+W|(?:\d+Y)?(?:\d+M)?(?:\d+D)?(?:T(?:\d+H)?(?:\d+M)?(?:\d+S)?)?)$")
        .expect("invalid duration regex")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*$")
        .expect("invalid email regex")
});

/// Check `value` against a named format.
///
/// Returns the error code of the failed format, `None` when the value
/// conforms or the format is unknown.
pub fn check(format: &str, value: &str) -> Option<ErrorCode> {
    let (valid, code) = match format {
        "date" => (is_date(value), ErrorCode::FormatDate),
        "date-time" => (is_date_time(value), ErrorCode::FormatDateTime),
        "time" => (is_time(value), ErrorCode::FormatTime),
        "duration" => (is_duration(value), ErrorCode::FormatDuration),
        "email" => (is_email(value), ErrorCode::FormatEmail),
        "hostname" => (is_hostname(value), ErrorCode::FormatHostname),
        "ipv4" => (value.parse::<Ipv4Addr>().is_ok(), ErrorCode::FormatIpv4),
        "ipv6" => (value.parse::<Ipv6Addr>().is_ok(), ErrorCode::FormatIpv6),
        "json-pointer" => (schemata_pointer::is_valid(value), ErrorCode::FormatJsonPointer),
        "regex" => (Regex::new(value).is_ok(), ErrorCode::FormatRegex),
        "uri" => (is_uri(value), ErrorCode::FormatUri),
        "uri-reference" => (is_uri_reference(value), ErrorCode::FormatUriReference),
        "uuid" => (is_uuid(value), ErrorCode::FormatUuid),
        _ => return None,
    };
    (!valid).then_some(code)
}

/// `YYYY-MM-DD` with exactly four, two and two digits.
fn is_full_date_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes
            .iter()
            .enumerate()
            .all(|(index, b)| if index == 4 || index == 7 { *b == b'-' } else { b.is_ascii_digit() })
}

fn is_date(value: &str) -> bool {
    is_full_date_shape(value) && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

fn is_date_time(value: &str) -> bool {
    let separated = matches!(value.as_bytes().get(10), Some(b'T' | b't'));
    if !separated || !value.get(..10).is_some_and(is_full_date_shape) {
        return false;
    }
    match DateTime::parse_from_rfc3339(value) {
        Ok(parsed) => leap_second_at_end_of_day(&parsed),
        Err(_) => false,
    }
}

fn is_time(value: &str) -> bool {
    is_date_time(&format!("1970-01-01T{value}"))
}

// leap seconds only at 23:59:60 UTC
fn leap_second_at_end_of_day(parsed: &DateTime<FixedOffset>) -> bool {
    let time = parsed.time();
    if time.nanosecond() < 1_000_000_000 {
        return true;
    }
    let offset = i64::from(parsed.offset().local_minus_utc() / 60);
    let local = i64::from(time.hour() * 60 + time.minute());
    (local - offset).rem_euclid(24 * 60) == 23 * 60 + 59
}

fn is_uuid(value: &str) -> bool {
    // hyphenated form only
    value.len() == 36 && Uuid::try_parse(value).is_ok()
}

fn is_duration(value: &str) -> bool {
    DURATION.is_match(value) && value != "P" && !value.ends_with('T')
}

fn is_email(value: &str) -> bool {
    let Some((local, _)) = value.rsplit_once('@') else {
        return false;
    };
    EMAIL.is_match(value) && !local.starts_with('.') && !local.ends_with('.') && !local.contains("..")
}

fn is_hostname(value: &str) -> bool {
    let value = value.strip_suffix('.').unwrap_or(value);
    if value.is_empty() || value.len() > 253 {
        return false;
    }
    value.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}

fn is_uri(value: &str) -> bool {
    !value.contains([' ', '\\']) && Url::parse(value).is_ok()
}

fn is_uri_reference(value: &str) -> bool {
    if value.contains([' ', '\\']) {
        return false;
    }
    static BASE: LazyLock<Url> =
        LazyLock::new(|| Url::parse("http://example.com/").expect("invalid base url"));
    Url::parse(value).is_ok() || BASE.join(value).is_ok()
}
