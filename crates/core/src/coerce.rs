//! Conversion of raw selector results into typed story properties.
//!
//! Selectors yield either a single string or the string values of a node set
//! ([`RawValue`]). The functions here turn those into plain text, tag lists and
//! dates. Date parsing sniffs the format: RFC 3339 / W3C-DTF as used by Atom and
//! Dublin Core, and RFC 822 as used by RSS `pubDate`, plus the common sloppy
//! variants real feeds produce.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Serialize;

use crate::error::CoercionError;

/// Raw result of evaluating one selector against one item node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// A string (or number/boolean rendered as string) result.
    Scalar(String),
    /// String values of every node in a node set, in document order.
    Nodes(Vec<String>),
}

impl RawValue {
    /// Whether the selector produced nothing usable.
    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Scalar(s) => s.is_empty(),
            RawValue::Nodes(nodes) => nodes.is_empty(),
        }
    }
}

/// A coerced property value, as exposed by [`Story::to_map`](crate::Story::to_map).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// An absent date.
    Null,
    Text(String),
    Date(DateTime<FixedOffset>),
    List(Vec<String>),
}

impl FieldValue {
    /// Text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Date value, if this is a date.
    pub fn as_date(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            FieldValue::Date(d) => Some(d),
            _ => None,
        }
    }

    /// List items, if this is a list.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<Option<DateTime<FixedOffset>>> for FieldValue {
    fn from(value: Option<DateTime<FixedOffset>>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Date)
    }
}

/// Plain text: a scalar as-is, or the first node of a node set.
///
/// No trimming is applied; entity decoding is already done by the parser.
pub fn coerce_text(raw: RawValue) -> String {
    match raw {
        RawValue::Scalar(s) => s,
        RawValue::Nodes(nodes) => nodes.into_iter().next().unwrap_or_default(),
    }
}

/// Tag list: every node of a node set, or a non-empty scalar as a single entry.
pub fn coerce_list(raw: RawValue) -> Vec<String> {
    match raw {
        RawValue::Scalar(s) if s.is_empty() => Vec::new(),
        RawValue::Scalar(s) => vec![s],
        RawValue::Nodes(nodes) => nodes,
    }
}

/// Date for a fixed date field. Empty is `None`; anything else must parse.
pub fn coerce_date(field: &str, raw: RawValue) -> Result<Option<DateTime<FixedOffset>>, CoercionError> {
    let text = coerce_text(raw);
    if text.trim().is_empty() {
        return Ok(None);
    }

    parse_date(&text)
        .map(Some)
        .ok_or_else(|| CoercionError { field: field.to_string(), value: text })
}

/// Value for a property outside the fixed schema.
///
/// Node sets become lists. Scalars that look like dates become dates when
/// `detect_dates` is set; every other scalar is kept as text.
pub fn coerce_extra(raw: RawValue, detect_dates: bool) -> FieldValue {
    match raw {
        RawValue::Nodes(nodes) => FieldValue::List(nodes),
        RawValue::Scalar(s) => {
            if detect_dates
                && looks_like_date(&s)
                && let Some(date) = parse_date(&s)
            {
                return FieldValue::Date(date);
            }
            FieldValue::Text(s)
        }
    }
}

/// Cheap pre-check before attempting to parse an `extra` value as a date.
///
/// Requires a digit, a date-ish separator and no more than a sentence worth of text,
/// so free text and bare numbers are never turned into dates.
pub fn looks_like_date(value: &str) -> bool {
    let value = value.trim();
    (8..=64).contains(&value.len())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.contains(['-', ':', ',', ' '])
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%A, %d %B %Y %H:%M:%S %z",
    "%a, %d %B %Y %H:%M:%S %z",
    "%d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M %z",
    "%d-%b-%y %H:%M:%S %z",
    "%d-%b-%Y %H:%M:%S %z",
    "%a %b %d %H:%M:%S %z %Y",
    "%b %d %H:%M:%S %z %Y",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%a, %d %b %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %b %Y", "%a, %d %b %Y", "%B %d, %Y"];

/// Day name at the start of RFC 822 and RFC 850 dates, with its comma
static LEADING_WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?,?\s+").expect("weekday pattern is valid")
});

/// W3C-DTF time with an hour-only offset such as `+01`
static HOUR_OFFSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"T\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?[+-]\d{2}$").expect("hour offset pattern is valid")
});

/// Lenient date parser.
///
/// Values without an offset are taken as UTC; date-only values as midnight UTC.
/// A leading day name is dropped when the full value does not parse, so a wrong
/// weekday does not discard an otherwise valid date.
pub fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    parse_exact(value).or_else(|| {
        let rest = LEADING_WEEKDAY.find(value)?;
        parse_exact(&value[rest.end()..])
    })
}

fn parse_exact(value: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date);
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date);
    }

    let normalized = normalize_zone(value);

    if let Ok(date) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(date);
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(&normalized) {
        return Some(date);
    }

    for format in OFFSET_FORMATS {
        if let Ok(date) = DateTime::parse_from_str(&normalized, format) {
            return Some(date);
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&normalized, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc().fixed_offset());
        }
    }

    None
}

/// Zone names mapped to numeric offsets for the format table.
const ZONE_NAMES: &[(&str, &str)] = &[
    ("UTC", "+0000"),
    ("GMT", "+0000"),
    ("UT", "+0000"),
    ("Z", "+0000"),
    ("EST", "-0500"),
    ("EDT", "-0400"),
    ("CST", "-0600"),
    ("CDT", "-0500"),
    ("MST", "-0700"),
    ("MDT", "-0600"),
    ("PST", "-0800"),
    ("PDT", "-0700"),
    ("BST", "+0100"),
    ("CET", "+0100"),
    ("CEST", "+0200"),
    ("EET", "+0200"),
    ("EEST", "+0300"),
    ("IST", "+0530"),
    ("JST", "+0900"),
    ("AEST", "+1000"),
    ("AEDT", "+1100"),
];

/// Rewrite trailing `Z`, hour-only offsets and named zones into numeric offsets.
fn normalize_zone(value: &str) -> String {
    if HOUR_OFFSET.is_match(value) {
        return format!("{}:00", value);
    }

    if let Some((rest, zone)) = value.rsplit_once(' ') {
        for (name, offset) in ZONE_NAMES {
            if zone.eq_ignore_ascii_case(name) {
                return format!("{} {}", rest, offset);
            }
        }
    }

    if let Some(rest) = value.strip_suffix('Z')
        && rest.contains('T')
    {
        return format!("{}+00:00", rest);
    }

    value.to_string()
}
