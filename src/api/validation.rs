//! Parameter validation rules shared by the resource handlers.
//!
//! Rejections become 400 envelopes before any cache lookup or upstream
//! call. Pagination-style counts are clamped instead of rejected.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{GatewayError, Result};

/// Longest inclusive span accepted by `/apod/range`.
pub const APOD_MAX_RANGE_DAYS: i64 = 100;
/// Longest inclusive span accepted by `/asteroids/feed`.
pub const NEO_MAX_RANGE_DAYS: i64 = 7;

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"))
}

fn segment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("valid segment regex"))
}

// == Dates ==
/// Parses a `YYYY-MM-DD` date. Shape and calendar validity are both checked.
pub fn require_date(field: &str, value: &str) -> Result<NaiveDate> {
    if !date_pattern().is_match(value) {
        return Err(GatewayError::validation(format!(
            "Invalid {} format. Use YYYY-MM-DD",
            field
        )));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        GatewayError::validation(format!(
            "Invalid {}: {} is not a calendar date. Use YYYY-MM-DD",
            field, value
        ))
    })
}

/// Like [`require_date`] for a query value that must be present.
pub fn require_present_date(field: &str, value: Option<&str>) -> Result<NaiveDate> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => require_date(field, v),
        None => Err(GatewayError::validation(format!("{} is required", field))),
    }
}

/// Validates `start..=end` and returns its inclusive length in days.
pub fn validate_range(start: NaiveDate, end: NaiveDate, max_days: i64) -> Result<i64> {
    if start > end {
        return Err(GatewayError::validation(
            "start_date must be before or equal to end_date",
        ));
    }
    let days = (end - start).num_days() + 1;
    if days > max_days {
        return Err(GatewayError::validation(format!(
            "Date range cannot exceed {} days",
            max_days
        )));
    }
    Ok(days)
}

// == Enumerations ==
/// Lower-cases `value` and checks it against `allowed`, listing the allowed
/// set in the rejection.
pub fn require_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<String> {
    let normalized = value.trim().to_ascii_lowercase();
    if allowed.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(GatewayError::validation(format!(
            "Invalid {}. Must be one of: {}",
            field,
            allowed.join(", ")
        )))
    }
}

/// [`require_one_of`] for an optional value with a default.
pub fn one_of_or(field: &str, value: Option<&str>, allowed: &[&str], default: &str) -> Result<String> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => require_one_of(field, v, allowed),
        None => Ok(default.to_string()),
    }
}

// == Numbers ==
/// Parses a count and clamps it into `min..=max`; unparseable or missing
/// values yield `default`.
pub fn clamp_count(raw: Option<&str>, default: u32, min: u32, max: u32) -> u32 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map(|n| n.clamp(i64::from(min), i64::from(max)) as u32)
        .unwrap_or(default)
}

/// Parses an optional non-negative integer, rejecting malformed values.
pub fn parse_optional_u32(field: &str, raw: Option<&str>) -> Result<Option<u32>> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v.parse::<u32>().map(Some).map_err(|_| {
            GatewayError::validation(format!("{} must be a non-negative integer", field))
        }),
    }
}

/// Parses a four-digit year.
pub fn parse_year(field: &str, raw: Option<&str>) -> Result<Option<u32>> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) if v.len() == 4 && v.chars().all(|c| c.is_ascii_digit()) => {
            Ok(v.parse().ok())
        }
        Some(_) => Err(GatewayError::validation(format!(
            "{} must be a four-digit year",
            field
        ))),
    }
}

/// Parses `minx,miny,maxx,maxy` into four finite numbers.
pub fn parse_bbox(raw: &str) -> Result<[f64; 4]> {
    let invalid = || GatewayError::validation("bbox must be four comma-separated numbers: minx,miny,maxx,maxy");
    let parts: Vec<f64> = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|_| invalid()))
        .collect::<Result<_>>()?;

    match parts.as_slice() {
        [a, b, c, d] if parts.iter().all(|v| v.is_finite()) => Ok([*a, *b, *c, *d]),
        _ => Err(invalid()),
    }
}

/// Returns a trimmed, non-empty text parameter or a "required" rejection.
pub fn require_text<'a>(field: &str, raw: Option<&'a str>) -> Result<&'a str> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GatewayError::validation(format!("{} is required", field)))
}

/// Identifier spliced into an upstream URL path. Reserved characters and
/// dot segments would change which upstream resource is addressed.
pub fn require_path_segment<'a>(field: &str, raw: &'a str) -> Result<&'a str> {
    let value = require_text(field, Some(raw))?;
    if !segment_pattern().is_match(value) || value == "." || value.contains("..") {
        return Err(GatewayError::validation(format!(
            "Invalid {}. Use letters, digits, '_', '-' or '.'",
            field
        )));
    }
    Ok(value)
}
