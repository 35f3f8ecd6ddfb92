//! Cell-level parsing shared by every table
//!
//! Name normalization lives here and only here: every join on a team or
//! pitcher name goes through [`EntityKey`].

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::{MlbError, Result};

/// Canonical join form of a name: ASCII transliteration, lowercase, trimmed,
/// inner whitespace collapsed.
pub fn normalize_name(raw: &str) -> String {
    deunicode::deunicode(raw)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized team or pitcher name used as a join key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey(String);

impl EntityKey {
    pub fn new(raw: &str) -> Self {
        EntityKey(normalize_name(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Convert innings pitched from "whole.thirds" notation to a true fraction.
///
/// "6.2" is six and two-thirds innings. A fractional digit other than 0, 1
/// or 2 is rejected rather than read as tenths.
pub fn parse_innings(raw: &str) -> Result<f64> {
    let text = raw.trim();
    let (whole, thirds) = match text.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (text, "0"),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MlbError::Parse(format!("invalid innings pitched: {:?}", raw)));
    }
    let thirds = match thirds {
        "0" => 0.0,
        "1" => 1.0,
        "2" => 2.0,
        _ => {
            return Err(MlbError::Parse(format!(
                "innings pitched {:?} has an out-of-range third",
                raw
            )))
        }
    };

    let whole: f64 = whole
        .parse::<u32>()
        .map_err(|e| MlbError::Parse(format!("invalid innings pitched {:?}: {}", raw, e)))?
        .into();
    Ok(whole + thirds / 3.0)
}

/// Parse an optional innings cell; empty is missing, malformed is logged and missing.
pub fn parse_innings_cell(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match parse_innings(raw) {
        Ok(ip) => Some(ip),
        Err(e) => {
            log::debug!("{}", e);
            None
        }
    }
}

fn leading_date() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d{4}-\d{2}-\d{2})").expect("static date pattern"))
}

/// Extract the leading `YYYY-MM-DD` from a cell such as "2025-04-12 (2)"
pub fn extract_date(raw: &str) -> Option<NaiveDate> {
    let caps = leading_date().captures(raw)?;
    NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()
}

/// The home/away column holds "@" for road appearances
pub fn is_away_marker(raw: Option<&str>) -> bool {
    matches!(raw.map(str::trim), Some("@"))
}

/// Round to two decimals, as predictions are published
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
