//! Datetime normalization.
//!
//! Every timestamp that reaches an [`Asset`](crate::Asset) is timezone-aware
//! UTC. Input arrives as ISO-8601-ish strings from two directions: the
//! persisted document (where a bad value must not block the rest of the
//! record) and external commands (where the caller needs a precise error).
//! [`parse_lenient`] serves the first, [`parse_strict`] the second.

use std::borrow::Cow;

use chrono::{
  DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone,
  Utc,
};
use serde::Serializer;
use tracing::warn;

use crate::{Error, Result};

/// Formats tried, in order, for strings carrying a UTC offset.
const OFFSET_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f%z",
  "%Y-%m-%d %H:%M:%S%.f%z",
  "%Y-%m-%dT%H:%M%z",
  "%Y-%m-%d %H:%M%z",
];

/// Formats tried, in order, for strings without an offset.
const NAIVE_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M",
];

// ─── LooseDateTime ───────────────────────────────────────────────────────────

/// A timestamp that may or may not carry timezone information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LooseDateTime {
  /// Wall-clock time without an offset; interpreted as UTC.
  Naive(NaiveDateTime),
  Aware(DateTime<FixedOffset>),
}

impl From<NaiveDateTime> for LooseDateTime {
  fn from(value: NaiveDateTime) -> Self { Self::Naive(value) }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for LooseDateTime {
  fn from(value: DateTime<Tz>) -> Self { Self::Aware(value.fixed_offset()) }
}

// ─── Normalization ───────────────────────────────────────────────────────────

/// Attach UTC to a naive timestamp, or convert an aware one to UTC.
/// Idempotent.
pub fn ensure_utc(ts: impl Into<LooseDateTime>) -> DateTime<Utc> {
  match ts.into() {
    LooseDateTime::Naive(naive) => Utc.from_utc_datetime(&naive),
    LooseDateTime::Aware(aware) => aware.with_timezone(&Utc),
  }
}

/// Rewrite a `Z` suffix and an hour-only `±hh` offset into `±hhmm`, the
/// form `%z` reads.
fn expand_offset(raw: &str) -> Cow<'_, str> {
  if let Some(rest) = raw.strip_suffix(['Z', 'z']) {
    return Cow::Owned(format!("{rest}+0000"));
  }
  // Past the date, so a bare `YYYY-MM-DD` is never read as an offset.
  if let [.., sign, h1, h2] = raw.as_bytes()
    && raw.len() > "YYYY-MM-DDThh".len()
    && matches!(sign, b'+' | b'-')
    && h1.is_ascii_digit()
    && h2.is_ascii_digit()
  {
    return Cow::Owned(format!("{raw}00"));
  }
  Cow::Borrowed(raw)
}

/// Parse an ISO-8601 date-time (or bare date) without normalizing it.
pub fn parse(raw: &str) -> Option<LooseDateTime> {
  let raw = raw.trim();

  if let Ok(aware) = DateTime::parse_from_rfc3339(raw) {
    return Some(LooseDateTime::Aware(aware));
  }
  let expanded = expand_offset(raw);
  let raw = expanded.as_ref();

  if let Some(aware) = OFFSET_FORMATS
    .iter()
    .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
  {
    return Some(LooseDateTime::Aware(aware));
  }
  if let Some(naive) = NAIVE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
  {
    return Some(LooseDateTime::Naive(naive));
  }

  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .and_then(|date| date.and_hms_opt(0, 0, 0))
    .map(LooseDateTime::Naive)
}

/// Load-path parser: `None` for empty input, and `None` (with a warning) for
/// input that does not parse.
pub fn parse_lenient(raw: Option<&str>) -> Option<DateTime<Utc>> {
  let raw = raw.filter(|s| !s.is_empty())?;
  match parse(raw) {
    Some(ts) => Some(ensure_utc(ts)),
    None => {
      warn!(raw, "failed to parse datetime");
      None
    }
  }
}

/// Write-path parser: `Ok(None)` for empty input, [`Error::InvalidFormat`]
/// for input that does not parse.
pub fn parse_strict(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  let Some(raw) = raw.filter(|s| !s.is_empty()) else {
    return Ok(None);
  };
  parse(raw)
    .map(|ts| Some(ensure_utc(ts)))
    .ok_or_else(|| Error::InvalidFormat(raw.to_owned()))
}

// ─── Formatting ──────────────────────────────────────────────────────────────

/// Canonical ISO-8601 form, e.g. `2024-01-15T10:00:00+00:00`.
pub fn format(ts: &DateTime<Utc>) -> String {
  ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

pub(crate) fn serialize_utc<S: Serializer>(
  ts: &DateTime<Utc>,
  serializer: S,
) -> Result<S::Ok, S::Error> {
  serializer.serialize_str(&format(ts))
}

pub(crate) fn serialize_opt_utc<S: Serializer>(
  ts: &Option<DateTime<Utc>>,
  serializer: S,
) -> Result<S::Ok, S::Error> {
  match ts {
    Some(ts) => serializer.serialize_str(&format(ts)),
    None => serializer.serialize_none(),
  }
}
