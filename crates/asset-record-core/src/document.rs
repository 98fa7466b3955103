//! The persisted asset document, `{"assets": [AssetRecord, ...]}`.
//!
//! Decoding is forgiving at the record level: each record is
//! decoded on its own into a `Result`, so one corrupt entry costs only that
//! entry. Only a document whose overall shape is wrong is an error.

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::warn;

use crate::{AssetsView, Error, Result, asset::Asset, datetime::parse_lenient};

/// A single record that could not be decoded.
#[derive(Debug, Error)]
#[error("corrupt asset record {id}: {source}")]
pub struct RecordError {
  /// The record's `id`, or `"unknown"` when it has none.
  pub id:     String,
  #[source]
  pub source: serde_json::Error,
}

// ─── Encode ──────────────────────────────────────────────────────────────────

pub fn encode(view: &AssetsView) -> Result<Value> {
  let assets = view
    .sorted()
    .into_iter()
    .map(Asset::to_json)
    .collect::<Result<Vec<_>>>()?;
  Ok(json!({ "assets": assets }))
}

// ─── Decode ──────────────────────────────────────────────────────────────────

/// Decode every record in `document`.
///
/// Fails with [`Error::MalformedDocument`] only when the document is not an
/// object or its `assets` member is present but not an array.
pub fn decode(document: &Value) -> Result<Vec<Result<Asset, RecordError>>> {
  let Some(object) = document.as_object() else {
    return Err(Error::MalformedDocument(
      "top level is not an object".to_owned(),
    ));
  };

  let records = match object.get("assets") {
    None | Some(Value::Null) => return Ok(Vec::new()),
    Some(Value::Array(records)) => records,
    Some(_) => {
      return Err(Error::MalformedDocument(
        "`assets` is not an array".to_owned(),
      ));
    }
  };

  Ok(records.iter().map(decode_record).collect())
}

/// Decode one record, degrading individual bad fields to their defaults.
pub fn decode_record(record: &Value) -> Result<Asset, RecordError> {
  RawAsset::deserialize(record)
    .map(RawAsset::into_asset)
    .map_err(|source| RecordError {
      id: record
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_owned(),
      source,
    })
}

/// The loosest shape a stored record may take. Only `id` is mandatory.
#[derive(Deserialize)]
struct RawAsset {
  id:             String,
  #[serde(default)]
  name:           Option<String>,
  #[serde(default)]
  brand:          Option<String>,
  #[serde(default)]
  category:       Option<String>,
  #[serde(default)]
  value:          Option<Value>,
  #[serde(default)]
  purchase_at:    Option<Value>,
  #[serde(default)]
  warranty_until: Option<Value>,
  #[serde(default)]
  manual_md:      Option<String>,
  #[serde(default)]
  maintenance_md: Option<String>,
  #[serde(default)]
  created_at:     Option<Value>,
  #[serde(default)]
  updated_at:     Option<Value>,
}

impl RawAsset {
  fn into_asset(self) -> Asset {
    let now = Utc::now();
    let created_at = lenient_timestamp(&self.id, "created_at", self.created_at)
      .unwrap_or(now);
    let mut updated_at = lenient_timestamp(&self.id, "updated_at", self.updated_at)
      .unwrap_or(now);
    if updated_at < created_at {
      warn!(asset_id = %self.id, "updated_at precedes created_at; clamping");
      updated_at = created_at;
    }

    Asset {
      value: lenient_value(&self.id, self.value),
      purchase_at: lenient_timestamp(&self.id, "purchase_at", self.purchase_at),
      warranty_until: lenient_timestamp(
        &self.id,
        "warranty_until",
        self.warranty_until,
      ),
      name: self.name.unwrap_or_default(),
      brand: self.brand.unwrap_or_default(),
      category: self.category.unwrap_or_default(),
      manual_md: self.manual_md.unwrap_or_default(),
      maintenance_md: self.maintenance_md.unwrap_or_default(),
      created_at,
      updated_at,
      id: self.id,
    }
  }
}

fn lenient_timestamp(
  asset_id: &str,
  field: &str,
  raw: Option<Value>,
) -> Option<chrono::DateTime<Utc>> {
  match raw {
    None | Some(Value::Null) => None,
    Some(Value::String(raw)) => parse_lenient(Some(raw.as_str())),
    Some(other) => {
      warn!(asset_id, field, raw = %other, "datetime is not a string; ignoring");
      None
    }
  }
}

fn lenient_value(asset_id: &str, raw: Option<Value>) -> f64 {
  let parsed = match &raw {
    None => return 0.0,
    Some(Value::Number(n)) => n.as_f64(),
    Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
    Some(_) => None,
  };
  match parsed {
    Some(value) if value.is_finite() => value,
    _ => {
      warn!(asset_id, raw = ?raw, "invalid asset value; defaulting to 0");
      0.0
    }
  }
}
