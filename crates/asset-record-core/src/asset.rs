//! Asset types — the record, its creation input, and field-level changes.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

use crate::datetime::{self, LooseDateTime, ensure_utc};

// ─── Asset ───────────────────────────────────────────────────────────────────

/// A tracked physical item.
///
/// Serialises to the persisted record shape: timestamps as ISO-8601 strings,
/// absent dates as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
  /// `asset_<hex>`; see [`crate::id`].
  pub id:             String,
  pub name:           String,
  pub brand:          String,
  pub category:       String,
  pub value:          f64,
  #[serde(serialize_with = "datetime::serialize_opt_utc")]
  pub purchase_at:    Option<DateTime<Utc>>,
  #[serde(serialize_with = "datetime::serialize_opt_utc")]
  pub warranty_until: Option<DateTime<Utc>>,
  pub manual_md:      String,
  pub maintenance_md: String,
  #[serde(serialize_with = "datetime::serialize_utc")]
  pub created_at:     DateTime<Utc>,
  #[serde(serialize_with = "datetime::serialize_utc")]
  pub updated_at:     DateTime<Utc>,
}

impl Asset {
  pub fn to_json(&self) -> crate::Result<serde_json::Value> {
    Ok(serde_json::to_value(self)?)
  }

  pub(crate) fn apply(&mut self, change: Change) {
    match change {
      Change::Name(name) => self.name = name,
      Change::Brand(brand) => self.brand = brand,
      Change::Category(category) => self.category = category,
      Change::Value(value) => self.value = value,
      Change::PurchaseAt(ts) => self.purchase_at = ts,
      Change::WarrantyUntil(ts) => self.warranty_until = ts,
      Change::ManualMd(text) => self.manual_md = text,
      Change::MaintenanceMd(text) => self.maintenance_md = text,
    }
  }
}

// ─── NewAsset ────────────────────────────────────────────────────────────────

/// Input to [`crate::AssetStore::create`]. `id`, `created_at` and
/// `updated_at` are always set by the store.
#[derive(Debug, Clone, Default)]
pub struct NewAsset {
  pub name:           String,
  pub brand:          String,
  pub category:       String,
  pub value:          f64,
  pub purchase_at:    Option<LooseDateTime>,
  pub warranty_until: Option<LooseDateTime>,
  pub manual_md:      String,
  pub maintenance_md: String,
}

impl NewAsset {
  /// Convenience constructor with every optional field at its default.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }
}

// ─── Fields ──────────────────────────────────────────────────────────────────

/// The mutable fields of an [`Asset`], addressed by their snake_case names.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssetField {
  Name,
  Brand,
  Category,
  Value,
  PurchaseAt,
  WarrantyUntil,
  ManualMd,
  MaintenanceMd,
}

/// The value kind each field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FieldKind {
  Text,
  Number,
  /// A timestamp, or null to clear it.
  Timestamp,
}

impl AssetField {
  pub fn kind(self) -> FieldKind {
    match self {
      Self::Name
      | Self::Brand
      | Self::Category
      | Self::ManualMd
      | Self::MaintenanceMd => FieldKind::Text,
      Self::Value => FieldKind::Number,
      Self::PurchaseAt | Self::WarrantyUntil => FieldKind::Timestamp,
    }
  }
}

// ─── FieldValue ──────────────────────────────────────────────────────────────

/// A dynamically-typed value for a field update. Whether it fits the target
/// field is checked by [`Change::new`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
  Text(String),
  Number(f64),
  Timestamp(LooseDateTime),
  Null,
}

impl FieldValue {
  pub fn type_name(&self) -> &'static str {
    match self {
      Self::Text(_) => "text",
      Self::Number(_) => "number",
      Self::Timestamp(_) => "timestamp",
      Self::Null => "null",
    }
  }
}

impl From<&str> for FieldValue {
  fn from(value: &str) -> Self { Self::Text(value.to_owned()) }
}

impl From<String> for FieldValue {
  fn from(value: String) -> Self { Self::Text(value) }
}

impl From<f64> for FieldValue {
  fn from(value: f64) -> Self { Self::Number(value) }
}

impl From<i64> for FieldValue {
  fn from(value: i64) -> Self { Self::Number(value as f64) }
}

impl From<i32> for FieldValue {
  fn from(value: i32) -> Self { Self::Number(f64::from(value)) }
}

impl From<LooseDateTime> for FieldValue {
  fn from(value: LooseDateTime) -> Self { Self::Timestamp(value) }
}

impl From<DateTime<Utc>> for FieldValue {
  fn from(value: DateTime<Utc>) -> Self { Self::Timestamp(value.into()) }
}

impl From<NaiveDateTime> for FieldValue {
  fn from(value: NaiveDateTime) -> Self { Self::Timestamp(value.into()) }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
  fn from(value: Option<T>) -> Self { value.map_or(Self::Null, Into::into) }
}

// ─── Change ──────────────────────────────────────────────────────────────────

/// Why a [`FieldValue`] was refused for a field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChangeError {
  #[error("invalid type for field {field}: expected {expected}, got {got}")]
  TypeMismatch {
    field:    AssetField,
    expected: FieldKind,
    got:      &'static str,
  },

  #[error("asset name cannot be empty")]
  EmptyName,

  #[error("asset value must be a finite number")]
  NonFiniteValue,
}

/// A validated, typed update to one field. Datetimes are already UTC.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
  Name(String),
  Brand(String),
  Category(String),
  Value(f64),
  PurchaseAt(Option<DateTime<Utc>>),
  WarrantyUntil(Option<DateTime<Utc>>),
  ManualMd(String),
  MaintenanceMd(String),
}

impl Change {
  /// Check `value` against the expected kind for `field`.
  pub fn new(field: AssetField, value: FieldValue) -> Result<Self, ChangeError> {
    let change = match (field, value) {
      (AssetField::Name, FieldValue::Text(name)) => {
        let name = name.trim();
        if name.is_empty() {
          return Err(ChangeError::EmptyName);
        }
        Self::Name(name.to_owned())
      }
      (AssetField::Brand, FieldValue::Text(text)) => Self::Brand(text),
      (AssetField::Category, FieldValue::Text(text)) => Self::Category(text),
      (AssetField::ManualMd, FieldValue::Text(text)) => Self::ManualMd(text),
      (AssetField::MaintenanceMd, FieldValue::Text(text)) => {
        Self::MaintenanceMd(text)
      }
      (AssetField::Value, FieldValue::Number(n)) => {
        if !n.is_finite() {
          return Err(ChangeError::NonFiniteValue);
        }
        Self::Value(n)
      }
      (AssetField::PurchaseAt, FieldValue::Timestamp(ts)) => {
        Self::PurchaseAt(Some(ensure_utc(ts)))
      }
      (AssetField::PurchaseAt, FieldValue::Null) => Self::PurchaseAt(None),
      (AssetField::WarrantyUntil, FieldValue::Timestamp(ts)) => {
        Self::WarrantyUntil(Some(ensure_utc(ts)))
      }
      (AssetField::WarrantyUntil, FieldValue::Null) => Self::WarrantyUntil(None),
      (field, value) => {
        return Err(ChangeError::TypeMismatch {
          field,
          expected: field.kind(),
          got: value.type_name(),
        });
      }
    };
    Ok(change)
  }

  pub fn field(&self) -> AssetField {
    match self {
      Self::Name(_) => AssetField::Name,
      Self::Brand(_) => AssetField::Brand,
      Self::Category(_) => AssetField::Category,
      Self::Value(_) => AssetField::Value,
      Self::PurchaseAt(_) => AssetField::PurchaseAt,
      Self::WarrantyUntil(_) => AssetField::WarrantyUntil,
      Self::ManualMd(_) => AssetField::ManualMd,
      Self::MaintenanceMd(_) => AssetField::MaintenanceMd,
    }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn field_names_round_trip_through_strings() {
    for field in AssetField::iter() {
      assert_eq!(AssetField::from_str(field.as_ref()).unwrap(), field);
    }
    assert_eq!(AssetField::ManualMd.as_ref(), "manual_md");
    assert_eq!(AssetField::WarrantyUntil.to_string(), "warranty_until");
    assert!(AssetField::from_str("not_a_field").is_err());
  }

  #[test]
  fn text_field_rejects_number() {
    let err = Change::new(AssetField::Brand, FieldValue::Number(3.0)).unwrap_err();
    assert_eq!(
      err,
      ChangeError::TypeMismatch {
        field:    AssetField::Brand,
        expected: FieldKind::Text,
        got:      "number",
      }
    );
  }

  #[test]
  fn number_field_rejects_text_and_nan() {
    assert!(Change::new(AssetField::Value, "not-a-number".into()).is_err());
    assert_eq!(
      Change::new(AssetField::Value, f64::NAN.into()).unwrap_err(),
      ChangeError::NonFiniteValue
    );
    assert_eq!(
      Change::new(AssetField::Value, 12_i32.into()).unwrap(),
      Change::Value(12.0)
    );
  }

  #[test]
  fn timestamp_field_accepts_null_and_normalizes() {
    assert_eq!(
      Change::new(AssetField::PurchaseAt, FieldValue::Null).unwrap(),
      Change::PurchaseAt(None)
    );
    let naive = NaiveDateTime::parse_from_str("2024-01-15 10:00:00", "%Y-%m-%d %H:%M:%S")
      .unwrap();
    let change = Change::new(AssetField::WarrantyUntil, naive.into()).unwrap();
    assert_eq!(change, Change::WarrantyUntil(Some(naive.and_utc())));
    assert!(Change::new(AssetField::WarrantyUntil, "2024-01-15".into()).is_err());
  }

  #[test]
  fn name_is_trimmed_and_must_not_be_blank() {
    assert_eq!(
      Change::new(AssetField::Name, "  Drill ".into()).unwrap(),
      Change::Name("Drill".into())
    );
    assert_eq!(
      Change::new(AssetField::Name, "   ".into()).unwrap_err(),
      ChangeError::EmptyName
    );
    assert!(Change::new(AssetField::Name, FieldValue::Null).is_err());
  }
}
