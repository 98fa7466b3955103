//! Command schemas.
//!
//! Each message is one JSON object with a numeric `id`, a `type`, and the
//! command's own fields. The fields are decoded into a per-command struct
//! that refuses unknown keys; anything the schema rejects is reported as
//! [`ErrorCode::InvalidFormat`](crate::ErrorCode::InvalidFormat).

use asset_record_core::{
  AssetField, FieldValue, NewAsset, datetime::parse_strict, id,
};
use serde::{Deserialize, Deserializer, de::Error as _};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};

use crate::CommandError;

/// Limit for `name`, `brand` and `category`, in characters.
pub const MAX_SHORT_TEXT: usize = 255;
/// Limit for `manual_md` and `maintenance_md`, in characters.
pub const MAX_LONG_TEXT: usize = 65_535;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
pub enum CommandType {
  #[strum(serialize = "asset_record/list")]
  List,
  #[strum(serialize = "asset_record/create")]
  Create,
  #[strum(serialize = "asset_record/update")]
  Update,
  #[strum(serialize = "asset_record/delete")]
  Delete,
}

impl CommandType {
  /// Whether the command changes state and so needs an admin caller.
  pub fn is_write(self) -> bool { !matches!(self, Self::List) }
}

// ─── Envelope ────────────────────────────────────────────────────────────────

/// A decoded message: its id, its type string, and the remaining fields.
#[derive(Debug)]
pub struct Request {
  pub id:     u64,
  pub kind:   String,
  pub fields: Map<String, Value>,
}

impl Request {
  /// Split a raw frame into its envelope and fields.
  ///
  /// On failure returns the message id if one could be read.
  pub fn parse(frame: &str) -> Result<Self, (Option<u64>, CommandError)> {
    let value: Value = serde_json::from_str(frame).map_err(|e| {
      (None, CommandError::invalid_format(format!("Message incorrectly formatted: {e}")))
    })?;
    let Value::Object(mut fields) = value else {
      return Err((
        None,
        CommandError::invalid_format("Message incorrectly formatted: not an object"),
      ));
    };

    let id = fields.remove("id").and_then(|id| id.as_u64());
    let Some(id) = id else {
      return Err((
        None,
        CommandError::invalid_format("Message incorrectly formatted: missing id"),
      ));
    };
    let Some(Value::String(kind)) = fields.remove("type") else {
      return Err((
        Some(id),
        CommandError::invalid_format("Message incorrectly formatted: missing type"),
      ));
    };

    Ok(Self { id, kind, fields })
  }

  /// Decode the fields into a command's schema struct.
  pub fn decode<T: for<'de> Deserialize<'de>>(self) -> Result<T, CommandError> {
    serde_json::from_value(Value::Object(self.fields)).map_err(|e| {
      CommandError::invalid_format(format!("Message incorrectly formatted: {e}"))
    })
  }
}

// ─── Schemas ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListCommand {}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommand {
  pub name:           String,
  #[serde(default)]
  pub brand:          Option<String>,
  #[serde(default)]
  pub category:       Option<String>,
  #[serde(default, deserialize_with = "coerce_f64")]
  pub value:          Option<f64>,
  #[serde(default)]
  pub purchase_at:    Option<String>,
  #[serde(default)]
  pub warranty_until: Option<String>,
  #[serde(default)]
  pub manual_md:      Option<String>,
  #[serde(default)]
  pub maintenance_md: Option<String>,
}

/// Every field but `asset_id` is optional. For the two datetimes, an explicit
/// `null` (outer `Some(None)`) clears the field while omission leaves it.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCommand {
  pub asset_id:       String,
  #[serde(default)]
  pub name:           Option<String>,
  #[serde(default)]
  pub brand:          Option<String>,
  #[serde(default)]
  pub category:       Option<String>,
  #[serde(default, deserialize_with = "coerce_f64")]
  pub value:          Option<f64>,
  #[serde(default, deserialize_with = "present")]
  pub purchase_at:    Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub warranty_until: Option<Option<String>>,
  #[serde(default)]
  pub manual_md:      Option<String>,
  #[serde(default)]
  pub maintenance_md: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteCommand {
  pub asset_id: String,
}

/// Accept a number or a numeric string.
fn coerce_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
  let raw = Value::deserialize(d)?;
  let parsed = match &raw {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok(),
    _ => None,
  };
  parsed
    .filter(|n| n.is_finite())
    .map(Some)
    .ok_or_else(|| D::Error::custom(format!("expected float for `value`, got {raw}")))
}

/// Marks a key as present even when its value is `null`.
fn present<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  T::deserialize(d).map(Some)
}

// ─── Validation ──────────────────────────────────────────────────────────────

fn check_len(
  field: AssetField,
  text: Option<&str>,
  max: usize,
) -> Result<(), CommandError> {
  match text {
    Some(text) if text.chars().count() > max => Err(CommandError::invalid_format(
      format!("length of value must be at most {max} for `{field}`"),
    )),
    _ => Ok(()),
  }
}

fn check_asset_id(asset_id: &str) -> Result<(), CommandError> {
  if id::is_valid(asset_id) {
    Ok(())
  } else {
    Err(CommandError::invalid_format(format!(
      "value {asset_id:?} does not match format for `asset_id`"
    )))
  }
}

fn required_name(name: &str, message: &str) -> Result<String, CommandError> {
  let name = name.trim();
  if name.is_empty() {
    return Err(CommandError::invalid_input(message));
  }
  Ok(name.to_owned())
}

fn timestamp(raw: Option<&str>) -> Result<FieldValue, CommandError> {
  Ok(parse_strict(raw)?.into())
}

impl CreateCommand {
  /// Schema-level limits; failures are `invalid_format`.
  pub fn validate(&self) -> Result<(), CommandError> {
    check_len(AssetField::Name, Some(self.name.as_str()), MAX_SHORT_TEXT)?;
    check_len(AssetField::Brand, self.brand.as_deref(), MAX_SHORT_TEXT)?;
    check_len(AssetField::Category, self.category.as_deref(), MAX_SHORT_TEXT)?;
    check_len(AssetField::ManualMd, self.manual_md.as_deref(), MAX_LONG_TEXT)?;
    check_len(
      AssetField::MaintenanceMd,
      self.maintenance_md.as_deref(),
      MAX_LONG_TEXT,
    )
  }

  /// Build the store input, trimming the name and parsing datetimes.
  pub fn into_new_asset(self) -> Result<NewAsset, CommandError> {
    let name = required_name(&self.name, "Asset name is required")?;
    Ok(NewAsset {
      name,
      brand: self.brand.unwrap_or_default(),
      category: self.category.unwrap_or_default(),
      value: self.value.unwrap_or_default(),
      purchase_at: parse_strict(self.purchase_at.as_deref())?.map(Into::into),
      warranty_until: parse_strict(self.warranty_until.as_deref())?
        .map(Into::into),
      manual_md: self.manual_md.unwrap_or_default(),
      maintenance_md: self.maintenance_md.unwrap_or_default(),
    })
  }
}

impl UpdateCommand {
  pub fn validate(&self) -> Result<(), CommandError> {
    check_asset_id(&self.asset_id)?;
    check_len(AssetField::Name, self.name.as_deref(), MAX_SHORT_TEXT)?;
    check_len(AssetField::Brand, self.brand.as_deref(), MAX_SHORT_TEXT)?;
    check_len(AssetField::Category, self.category.as_deref(), MAX_SHORT_TEXT)?;
    check_len(AssetField::ManualMd, self.manual_md.as_deref(), MAX_LONG_TEXT)?;
    check_len(
      AssetField::MaintenanceMd,
      self.maintenance_md.as_deref(),
      MAX_LONG_TEXT,
    )
  }

  /// The requested changes, in field order. Nothing is applied if any of
  /// them is rejected.
  pub fn changes(&self) -> Result<Vec<(AssetField, FieldValue)>, CommandError> {
    let mut changes = Vec::new();
    if let Some(name) = &self.name {
      let name = required_name(name, "Asset name cannot be empty")?;
      changes.push((AssetField::Name, name.into()));
    }
    if let Some(brand) = &self.brand {
      changes.push((AssetField::Brand, brand.clone().into()));
    }
    if let Some(category) = &self.category {
      changes.push((AssetField::Category, category.clone().into()));
    }
    if let Some(value) = self.value {
      changes.push((AssetField::Value, value.into()));
    }
    if let Some(raw) = &self.purchase_at {
      changes.push((AssetField::PurchaseAt, timestamp(raw.as_deref())?));
    }
    if let Some(raw) = &self.warranty_until {
      changes.push((AssetField::WarrantyUntil, timestamp(raw.as_deref())?));
    }
    if let Some(text) = &self.manual_md {
      changes.push((AssetField::ManualMd, text.clone().into()));
    }
    if let Some(text) = &self.maintenance_md {
      changes.push((AssetField::MaintenanceMd, text.clone().into()));
    }
    Ok(changes)
  }
}

impl DeleteCommand {
  pub fn validate(&self) -> Result<(), CommandError> {
    check_asset_id(&self.asset_id)
  }
}
