//! Devices, entities, and the state they report.

use asset_record_core::{Asset, AssetField, datetime};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};
use strum::Display;

use crate::{
  ATTR_ASSET_ID, ATTR_RAW_CONTENT, DOMAIN, MANUFACTURER, MODEL,
  TEXT_MAX_LENGTH, VALUE_MAX, VALUE_MIN, VALUE_STEP,
};

// ─── Device ──────────────────────────────────────────────────────────────────

/// The grouping of one asset's entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
  /// The asset id.
  pub identifier:   String,
  pub name:         String,
  pub manufacturer: &'static str,
  pub model:        &'static str,
}

impl Device {
  pub fn for_asset(asset: &Asset) -> Self {
    Self {
      identifier:   asset.id.clone(),
      name:         asset.name.clone(),
      manufacturer: MANUFACTURER,
      model:        MODEL,
    }
  }
}

// ─── Entity ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityPlatformKind {
  Datetime,
  Text,
  Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberMode {
  Box,
}

/// One field of one asset, exposed as a controllable entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
  pub unique_id: String,
  pub asset_id:  String,
  pub field:     AssetField,
  pub platform:  EntityPlatformKind,
  /// Multiline text entities also report their full content.
  pub multiline: bool,
}

impl Entity {
  fn new(asset_id: &str, field: AssetField) -> Self {
    let (platform, multiline) = match field {
      AssetField::PurchaseAt | AssetField::WarrantyUntil => {
        (EntityPlatformKind::Datetime, false)
      }
      AssetField::Value => (EntityPlatformKind::Number, false),
      AssetField::ManualMd | AssetField::MaintenanceMd => {
        (EntityPlatformKind::Text, true)
      }
      AssetField::Name | AssetField::Brand | AssetField::Category => {
        (EntityPlatformKind::Text, false)
      }
    };
    Self {
      unique_id: unique_id(asset_id, field),
      asset_id: asset_id.to_owned(),
      field,
      platform,
      multiline,
    }
  }

  /// The entities an asset is presented as. The name lives on the device,
  /// so it has no entity of its own.
  pub fn for_asset(asset_id: &str) -> Vec<Self> {
    [
      AssetField::PurchaseAt,
      AssetField::WarrantyUntil,
      AssetField::Brand,
      AssetField::Category,
      AssetField::ManualMd,
      AssetField::MaintenanceMd,
      AssetField::Value,
    ]
    .into_iter()
    .map(|field| Self::new(asset_id, field))
    .collect()
  }

  /// Render the entity's state from the current asset.
  pub fn state(&self, asset: &Asset) -> EntityState {
    let mut attributes = Map::new();
    attributes.insert(ATTR_ASSET_ID.to_owned(), json!(asset.id));

    let state = match self.platform {
      EntityPlatformKind::Datetime => {
        let ts = match self.field {
          AssetField::PurchaseAt => asset.purchase_at,
          _ => asset.warranty_until,
        };
        ts.map_or(Value::Null, |ts| json!(datetime::format(&ts)))
      }
      EntityPlatformKind::Text => {
        let full = text_value(asset, self.field);
        if self.multiline {
          attributes.insert(ATTR_RAW_CONTENT.to_owned(), json!(full));
        }
        json!(truncate(full, TEXT_MAX_LENGTH))
      }
      EntityPlatformKind::Number => {
        attributes.insert("min".to_owned(), json!(VALUE_MIN));
        attributes.insert("max".to_owned(), json!(VALUE_MAX));
        attributes.insert("step".to_owned(), json!(VALUE_STEP));
        attributes.insert("mode".to_owned(), json!(NumberMode::Box));
        json!(asset.value)
      }
    };

    EntityState {
      unique_id: self.unique_id.clone(),
      platform: self.platform,
      device: asset.id.clone(),
      translation_key: self.field.to_string(),
      state,
      attributes,
    }
  }
}

/// `asset_record_<asset id>_<field>`
pub fn unique_id(asset_id: &str, field: AssetField) -> String {
  format!("{DOMAIN}_{asset_id}_{field}")
}

fn text_value(asset: &Asset, field: AssetField) -> &str {
  match field {
    AssetField::Name => &asset.name,
    AssetField::Brand => &asset.brand,
    AssetField::Category => &asset.category,
    AssetField::ManualMd => &asset.manual_md,
    AssetField::MaintenanceMd => &asset.maintenance_md,
    AssetField::Value | AssetField::PurchaseAt | AssetField::WarrantyUntil => "",
  }
}

/// Cut `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
  if text.chars().count() <= max {
    return text.to_owned();
  }
  let mut cut: String = text.chars().take(max.saturating_sub(3)).collect();
  cut.push_str("...");
  cut
}

// ─── State ───────────────────────────────────────────────────────────────────

/// A snapshot of one entity, as served by `GET /api/entities`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityState {
  pub unique_id:       String,
  pub platform:        EntityPlatformKind,
  /// Identifier of the owning device.
  pub device:          String,
  pub translation_key: String,
  pub state:           Value,
  pub attributes:      Map<String, Value>,
}

/// A value written to an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityValue {
  Text(String),
  Number(f64),
  /// `None` clears the date.
  Datetime(Option<DateTime<Utc>>),
}

impl EntityValue {
  pub fn type_name(&self) -> &'static str {
    match self {
      Self::Text(_) => "text",
      Self::Number(_) => "number",
      Self::Datetime(_) => "datetime",
    }
  }
}
