//! Entity adapters for Asset Record.
//!
//! Every asset is presented as a *device* with one *entity* per editable
//! field: datetime entities for the two dates, text entities for the
//! free-text fields, and a number entity for the value. The
//! [`EntityPlatform`] keeps that set in step with the store by listening to
//! its change notifications.

pub mod entity;
pub mod error;
pub mod platform;

pub use entity::{
  Device, Entity, EntityPlatformKind, EntityState, EntityValue, NumberMode,
};
pub use error::{Error, Result};
pub use platform::EntityPlatform;

/// Prefix of every entity unique id, and the device identifier domain.
pub const DOMAIN: &str = "asset_record";
pub const MANUFACTURER: &str = "Asset Record";
pub const MODEL: &str = "Asset";

/// Text entity states longer than this are cut to fit, ending in `...`.
pub const TEXT_MAX_LENGTH: usize = 255;
/// Longest text a text entity accepts.
pub const TEXT_NATIVE_MAX: usize = 65_535;

pub const VALUE_MIN: f64 = 0.0;
pub const VALUE_MAX: f64 = 99_999_999.0;
pub const VALUE_STEP: f64 = 0.01;

pub const ATTR_ASSET_ID: &str = "asset_id";
pub const ATTR_RAW_CONTENT: &str = "raw_content";

#[cfg(test)]
mod tests;
