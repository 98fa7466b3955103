//! The versioned wrapper around the stored document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Major version of the on-disk format. A file with any other major version
/// is refused.
pub const STORAGE_VERSION: u32 = 1;
/// Minor version; informational only.
pub const STORAGE_MINOR_VERSION: u32 = 1;
pub const STORAGE_KEY: &str = "asset_record";

/// `{"version": 1, "minor_version": 1, "key": "asset_record", "data": {...}}`
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Envelope {
  pub version:       u32,
  #[serde(default)]
  pub minor_version: u32,
  #[serde(default)]
  pub key:           String,
  pub data:          Value,
}

impl Envelope {
  pub(crate) fn wrap(data: Value) -> Self {
    Self {
      version: STORAGE_VERSION,
      minor_version: STORAGE_MINOR_VERSION,
      key: STORAGE_KEY.to_owned(),
      data,
    }
  }

  /// Unwrap the document, refusing incompatible major versions.
  pub(crate) fn into_data(self) -> Result<Value> {
    if self.version != STORAGE_VERSION {
      return Err(Error::UnsupportedVersion {
        found:    self.version,
        expected: STORAGE_VERSION,
      });
    }
    Ok(self.data)
  }
}
