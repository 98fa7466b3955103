//! Error type for `asset-record-entities`.

use thiserror::Error;

use crate::EntityPlatformKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[from] asset_record_core::Error),

  #[error("unknown entity: {0}")]
  UnknownEntity(String),

  #[error("{platform} entity {unique_id} cannot take a {got} value")]
  WrongValueType {
    unique_id: String,
    platform:  EntityPlatformKind,
    got:       &'static str,
  },

  #[error("value {value} is outside [{min}, {max}]")]
  OutOfRange { value: f64, min: f64, max: f64 },

  #[error("text is {len} characters; the limit is {max}")]
  TooLong { len: usize, max: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
