//! Error types for `asset-record-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid datetime format: {0:?}")]
  InvalidFormat(String),

  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// The persisted document does not have the `{"assets": [...]}` shape.
  #[error("malformed asset document: {0}")]
  MalformedDocument(String),

  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
