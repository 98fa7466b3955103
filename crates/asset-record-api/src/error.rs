//! Command error codes and the [`CommandError`] type.

use serde::Serialize;
use strum::{AsRefStr, Display};
use thiserror::Error;

/// Machine-readable error code carried in a failed command response.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCode {
  /// The store is not available, or the asset does not exist.
  NotFound,
  /// A value passed the schema but is semantically wrong (a blank name).
  InvalidInput,
  /// The message does not match the command schema, or a datetime does not
  /// parse.
  InvalidFormat,
  UnknownCommand,
  /// A write command from a caller without admin rights.
  Unauthorized,
  /// Persisting the change failed.
  UnknownError,
}

/// An error returned by a command handler.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code}: {message}")]
pub struct CommandError {
  pub code:    ErrorCode,
  pub message: String,
}

impl CommandError {
  pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
    Self {
      code,
      message: message.into(),
    }
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    Self::new(ErrorCode::NotFound, message)
  }

  pub fn invalid_input(message: impl Into<String>) -> Self {
    Self::new(ErrorCode::InvalidInput, message)
  }

  pub fn invalid_format(message: impl Into<String>) -> Self {
    Self::new(ErrorCode::InvalidFormat, message)
  }

  pub(crate) fn store_unavailable() -> Self {
    Self::not_found("Integration not configured")
  }
}

impl From<asset_record_core::Error> for CommandError {
  fn from(e: asset_record_core::Error) -> Self {
    use asset_record_core::Error;
    match e {
      Error::InvalidInput(message) => Self::invalid_input(message),
      Error::InvalidFormat(raw) => {
        Self::invalid_format(format!("Invalid datetime format: {raw}"))
      }
      other => Self::new(ErrorCode::UnknownError, other.to_string()),
    }
  }
}
