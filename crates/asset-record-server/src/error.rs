//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  /// Setup could not complete; the host may try again.
  #[error("setup not ready: {0}")]
  SetupNotReady(#[source] asset_record_core::Error),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res =
          (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"asset_record\""),
        );
        res
      }
      Error::NotFound(message) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": message })))
          .into_response()
      }
      Error::SetupNotReady(e) => (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": e.to_string() })),
      )
        .into_response(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
