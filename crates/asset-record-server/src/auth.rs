//! HTTP Basic-auth principal resolution.
//!
//! Valid credentials make the caller an admin. A request with no
//! `Authorization` header is an anonymous reader. A header that is present
//! but wrong is rejected outright.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use asset_record_api::User;
use asset_record_core::BlobStore;
use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use tracing::debug;

use crate::{AppState, error::Error};

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Check Basic credentials in `headers` against `config`.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<String, Error> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  if username != config.username {
    return Err(Error::Unauthorized);
  }

  let parsed_hash = PasswordHash::new(&config.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(username.to_owned())
}

/// Map a request's headers to the caller.
pub fn resolve_user(headers: &HeaderMap, config: &AuthConfig) -> Result<User, Error> {
  if !headers.contains_key(header::AUTHORIZATION) {
    return Ok(User::anonymous());
  }
  verify_auth(headers, config).map(User::admin)
}

/// Middleware placing the resolved [`User`] in the request extensions.
pub async fn attach_user<B>(
  State(state): State<AppState<B>>,
  mut req: Request,
  next: Next,
) -> Response
where
  B: BlobStore + 'static,
{
  match resolve_user(req.headers(), &state.auth) {
    Ok(user) => {
      req.extensions_mut().insert(user);
      next.run(req).await
    }
    Err(e) => {
      debug!(path = %req.uri().path(), "rejected bad credentials");
      e.into_response()
    }
  }
}
