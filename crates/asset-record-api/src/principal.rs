//! The caller identity attached to a request.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

/// Who is calling. Placed in the request extensions by the host's auth
/// middleware; a request without one is treated as an anonymous reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
  pub name:     String,
  pub is_admin: bool,
}

impl User {
  pub fn admin(name: impl Into<String>) -> Self {
    Self {
      name:     name.into(),
      is_admin: true,
    }
  }

  pub fn anonymous() -> Self {
    Self {
      name:     "anonymous".to_owned(),
      is_admin: false,
    }
  }
}

impl<S: Send + Sync> FromRequestParts<S> for User {
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    Ok(
      parts
        .extensions
        .get::<User>()
        .cloned()
        .unwrap_or_else(User::anonymous),
    )
  }
}
