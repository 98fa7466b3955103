//! The Asset Record server.
//!
//! Wires the store, the entity platform and the command API into one axum
//! [`Router`], and owns configuration and authentication.

pub mod auth;
pub mod error;
pub mod lifecycle;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use asset_record_core::BlobStore;
use asset_record_entities::EntityState;
use axum::{
  Json, Router,
  extract::State,
  middleware,
  routing::get,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::AuthConfig;
use lifecycle::{Integration, RetryPolicy};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ASSET_RECORD_*` environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  pub host:                   String,
  pub port:                   u16,
  /// The JSON file holding the asset document.
  pub storage_path:           PathBuf,
  pub auth_username:          String,
  pub auth_password_hash:     String,
  #[serde(default = "default_setup_retries")]
  pub setup_retries:          u32,
  #[serde(default = "default_setup_retry_delay_secs")]
  pub setup_retry_delay_secs: u64,
}

fn default_setup_retries() -> u32 { 3 }

fn default_setup_retry_delay_secs() -> u64 { 5 }

impl ServerConfig {
  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy {
      retries: self.setup_retries,
      delay:   Duration::from_secs(self.setup_retry_delay_secs),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<B: BlobStore> {
  pub integration: Arc<Integration<B>>,
  pub auth:        Arc<AuthConfig>,
}

impl<B: BlobStore> Clone for AppState<B> {
  fn clone(&self) -> Self {
    Self {
      integration: self.integration.clone(),
      auth:        self.auth.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the server router: `GET /api/websocket` and `GET /api/entities`.
pub fn router<B>(state: AppState<B>) -> Router
where
  B: BlobStore + 'static,
{
  let api = asset_record_api::api_router(state.integration.slot())
    .route("/entities", get(entities::<B>).with_state(state.clone()));

  Router::new()
    .nest("/api", api)
    .layer(middleware::from_fn_with_state(
      state,
      auth::attach_user::<B>,
    ))
    .layer(TraceLayer::new_for_http())
}

/// `GET /api/entities` — the state of every entity.
async fn entities<B>(
  State(state): State<AppState<B>>,
) -> Result<Json<Vec<EntityState>>, Error>
where
  B: BlobStore + 'static,
{
  let platform = state
    .integration
    .platform()
    .ok_or_else(|| Error::NotFound("Integration not configured".to_owned()))?;
  Ok(Json(platform.states()))
}
