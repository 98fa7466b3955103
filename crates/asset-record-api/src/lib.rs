//! Websocket command API for Asset Record.
//!
//! Exposes an axum [`Router`] whose handlers reach the store through a
//! [`StoreSlot`]. Authentication is the caller's responsibility: the host
//! places a [`User`] in the request extensions.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", asset_record_api::api_router(slot.clone()))
//! ```

pub mod command;
pub mod error;
pub mod handlers;
pub mod principal;
pub mod slot;
pub mod ws;

use std::sync::Arc;

use asset_record_core::BlobStore;
use axum::{Router, routing::get};

pub use error::{CommandError, ErrorCode};
pub use handlers::handle_frame;
pub use principal::User;
pub use slot::StoreSlot;

/// Build the API router for `slot`.
pub fn api_router<B>(slot: Arc<StoreSlot<B>>) -> Router<()>
where
  B: BlobStore + 'static,
{
  Router::new()
    .route("/websocket", get(ws::handler::<B>))
    .with_state(slot)
}
