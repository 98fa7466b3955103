//! `GET /websocket` — the command channel.
//!
//! One JSON command per text frame, one JSON response per command. The
//! caller's [`User`] is fixed when the connection is upgraded.

use std::sync::Arc;

use asset_record_core::BlobStore;
use axum::{
  extract::{
    State,
    ws::{Message, WebSocket, WebSocketUpgrade},
  },
  response::Response,
};
use tracing::{debug, info, warn};

use crate::{StoreSlot, User, handlers::handle_frame};

pub async fn handler<B>(
  State(slot): State<Arc<StoreSlot<B>>>,
  user: User,
  ws: WebSocketUpgrade,
) -> Response
where
  B: BlobStore + 'static,
{
  ws.on_upgrade(move |socket| serve(socket, slot, user))
}

async fn serve<B: BlobStore>(
  mut socket: WebSocket,
  slot: Arc<StoreSlot<B>>,
  user: User,
) {
  info!(user = %user.name, admin = user.is_admin, "websocket connected");

  while let Some(message) = socket.recv().await {
    let frame = match message {
      Ok(Message::Text(text)) => text,
      Ok(Message::Close(_)) => break,
      Ok(Message::Binary(_)) => {
        debug!("ignoring binary frame");
        continue;
      }
      Ok(_) => continue,
      Err(e) => {
        warn!(error = %e, "websocket receive failed");
        break;
      }
    };

    let response = handle_frame(&slot, &user, frame.as_str()).await;
    if let Err(e) = socket.send(Message::Text(response.to_string().into())).await {
      warn!(error = %e, "websocket send failed");
      break;
    }
  }

  info!(user = %user.name, "websocket disconnected");
}
