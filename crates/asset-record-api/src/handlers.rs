//! Command handlers.
//!
//! | Type | Fields | Result |
//! |------|--------|--------|
//! | `asset_record/list` | none | `{"assets": [...]}` |
//! | `asset_record/create` | `name`, optional fields | `{"asset": {...}}` |
//! | `asset_record/update` | `asset_id`, optional fields | `{"asset": {...}}` |
//! | `asset_record/delete` | `asset_id` | `{"success": true}` |
//!
//! Write commands need an admin [`User`].

use asset_record_core::{AssetStore, BlobStore};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::{
  CommandError, ErrorCode, StoreSlot, User,
  command::{CommandType, CreateCommand, DeleteCommand, ListCommand, Request, UpdateCommand},
};

// ─── Responses ───────────────────────────────────────────────────────────────

pub fn result_message(id: u64, result: Value) -> Value {
  json!({ "id": id, "type": "result", "success": true, "result": result })
}

pub fn error_message(id: Option<u64>, error: &CommandError) -> Value {
  json!({
    "id": id,
    "type": "result",
    "success": false,
    "error": { "code": error.code, "message": error.message },
  })
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

/// Handle one text frame and produce the response to send back.
pub async fn handle_frame<B: BlobStore>(
  slot: &StoreSlot<B>,
  user: &User,
  frame: &str,
) -> Value {
  let request = match Request::parse(frame) {
    Ok(request) => request,
    Err((id, error)) => {
      warn!(error = %error, "rejected malformed message");
      return error_message(id, &error);
    }
  };

  let id = request.id;
  match dispatch(slot, user, request).await {
    Ok(result) => result_message(id, result),
    Err(error) => {
      debug!(id, code = %error.code, message = %error.message, "command failed");
      error_message(Some(id), &error)
    }
  }
}

/// Route a decoded request to its handler.
pub async fn dispatch<B: BlobStore>(
  slot: &StoreSlot<B>,
  user: &User,
  request: Request,
) -> Result<Value, CommandError> {
  let Ok(command) = request.kind.parse::<CommandType>() else {
    return Err(CommandError::new(
      ErrorCode::UnknownCommand,
      format!("Unknown command: {}", request.kind),
    ));
  };
  debug!(id = request.id, command = %command, user = %user.name, "handling command");

  match command {
    CommandType::List => {
      request.decode::<ListCommand>()?;
      list(&*require_store(slot)?)
    }
    CommandType::Create => {
      let cmd = request.decode::<CreateCommand>()?;
      cmd.validate()?;
      require_admin(user)?;
      create(&*require_store(slot)?, cmd).await
    }
    CommandType::Update => {
      let cmd = request.decode::<UpdateCommand>()?;
      cmd.validate()?;
      require_admin(user)?;
      update(&*require_store(slot)?, cmd).await
    }
    CommandType::Delete => {
      let cmd = request.decode::<DeleteCommand>()?;
      cmd.validate()?;
      require_admin(user)?;
      delete(&*require_store(slot)?, cmd).await
    }
  }
}

fn require_admin(user: &User) -> Result<(), CommandError> {
  if user.is_admin {
    return Ok(());
  }
  warn!(user = %user.name, "write command refused for non-admin user");
  Err(CommandError::new(ErrorCode::Unauthorized, "Unauthorized"))
}

fn require_store<B: BlobStore>(
  slot: &StoreSlot<B>,
) -> Result<std::sync::Arc<AssetStore<B>>, CommandError> {
  slot.get().ok_or_else(CommandError::store_unavailable)
}

fn asset_not_found(asset_id: &str) -> CommandError {
  CommandError::not_found(format!("Asset {asset_id} not found"))
}

// ─── Handlers ────────────────────────────────────────────────────────────────

pub fn list<B: BlobStore>(store: &AssetStore<B>) -> Result<Value, CommandError> {
  let view = store.list();
  let assets = view
    .sorted()
    .into_iter()
    .map(|asset| asset.to_json())
    .collect::<Result<Vec<_>, _>>()?;
  Ok(json!({ "assets": assets }))
}

pub async fn create<B: BlobStore>(
  store: &AssetStore<B>,
  cmd: CreateCommand,
) -> Result<Value, CommandError> {
  let input = cmd.into_new_asset()?;
  let asset = store.create(input).await?;
  Ok(json!({ "asset": asset.to_json()? }))
}

/// Every field is checked before anything is written, so a rejected update
/// leaves the asset untouched.
pub async fn update<B: BlobStore>(
  store: &AssetStore<B>,
  cmd: UpdateCommand,
) -> Result<Value, CommandError> {
  if store.get(&cmd.asset_id).is_none() {
    return Err(asset_not_found(&cmd.asset_id));
  }
  let changes = cmd.changes()?;
  if !store.update_fields(&cmd.asset_id, changes).await? {
    // Rejected by the store, or deleted since the lookup above.
    return match store.get(&cmd.asset_id) {
      None => Err(asset_not_found(&cmd.asset_id)),
      Some(_) => Err(CommandError::invalid_input("Update rejected")),
    };
  }
  let asset = store
    .get(&cmd.asset_id)
    .ok_or_else(|| asset_not_found(&cmd.asset_id))?;
  Ok(json!({ "asset": asset.to_json()? }))
}

pub async fn delete<B: BlobStore>(
  store: &AssetStore<B>,
  cmd: DeleteCommand,
) -> Result<Value, CommandError> {
  if !store.delete(&cmd.asset_id).await? {
    return Err(asset_not_found(&cmd.asset_id));
  }
  Ok(json!({ "success": true }))
}
