//! [`AssetStore`] — the authoritative asset collection.
//!
//! Every mutation runs the same sequence: change the in-memory map, persist
//! the whole document through the [`BlobStore`], then notify listeners. The
//! sequence is serialized by an async mutex, so at most one mutation is in
//! flight. Listeners run after that mutex is released. A failed save is
//! returned to the caller but not rolled back: the in-memory map may be
//! ahead of durable storage until the next good save.

use std::{
  collections::{HashMap, hash_map::Entry},
  sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
  Asset, AssetsView, BlobStore, Error, Result, Unsubscribe,
  asset::{AssetField, Change, FieldValue, NewAsset},
  datetime::ensure_utc,
  document, id,
  listener::Listeners,
};

type AssetMap = HashMap<String, Asset>;

/// Outcome of [`AssetStore::load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
  pub loaded:  usize,
  /// Records dropped because they could not be decoded or repeated an id.
  pub skipped: usize,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// The in-memory asset collection, its persistence, and its listeners.
///
/// Share it as `Arc<AssetStore<B>>`. Reads never wait on a mutation that is
/// persisting.
pub struct AssetStore<B: BlobStore> {
  backend:   B,
  /// Copy-on-write: views handed out by [`AssetStore::list`] keep the old map.
  assets:    RwLock<Arc<AssetMap>>,
  listeners: Listeners,
  mutation:  Mutex<()>,
}

impl<B: BlobStore> AssetStore<B> {
  /// Create an empty store. Call [`AssetStore::load`] to read persisted data.
  pub fn new(backend: B) -> Self {
    Self {
      backend,
      assets: RwLock::default(),
      listeners: Listeners::default(),
      mutation: Mutex::new(()),
    }
  }

  pub fn backend(&self) -> &B { &self.backend }

  fn read(&self) -> RwLockReadGuard<'_, Arc<AssetMap>> {
    self.assets.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn write(&self) -> RwLockWriteGuard<'_, Arc<AssetMap>> {
    self.assets.write().unwrap_or_else(PoisonError::into_inner)
  }

  // ── Persistence ───────────────────────────────────────────────────────────

  /// Replace the in-memory collection with the persisted one.
  ///
  /// A backend read failure is logged and leaves the store empty. Records
  /// that fail to decode are skipped with a warning. Only a document of the
  /// wrong overall shape is returned as an error
  /// ([`Error::MalformedDocument`]).
  pub async fn load(&self) -> Result<LoadReport> {
    let _guard = self.mutation.lock().await;

    let document = match self.backend.load().await {
      Ok(document) => document,
      Err(e) => {
        warn!(error = %e, "failed to load asset storage; starting with empty data");
        None
      }
    };

    let mut assets = AssetMap::new();
    let mut report = LoadReport::default();

    if let Some(document) = document {
      for record in document::decode(&document)? {
        match record {
          Ok(asset) => match assets.entry(asset.id.clone()) {
            Entry::Vacant(slot) => {
              slot.insert(asset);
              report.loaded += 1;
            }
            Entry::Occupied(_) => {
              warn!(asset_id = %asset.id, "skipping duplicate asset record");
              report.skipped += 1;
            }
          },
          Err(e) => {
            warn!(asset_id = %e.id, error = %e.source, "skipping corrupt asset record");
            report.skipped += 1;
          }
        }
      }
    }

    *self.write() = Arc::new(assets);
    debug!(loaded = report.loaded, skipped = report.skipped, "loaded assets");
    Ok(report)
  }

  async fn save(&self) -> Result<()> {
    let view = self.list();
    let document = document::encode(&view)?;
    self
      .backend
      .save(document)
      .await
      .map_err(|e| Error::Persistence(Box::new(e)))?;
    debug!(count = view.len(), "saved assets");
    Ok(())
  }

  // ── Listeners ─────────────────────────────────────────────────────────────

  /// Register `listener` to run after every successful mutation.
  pub fn add_listener(
    &self,
    listener: impl Fn() + Send + Sync + 'static,
  ) -> Unsubscribe {
    self.listeners.add(listener)
  }

  pub fn listener_count(&self) -> usize { self.listeners.len() }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub fn get(&self, id: &str) -> Option<Asset> { self.read().get(id).cloned() }

  /// A read-only snapshot of every asset.
  pub fn list(&self) -> AssetsView { AssetsView::new(Arc::clone(&self.read())) }

  pub fn len(&self) -> usize { self.read().len() }

  pub fn is_empty(&self) -> bool { self.read().is_empty() }

  // ── Mutations ─────────────────────────────────────────────────────────────

  /// Create an asset with every field of `input` in one step: one save, one
  /// notification.
  pub async fn create(&self, input: NewAsset) -> Result<Asset> {
    let name = input.name.trim();
    if name.is_empty() {
      return Err(Error::InvalidInput("asset name is required".to_owned()));
    }
    if !input.value.is_finite() {
      return Err(Error::InvalidInput(
        "asset value must be a finite number".to_owned(),
      ));
    }
    let name = name.to_owned();

    let guard = self.mutation.lock().await;

    let asset = {
      let mut assets = self.write();
      let assets = Arc::make_mut(&mut *assets);
      let asset_id = loop {
        let candidate = id::generate();
        if !assets.contains_key(&candidate) {
          break candidate;
        }
      };
      let now = Utc::now();
      let asset = Asset {
        id: asset_id,
        name,
        brand: input.brand,
        category: input.category,
        value: input.value,
        purchase_at: input.purchase_at.map(ensure_utc),
        warranty_until: input.warranty_until.map(ensure_utc),
        manual_md: input.manual_md,
        maintenance_md: input.maintenance_md,
        created_at: now,
        updated_at: now,
      };
      assets.insert(asset.id.clone(), asset.clone());
      asset
    };

    self.save().await?;
    drop(guard);
    self.listeners.notify();
    info!(asset_id = %asset.id, name = %asset.name, "created asset");
    Ok(asset)
  }

  /// Set one field by name.
  ///
  /// Returns `Ok(false)` without touching anything if the asset does not
  /// exist, the field name is unknown, or the value does not fit the field.
  /// The last two are logged as warnings; an unknown asset only at debug.
  pub async fn update(
    &self,
    id: &str,
    field_name: &str,
    value: impl Into<FieldValue>,
  ) -> Result<bool> {
    let Ok(field) = field_name.parse::<AssetField>() else {
      warn!(asset_id = id, field = field_name, "unknown asset field");
      return Ok(false);
    };
    self.update_fields(id, vec![(field, value.into())]).await
  }

  /// Set several fields at once with a single `updated_at` bump, save and
  /// notification.
  ///
  /// Every value is checked before any is applied; one bad value rejects the
  /// whole batch with `Ok(false)`. An empty batch on an existing asset is a
  /// successful no-op.
  pub async fn update_fields(
    &self,
    id: &str,
    changes: Vec<(AssetField, FieldValue)>,
  ) -> Result<bool> {
    let guard = self.mutation.lock().await;

    if !self.read().contains_key(id) {
      debug!(asset_id = id, "update of unknown asset");
      return Ok(false);
    }

    let mut checked = Vec::with_capacity(changes.len());
    for (field, value) in changes {
      match Change::new(field, value) {
        Ok(change) => checked.push(change),
        Err(e) => {
          warn!(asset_id = id, %field, error = %e, "rejected asset update");
          return Ok(false);
        }
      }
    }
    if checked.is_empty() {
      return Ok(true);
    }
    let fields: Vec<AssetField> = checked.iter().map(Change::field).collect();

    {
      let mut assets = self.write();
      let Some(asset) = Arc::make_mut(&mut *assets).get_mut(id) else {
        return Ok(false);
      };
      for change in checked {
        asset.apply(change);
      }
      asset.updated_at = Utc::now().max(asset.created_at);
    }

    self.save().await?;
    drop(guard);
    self.listeners.notify();
    debug!(asset_id = id, ?fields, "updated asset");
    Ok(true)
  }

  /// Remove an asset. Returns `Ok(false)` if it does not exist.
  ///
  /// Representations keyed by the id (devices, entities) are cleaned up by
  /// their owners when they observe the notification.
  pub async fn delete(&self, id: &str) -> Result<bool> {
    let guard = self.mutation.lock().await;

    let removed = {
      let mut assets = self.write();
      if !assets.contains_key(id) {
        return Ok(false);
      }
      Arc::make_mut(&mut *assets).remove(id)
    };
    let Some(asset) = removed else {
      return Ok(false);
    };

    self.save().await?;
    drop(guard);
    self.listeners.notify();
    info!(asset_id = %asset.id, name = %asset.name, "deleted asset");
    Ok(true)
  }
}
