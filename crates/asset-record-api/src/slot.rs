//! [`StoreSlot`] — where command handlers find the store.

use std::sync::{Arc, PoisonError, RwLock};

use asset_record_core::{AssetStore, BlobStore};

/// Holds the active store while the integration is set up.
///
/// Handlers that find the slot empty answer `not_found`, the same as a
/// request that arrives before setup or after unload.
pub struct StoreSlot<B: BlobStore> {
  store: RwLock<Option<Arc<AssetStore<B>>>>,
}

impl<B: BlobStore> Default for StoreSlot<B> {
  fn default() -> Self {
    Self {
      store: RwLock::new(None),
    }
  }
}

impl<B: BlobStore> StoreSlot<B> {
  pub fn new() -> Self { Self::default() }

  pub fn with_store(store: Arc<AssetStore<B>>) -> Self {
    Self {
      store: RwLock::new(Some(store)),
    }
  }

  pub fn get(&self) -> Option<Arc<AssetStore<B>>> {
    self
      .store
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  pub fn attach(&self, store: Arc<AssetStore<B>>) {
    *self.store.write().unwrap_or_else(PoisonError::into_inner) = Some(store);
  }

  /// Empty the slot, returning the store that was in it.
  pub fn detach(&self) -> Option<Arc<AssetStore<B>>> {
    self.store.write().unwrap_or_else(PoisonError::into_inner).take()
  }
}
