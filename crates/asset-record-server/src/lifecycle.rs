//! Setup and unload of the integration.
//!
//! Setup builds the store over a blob backend, loads it, starts the entity
//! platform, and publishes the store to the command handlers. Unload undoes
//! those steps in reverse.

use std::{
  sync::{Arc, PoisonError, RwLock},
  time::Duration,
};

use asset_record_api::StoreSlot;
use asset_record_core::{AssetStore, BlobStore, LoadReport};
use asset_record_entities::EntityPlatform;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// How often, and how far apart, setup is attempted.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
  /// Attempts after the first.
  pub retries: u32,
  pub delay:   Duration,
}

/// The running integration: at most one store and one entity platform.
pub struct Integration<B: BlobStore> {
  slot:     Arc<StoreSlot<B>>,
  platform: RwLock<Option<Arc<EntityPlatform<B>>>>,
}

impl<B: BlobStore> Default for Integration<B> {
  fn default() -> Self {
    Self {
      slot:     Arc::new(StoreSlot::new()),
      platform: RwLock::new(None),
    }
  }
}

impl<B: BlobStore + 'static> Integration<B> {
  pub fn new() -> Self { Self::default() }

  pub fn slot(&self) -> Arc<StoreSlot<B>> { self.slot.clone() }

  pub fn store(&self) -> Option<Arc<AssetStore<B>>> { self.slot.get() }

  pub fn platform(&self) -> Option<Arc<EntityPlatform<B>>> {
    self
      .platform
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  pub fn is_loaded(&self) -> bool { self.slot.get().is_some() }

  /// Load a store over `backend` and bring the integration up.
  ///
  /// Any previous setup is unloaded first. A document of the wrong shape
  /// fails with [`Error::SetupNotReady`] and leaves the integration down.
  pub async fn setup(&self, backend: B) -> Result<LoadReport> {
    self.unload();

    let store = Arc::new(AssetStore::new(backend));
    let report = store.load().await.map_err(Error::SetupNotReady)?;

    let platform = Arc::new(EntityPlatform::attach(&store));
    *self.platform.write().unwrap_or_else(PoisonError::into_inner) =
      Some(platform);
    self.slot.attach(store);

    info!(
      loaded = report.loaded,
      skipped = report.skipped,
      "asset record set up"
    );
    Ok(report)
  }

  /// Run [`Integration::setup`] until it succeeds or `policy` is used up.
  /// `backend` is called once per attempt.
  pub async fn setup_with_retry(
    &self,
    mut backend: impl FnMut() -> B,
    policy: RetryPolicy,
  ) -> Result<LoadReport> {
    let mut attempt = 0;
    loop {
      match self.setup(backend()).await {
        Ok(report) => return Ok(report),
        Err(e) if attempt < policy.retries => {
          attempt += 1;
          warn!(
            error = %e,
            attempt,
            retries = policy.retries,
            "setup failed; retrying"
          );
          tokio::time::sleep(policy.delay).await;
        }
        Err(e) => return Err(e),
      }
    }
  }

  /// Stop the entity platform and withdraw the store. Returns whether
  /// anything was loaded.
  pub fn unload(&self) -> bool {
    let platform = self
      .platform
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .take();
    if let Some(platform) = &platform {
      platform.detach();
    }
    let store = self.slot.detach();
    let was_loaded = platform.is_some() || store.is_some();
    if was_loaded {
      info!("asset record unloaded");
    }
    was_loaded
  }
}
