//! [`EntityPlatform`] — keeps devices and entities in step with the store.

use std::{
  collections::{BTreeMap, HashMap, HashSet},
  sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use asset_record_core::{
  Asset, AssetStore, AssetsView, BlobStore, FieldValue, Unsubscribe,
};
use tracing::{debug, info};

use crate::{
  Device, Entity, EntityPlatformKind, EntityState, EntityValue, Error, Result,
  TEXT_NATIVE_MAX, VALUE_MAX, VALUE_MIN,
};

#[derive(Default)]
struct Registry {
  devices:  BTreeMap<String, Device>,
  entities: BTreeMap<String, Entity>,
  /// Last seen copy of each asset, read when rendering state.
  assets:   HashMap<String, Asset>,
}

impl Registry {
  /// Bring the registry in line with `view`: add what is new, refresh what
  /// changed, and remove assets that are gone.
  fn sync(&mut self, view: &AssetsView) {
    let mut added = 0;
    for asset in view {
      self
        .devices
        .insert(asset.id.clone(), Device::for_asset(asset));
      for entity in Entity::for_asset(&asset.id) {
        if !self.entities.contains_key(&entity.unique_id) {
          self.entities.insert(entity.unique_id.clone(), entity);
          added += 1;
        }
      }
      self.assets.insert(asset.id.clone(), asset.clone());
    }

    let gone: Vec<String> = self
      .assets
      .keys()
      .filter(|id| !view.contains(id))
      .cloned()
      .collect();
    for asset_id in gone {
      self.remove_asset(&asset_id);
    }

    if added > 0 {
      debug!(added, total = self.entities.len(), "added asset entities");
    }
  }

  fn remove_asset(&mut self, asset_id: &str) -> usize {
    self.assets.remove(asset_id);
    self.devices.remove(asset_id);
    let before = self.entities.len();
    self.entities.retain(|_, entity| entity.asset_id != asset_id);
    let removed = before - self.entities.len();
    if removed > 0 {
      info!(asset_id, removed, "removed device and entities of deleted asset");
    }
    removed
  }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
  registry.lock().unwrap_or_else(PoisonError::into_inner)
}

// ─── Platform ────────────────────────────────────────────────────────────────

/// The entity side of the integration for one store.
pub struct EntityPlatform<B: BlobStore> {
  store:       Weak<AssetStore<B>>,
  registry:    Arc<Mutex<Registry>>,
  unsubscribe: Mutex<Option<Unsubscribe>>,
}

impl<B: BlobStore + 'static> EntityPlatform<B> {
  /// Create entities for every asset already in `store` and start following
  /// its changes.
  pub fn attach(store: &Arc<AssetStore<B>>) -> Self {
    let registry = Arc::new(Mutex::new(Registry::default()));
    lock(&registry).sync(&store.list());

    let weak_store = Arc::downgrade(store);
    let weak_registry = Arc::downgrade(&registry);
    let unsubscribe = store.add_listener(move || {
      let (Some(store), Some(registry)) =
        (weak_store.upgrade(), weak_registry.upgrade())
      else {
        return;
      };
      lock(&registry).sync(&store.list());
    });

    let platform = Self {
      store: Arc::downgrade(store),
      registry,
      unsubscribe: Mutex::new(Some(unsubscribe)),
    };
    info!(
      devices = platform.device_count(),
      entities = platform.entity_count(),
      "entity platform attached"
    );
    platform
  }
}

impl<B: BlobStore> EntityPlatform<B> {
  /// Stop following the store and drop every device and entity.
  pub fn detach(&self) {
    if let Some(unsubscribe) = self
      .unsubscribe
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .take()
    {
      unsubscribe.unsubscribe();
    }
    *lock(&self.registry) = Registry::default();
    debug!("entity platform detached");
  }

  /// Remove the device and entities of `asset_id`. Runs automatically when
  /// a deletion is observed; returns how many entities were removed.
  pub fn remove_asset(&self, asset_id: &str) -> usize {
    lock(&self.registry).remove_asset(asset_id)
  }

  pub fn device_count(&self) -> usize { lock(&self.registry).devices.len() }

  pub fn entity_count(&self) -> usize { lock(&self.registry).entities.len() }

  pub fn devices(&self) -> Vec<Device> {
    lock(&self.registry).devices.values().cloned().collect()
  }

  pub fn device(&self, asset_id: &str) -> Option<Device> {
    lock(&self.registry).devices.get(asset_id).cloned()
  }

  /// Current state of every entity, ordered by unique id.
  pub fn states(&self) -> Vec<EntityState> {
    let registry = lock(&self.registry);
    registry
      .entities
      .values()
      .filter_map(|entity| {
        registry
          .assets
          .get(&entity.asset_id)
          .map(|asset| entity.state(asset))
      })
      .collect()
  }

  pub fn state(&self, unique_id: &str) -> Option<EntityState> {
    let registry = lock(&self.registry);
    let entity = registry.entities.get(unique_id)?;
    registry.assets.get(&entity.asset_id).map(|a| entity.state(a))
  }

  /// Asset ids that currently have a device.
  pub fn asset_ids(&self) -> HashSet<String> {
    lock(&self.registry).devices.keys().cloned().collect()
  }

  /// Write `value` through to the asset field behind `unique_id`.
  ///
  /// Returns the store's verdict: `Ok(false)` if the asset vanished or the
  /// store refused the change.
  pub async fn set_value(
    &self,
    unique_id: &str,
    value: EntityValue,
  ) -> Result<bool> {
    let entity = lock(&self.registry)
      .entities
      .get(unique_id)
      .cloned()
      .ok_or_else(|| Error::UnknownEntity(unique_id.to_owned()))?;

    let field_value = match (entity.platform, value) {
      (EntityPlatformKind::Text, EntityValue::Text(text)) => {
        let len = text.chars().count();
        if len > TEXT_NATIVE_MAX {
          return Err(Error::TooLong {
            len,
            max: TEXT_NATIVE_MAX,
          });
        }
        FieldValue::Text(text)
      }
      (EntityPlatformKind::Number, EntityValue::Number(n)) => {
        if !(VALUE_MIN..=VALUE_MAX).contains(&n) {
          return Err(Error::OutOfRange {
            value: n,
            min:   VALUE_MIN,
            max:   VALUE_MAX,
          });
        }
        FieldValue::Number(n)
      }
      (EntityPlatformKind::Datetime, EntityValue::Datetime(ts)) => ts.into(),
      (platform, value) => {
        return Err(Error::WrongValueType {
          unique_id: unique_id.to_owned(),
          platform,
          got: value.type_name(),
        });
      }
    };

    let Some(store) = self.store.upgrade() else {
      return Ok(false);
    };
    Ok(
      store
        .update(&entity.asset_id, entity.field.as_ref(), field_value)
        .await?,
    )
  }
}
