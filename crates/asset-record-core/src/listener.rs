//! Change-notification fan-out.
//!
//! Listeners are zero-argument callbacks invoked synchronously after every
//! successful mutation. They are expected to be well-behaved observers: a
//! panicking listener is not caught.

use std::{
  collections::BTreeMap,
  fmt,
  sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
  last_id:   u64,
  /// Keyed by registration counter, so iteration follows registration order.
  listeners: BTreeMap<u64, Listener>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
  registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The set of registered listeners.
#[derive(Clone, Default)]
pub(crate) struct Listeners {
  registry: Arc<Mutex<Registry>>,
}

impl Listeners {
  pub(crate) fn add(
    &self,
    listener: impl Fn() + Send + Sync + 'static,
  ) -> Unsubscribe {
    let mut registry = lock(&self.registry);
    registry.last_id += 1;
    let id = registry.last_id;
    registry.listeners.insert(id, Arc::new(listener));
    Unsubscribe {
      registry: Arc::downgrade(&self.registry),
      id,
    }
  }

  /// Invoke every listener registered at the time of the call.
  ///
  /// The lock is released before any listener runs, so listeners may add or
  /// remove registrations (including their own) while being notified.
  pub(crate) fn notify(&self) {
    let snapshot: Vec<Listener> =
      lock(&self.registry).listeners.values().cloned().collect();
    for listener in snapshot {
      listener();
    }
  }

  pub(crate) fn len(&self) -> usize { lock(&self.registry).listeners.len() }
}

/// Removes one listener registration.
///
/// Calling [`Unsubscribe::unsubscribe`] more than once is a no-op, as is
/// calling it after the store has been dropped. Dropping the handle does
/// *not* unsubscribe.
pub struct Unsubscribe {
  registry: Weak<Mutex<Registry>>,
  id:       u64,
}

impl Unsubscribe {
  pub fn unsubscribe(&self) {
    if let Some(registry) = self.registry.upgrade() {
      lock(&registry).listeners.remove(&self.id);
    }
  }
}

impl fmt::Debug for Unsubscribe {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Unsubscribe").field("id", &self.id).finish()
  }
}
