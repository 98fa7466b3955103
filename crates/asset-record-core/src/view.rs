//! [`AssetsView`] — the read-only face of the store's asset map.

use std::{collections::HashMap, sync::Arc};

use crate::Asset;

/// An immutable snapshot of every asset at the moment it was taken.
///
/// Holding a view never blocks the store: the next mutation copies the map
/// instead of writing through a shared one. Cloning a view is cheap.
#[derive(Debug, Clone, Default)]
pub struct AssetsView {
  assets: Arc<HashMap<String, Asset>>,
}

impl AssetsView {
  pub(crate) fn new(assets: Arc<HashMap<String, Asset>>) -> Self {
    Self { assets }
  }

  pub fn get(&self, id: &str) -> Option<&Asset> { self.assets.get(id) }

  pub fn contains(&self, id: &str) -> bool { self.assets.contains_key(id) }

  pub fn len(&self) -> usize { self.assets.len() }

  pub fn is_empty(&self) -> bool { self.assets.is_empty() }

  /// Iterate in no particular order.
  pub fn iter(&self) -> impl Iterator<Item = &Asset> { self.assets.values() }

  /// Assets ordered by creation time, then id.
  pub fn sorted(&self) -> Vec<&Asset> {
    let mut assets: Vec<&Asset> = self.assets.values().collect();
    assets.sort_by(|a, b| {
      a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
    });
    assets
  }
}

impl<'a> IntoIterator for &'a AssetsView {
  type IntoIter = std::collections::hash_map::Values<'a, String, Asset>;
  type Item = &'a Asset;

  fn into_iter(self) -> Self::IntoIter { self.assets.values() }
}
