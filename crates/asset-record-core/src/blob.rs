//! The [`BlobStore`] trait and an in-memory implementation.
//!
//! The asset collection is persisted as one JSON document. Backends only move
//! that document in and out; they know nothing about its contents.

use std::{
  future::Future,
  sync::{
    Mutex,
    PoisonError,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use serde_json::Value;
use thiserror::Error;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Durable load/save of the whole asset document.
///
/// All methods return `Send` futures so the store can be shared across a
/// multi-threaded runtime.
pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the stored document, or `None` if nothing has been saved yet.
  fn load(
    &self,
  ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send + '_;

  /// Replace the stored document.
  fn save(
    &self,
    document: Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── MemoryBlobStore ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MemoryBlobError {
  #[error("simulated load failure")]
  Load,

  #[error("simulated save failure")]
  Save,
}

/// A [`BlobStore`] that keeps the document in process memory.
///
/// Useful for tests and throwaway runs. Loads and saves can be made to fail
/// on demand, and saves are counted.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
  document:  Mutex<Option<Value>>,
  saves:     AtomicUsize,
  fail_load: AtomicBool,
  fail_save: AtomicBool,
}

impl MemoryBlobStore {
  pub fn new() -> Self { Self::default() }

  /// Start with `document` already stored.
  pub fn with_document(document: Value) -> Self {
    Self {
      document: Mutex::new(Some(document)),
      ..Self::default()
    }
  }

  /// The most recently saved (or seeded) document.
  pub fn document(&self) -> Option<Value> {
    self
      .document
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  /// Number of successful saves so far.
  pub fn save_count(&self) -> usize { self.saves.load(Ordering::SeqCst) }

  pub fn fail_loads(&self, fail: bool) {
    self.fail_load.store(fail, Ordering::SeqCst);
  }

  pub fn fail_saves(&self, fail: bool) {
    self.fail_save.store(fail, Ordering::SeqCst);
  }
}

impl BlobStore for MemoryBlobStore {
  type Error = MemoryBlobError;

  async fn load(&self) -> Result<Option<Value>, MemoryBlobError> {
    if self.fail_load.load(Ordering::SeqCst) {
      return Err(MemoryBlobError::Load);
    }
    Ok(self.document())
  }

  async fn save(&self, document: Value) -> Result<(), MemoryBlobError> {
    if self.fail_save.load(Ordering::SeqCst) {
      return Err(MemoryBlobError::Save);
    }
    *self.document.lock().unwrap_or_else(PoisonError::into_inner) =
      Some(document);
    self.saves.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }
}
