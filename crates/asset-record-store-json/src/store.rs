//! [`JsonFileStore`] — the file implementation of [`BlobStore`].

use std::path::{Path, PathBuf};

use asset_record_core::BlobStore;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};

use crate::{Error, Result, envelope::Envelope};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Stores the asset document in one JSON file.
///
/// Cloning is cheap; clones write to the same path. Callers are expected to
/// serialize saves (the asset store already does).
#[derive(Debug, Clone)]
pub struct JsonFileStore {
  path: PathBuf,
}

impl JsonFileStore {
  /// A store backed by `path`. Nothing is read or created until the first
  /// load or save.
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

  pub fn path(&self) -> &Path { &self.path }

  fn temp_path(&self) -> PathBuf {
    let mut name = self
      .path
      .file_name()
      .map(|n| n.to_os_string())
      .unwrap_or_default();
    name.push(".tmp");
    self.path.with_file_name(name)
  }
}

impl BlobStore for JsonFileStore {
  type Error = Error;

  async fn load(&self) -> Result<Option<Value>> {
    let bytes = match fs::read(&self.path).await {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        debug!(path = %self.path.display(), "no storage file yet");
        return Ok(None);
      }
      Err(e) => return Err(Error::io(&self.path, e)),
    };

    let envelope: Envelope = serde_json::from_slice(&bytes)?;
    if envelope.key != crate::STORAGE_KEY {
      warn!(
        path = %self.path.display(),
        key = %envelope.key,
        "storage file has an unexpected key"
      );
    }
    envelope.into_data().map(Some)
  }

  async fn save(&self, document: Value) -> Result<()> {
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty())
    {
      fs::create_dir_all(parent)
        .await
        .map_err(|e| Error::io(parent, e))?;
    }

    let bytes = serde_json::to_vec_pretty(&Envelope::wrap(document))?;
    let temp = self.temp_path();
    fs::write(&temp, &bytes)
      .await
      .map_err(|e| Error::io(&temp, e))?;
    fs::rename(&temp, &self.path)
      .await
      .map_err(|e| Error::io(&self.path, e))?;

    debug!(path = %self.path.display(), bytes = bytes.len(), "wrote storage file");
    Ok(())
  }
}
