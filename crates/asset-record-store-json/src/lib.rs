//! File backend for the Asset Record store.
//!
//! Persists the asset document as a single versioned JSON file. Writes go to
//! a sibling temp file that is then renamed over the target.

mod envelope;
mod store;

pub mod error;

pub use envelope::{STORAGE_KEY, STORAGE_MINOR_VERSION, STORAGE_VERSION};
pub use error::{Error, Result};
pub use store::JsonFileStore;
