//! Core types for Asset Record: the asset model, the datetime normalizer, and
//! the [`AssetStore`] coordinator with its change-notification fan-out.
//!
//! This crate is free of HTTP and file-system dependencies. Durable storage
//! is reached through the [`BlobStore`] trait; `asset-record-store-json`
//! provides the on-disk implementation.

pub mod asset;
pub mod blob;
pub mod datetime;
pub mod document;
pub mod error;
pub mod id;
pub mod listener;
pub mod store;
pub mod view;

pub use asset::{Asset, AssetField, Change, FieldKind, FieldValue, NewAsset};
pub use blob::{BlobStore, MemoryBlobStore};
pub use error::{Error, Result};
pub use listener::Unsubscribe;
pub use store::{AssetStore, LoadReport};
pub use view::AssetsView;

#[cfg(test)]
mod tests;
