//! Store behaviour against the in-memory blob backend.

use std::{
  collections::HashSet,
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::json;

use crate::{
  AssetField, AssetStore, Error, FieldValue, MemoryBlobStore, NewAsset,
};

fn store() -> AssetStore<MemoryBlobStore> {
  AssetStore::new(MemoryBlobStore::new())
}

fn counting_listener(
  store: &AssetStore<MemoryBlobStore>,
) -> (Arc<AtomicUsize>, crate::Unsubscribe) {
  let count = Arc::new(AtomicUsize::new(0));
  let inner = count.clone();
  let unsub = store.add_listener(move || {
    inner.fetch_add(1, Ordering::SeqCst);
  });
  (count, unsub)
}

fn naive(raw: &str) -> NaiveDateTime {
  NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").unwrap()
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_with_name_only_uses_defaults() {
  let s = store();
  let asset = s.create(NewAsset::new("Drill")).await.unwrap();

  assert_eq!(s.len(), 1);
  assert_eq!(asset.name, "Drill");
  assert_eq!(asset.brand, "");
  assert_eq!(asset.value, 0.0);
  assert!(asset.purchase_at.is_none());
  assert_eq!(asset.created_at, asset.updated_at);
  assert!(crate::id::is_valid(&asset.id));
  assert_eq!(s.get(&asset.id), Some(asset));
}

#[tokio::test]
async fn create_normalizes_naive_purchase_date_to_utc() {
  let s = store();
  let input = NewAsset {
    purchase_at: Some(naive("2024-01-15T10:00:00").into()),
    ..NewAsset::new("TV")
  };
  let asset = s.create(input).await.unwrap();

  let expected: DateTime<Utc> = "2024-01-15T10:00:00Z".parse().unwrap();
  assert_eq!(asset.purchase_at, Some(expected));
}

#[tokio::test]
async fn create_with_all_fields_saves_and_notifies_once() {
  let s = store();
  let (notified, _unsub) = counting_listener(&s);

  let input = NewAsset {
    brand: "Bosch".into(),
    category: "Tools".into(),
    value: 129.5,
    warranty_until: Some(naive("2027-03-01T00:00:00").into()),
    manual_md: "# Manual".into(),
    ..NewAsset::new("Drill")
  };
  s.create(input).await.unwrap();

  assert_eq!(s.backend().save_count(), 1);
  assert_eq!(notified.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn create_rejects_blank_name() {
  let s = store();
  let (notified, _unsub) = counting_listener(&s);

  let err = s.create(NewAsset::new("   ")).await.unwrap_err();
  assert!(matches!(err, Error::InvalidInput(_)));
  assert!(s.is_empty());
  assert_eq!(s.backend().save_count(), 0);
  assert_eq!(notified.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn create_trims_the_name() {
  let s = store();
  let asset = s.create(NewAsset::new("  Kettle  ")).await.unwrap();
  assert_eq!(asset.name, "Kettle");
}

#[tokio::test]
async fn created_ids_are_distinct() {
  let s = store();
  let mut ids = HashSet::new();
  for n in 0..50 {
    let asset = s.create(NewAsset::new(format!("Item {n}"))).await.unwrap();
    assert!(ids.insert(asset.id));
  }
  assert_eq!(s.len(), 50);
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_sets_field_and_bumps_updated_at() {
  let s = store();
  let asset = s.create(NewAsset::new("Drill")).await.unwrap();
  let (notified, _unsub) = counting_listener(&s);

  assert!(s.update(&asset.id, "brand", "Makita").await.unwrap());

  let updated = s.get(&asset.id).unwrap();
  assert_eq!(updated.brand, "Makita");
  assert!(updated.updated_at >= asset.updated_at);
  assert_eq!(updated.created_at, asset.created_at);
  assert_eq!(notified.load(Ordering::SeqCst), 1);
  assert_eq!(s.backend().save_count(), 2);
}

#[tokio::test]
async fn update_rejects_unknown_field() {
  let s = store();
  let asset = s.create(NewAsset::new("Drill")).await.unwrap();

  assert!(!s.update(&asset.id, "not_a_field", "x").await.unwrap());
  assert_eq!(s.get(&asset.id).unwrap().updated_at, asset.updated_at);
  assert_eq!(s.backend().save_count(), 1);
}

#[tokio::test]
async fn update_rejects_type_mismatch() {
  let s = store();
  let asset = s
    .create(NewAsset {
      value: 10.0,
      ..NewAsset::new("Drill")
    })
    .await
    .unwrap();
  let (notified, _unsub) = counting_listener(&s);

  assert!(!s.update(&asset.id, "value", "abc").await.unwrap());
  assert!(!s.update(&asset.id, "brand", 3.5_f64).await.unwrap());

  assert_eq!(s.get(&asset.id), Some(asset));
  assert_eq!(notified.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn update_rejects_blank_name() {
  let s = store();
  let asset = s.create(NewAsset::new("Drill")).await.unwrap();
  assert!(!s.update(&asset.id, "name", "  ").await.unwrap());
  assert_eq!(s.get(&asset.id).unwrap().name, "Drill");
}

#[tokio::test]
async fn update_unknown_asset_is_false() {
  let s = store();
  assert!(!s.update("asset_00", "name", "Ghost").await.unwrap());
}

#[tokio::test]
async fn update_can_clear_a_timestamp() {
  let s = store();
  let asset = s
    .create(NewAsset {
      warranty_until: Some(naive("2030-01-01T00:00:00").into()),
      ..NewAsset::new("Fridge")
    })
    .await
    .unwrap();

  assert!(
    s.update(&asset.id, "warranty_until", FieldValue::Null)
      .await
      .unwrap()
  );
  assert!(s.get(&asset.id).unwrap().warranty_until.is_none());
}

#[tokio::test]
async fn update_fields_is_all_or_nothing() {
  let s = store();
  let asset = s.create(NewAsset::new("Drill")).await.unwrap();
  let (notified, _unsub) = counting_listener(&s);

  let rejected = s
    .update_fields(&asset.id, vec![
      (AssetField::Brand, FieldValue::from("Makita")),
      (AssetField::Value, FieldValue::from("lots")),
    ])
    .await
    .unwrap();
  assert!(!rejected);
  assert_eq!(s.get(&asset.id).unwrap().brand, "");

  let accepted = s
    .update_fields(&asset.id, vec![
      (AssetField::Brand, FieldValue::from("Makita")),
      (AssetField::Value, FieldValue::Number(80.0)),
      (AssetField::Category, FieldValue::from("Tools")),
    ])
    .await
    .unwrap();
  assert!(accepted);
  let updated = s.get(&asset.id).unwrap();
  assert_eq!(
    (updated.brand.as_str(), updated.value, updated.category.as_str()),
    ("Makita", 80.0, "Tools")
  );
  assert_eq!(notified.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_update_batch_is_a_noop() {
  let s = store();
  let asset = s.create(NewAsset::new("Drill")).await.unwrap();
  assert!(s.update_fields(&asset.id, Vec::new()).await.unwrap());
  assert_eq!(s.backend().save_count(), 1);
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_then_get_is_gone() {
  let s = store();
  let asset = s.create(NewAsset::new("Drill")).await.unwrap();

  assert!(s.delete(&asset.id).await.unwrap());
  assert!(s.get(&asset.id).is_none());
  assert!(!s.update(&asset.id, "brand", "x").await.unwrap());
  assert!(!s.delete(&asset.id).await.unwrap());
  assert_eq!(s.backend().save_count(), 2);
}

#[tokio::test]
async fn views_are_snapshots() {
  let s = store();
  let asset = s.create(NewAsset::new("Drill")).await.unwrap();
  let before = s.list();

  s.delete(&asset.id).await.unwrap();

  assert!(before.contains(&asset.id));
  assert!(s.list().is_empty());
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn saved_document_reloads_into_an_equal_store() {
  let s = store();
  let input = NewAsset {
    brand: "Frosty".into(),
    value: 899.99,
    purchase_at: Some(naive("2023-04-01T09:30:00").into()),
    maintenance_md: "- clean coils".into(),
    ..NewAsset::new("Fridge")
  };
  let asset = s.create(input).await.unwrap();

  let document = s.backend().document().unwrap();
  assert_eq!(
    document["assets"][0]["purchase_at"],
    json!("2023-04-01T09:30:00+00:00")
  );

  let reloaded = AssetStore::new(MemoryBlobStore::with_document(document));
  let report = reloaded.load().await.unwrap();
  assert_eq!(report.loaded, 1);
  assert_eq!(reloaded.get(&asset.id), Some(asset));
}

#[tokio::test]
async fn load_skips_corrupt_records() {
  let document = json!({
    "assets": [
      { "id": "asset_01", "name": "Drill", "created_at": "2024-01-01T00:00:00+00:00" },
      { "name": "no id at all" },
      { "id": "asset_02", "name": "Saw", "value": "12.5" },
      { "id": "asset_01", "name": "Duplicate" },
    ]
  });
  let s = AssetStore::new(MemoryBlobStore::with_document(document));

  let report = s.load().await.unwrap();
  assert_eq!(report.loaded, 2);
  assert_eq!(report.skipped, 2);
  assert_eq!(s.get("asset_01").unwrap().name, "Drill");
  assert_eq!(s.get("asset_02").unwrap().value, 12.5);
}

#[tokio::test]
async fn load_failure_starts_empty() {
  let blob = MemoryBlobStore::with_document(json!({
    "assets": [{ "id": "asset_01", "name": "Drill" }]
  }));
  blob.fail_loads(true);
  let s = AssetStore::new(blob);

  assert_eq!(s.load().await.unwrap().loaded, 0);
  assert!(s.is_empty());
}

#[tokio::test]
async fn load_with_nothing_saved_is_empty() {
  let s = store();
  assert_eq!(s.load().await.unwrap(), crate::LoadReport::default());
}

#[tokio::test]
async fn malformed_document_is_an_error() {
  let s = AssetStore::new(MemoryBlobStore::with_document(json!({
    "assets": "nope"
  })));
  assert!(matches!(s.load().await, Err(Error::MalformedDocument(_))));
}

#[tokio::test]
async fn save_failure_propagates_without_rollback() {
  let s = store();
  let (notified, _unsub) = counting_listener(&s);
  s.backend().fail_saves(true);

  let err = s.create(NewAsset::new("Drill")).await.unwrap_err();
  assert!(matches!(err, Error::Persistence(_)));
  assert_eq!(s.len(), 1);
  assert_eq!(notified.load(Ordering::SeqCst), 0);

  s.backend().fail_saves(false);
  let id = s.list().iter().next().unwrap().id.clone();
  assert!(s.update(&id, "brand", "Bosch").await.unwrap());
  let saved = s.backend().document().unwrap();
  assert_eq!(saved["assets"].as_array().unwrap().len(), 1);
}

// ─── Listeners ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn only_subscribed_listeners_are_notified() {
  let s = store();
  let (first, unsub_first) = counting_listener(&s);
  let (second, _unsub_second) = counting_listener(&s);

  unsub_first.unsubscribe();
  s.create(NewAsset::new("Drill")).await.unwrap();

  assert_eq!(first.load(Ordering::SeqCst), 0);
  assert_eq!(second.load(Ordering::SeqCst), 1);
  assert_eq!(s.listener_count(), 1);
}

#[tokio::test]
async fn unsubscribe_is_idempotent() {
  let s = store();
  let (count, unsub) = counting_listener(&s);

  s.create(NewAsset::new("One")).await.unwrap();
  unsub.unsubscribe();
  unsub.unsubscribe();
  s.create(NewAsset::new("Two")).await.unwrap();

  assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn listeners_can_read_the_store() {
  let s = Arc::new(store());
  let seen = Arc::new(AtomicUsize::new(0));

  let (reader, seen_inner) = (Arc::downgrade(&s), seen.clone());
  let _unsub = s.add_listener(move || {
    if let Some(store) = reader.upgrade() {
      seen_inner.store(store.list().len(), Ordering::SeqCst);
    }
  });

  s.create(NewAsset::new("One")).await.unwrap();
  s.create(NewAsset::new("Two")).await.unwrap();
  assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn concurrent_creates_are_all_persisted() {
  let s = Arc::new(store());
  let tasks: Vec<_> = (0..16)
    .map(|n| {
      let s = s.clone();
      tokio::spawn(async move { s.create(NewAsset::new(format!("Item {n}"))).await })
    })
    .collect();
  for task in tasks {
    task.await.unwrap().unwrap();
  }

  assert_eq!(s.len(), 16);
  let saved = s.backend().document().unwrap();
  assert_eq!(saved["assets"].as_array().unwrap().len(), 16);
}
