//! Platform behaviour as the store changes underneath it.

use std::sync::Arc;

use asset_record_core::{
  AssetField, AssetStore, MemoryBlobStore, NewAsset, datetime,
};
use serde_json::{Value, json};

use crate::{
  EntityPlatform, EntityPlatformKind, EntityValue, Error, entity::unique_id,
};

fn store() -> Arc<AssetStore<MemoryBlobStore>> {
  Arc::new(AssetStore::new(MemoryBlobStore::new()))
}

#[tokio::test]
async fn attach_builds_entities_for_existing_assets() {
  let store = store();
  let drill = store.create(NewAsset::new("Drill")).await.unwrap();
  store.create(NewAsset::new("Saw")).await.unwrap();

  let platform = EntityPlatform::attach(&store);

  assert_eq!(platform.device_count(), 2);
  assert_eq!(platform.entity_count(), 14);
  let device = platform.device(&drill.id).unwrap();
  assert_eq!(device.name, "Drill");
  assert_eq!(device.manufacturer, "Asset Record");
  assert_eq!(device.model, "Asset");
}

#[tokio::test]
async fn created_assets_get_entities_once() {
  let store = store();
  let platform = EntityPlatform::attach(&store);

  let tv = store.create(NewAsset::new("TV")).await.unwrap();
  assert_eq!(platform.entity_count(), 7);

  store.update(&tv.id, "brand", "Sony").await.unwrap();
  assert_eq!(platform.entity_count(), 7);

  let brand = platform
    .state(&unique_id(&tv.id, AssetField::Brand))
    .unwrap();
  assert_eq!(brand.state, json!("Sony"));
  assert_eq!(brand.attributes["asset_id"], json!(tv.id));
}

#[tokio::test]
async fn deleting_an_asset_removes_its_device_and_entities() {
  let store = store();
  let platform = EntityPlatform::attach(&store);
  let tv = store.create(NewAsset::new("TV")).await.unwrap();
  let radio = store.create(NewAsset::new("Radio")).await.unwrap();

  store.delete(&tv.id).await.unwrap();

  assert!(platform.device(&tv.id).is_none());
  assert!(platform.device(&radio.id).is_some());
  assert_eq!(platform.entity_count(), 7);
  assert!(platform.states().iter().all(|s| s.device == radio.id));
}

#[tokio::test]
async fn renaming_updates_the_device() {
  let store = store();
  let platform = EntityPlatform::attach(&store);
  let tv = store.create(NewAsset::new("TV")).await.unwrap();

  store.update(&tv.id, "name", "Living room TV").await.unwrap();
  assert_eq!(platform.device(&tv.id).unwrap().name, "Living room TV");
}

#[tokio::test]
async fn multiline_text_is_truncated_with_raw_content() {
  let store = store();
  let manual = "a".repeat(400);
  let asset = store
    .create(NewAsset {
      manual_md: manual.clone(),
      brand: "b".repeat(300),
      ..NewAsset::new("Boiler")
    })
    .await
    .unwrap();
  let platform = EntityPlatform::attach(&store);

  let state = platform
    .state(&unique_id(&asset.id, AssetField::ManualMd))
    .unwrap();
  let shown = state.state.as_str().unwrap();
  assert_eq!(shown.len(), 255);
  assert!(shown.ends_with("..."));
  assert_eq!(state.attributes["raw_content"], json!(manual));

  let brand = platform
    .state(&unique_id(&asset.id, AssetField::Brand))
    .unwrap();
  assert_eq!(brand.state.as_str().unwrap().len(), 255);
  assert!(!brand.attributes.contains_key("raw_content"));
}

#[tokio::test]
async fn datetime_and_number_states() {
  let store = store();
  let asset = store
    .create(NewAsset {
      value: 1299.99,
      purchase_at: datetime::parse("2024-01-15T10:00:00+02:00"),
      ..NewAsset::new("Laptop")
    })
    .await
    .unwrap();
  let platform = EntityPlatform::attach(&store);

  let purchase = platform
    .state(&unique_id(&asset.id, AssetField::PurchaseAt))
    .unwrap();
  assert_eq!(purchase.platform, EntityPlatformKind::Datetime);
  assert_eq!(purchase.state, json!("2024-01-15T08:00:00+00:00"));

  let warranty = platform
    .state(&unique_id(&asset.id, AssetField::WarrantyUntil))
    .unwrap();
  assert_eq!(warranty.state, Value::Null);

  let value = platform
    .state(&unique_id(&asset.id, AssetField::Value))
    .unwrap();
  assert_eq!(value.state, json!(1299.99));
  assert_eq!(value.attributes["mode"], json!("box"));
  assert_eq!(value.attributes["max"], json!(99_999_999.0));
}

#[tokio::test]
async fn set_value_writes_through_to_the_store() {
  let store = store();
  let platform = EntityPlatform::attach(&store);
  let asset = store.create(NewAsset::new("Drill")).await.unwrap();

  let value_id = unique_id(&asset.id, AssetField::Value);
  assert!(
    platform
      .set_value(&value_id, EntityValue::Number(42.5))
      .await
      .unwrap()
  );
  assert_eq!(store.get(&asset.id).unwrap().value, 42.5);
  assert_eq!(platform.state(&value_id).unwrap().state, json!(42.5));

  let warranty_id = unique_id(&asset.id, AssetField::WarrantyUntil);
  let until = datetime::parse_strict(Some("2027-06-30")).unwrap();
  platform
    .set_value(&warranty_id, EntityValue::Datetime(until))
    .await
    .unwrap();
  assert_eq!(store.get(&asset.id).unwrap().warranty_until, until);
}

#[tokio::test]
async fn set_value_enforces_bounds_and_types() {
  let store = store();
  let platform = EntityPlatform::attach(&store);
  let asset = store.create(NewAsset::new("Drill")).await.unwrap();
  let value_id = unique_id(&asset.id, AssetField::Value);

  for bad in [-0.01, 100_000_000.0, f64::NAN] {
    let err = platform
      .set_value(&value_id, EntityValue::Number(bad))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::OutOfRange { .. }));
  }

  let err = platform
    .set_value(&value_id, EntityValue::Text("10".into()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::WrongValueType { .. }));

  let err = platform
    .set_value("asset_record_nope_value", EntityValue::Number(1.0))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UnknownEntity(_)));

  assert_eq!(store.get(&asset.id).unwrap().value, 0.0);
}

#[tokio::test]
async fn detach_stops_following_the_store() {
  let store = store();
  let platform = EntityPlatform::attach(&store);
  store.create(NewAsset::new("Drill")).await.unwrap();
  assert_eq!(store.listener_count(), 1);

  platform.detach();
  platform.detach();
  store.create(NewAsset::new("Saw")).await.unwrap();

  assert_eq!(store.listener_count(), 0);
  assert_eq!(platform.entity_count(), 0);
}

#[tokio::test]
async fn remove_asset_hook_can_be_called_directly() {
  let store = store();
  let asset = store.create(NewAsset::new("Drill")).await.unwrap();
  let platform = EntityPlatform::attach(&store);

  assert_eq!(platform.remove_asset(&asset.id), 7);
  assert_eq!(platform.remove_asset(&asset.id), 0);
  assert!(platform.asset_ids().is_empty());
}
