//! Cart rules exercised through the public core API.

#![allow(clippy::unwrap_used)]

use serde_json::{Value, json};
use session_cart_core::{
    Cart, CartConfig, CartStore, MemoryAdapter, PersistenceAdapter, StorageMode, StoreKey,
};

fn key() -> StoreKey {
    StoreKey::for_host(Some("shop.example.com"))
}

fn open(config: CartConfig, adapter: MemoryAdapter) -> CartStore<MemoryAdapter> {
    CartStore::open(config, key(), adapter)
}

#[test]
fn test_merge_and_variant_examples() {
    let mut cart = open(CartConfig::default(), MemoryAdapter::new());
    cart.add("shirt", 2, json!({"size": "L"})).unwrap();
    cart.add("shirt", 3, json!({"size": "L"})).unwrap();
    assert_eq!(cart.total_quantity(), 5);
    assert_eq!(cart.total_item(), 1);

    let mut cart = open(CartConfig::default(), MemoryAdapter::new());
    cart.add("shirt", 1, json!({"size": "L"})).unwrap();
    cart.add("shirt", 1, json!({"size": "M"})).unwrap();
    assert_eq!(cart.total_item(), 2);
    assert!(cart.item_exists("shirt", json!({"size": "L"})));
    assert!(!cart.item_exists("shirt", json!({"size": "S"})));
}

#[test]
fn test_clamp_and_fallback_examples() {
    let mut cart = open(
        CartConfig::default().with_item_max_quantity(10),
        MemoryAdapter::new(),
    );
    cart.add("x", 15, ()).unwrap();
    assert_eq!(cart.total_quantity(), 10);

    let mut cart = open(CartConfig::default(), MemoryAdapter::new());
    cart.add("x", -3, ()).unwrap();
    cart.add("y", "abc", ()).unwrap();
    assert_eq!(cart.total_quantity(), 2);
}

#[test]
fn test_destroy_then_reopen_is_empty() {
    for mode in [StorageMode::Session, StorageMode::Cookie] {
        let config = CartConfig::default().with_storage(mode);
        let mut cart = open(config, MemoryAdapter::new());
        cart.add("shirt", 1, json!({"size": "L"})).unwrap();
        cart.destroy().unwrap();

        let adapter = cart.into_adapter();
        assert_eq!(adapter.load(&key()).unwrap(), None);
        assert!(open(config, adapter).is_empty());
    }
}

#[test]
fn test_persisted_blob_format() {
    let mut cart = open(CartConfig::default(), MemoryAdapter::new());
    cart.add("shirt", 2, json!({"size": "L", "note": ""})).unwrap();
    cart.add("mug", 1, ()).unwrap();
    cart.remove("mug", ()).unwrap();

    let blob: Value =
        serde_json::from_str(&cart.adapter().load(&key()).unwrap().unwrap()).unwrap();
    let line = &blob["shirt"][0];
    assert_eq!(blob.as_object().unwrap().len(), 1);
    assert_eq!(line["quantity"], json!(2));
    assert_eq!(line["attributes"], json!({"size": "L"}));
    assert_eq!(line["hash"].as_str().unwrap().len(), 32);
}

#[test]
fn test_carts_are_scoped_by_host() {
    let mut adapter = MemoryAdapter::new();
    let a = StoreKey::for_host(Some("a.example.com"));
    let b = StoreKey::for_host(Some("b.example.com"));

    let mut cart = CartStore::open(CartConfig::default(), a.clone(), &mut adapter);
    cart.add("shirt", 1, ()).unwrap();

    assert_eq!(
        CartStore::open(CartConfig::default(), b, &mut adapter).total_item(),
        0
    );
    assert_eq!(
        CartStore::open(CartConfig::default(), a, &mut adapter).total_item(),
        1
    );
}

#[test]
fn test_legacy_blob_shapes_load() {
    let blob = r#"[{"0":{"quantity":"3","hash":"old","attributes":[]}}]"#;
    let cart = open(CartConfig::default(), MemoryAdapter::with_blob(&key(), blob));
    assert_eq!(cart.total_quantity(), 3);
    assert!(cart.item_exists("0", ()));

    let blob = r#"{"shirt":{"0":{"quantity":1,"attributes":{"size":"L"}},"1":{"quantity":2,"attributes":{"size":"L"}}}}"#;
    let cart = open(CartConfig::default(), MemoryAdapter::with_blob(&key(), blob));
    assert_eq!(cart.total_item(), 1);
    assert_eq!(cart.total_quantity(), 3);
}

#[test]
fn test_round_trip_excludes_empty_groups() {
    let mut cart = open(CartConfig::default(), MemoryAdapter::new());
    cart.add("shirt", 1, json!({"size": "L"})).unwrap();
    cart.add("mug", 4, ()).unwrap();
    cart.remove("shirt", json!({"size": "L"})).unwrap();

    let restored = Cart::from_blob(&cart.items().to_blob().unwrap()).unwrap();
    assert!(restored.group(&"shirt".into()).is_none());
    assert_eq!(restored.total_quantity(), 4);
}
