//! The cart store.
//!
//! A [`CartStore`] is opened once per request from a [`CartConfig`], a
//! [`StoreKey`] and a [`PersistenceAdapter`]. It loads the persisted blob,
//! applies mutations in memory and writes the whole cart back after each
//! one. Reads never touch the adapter.
//!
//! Lines are identified by product id plus attribute fingerprint:
//!
//! ```
//! use session_cart_core::{CartConfig, CartStore, MemoryAdapter, StoreKey};
//!
//! let key = StoreKey::for_host(Some("shop.example.com"));
//! let mut cart = CartStore::open(CartConfig::default(), key, MemoryAdapter::new());
//!
//! cart.add("shirt", 2, [("size", "L")]).unwrap();
//! cart.add("shirt", 3, [("size", "L")]).unwrap();
//! cart.add("shirt", 1, [("size", "M")]).unwrap();
//!
//! assert_eq!(cart.total_item(), 2);
//! assert_eq!(cart.total_quantity(), 6);
//! assert!(cart.item_exists("shirt", [("size", "L")]));
//! assert!(!cart.item_exists("shirt", [("size", "S")]));
//! ```
//!
//! Concurrent requests that open the same blob each write their full copy
//! back; the last write wins.

use rust_decimal::Decimal;

use crate::cart::{Cart, CartLine};
use crate::config::CartConfig;
use crate::error::Result;
use crate::key::StoreKey;
use crate::persistence::PersistenceAdapter;
use crate::types::{AttributeInput, ProductId, RawQuantity, clamp_quantity};

/// Session-scoped cart backed by a persistence adapter.
#[derive(Debug)]
pub struct CartStore<A> {
    config: CartConfig,
    key: StoreKey,
    adapter: A,
    cart: Cart,
}

impl<A: PersistenceAdapter> CartStore<A> {
    /// Open the cart stored under `key`.
    ///
    /// A missing, empty or unreadable blob yields an empty cart. A readable
    /// blob is repaired (see [`Cart::repair`]) before use.
    pub fn open(config: CartConfig, key: StoreKey, adapter: A) -> Self {
        let cart = load_cart(&adapter, &key, config.item_max_quantity());
        Self {
            config,
            key,
            adapter,
            cart,
        }
    }

    /// Configuration the cart was opened with.
    #[must_use]
    pub const fn config(&self) -> &CartConfig {
        &self.config
    }

    /// Key the blob is persisted under.
    #[must_use]
    pub const fn key(&self) -> &StoreKey {
        &self.key
    }

    /// Borrow the adapter.
    #[must_use]
    pub const fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Close the cart and hand the adapter back to the host.
    #[must_use]
    pub fn into_adapter(self) -> A {
        self.adapter
    }

    /// All groups and lines.
    #[must_use]
    pub const fn items(&self) -> &Cart {
        &self.cart
    }

    /// Returns `true` if no group holds a line.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn total_item(&self) -> usize {
        self.cart.total_item()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.cart.total_quantity()
    }

    /// Sum of `attribute * quantity` across lines; lines without a numeric
    /// `attribute` contribute nothing.
    #[must_use]
    pub fn attribute_total(&self, attribute: &str) -> Decimal {
        self.cart.attribute_total(attribute)
    }

    /// Returns `true` if the line count is above a non-zero `cart_max_item`.
    #[must_use]
    pub fn exceeds_max_items(&self) -> bool {
        let limit = self.config.cart_max_item();
        limit > 0 && u64::try_from(self.cart.total_item()).unwrap_or(u64::MAX) > limit
    }

    /// Returns `true` if `id` has a line with matching attributes.
    pub fn item_exists(
        &self,
        id: impl Into<ProductId>,
        attributes: impl Into<AttributeInput>,
    ) -> bool {
        self.cart.find(&id.into(), &attributes.into()).is_some()
    }

    /// Add `quantity` units of `id` with `attributes`.
    ///
    /// A line with the same fingerprint has the quantity added to it;
    /// otherwise a new line is appended. Either way the result is clamped to
    /// `item_max_quantity`. A quantity that is not a non-negative integer
    /// literal counts as 1; a quantity of 0 creates no line.
    ///
    /// Always returns `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn add(
        &mut self,
        id: impl Into<ProductId>,
        quantity: impl Into<RawQuantity>,
        attributes: impl Into<AttributeInput>,
    ) -> Result<bool> {
        let id = id.into();
        let quantity = quantity.into().resolve();
        let attributes = attributes.into().normalize();
        let hash = attributes.fingerprint();
        let max = self.config.item_max_quantity();

        if let Some(line) = self
            .cart
            .group_mut(&id)
            .and_then(|lines| lines.iter_mut().find(|line| line.fingerprint() == &hash))
        {
            let merged = clamp_quantity(line.quantity().saturating_add(quantity), max);
            line.set_quantity(merged);
            tracing::debug!(%id, %hash, quantity = merged, "Merged into existing line");
        } else if quantity > 0 {
            let quantity = clamp_quantity(quantity, max);
            self.cart
                .group_or_insert(&id)
                .push(CartLine::new(quantity, attributes));
            tracing::debug!(%id, %hash, quantity, "Added line");
            self.warn_if_over_limit();
        } else {
            tracing::debug!(%id, %hash, "Zero quantity add, no line created");
        }

        self.write()?;
        Ok(true)
    }

    /// Set the quantity of the line of `id` matching `attributes`.
    ///
    /// A quantity of 0 removes the line (see [`CartStore::remove`]) and
    /// returns `true` whether or not it existed. Otherwise returns `false`
    /// when no line matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn update(
        &mut self,
        id: impl Into<ProductId>,
        quantity: impl Into<RawQuantity>,
        attributes: impl Into<AttributeInput>,
    ) -> Result<bool> {
        let id = id.into();
        let quantity = quantity.into().resolve();
        let attributes = attributes.into();

        if quantity == 0 {
            self.remove(id, attributes)?;
            return Ok(true);
        }

        let hash = attributes.normalize().fingerprint();
        let max = self.config.item_max_quantity();
        let Some(line) = self
            .cart
            .group_mut(&id)
            .and_then(|lines| lines.iter_mut().find(|line| line.fingerprint() == &hash))
        else {
            tracing::debug!(%id, %hash, "Update skipped, no matching line");
            return Ok(false);
        };

        let quantity = clamp_quantity(quantity, max);
        line.set_quantity(quantity);
        tracing::debug!(%id, %hash, quantity, "Updated line");

        self.write()?;
        Ok(true)
    }

    /// Remove lines of `id`.
    ///
    /// With no attributes every line of `id` is removed. With attributes
    /// only the matching line is removed, which can leave `id` with an empty
    /// group until the cart is next written. Returns `false`, without
    /// writing, when nothing matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn remove(
        &mut self,
        id: impl Into<ProductId>,
        attributes: impl Into<AttributeInput>,
    ) -> Result<bool> {
        let id = id.into();
        let attributes = attributes.into();

        if self.cart.group(&id).is_none() {
            return Ok(false);
        }

        if attributes.is_empty() {
            self.cart.remove_group(&id);
            tracing::debug!(%id, "Removed all lines");
            self.write()?;
            return Ok(true);
        }

        let hash = attributes.normalize().fingerprint();
        let Some(lines) = self.cart.group_mut(&id) else {
            return Ok(false);
        };
        let Some(position) = lines.iter().position(|line| line.fingerprint() == &hash) else {
            tracing::debug!(%id, %hash, "Remove skipped, no matching line");
            return Ok(false);
        };
        lines.remove(position);
        tracing::debug!(%id, %hash, "Removed line");

        self.write()?;
        Ok(true)
    }

    /// Remove every line and persist the empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn clear(&mut self) -> Result<()> {
        self.cart.clear();
        tracing::debug!(key = %self.key, "Cleared cart");
        self.write()
    }

    /// Remove every line and delete the persisted entry.
    ///
    /// Unlike [`CartStore::clear`] nothing is written: the storage entry
    /// itself goes away (the cookie expires, the session key is removed).
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter fails to delete the entry.
    pub fn destroy(&mut self) -> Result<()> {
        self.cart.clear();
        self.adapter.delete(&self.key)?;
        tracing::debug!(key = %self.key, "Destroyed cart");
        Ok(())
    }

    fn write(&mut self) -> Result<()> {
        let blob = self.cart.to_blob()?;
        self.adapter
            .save(&self.key, &blob, self.config.storage().ttl())?;
        Ok(())
    }

    fn warn_if_over_limit(&self) {
        if self.exceeds_max_items() {
            tracing::warn!(
                lines = self.cart.total_item(),
                limit = self.config.cart_max_item(),
                "Cart is above its advisory line limit"
            );
        }
    }
}

fn load_cart<A: PersistenceAdapter>(adapter: &A, key: &StoreKey, item_max_quantity: u64) -> Cart {
    let blob = match adapter.load(key) {
        Ok(Some(blob)) if !blob.trim().is_empty() => blob,
        Ok(_) => return Cart::new(),
        Err(e) => {
            tracing::warn!(%key, "Failed to load cart, starting empty: {e}");
            return Cart::new();
        }
    };

    match Cart::from_blob(&blob) {
        Ok(mut cart) => {
            if cart.repair(item_max_quantity) {
                tracing::debug!(%key, "Repaired persisted cart");
            }
            cart
        }
        Err(e) => {
            tracing::warn!(%key, "Discarding unreadable cart blob: {e}");
            Cart::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::config::StorageMode;
    use crate::persistence::{MemoryAdapter, PersistenceError};

    fn key() -> StoreKey {
        StoreKey::for_host(Some("shop.test"))
    }

    fn open(config: CartConfig) -> CartStore<MemoryAdapter> {
        CartStore::open(config, key(), MemoryAdapter::new())
    }

    fn stored(cart: &CartStore<MemoryAdapter>) -> serde_json::Value {
        let blob = &cart.adapter().entry(&key()).unwrap().blob;
        serde_json::from_str(blob).unwrap()
    }

    #[test]
    fn test_add_merges_identical_attributes() {
        let mut cart = open(CartConfig::default());
        assert!(cart.add("shirt", 2, [("size", "L")]).unwrap());
        assert!(cart.add("shirt", 3, [("size", "L")]).unwrap());

        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.total_item(), 1);
    }

    #[test]
    fn test_add_separates_different_attributes() {
        let mut cart = open(CartConfig::default());
        cart.add("shirt", 1, [("size", "L")]).unwrap();
        cart.add("shirt", 1, [("size", "M")]).unwrap();

        assert_eq!(cart.total_item(), 2);
        assert!(cart.item_exists("shirt", [("size", "L")]));
        assert!(!cart.item_exists("shirt", [("size", "S")]));
        assert!(!cart.item_exists("hat", [("size", "L")]));
    }

    #[test]
    fn test_add_clamps_new_and_merged_lines() {
        let mut cart = open(CartConfig::default().with_item_max_quantity(10));
        cart.add("x", 15, ()).unwrap();
        assert_eq!(cart.total_quantity(), 10);

        cart.add("y", 6, ()).unwrap();
        cart.add("y", 6, ()).unwrap();
        assert_eq!(cart.items().find(&"y".into(), &().into()).unwrap().quantity(), 10);
    }

    #[test]
    fn test_add_invalid_quantity_falls_back_to_one() {
        let mut cart = open(CartConfig::default());
        cart.add("x", -3, ()).unwrap();
        cart.add("y", "abc", ()).unwrap();
        cart.add("z", 2.5, ()).unwrap();
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_add_zero_creates_no_line() {
        let mut cart = open(CartConfig::default());
        assert!(cart.add("x", 0, ()).unwrap());
        assert!(cart.is_empty());
        assert!(cart.items().group(&"x".into()).is_none());
        assert!(cart.adapter().contains(&key()));
    }

    #[test]
    fn test_add_ignores_falsy_attributes() {
        let mut cart = open(CartConfig::default());
        cart.add("shirt", 1, json!({"size": "L"})).unwrap();
        cart.add("shirt", 1, json!({"size": "L", "note": "", "gift": false}))
            .unwrap();
        assert_eq!(cart.total_item(), 1);
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_add_persists_after_every_call() {
        let mut cart = open(CartConfig::default());
        cart.add("shirt", 2, [("size", "L")]).unwrap();

        let blob = stored(&cart);
        assert_eq!(blob["shirt"][0]["quantity"], json!(2));
        assert_eq!(blob["shirt"][0]["attributes"], json!({"size": "L"}));
    }

    #[test]
    fn test_update_sets_quantity() {
        let mut cart = open(CartConfig::default().with_item_max_quantity(50));
        cart.add("shirt", 2, [("size", "L")]).unwrap();

        assert!(cart.update("shirt", 7, [("size", "L")]).unwrap());
        assert_eq!(cart.total_quantity(), 7);

        assert!(cart.update("shirt", 99, [("size", "L")]).unwrap());
        assert_eq!(cart.total_quantity(), 50);
    }

    #[test]
    fn test_update_missing_line_returns_false() {
        let mut cart = open(CartConfig::default());
        cart.add("shirt", 2, [("size", "L")]).unwrap();

        assert!(!cart.update("shirt", 3, [("size", "M")]).unwrap());
        assert!(!cart.update("hat", 3, ()).unwrap());
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_update_zero_removes() {
        let mut cart = open(CartConfig::default());
        cart.add("shirt", 2, [("size", "L")]).unwrap();
        cart.add("shirt", 2, [("size", "M")]).unwrap();

        assert!(cart.update("shirt", 0, [("size", "L")]).unwrap());
        assert!(!cart.item_exists("shirt", [("size", "L")]));
        assert!(cart.item_exists("shirt", [("size", "M")]));

        assert!(cart.update("hat", "0", ()).unwrap());
    }

    #[test]
    fn test_update_invalid_quantity_sets_one() {
        let mut cart = open(CartConfig::default());
        cart.add("shirt", 5, ()).unwrap();
        assert!(cart.update("shirt", "lots", ()).unwrap());
        assert_eq!(cart.total_quantity(), 1);
    }

    #[test]
    fn test_remove_without_attributes_drops_group() {
        let mut cart = open(CartConfig::default());
        cart.add("shirt", 1, [("size", "L")]).unwrap();
        cart.add("shirt", 1, [("size", "M")]).unwrap();
        cart.add("mug", 1, ()).unwrap();

        assert!(cart.remove("shirt", ()).unwrap());
        assert!(cart.items().group(&"shirt".into()).is_none());
        assert_eq!(cart.total_item(), 1);
    }

    #[test]
    fn test_remove_single_variant_keeps_group_in_memory() {
        let mut cart = open(CartConfig::default());
        cart.add("shirt", 1, [("size", "L")]).unwrap();

        assert!(cart.remove("shirt", [("size", "L")]).unwrap());
        assert_eq!(cart.items().group(&"shirt".into()), Some(&[][..]));
        assert!(cart.is_empty());
        assert_eq!(stored(&cart), json!({}));
    }

    #[test]
    fn test_remove_no_match_does_not_write() {
        let mut cart = open(CartConfig::default());
        assert!(!cart.remove("shirt", ()).unwrap());
        assert!(!cart.adapter().contains(&key()));

        cart.add("shirt", 1, [("size", "L")]).unwrap();
        let before = cart.adapter().entry(&key()).cloned();
        assert!(!cart.remove("shirt", [("size", "XL")]).unwrap());
        assert_eq!(cart.adapter().entry(&key()).cloned(), before);
    }

    #[test]
    fn test_clear_persists_empty_state() {
        let mut cart = open(CartConfig::default());
        cart.add("shirt", 1, ()).unwrap();
        cart.clear().unwrap();

        assert!(cart.is_empty());
        assert_eq!(stored(&cart), json!({}));
    }

    #[test]
    fn test_destroy_deletes_entry() {
        let mut cart = open(CartConfig::default());
        cart.add("shirt", 1, ()).unwrap();
        cart.destroy().unwrap();

        assert!(cart.is_empty());
        let adapter = cart.into_adapter();
        assert!(!adapter.contains(&key()));

        let reopened = CartStore::open(CartConfig::default(), key(), adapter);
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_reopen_restores_lines() {
        let mut cart = open(CartConfig::default());
        cart.add("shirt", 2, [("size", "L")]).unwrap();
        cart.add("mug", 1, ()).unwrap();

        let reopened = CartStore::open(CartConfig::default(), key(), cart.into_adapter());
        assert_eq!(reopened.total_item(), 2);
        assert_eq!(reopened.total_quantity(), 3);
        assert!(reopened.item_exists("shirt", [("size", "L")]));
    }

    #[test]
    fn test_malformed_blob_opens_empty() {
        for blob in ["", "   ", "{oops", "42", r#"{"shirt": "x"}"#] {
            let adapter = MemoryAdapter::with_blob(&key(), blob);
            let cart = CartStore::open(CartConfig::default(), key(), adapter);
            assert!(cart.is_empty(), "blob {blob:?} should open empty");
        }
    }

    #[test]
    fn test_load_clamps_to_current_limit() {
        let adapter =
            MemoryAdapter::with_blob(&key(), r#"{"x":[{"quantity":500,"hash":"","attributes":[]}]}"#);
        let cart = CartStore::open(
            CartConfig::default().with_item_max_quantity(20),
            key(),
            adapter,
        );
        assert_eq!(cart.total_quantity(), 20);
    }

    #[test]
    fn test_attribute_total() {
        let mut cart = open(CartConfig::default());
        cart.add("shirt", 2, json!({"size": "L", "price": "19.99"})).unwrap();
        cart.add("mug", 3, json!({"price": 4.5})).unwrap();
        cart.add("sticker", 10, ()).unwrap();

        assert_eq!(cart.attribute_total("price"), Decimal::new(5348, 2));
        assert_eq!(cart.attribute_total("weight"), Decimal::ZERO);
    }

    #[test]
    fn test_cookie_mode_saves_with_ttl() {
        let mut cart = open(CartConfig::default().with_storage(StorageMode::Cookie));
        cart.add("shirt", 1, ()).unwrap();
        assert_eq!(
            cart.adapter().entry(&key()).unwrap().ttl,
            Some(Duration::from_secs(604_800))
        );
    }

    #[test]
    fn test_max_items_is_advisory() {
        let mut cart = open(CartConfig::default().with_cart_max_item(1));
        cart.add("a", 1, ()).unwrap();
        assert!(!cart.exceeds_max_items());
        assert!(cart.add("b", 1, ()).unwrap());
        assert_eq!(cart.total_item(), 2);
        assert!(cart.exceeds_max_items());
    }

    #[test]
    fn test_scalar_attributes() {
        let mut cart = open(CartConfig::default());
        cart.add("shirt", 1, "L").unwrap();
        cart.add("shirt", 1, "L").unwrap();
        assert_eq!(cart.total_item(), 1);
        assert!(cart.item_exists("shirt", "L"));
        assert!(cart.remove("shirt", "L").unwrap());
        assert!(cart.is_empty());
    }

    struct FailingAdapter;

    impl PersistenceAdapter for FailingAdapter {
        fn load(&self, _key: &StoreKey) -> std::result::Result<Option<String>, PersistenceError> {
            Err(PersistenceError::Backend("offline".into()))
        }

        fn save(
            &mut self,
            _key: &StoreKey,
            _blob: &str,
            _ttl: Option<Duration>,
        ) -> std::result::Result<(), PersistenceError> {
            Err(PersistenceError::Backend("offline".into()))
        }

        fn delete(&mut self, _key: &StoreKey) -> std::result::Result<(), PersistenceError> {
            Err(PersistenceError::Backend("offline".into()))
        }
    }

    #[test]
    fn test_adapter_failures() {
        let mut cart = CartStore::open(CartConfig::default(), key(), FailingAdapter);
        assert!(cart.is_empty());
        assert!(cart.add("shirt", 1, ()).is_err());
        assert!(cart.destroy().is_err());
    }
}
