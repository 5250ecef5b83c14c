//! Cart lines, product groups and the persisted blob format.
//!
//! The blob is a JSON object keyed by product id, each value an array of
//! `{quantity, hash, attributes}` lines:
//!
//! ```json
//! {"shirt":[{"quantity":2,"hash":"9b1c…","attributes":{"size":"L"}}]}
//! ```
//!
//! Groups without lines are never written. Reading is lenient about shapes
//! older writers produced: a top-level `[]`, groups stored as index-keyed
//! objects instead of arrays, and quantities stored as digit strings.

use core::fmt;
use core::marker::PhantomData;

use rust_decimal::Decimal;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::types::{
    AttributeInput, Attributes, Fingerprint, ProductId, RawQuantity, attribute_amount,
    clamp_quantity,
};

/// One purchasable variant of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredLine")]
pub struct CartLine {
    quantity: u64,
    hash: Fingerprint,
    attributes: Attributes,
}

impl CartLine {
    pub(crate) fn new(quantity: u64, attributes: Attributes) -> Self {
        Self {
            quantity,
            hash: attributes.fingerprint(),
            attributes,
        }
    }

    /// Number of units on this line.
    #[must_use]
    pub const fn quantity(&self) -> u64 {
        self.quantity
    }

    /// Fingerprint of the line's attributes.
    #[must_use]
    pub const fn fingerprint(&self) -> &Fingerprint {
        &self.hash
    }

    /// The normalized attributes of the line.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub(crate) const fn set_quantity(&mut self, quantity: u64) {
        self.quantity = quantity;
    }
}

/// Line as read from a blob, before validation.
#[derive(Deserialize)]
struct StoredLine {
    quantity: Value,
    #[serde(default)]
    attributes: Attributes,
}

impl TryFrom<StoredLine> for CartLine {
    type Error = String;

    fn try_from(stored: StoredLine) -> Result<Self, Self::Error> {
        let quantity = RawQuantity::from(&stored.quantity)
            .literal()
            .ok_or_else(|| format!("invalid stored quantity: {}", stored.quantity))?;
        Ok(Self::new(quantity, stored.attributes))
    }
}

/// All lines sharing one product id, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CartGroup {
    id: ProductId,
    lines: Vec<CartLine>,
}

/// The full cart: product ids mapped to their lines.
///
/// Product ids keep the order in which they were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    groups: Vec<CartGroup>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { groups: Vec::new() }
    }

    /// Parse a persisted blob.
    ///
    /// The result is not yet repaired; see [`Cart::repair`].
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is not valid JSON or does not have the
    /// cart shape.
    pub fn from_blob(blob: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(blob)
    }

    /// Serialize to the persisted blob, omitting empty groups.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Lines of one product, if the product has a group.
    ///
    /// A group can exist with no lines after its last variant was removed.
    #[must_use]
    pub fn group(&self, id: &ProductId) -> Option<&[CartLine]> {
        self.groups
            .iter()
            .find(|group| &group.id == id)
            .map(|group| group.lines.as_slice())
    }

    /// Iterate over product groups in insertion order.
    pub fn groups(&self) -> impl Iterator<Item = (&ProductId, &[CartLine])> {
        self.groups
            .iter()
            .map(|group| (&group.id, group.lines.as_slice()))
    }

    /// Iterate over every line with its product id.
    pub fn lines(&self) -> impl Iterator<Item = (&ProductId, &CartLine)> {
        self.groups
            .iter()
            .flat_map(|group| group.lines.iter().map(move |line| (&group.id, line)))
    }

    /// Find the line of `id` whose attributes match `attributes`.
    #[must_use]
    pub fn find(&self, id: &ProductId, attributes: &AttributeInput) -> Option<&CartLine> {
        let hash = attributes.normalize().fingerprint();
        self.group(id)?.iter().find(|line| line.hash == hash)
    }

    /// Returns `true` if no group holds a line.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|group| group.lines.is_empty())
    }

    /// Number of lines across all groups.
    #[must_use]
    pub fn total_item(&self) -> usize {
        self.groups.iter().map(|group| group.lines.len()).sum()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.lines()
            .fold(0_u64, |total, (_, line)| total.saturating_add(line.quantity))
    }

    /// Sum of `attribute * quantity` over lines that carry a numeric
    /// `attribute`.
    #[must_use]
    pub fn attribute_total(&self, attribute: &str) -> Decimal {
        let mut total = Decimal::ZERO;
        for (id, line) in self.lines() {
            let Some(value) = line.attributes.get(attribute) else {
                continue;
            };
            let Some(amount) = attribute_amount(value) else {
                tracing::debug!(%id, attribute, %value, "Non-numeric attribute ignored in total");
                continue;
            };
            match amount
                .checked_mul(Decimal::from(line.quantity))
                .and_then(|subtotal| total.checked_add(subtotal))
            {
                Some(sum) => total = sum,
                None => tracing::warn!(%id, attribute, "Attribute total overflowed, line skipped"),
            }
        }
        total
    }

    pub(crate) fn group_mut(&mut self, id: &ProductId) -> Option<&mut Vec<CartLine>> {
        self.groups
            .iter_mut()
            .find(|group| &group.id == id)
            .map(|group| &mut group.lines)
    }

    pub(crate) fn group_or_insert(&mut self, id: &ProductId) -> &mut Vec<CartLine> {
        let position = match self.groups.iter().position(|group| &group.id == id) {
            Some(position) => position,
            None => {
                self.groups.push(CartGroup {
                    id: id.clone(),
                    lines: Vec::new(),
                });
                self.groups.len() - 1
            }
        };
        // position is either found or the index just pushed
        #[allow(clippy::indexing_slicing)]
        &mut self.groups[position].lines
    }

    pub(crate) fn remove_group(&mut self, id: &ProductId) -> bool {
        let before = self.groups.len();
        self.groups.retain(|group| &group.id != id);
        self.groups.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.groups.clear();
    }

    /// Restore the cart invariants on data read from storage.
    ///
    /// Fingerprints are recomputed from the stored attributes, lines that
    /// collide after rehashing are merged, quantities are clamped to
    /// `item_max_quantity`, and zero-quantity lines and empty groups are
    /// dropped. Returns `true` if anything changed.
    pub fn repair(&mut self, item_max_quantity: u64) -> bool {
        let mut changed = false;

        for group in &mut self.groups {
            let mut repaired: Vec<CartLine> = Vec::with_capacity(group.lines.len());
            for line in group.lines.drain(..) {
                let hash = line.attributes.fingerprint();
                changed |= hash != line.hash;

                if let Some(existing) = repaired.iter_mut().find(|l| l.hash == hash) {
                    existing.quantity = clamp_quantity(
                        existing.quantity.saturating_add(line.quantity),
                        item_max_quantity,
                    );
                    changed = true;
                    continue;
                }

                let quantity = clamp_quantity(line.quantity, item_max_quantity);
                if quantity == 0 {
                    changed = true;
                    continue;
                }
                changed |= quantity != line.quantity;
                repaired.push(CartLine {
                    quantity,
                    hash,
                    attributes: line.attributes,
                });
            }
            group.lines = repaired;
        }

        let before = self.groups.len();
        self.groups.retain(|group| !group.lines.is_empty());
        changed || self.groups.len() != before
    }

    fn push_group(&mut self, id: ProductId, lines: Vec<CartLine>) {
        match self.group_mut(&id) {
            Some(existing) => existing.extend(lines),
            None => self.groups.push(CartGroup { id, lines }),
        }
    }
}

impl Serialize for Cart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let groups: Vec<&CartGroup> = self
            .groups
            .iter()
            .filter(|group| !group.lines.is_empty())
            .collect();

        let mut map = serializer.serialize_map(Some(groups.len()))?;
        for group in groups {
            map.serialize_entry(&group.id, &group.lines)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Keyed::<Keyed<CartLine>>::deserialize(deserializer)?;

        let mut cart = Self::new();
        for (id, lines) in entries.0 {
            let lines = lines.0.into_iter().map(|(_, line)| line).collect();
            cart.push_group(ProductId::from(id), lines);
        }
        Ok(cart)
    }
}

/// A JSON array or an index-keyed JSON object, read as ordered entries.
///
/// Array elements are keyed by their position.
struct Keyed<T>(Vec<(String, T)>);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Keyed<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(KeyedVisitor(PhantomData))
    }
}

struct KeyedVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for KeyedVisitor<T> {
    type Value = Keyed<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object or array")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Keyed<T>, A::Error> {
        let mut entries = Vec::new();
        while let Some(entry) = access.next_entry::<String, T>()? {
            entries.push(entry);
        }
        Ok(Keyed(entries))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Keyed<T>, A::Error> {
        let mut entries = Vec::new();
        while let Some(item) = access.next_element::<T>()? {
            entries.push((entries.len().to_string(), item));
        }
        Ok(Keyed(entries))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Keyed<T>, E> {
        Ok(Keyed(Vec::new()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn line(quantity: u64, attributes: Value) -> CartLine {
        CartLine::new(quantity, AttributeInput::from(attributes).normalize())
    }

    fn sample_cart() -> Cart {
        let mut cart = Cart::new();
        cart.group_or_insert(&ProductId::from("shirt"))
            .push(line(2, json!({"size": "L", "price": "10.50"})));
        cart.group_or_insert(&ProductId::from("shirt"))
            .push(line(1, json!({"size": "M", "price": "10.50"})));
        cart.group_or_insert(&ProductId::from("mug"))
            .push(line(3, json!({"price": 4})));
        cart
    }

    #[test]
    fn test_totals() {
        let cart = sample_cart();
        assert_eq!(cart.total_item(), 3);
        assert_eq!(cart.total_quantity(), 6);
        assert_eq!(cart.attribute_total("price"), Decimal::new(4350, 2));
        assert_eq!(cart.attribute_total("weight"), Decimal::ZERO);
    }

    #[test]
    fn test_groups_keep_insertion_order() {
        let cart = sample_cart();
        let ids: Vec<&str> = cart.groups().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["shirt", "mug"]);
    }

    #[test]
    fn test_empty_group_counts_as_empty() {
        let mut cart = Cart::new();
        cart.group_or_insert(&ProductId::from("shirt"));
        assert!(cart.is_empty());
        assert!(cart.group(&ProductId::from("shirt")).is_some());
        assert_eq!(cart.to_blob().unwrap(), "{}");
    }

    #[test]
    fn test_blob_shape() {
        let mut cart = Cart::new();
        cart.group_or_insert(&ProductId::from("mug"))
            .push(line(3, json!({"price": 4})));

        let blob: Value = serde_json::from_str(&cart.to_blob().unwrap()).unwrap();
        let stored = &blob["mug"][0];
        assert_eq!(stored["quantity"], json!(3));
        assert_eq!(stored["attributes"], json!({"price": 4}));
        assert_eq!(stored["hash"].as_str().unwrap().len(), 32);
    }

    #[test]
    fn test_blob_round_trip() {
        let cart = sample_cart();
        let restored = Cart::from_blob(&cart.to_blob().unwrap()).unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_legacy_shapes() {
        assert!(Cart::from_blob("[]").unwrap().is_empty());

        let blob = r#"{
            "shirt": {"1": {"quantity": "2", "hash": "d41d8cd98f00b204e9800998ecf8427e", "attributes": ["L"]}},
            "mug": [{"quantity": 1, "hash": "x", "attributes": []}]
        }"#;
        let cart = Cart::from_blob(blob).unwrap();
        let shirt = cart.group(&ProductId::from("shirt")).unwrap();
        assert_eq!(shirt.len(), 1);
        assert_eq!(shirt[0].quantity(), 2);
        assert_eq!(shirt[0].attributes().get("0"), Some(&json!("L")));
        assert!(
            cart.find(&ProductId::from("mug"), &AttributeInput::default())
                .is_some()
        );
    }

    #[test]
    fn test_invalid_blobs() {
        assert!(Cart::from_blob("").is_err());
        assert!(Cart::from_blob("not json").is_err());
        assert!(Cart::from_blob(r#"{"shirt": 5}"#).is_err());
        assert!(Cart::from_blob(r#"{"shirt": [{"quantity": -1}]}"#).is_err());
    }

    #[test]
    fn test_repair_merges_and_clamps() {
        let blob = r#"{
            "shirt": [
                {"quantity": 4, "hash": "stale", "attributes": {"size": "L"}},
                {"quantity": 9, "hash": "other", "attributes": {"size": "L"}},
                {"quantity": 0, "hash": "zero", "attributes": {"size": "M"}}
            ],
            "empty": []
        }"#;
        let mut cart = Cart::from_blob(blob).unwrap();
        assert!(cart.repair(10));

        let shirt = cart.group(&ProductId::from("shirt")).unwrap();
        assert_eq!(shirt.len(), 1);
        assert_eq!(shirt[0].quantity(), 10);
        assert!(cart.group(&ProductId::from("empty")).is_none());
    }

    #[test]
    fn test_repair_is_noop_on_clean_cart() {
        let mut cart = sample_cart();
        assert!(!cart.repair(200_000));
    }
}
