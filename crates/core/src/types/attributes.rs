//! Line attributes and their fingerprints.
//!
//! Two additions of the same product are the same cart line only when their
//! attributes normalize to the same content. Normalization removes falsy
//! values from a mapping and wraps a scalar as `{"0": scalar}`; the
//! fingerprint is a hash over the normalized mapping in insertion order, so
//! `{size, color}` and `{color, size}` are different lines.

use core::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the SHA-256 digest (128 bits).
pub const FINGERPRINT_LEN: usize = 32;

/// Attributes as supplied by the caller, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeInput {
    /// Name/value pairs. Falsy values are dropped during normalization.
    Map(Map<String, Value>),
    /// A bare value, stored as the single entry `"0"` without filtering.
    Scalar(Value),
    /// Attributes taken from an existing line, used as-is.
    Normalized(Attributes),
}

impl AttributeInput {
    /// Returns `true` when no attributes were supplied.
    ///
    /// Evaluated on the raw input: a mapping whose values are all falsy is
    /// not empty, even though it normalizes to an empty set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Map(map) => map.is_empty(),
            Self::Scalar(value) => is_falsy(value),
            Self::Normalized(attributes) => attributes.is_empty(),
        }
    }

    /// Normalize into the stored attribute set.
    #[must_use]
    pub fn normalize(&self) -> Attributes {
        match self {
            Self::Map(map) => Attributes {
                map: map
                    .iter()
                    .filter(|(_, value)| !is_falsy(value))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            },
            Self::Scalar(value) => {
                let mut map = Map::new();
                map.insert("0".to_owned(), value.clone());
                Attributes { map }
            }
            Self::Normalized(attributes) => attributes.clone(),
        }
    }
}

impl Default for AttributeInput {
    fn default() -> Self {
        Self::Map(Map::new())
    }
}

impl From<()> for AttributeInput {
    fn from((): ()) -> Self {
        Self::default()
    }
}

impl From<Map<String, Value>> for AttributeInput {
    fn from(map: Map<String, Value>) -> Self {
        Self::Map(map)
    }
}

/// JSON input: objects are mappings, arrays are index-keyed mappings,
/// `null` means no attributes, anything else is a scalar.
impl From<Value> for AttributeInput {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Map(map),
            Value::Array(items) => Self::Map(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| (index.to_string(), item))
                    .collect(),
            ),
            Value::Null => Self::default(),
            scalar => Self::Scalar(scalar),
        }
    }
}

impl From<&Value> for AttributeInput {
    fn from(value: &Value) -> Self {
        Self::from(value.clone())
    }
}

impl From<Option<Value>> for AttributeInput {
    fn from(value: Option<Value>) -> Self {
        value.map_or_else(Self::default, Self::from)
    }
}

impl From<&str> for AttributeInput {
    fn from(value: &str) -> Self {
        Self::Scalar(Value::String(value.to_owned()))
    }
}

impl From<Attributes> for AttributeInput {
    fn from(attributes: Attributes) -> Self {
        Self::Normalized(attributes)
    }
}

impl From<&Attributes> for AttributeInput {
    fn from(attributes: &Attributes) -> Self {
        Self::Normalized(attributes.clone())
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for AttributeInput
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self::Map(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<K, V> From<Vec<(K, V)>> for AttributeInput
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: Vec<(K, V)>) -> Self {
        Self::Map(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Falsy values are removed from attribute mappings before hashing.
#[must_use]
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Bool(true) => false,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// A normalized, insertion-ordered attribute set.
///
/// Deserializes from a JSON object or from a JSON array (entries keyed by
/// index), and always serializes as an object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    map: Map<String, Value>,
}

impl Attributes {
    /// Returns the value of an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.map.get(name)
    }

    /// Returns `true` if the set holds no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Iterate over name/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.map.iter()
    }

    /// Borrow the underlying mapping.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.map
    }

    /// Canonical text the fingerprint is computed over: compact JSON, keys in
    /// insertion order.
    #[must_use]
    pub fn canonical(&self) -> String {
        Value::Object(self.map.clone()).to_string()
    }

    /// Compute the fingerprint of this set.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.canonical())
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AttributesVisitor)
    }
}

struct AttributesVisitor;

impl<'de> Visitor<'de> for AttributesVisitor {
    type Value = Attributes;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an attribute object or array")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Attributes, E> {
        Ok(Attributes::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Attributes, A::Error> {
        let mut map = Map::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            map.insert(key, value);
        }
        Ok(Attributes { map })
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Attributes, A::Error> {
        let mut map = Map::new();
        let mut index = 0_usize;
        while let Some(value) = access.next_element::<Value>()? {
            map.insert(index.to_string(), value);
            index += 1;
        }
        Ok(Attributes { map })
    }
}

/// Identity of a line within its product group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hash canonical attribute text.
    #[must_use]
    pub fn of(canonical: &str) -> Self {
        let mut hex = hex::encode(Sha256::digest(canonical.as_bytes()));
        hex.truncate(FINGERPRINT_LEN);
        Self(hex)
    }

    /// Returns the fingerprint as a hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
