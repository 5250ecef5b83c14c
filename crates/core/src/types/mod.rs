//! Core value types for the cart.
//!
//! This module provides the typed inputs a host hands to the cart and the
//! normalized forms the cart stores.

pub mod amount;
pub mod attributes;
pub mod id;
pub mod quantity;

pub use amount::attribute_amount;
pub use attributes::{AttributeInput, Attributes, FINGERPRINT_LEN, Fingerprint, is_falsy};
pub use id::ProductId;
pub use quantity::{FALLBACK_QUANTITY, RawQuantity, clamp_quantity};
