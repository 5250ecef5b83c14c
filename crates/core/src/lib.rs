//! Session Cart Core - session-scoped shopping cart store.
//!
//! This crate provides the cart used by every Session Cart host:
//! - `storefront` - HTTP host keeping carts in a session or a cookie
//! - `cli` - Command-line tool keeping carts in a directory
//!
//! # Architecture
//!
//! The core crate owns the cart data model and its identity rules, and
//! nothing else: no HTTP, no sessions, no files. Hosts supply storage through
//! the [`PersistenceAdapter`] trait.
//!
//! # Modules
//!
//! - [`types`] - Product ids, quantity literals, attributes and fingerprints
//! - [`cart`] - Lines, groups and the persisted blob format
//! - [`store`] - The [`CartStore`] operations
//! - [`persistence`] - The adapter trait and an in-memory adapter
//! - [`key`] - Store key derivation
//! - [`config`] - Limits and storage mode

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod key;
pub mod persistence;
pub mod store;
pub mod types;

pub use cart::{Cart, CartLine};
pub use config::{COOKIE_TTL, CartConfig, DEFAULT_ITEM_MAX_QUANTITY, StorageMode};
pub use error::CartError;
pub use key::StoreKey;
pub use persistence::{MemoryAdapter, PersistenceAdapter, PersistenceError, StoredBlob};
pub use store::CartStore;
pub use types::*;
