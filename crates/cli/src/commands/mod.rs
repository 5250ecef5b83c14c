//! Cart commands.
//!
//! Each command opens the cart from the file store, runs one operation and
//! returns the text to print.

use serde_json::json;
use session_cart_core::{AttributeInput, CartConfig, CartError, CartStore, StoreKey};
use thiserror::Error;

use crate::file_adapter::FileAdapter;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// An `-a` argument was not `name=value`.
    #[error("Invalid attribute '{0}', expected name=value")]
    InvalidAttribute(String),

    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where and how carts are opened.
#[derive(Debug, Clone)]
pub struct Context {
    pub adapter: FileAdapter,
    pub key: StoreKey,
    pub config: CartConfig,
}

impl Context {
    fn open(&self) -> CartStore<FileAdapter> {
        CartStore::open(self.config, self.key.clone(), self.adapter.clone())
    }
}

/// Operation to run against the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Key,
    Show,
    Add {
        id: String,
        quantity: Option<String>,
        attributes: Vec<String>,
    },
    Update {
        id: String,
        quantity: String,
        attributes: Vec<String>,
    },
    Remove {
        id: String,
        attributes: Vec<String>,
    },
    Clear,
    Destroy,
    Exists {
        id: String,
        attributes: Vec<String>,
    },
    Total {
        attribute: String,
    },
}

/// Parse `name=value` arguments into an attribute set.
///
/// # Errors
///
/// Returns `CliError::InvalidAttribute` for an argument without `=` or with
/// an empty name.
pub fn parse_attributes(args: &[String]) -> Result<AttributeInput, CliError> {
    let pairs = args
        .iter()
        .map(|arg| match arg.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.to_string()))
            }
            _ => Err(CliError::InvalidAttribute(arg.clone())),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AttributeInput::from(pairs))
}

/// Run `action` and return its output.
///
/// # Errors
///
/// Returns an error if an attribute argument is malformed or the cart
/// cannot be persisted.
pub fn run(context: &Context, action: Action) -> Result<String, CliError> {
    let output = match action {
        Action::Key => context.key.to_string(),
        Action::Show => {
            let cart = context.open();
            let view = json!({
                "key": context.key,
                "items": cart.items(),
                "total_item": cart.total_item(),
                "total_quantity": cart.total_quantity(),
                "exceeds_max_items": cart.exceeds_max_items(),
            });
            serde_json::to_string_pretty(&view).map_err(CartError::from)?
        }
        Action::Add {
            id,
            quantity,
            attributes,
        } => {
            let attributes = parse_attributes(&attributes)?;
            let mut cart = context.open();
            let added = match quantity {
                Some(quantity) => cart.add(id, quantity, attributes)?,
                None => cart.add(id, 1, attributes)?,
            };
            added.to_string()
        }
        Action::Update {
            id,
            quantity,
            attributes,
        } => {
            let attributes = parse_attributes(&attributes)?;
            context.open().update(id, quantity, attributes)?.to_string()
        }
        Action::Remove { id, attributes } => {
            let attributes = parse_attributes(&attributes)?;
            context.open().remove(id, attributes)?.to_string()
        }
        Action::Clear => {
            context.open().clear()?;
            true.to_string()
        }
        Action::Destroy => {
            context.open().destroy()?;
            true.to_string()
        }
        Action::Exists { id, attributes } => {
            let attributes = parse_attributes(&attributes)?;
            context.open().item_exists(id, attributes).to_string()
        }
        Action::Total { attribute } => context.open().attribute_total(&attribute).to_string(),
    };
    Ok(output)
}
