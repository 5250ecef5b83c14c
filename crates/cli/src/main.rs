//! Session Cart CLI - inspect and edit carts stored on disk.
//!
//! # Usage
//!
//! ```bash
//! # Add two large shirts
//! cart-cli add shirt -q 2 -a size=L -a price=19.99
//!
//! # Show the cart
//! cart-cli show
//!
//! # Sum the price attribute
//! cart-cli total price
//!
//! # Keep carts for another host in another directory
//! cart-cli --dir /tmp/carts --host shop.example.com show
//! ```
//!
//! # Commands
//!
//! - `key` - Print the store key
//! - `show` - Print the cart as JSON
//! - `add`, `update`, `remove`, `exists` - Line operations
//! - `clear` - Empty the cart
//! - `destroy` - Empty the cart and delete its file
//! - `total` - Sum an attribute over all lines

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use session_cart_core::{CartConfig, DEFAULT_ITEM_MAX_QUANTITY, StoreKey};

mod commands;
mod file_adapter;

use commands::{Action, CliError, Context};
use file_adapter::FileAdapter;

#[derive(Parser)]
#[command(name = "cart-cli")]
#[command(author, version, about = "Session Cart CLI tools")]
struct Cli {
    /// Directory carts are stored in
    #[arg(long, default_value = ".session-cart", global = true)]
    dir: PathBuf,

    /// Host name the store key is derived from
    #[arg(long, global = true)]
    host: Option<String>,

    /// Per-line quantity cap
    #[arg(long, default_value_t = DEFAULT_ITEM_MAX_QUANTITY, global = true)]
    max_quantity: u64,

    /// Advisory line limit, 0 for unlimited
    #[arg(long, default_value_t = 0, global = true)]
    max_items: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the store key
    Key,
    /// Print the cart as JSON
    Show,
    /// Add units of a line
    Add {
        /// Product id
        id: String,

        /// Quantity (defaults to 1)
        #[arg(short, long)]
        quantity: Option<String>,

        /// Attribute as name=value (repeatable)
        #[arg(short, long = "attribute")]
        attributes: Vec<String>,
    },
    /// Set the quantity of a line (0 removes it)
    Update {
        /// Product id
        id: String,

        /// New quantity
        #[arg(short, long)]
        quantity: String,

        /// Attribute as name=value (repeatable)
        #[arg(short, long = "attribute")]
        attributes: Vec<String>,
    },
    /// Remove a line, or every line of a product without attributes
    Remove {
        /// Product id
        id: String,

        /// Attribute as name=value (repeatable)
        #[arg(short, long = "attribute")]
        attributes: Vec<String>,
    },
    /// Empty the cart
    Clear,
    /// Empty the cart and delete its file
    Destroy,
    /// Check whether a line exists
    Exists {
        /// Product id
        id: String,

        /// Attribute as name=value (repeatable)
        #[arg(short, long = "attribute")]
        attributes: Vec<String>,
    },
    /// Sum an attribute over all lines
    Total {
        /// Attribute to sum
        #[arg(default_value = "price")]
        attribute: String,
    },
}

impl From<Commands> for Action {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Key => Self::Key,
            Commands::Show => Self::Show,
            Commands::Add {
                id,
                quantity,
                attributes,
            } => Self::Add {
                id,
                quantity,
                attributes,
            },
            Commands::Update {
                id,
                quantity,
                attributes,
            } => Self::Update {
                id,
                quantity,
                attributes,
            },
            Commands::Remove { id, attributes } => Self::Remove { id, attributes },
            Commands::Clear => Self::Clear,
            Commands::Destroy => Self::Destroy,
            Commands::Exists { id, attributes } => Self::Exists { id, attributes },
            Commands::Total { attribute } => Self::Total { attribute },
        }
    }
}

fn main() {
    // Logs go to stderr so command output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "session_cart_cli=warn,session_cart_core=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let context = Context {
        adapter: FileAdapter::new(cli.dir),
        key: StoreKey::for_host(cli.host.as_deref()),
        config: CartConfig::default()
            .with_item_max_quantity(cli.max_quantity)
            .with_cart_max_item(cli.max_items),
    };
    tracing::debug!(dir = %context.adapter.dir().display(), key = %context.key, "Opening cart");

    let output = commands::run(&context, cli.command.into())?;
    writeln!(std::io::stdout().lock(), "{output}")?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_add_with_attributes() {
        let cli = Cli::try_parse_from([
            "cart-cli", "--host", "shop.test", "add", "shirt", "-q", "2", "-a", "size=L", "-a",
            "price=5",
        ])
        .unwrap();
        assert_eq!(cli.host.as_deref(), Some("shop.test"));
        assert_eq!(
            Action::from(cli.command),
            Action::Add {
                id: "shirt".to_string(),
                quantity: Some("2".to_string()),
                attributes: vec!["size=L".to_string(), "price=5".to_string()],
            }
        );
    }

    #[test]
    fn test_total_defaults_to_price() {
        let cli = Cli::try_parse_from(["cart-cli", "total"]).unwrap();
        assert_eq!(
            Action::from(cli.command),
            Action::Total {
                attribute: "price".to_string()
            }
        );
        assert_eq!(cli.max_quantity, DEFAULT_ITEM_MAX_QUANTITY);
    }
}
