//! Session Cart Storefront - JSON cart API.
//!
//! This binary serves the cart on port 3000 by default.
//!
//! # Architecture
//!
//! - Axum web framework
//! - Carts kept in a tower-sessions session, or in a cookie when
//!   `CART_USE_COOKIE` is set
//! - Cart rules from `session-cart-core`

#![cfg_attr(not(test), forbid(unsafe_code))]

use session_cart_storefront::{app, config::StorefrontConfig, state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing with EnvFilter
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "session_cart_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StorefrontConfig::from_env().expect("Failed to load configuration");
    tracing::info!(
        storage = ?config.cart.storage(),
        item_max_quantity = config.cart.item_max_quantity(),
        cart_max_item = config.cart.cart_max_item(),
        "Cart configuration loaded"
    );

    let addr = config.socket_addr();
    let app = app(AppState::new(config));

    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
