//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Cart (JSON)
//! GET  /cart                   - Cart view (lines and totals)
//! GET  /cart/count             - Line and unit counts
//! GET  /cart/total             - Attribute total (?attribute=price)
//! POST /cart/exists            - Whether a line exists
//! POST /cart/add               - Add units of a line
//! POST /cart/update            - Set a line's quantity
//! POST /cart/remove            - Remove a line or a whole product
//! POST /cart/clear             - Empty the cart
//! POST /cart/destroy           - Empty the cart and drop its storage entry
//! ```

pub mod cart;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/total", get(cart::total))
        .route("/exists", post(cart::exists))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/destroy", post(cart::destroy))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/cart", cart_routes())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
