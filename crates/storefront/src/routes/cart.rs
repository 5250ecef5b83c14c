//! Cart route handlers.
//!
//! Every handler opens the cart for the current request, runs one cart
//! operation and, for mutations, flushes the backend before responding.
//! In cookie mode the flush produces the `Set-Cookie` header.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use session_cart_core::{CartStore, PersistenceAdapter, ProductId};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::storage::CartBackend;

type Store = CartStore<CartBackend>;

// =============================================================================
// Request Types
// =============================================================================

/// Body of add and update requests.
#[derive(Debug, Deserialize)]
pub struct LineRequest {
    /// Product id, a string or a number.
    pub id: Value,
    /// Quantity literal; anything but a non-negative integer counts as 1.
    pub quantity: Option<Value>,
    /// Attribute mapping (or a scalar).
    pub attributes: Option<Value>,
}

/// Body of exists and remove requests.
#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    pub id: Value,
    pub attributes: Option<Value>,
}

/// Query of the total endpoint.
#[derive(Debug, Deserialize)]
pub struct TotalQuery {
    #[serde(default = "default_total_attribute")]
    pub attribute: String,
}

fn default_total_attribute() -> String {
    "price".to_string()
}

// =============================================================================
// Response Types
// =============================================================================

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineView {
    pub id: String,
    pub quantity: u64,
    pub hash: String,
    pub attributes: Map<String, Value>,
}

/// The cart with its totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total_item: usize,
    pub total_quantity: u64,
    /// Total of the `price` attribute.
    pub subtotal: Decimal,
}

impl CartView {
    /// Snapshot the lines and totals of an open cart.
    #[must_use]
    pub fn from_store<A: PersistenceAdapter>(cart: &CartStore<A>) -> Self {
        Self {
            items: cart
                .items()
                .lines()
                .map(|(id, line)| CartLineView {
                    id: id.to_string(),
                    quantity: line.quantity(),
                    hash: line.fingerprint().to_string(),
                    attributes: line.attributes().as_map().clone(),
                })
                .collect(),
            total_item: cart.total_item(),
            total_quantity: cart.total_quantity(),
            subtotal: cart.attribute_total("price"),
        }
    }
}

/// Result of a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartResponse {
    pub ok: bool,
    pub cart: CartView,
}

/// Line and unit counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountView {
    pub total_item: usize,
    pub total_quantity: u64,
}

/// Total of one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalView {
    pub attribute: String,
    pub total: Decimal,
}

/// Whether a line exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistsView {
    pub exists: bool,
}

// =============================================================================
// Helpers
// =============================================================================

/// Accept string and numeric product ids.
fn product_id(value: &Value) -> Result<ProductId> {
    match value {
        Value::String(s) if !s.is_empty() => Ok(ProductId::new(s.as_str())),
        Value::Number(n) => Ok(ProductId::new(n.to_string())),
        _ => Err(AppError::BadRequest(
            "id must be a non-empty string or a number".to_string(),
        )),
    }
}

async fn open_cart(state: &AppState, session: &Session, headers: &HeaderMap) -> Store {
    let backend = CartBackend::open(state, session, headers).await;
    CartStore::open(state.config().cart, state.store_key().clone(), backend)
}

/// Flush the backend and render the mutation result.
async fn respond(cart: Store, session: &Session, ok: bool) -> Result<Response> {
    let body = CartResponse {
        ok,
        cart: CartView::from_store(&cart),
    };
    let set_cookie = cart.into_adapter().commit(session).await?;

    let mut response = Json(body).into_response();
    if let Some(value) = set_cookie {
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(response)
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Show the cart.
#[instrument(skip(state, session, headers))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Json<CartView> {
    let cart = open_cart(&state, &session, &headers).await;
    Json(CartView::from_store(&cart))
}

/// Line and unit counts.
#[instrument(skip(state, session, headers))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Json<CountView> {
    let cart = open_cart(&state, &session, &headers).await;
    Json(CountView {
        total_item: cart.total_item(),
        total_quantity: cart.total_quantity(),
    })
}

/// Total of one numeric attribute across lines.
#[instrument(skip(state, session, headers))]
pub async fn total(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Query(query): Query<TotalQuery>,
) -> Json<TotalView> {
    let cart = open_cart(&state, &session, &headers).await;
    let total = cart.attribute_total(&query.attribute);
    Json(TotalView {
        attribute: query.attribute,
        total,
    })
}

/// Check whether a line exists.
#[instrument(skip(state, session, headers))]
pub async fn exists(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Json(request): Json<ItemRequest>,
) -> Result<Json<ExistsView>> {
    let id = product_id(&request.id)?;
    let cart = open_cart(&state, &session, &headers).await;
    Ok(Json(ExistsView {
        exists: cart.item_exists(id, request.attributes),
    }))
}

/// Add units of a line.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Json(request): Json<LineRequest>,
) -> Result<Response> {
    let id = product_id(&request.id)?;
    let mut cart = open_cart(&state, &session, &headers).await;
    let ok = cart.add(id, request.quantity, request.attributes)?;
    respond(cart, &session, ok).await
}

/// Set the quantity of a line.
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Json(request): Json<LineRequest>,
) -> Result<Response> {
    let id = product_id(&request.id)?;
    let mut cart = open_cart(&state, &session, &headers).await;
    let ok = cart.update(id, request.quantity, request.attributes)?;
    respond(cart, &session, ok).await
}

/// Remove one line, or every line of a product when no attributes are given.
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Json(request): Json<ItemRequest>,
) -> Result<Response> {
    let id = product_id(&request.id)?;
    let mut cart = open_cart(&state, &session, &headers).await;
    let ok = cart.remove(id, request.attributes)?;
    respond(cart, &session, ok).await
}

/// Empty the cart.
#[instrument(skip(state, session, headers))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Result<Response> {
    let mut cart = open_cart(&state, &session, &headers).await;
    cart.clear()?;
    respond(cart, &session, true).await
}

/// Empty the cart and drop its storage entry.
#[instrument(skip(state, session, headers))]
pub async fn destroy(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Result<Response> {
    let mut cart = open_cart(&state, &session, &headers).await;
    cart.destroy()?;
    respond(cart, &session, true).await
}
