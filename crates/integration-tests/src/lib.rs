//! Integration tests for Tienda.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tienda-integration-tests
//! ```
//!
//! No external services are needed: [`FakeShop`] serves an in-memory copy
//! of the shop API on an ephemeral port, and [`start_storefront`] serves the
//! real storefront router against it.
//!
//! # Test Categories
//!
//! - `api_client` - `ApiClient` against the fake API over HTTP
//! - `cart_session` - cart ID lifecycle and self-heal end to end
//! - `cli_cart` - CLI cart commands with the cart ID kept in a file
//! - `storefront_routes` - the web storefront driven by a cookie-keeping client
//!
//! # Fake API Behavior
//!
//! Mirrors the shop API's documented surface: sequential IDs (`p1, p2, ...`
//! for products, `c1, c2, ...` for carts), 404 for unknown carts and
//! products (product checked before cart on add), quantities merged per
//! product with the price captured at add time, checkout recording an order
//! and deleting the cart, and the top-selling report sorted by quantity.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::json;
use url::Url;

use tienda_core::{
    AddItemRequest, Cart, CartId, CartItem, NewProduct, Price, Product, ProductId,
    TopSellingEntry,
};
use tienda_storefront::api::ApiClient;
use tienda_storefront::config::StorefrontConfig;
use tienda_storefront::state::AppState;

/// Message the shop API returns on a successful checkout.
pub const CHECKOUT_MESSAGE: &str = "¡Compra realizada con éxito!";

/// Fake API endpoints, for request counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ListProducts,
    GetProduct,
    CreateProduct,
    CreateProductsBatch,
    UpdateProduct,
    DeleteProduct,
    CreateCart,
    GetCart,
    AddItem,
    RemoveItem,
    Checkout,
    TopSelling,
}

#[derive(Default)]
struct ShopState {
    products: Vec<Product>,
    carts: HashMap<CartId, Cart>,
    orders: Vec<Cart>,
    next_product: u64,
    next_cart: u64,
    hits: HashMap<Endpoint, usize>,
    forget_new_carts: bool,
    failing: bool,
}

impl ShopState {
    fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    fn insert_product(&mut self, product: NewProduct) -> Product {
        self.next_product += 1;
        let product = product.with_id(ProductId::new(format!("p{}", self.next_product)));
        self.products.push(product.clone());
        product
    }
}

type Shared = Arc<Mutex<ShopState>>;

fn lock(shared: &Shared) -> MutexGuard<'_, ShopState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Record a request and short-circuit with a 500 while failing.
fn enter(shared: &Shared, endpoint: Endpoint) -> Result<MutexGuard<'_, ShopState>, Response> {
    let mut state = lock(shared);
    *state.hits.entry(endpoint).or_default() += 1;
    if state.failing {
        return Err(error(StatusCode::INTERNAL_SERVER_ERROR, "Error interno"));
    }
    Ok(state)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, format!("{message}\n")).into_response()
}

fn recompute_total(cart: &mut Cart) {
    cart.total = cart.items.iter().map(CartItem::subtotal).sum();
}

// =============================================================================
// Fake Shop API
// =============================================================================

/// An in-memory shop API served over HTTP on `127.0.0.1`.
///
/// The server task runs until the test's runtime shuts down.
pub struct FakeShop {
    addr: SocketAddr,
    state: Shared,
}

impl FakeShop {
    /// Start the fake API on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state = Shared::default();
        let addr = serve(fake_api_router(state.clone())).await;
        Self { addr, state }
    }

    /// Base URL including the `/api` prefix.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// A client for this API.
    ///
    /// # Panics
    ///
    /// Never in practice; the URL is always a valid base.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.api_url()).expect("fake API URL is a valid base")
    }

    /// Add a product directly, without a request.
    pub fn seed_product(&self, name: &str, price: Price, stock: i64) -> Product {
        lock(&self.state).insert_product(NewProduct {
            name: name.to_string(),
            description: format!("{name} description"),
            price,
            stock,
        })
    }

    /// Drop a cart server-side, as if it expired.
    pub fn forget_cart(&self, cart_id: &CartId) {
        lock(&self.state).carts.remove(cart_id);
    }

    /// Hand out IDs for new carts without keeping them.
    pub fn forget_new_carts(&self, forget: bool) {
        lock(&self.state).forget_new_carts = forget;
    }

    /// Answer every request with 500 while set.
    pub fn set_failing(&self, failing: bool) {
        lock(&self.state).failing = failing;
    }

    /// The server's copy of a cart.
    #[must_use]
    pub fn cart(&self, cart_id: &CartId) -> Option<Cart> {
        lock(&self.state).carts.get(cart_id).cloned()
    }

    /// Number of carts currently held by the server.
    #[must_use]
    pub fn cart_count(&self) -> usize {
        lock(&self.state).carts.len()
    }

    /// Number of completed orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        lock(&self.state).orders.len()
    }

    /// How many requests an endpoint has received.
    #[must_use]
    pub fn hits(&self, endpoint: Endpoint) -> usize {
        lock(&self.state).hits.get(&endpoint).copied().unwrap_or(0)
    }
}

/// Serve `router` on an ephemeral local port, returning its address.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local address");

    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    addr
}

/// Serve the real storefront against `api_url`, returning its base URL.
///
/// # Panics
///
/// Panics if `api_url` is not a valid URL or no port can be bound.
pub async fn start_storefront(api_url: &str) -> String {
    let config = StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost".to_string(),
        api_url: Url::parse(api_url).expect("valid API URL"),
        sentry_dsn: None,
        sentry_environment: None,
    };
    let state = AppState::new(config).expect("storefront state");
    let addr = serve(tienda_storefront::router(state)).await;
    format!("http://{addr}")
}

fn fake_api_router(state: Shared) -> Router {
    let api = Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/batch", post(create_products_batch))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/cart", post(create_cart))
        .route("/cart/{id}", get(get_cart))
        .route("/cart/{id}/add", post(add_item))
        .route("/cart/{id}/item/{product_id}", delete(remove_item))
        .route("/cart/{id}/checkout", post(checkout))
        .route("/reports/top-selling", get(top_selling));

    Router::new().nest("/api", api).with_state(state)
}

// =============================================================================
// Product Handlers
// =============================================================================

async fn list_products(State(shared): State<Shared>) -> Response {
    match enter(&shared, Endpoint::ListProducts) {
        Ok(state) => Json(state.products.clone()).into_response(),
        Err(response) => response,
    }
}

async fn get_product(State(shared): State<Shared>, Path(id): Path<ProductId>) -> Response {
    let state = match enter(&shared, Endpoint::GetProduct) {
        Ok(state) => state,
        Err(response) => return response,
    };
    match state.product(&id) {
        Some(product) => Json(product.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Producto no encontrado"),
    }
}

async fn create_product(State(shared): State<Shared>, Json(body): Json<NewProduct>) -> Response {
    let mut state = match enter(&shared, Endpoint::CreateProduct) {
        Ok(state) => state,
        Err(response) => return response,
    };
    let product = state.insert_product(body);
    (StatusCode::CREATED, Json(product)).into_response()
}

async fn create_products_batch(
    State(shared): State<Shared>,
    Json(body): Json<Vec<NewProduct>>,
) -> Response {
    let mut state = match enter(&shared, Endpoint::CreateProductsBatch) {
        Ok(state) => state,
        Err(response) => return response,
    };
    let created: Vec<Product> = body
        .into_iter()
        .map(|product| state.insert_product(product))
        .collect();
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn update_product(
    State(shared): State<Shared>,
    Path(id): Path<ProductId>,
    Json(body): Json<NewProduct>,
) -> Response {
    let mut state = match enter(&shared, Endpoint::UpdateProduct) {
        Ok(state) => state,
        Err(response) => return response,
    };
    match state.products.iter_mut().find(|p| p.id == id) {
        Some(product) => {
            *product = body.with_id(id);
            Json(product.clone()).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Producto no encontrado"),
    }
}

async fn delete_product(State(shared): State<Shared>, Path(id): Path<ProductId>) -> Response {
    let mut state = match enter(&shared, Endpoint::DeleteProduct) {
        Ok(state) => state,
        Err(response) => return response,
    };
    let before = state.products.len();
    state.products.retain(|p| p.id != id);
    if state.products.len() == before {
        return error(StatusCode::NOT_FOUND, "Producto no encontrado");
    }
    StatusCode::NO_CONTENT.into_response()
}

// =============================================================================
// Cart Handlers
// =============================================================================

async fn create_cart(State(shared): State<Shared>) -> Response {
    let mut state = match enter(&shared, Endpoint::CreateCart) {
        Ok(state) => state,
        Err(response) => return response,
    };
    state.next_cart += 1;
    let cart = Cart {
        id: CartId::new(format!("c{}", state.next_cart)),
        items: Vec::new(),
        total: Price::ZERO,
    };
    if !state.forget_new_carts {
        state.carts.insert(cart.id.clone(), cart.clone());
    }
    (StatusCode::CREATED, Json(cart)).into_response()
}

async fn get_cart(State(shared): State<Shared>, Path(id): Path<CartId>) -> Response {
    let state = match enter(&shared, Endpoint::GetCart) {
        Ok(state) => state,
        Err(response) => return response,
    };
    match state.carts.get(&id) {
        Some(cart) => Json(cart.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Carrito no encontrado"),
    }
}

async fn add_item(
    State(shared): State<Shared>,
    Path(id): Path<CartId>,
    Json(body): Json<AddItemRequest>,
) -> Response {
    let mut state = match enter(&shared, Endpoint::AddItem) {
        Ok(state) => state,
        Err(response) => return response,
    };
    if body.quantity == 0 {
        return error(StatusCode::BAD_REQUEST, "La cantidad debe ser positiva");
    }
    let Some(price) = state.product(&body.product_id).map(|p| p.price) else {
        return error(StatusCode::NOT_FOUND, "Producto no encontrado");
    };
    let Some(cart) = state.carts.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, "Carrito no encontrado");
    };

    match cart
        .items
        .iter_mut()
        .find(|item| item.product_id == body.product_id)
    {
        Some(item) => item.quantity += body.quantity,
        None => cart.items.push(CartItem {
            product_id: body.product_id,
            quantity: body.quantity,
            price,
        }),
    }
    recompute_total(cart);

    Json(cart.clone()).into_response()
}

async fn remove_item(
    State(shared): State<Shared>,
    Path((id, product_id)): Path<(CartId, ProductId)>,
) -> Response {
    let mut state = match enter(&shared, Endpoint::RemoveItem) {
        Ok(state) => state,
        Err(response) => return response,
    };
    let Some(cart) = state.carts.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, "Carrito no encontrado");
    };

    let before = cart.items.len();
    cart.items.retain(|item| item.product_id != product_id);
    if cart.items.len() == before {
        return error(StatusCode::NOT_FOUND, "Producto no encontrado en el carrito");
    }
    recompute_total(cart);

    Json(cart.clone()).into_response()
}

async fn checkout(State(shared): State<Shared>, Path(id): Path<CartId>) -> Response {
    let mut state = match enter(&shared, Endpoint::Checkout) {
        Ok(state) => state,
        Err(response) => return response,
    };
    let Some(cart) = state.carts.remove(&id) else {
        return error(StatusCode::NOT_FOUND, "Carrito no encontrado");
    };
    state.orders.push(cart);

    Json(json!({ "message": CHECKOUT_MESSAGE })).into_response()
}

// =============================================================================
// Report Handlers
// =============================================================================

async fn top_selling(State(shared): State<Shared>) -> Response {
    let state = match enter(&shared, Endpoint::TopSelling) {
        Ok(state) => state,
        Err(response) => return response,
    };

    let mut sold: HashMap<&ProductId, u64> = HashMap::new();
    for item in state.orders.iter().flat_map(|order| &order.items) {
        *sold.entry(&item.product_id).or_default() += u64::from(item.quantity);
    }

    // Products deleted since the sale are left out
    let mut report: Vec<TopSellingEntry> = sold
        .into_iter()
        .filter_map(|(id, quantity_sold)| {
            state.product(id).map(|product| TopSellingEntry {
                product: product.clone(),
                quantity_sold,
            })
        })
        .collect();
    report.sort_by(|a, b| {
        b.quantity_sold
            .cmp(&a.quantity_sold)
            .then_with(|| a.product.id.as_str().cmp(b.product.id.as_str()))
    });

    Json(report).into_response()
}
