//! Cart route handlers.
//!
//! Every cart operation goes through the visitor's [`SessionCart`], which
//! owns the cart ID kept in the session. Handlers only read the cart back
//! for display and never touch the session key themselves.
//!
//! [`SessionCart`]: crate::state::SessionCart

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Extension, Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use tienda_core::{Cart, CartId, CartItem, Product, ProductId};

use super::{Notice, NoticeQuery, NoticeView};
use crate::cart_session::CartError;
use crate::error::{AppError, add_breadcrumb};
use crate::middleware::RequestId;
use crate::state::AppState;

/// Name shown for cart lines whose product no longer exists.
pub const MISSING_PRODUCT_NAME: &str = "Product not found";

/// Cart item display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub subtotal: String,
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub id: String,
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u32,
}

impl CartView {
    /// Build the view, resolving product names from `names`.
    #[must_use]
    pub fn new(cart: &Cart, names: &HashMap<ProductId, String>) -> Self {
        Self {
            id: cart.id.to_string(),
            items: cart
                .items
                .iter()
                .map(|item| CartItemView::new(item, names))
                .collect(),
            total: cart.total.display(),
            item_count: cart.item_count(),
        }
    }
}

impl CartItemView {
    fn new(item: &CartItem, names: &HashMap<ProductId, String>) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            name: names
                .get(&item.product_id)
                .cloned()
                .unwrap_or_else(|| MISSING_PRODUCT_NAME.to_string()),
            quantity: item.quantity,
            price: item.price.display(),
            subtotal: item.subtotal().display(),
        }
    }
}

/// Index product names by ID.
fn product_names(products: Vec<Product>) -> HashMap<ProductId, String> {
    products
        .into_iter()
        .map(|product| (product.id, product.name))
        .collect()
}

/// Add to cart form data.
///
/// Fields are kept as text so malformed input still ends in a notice
/// rather than a bare rejection.
#[derive(Debug, Default, Deserialize)]
pub struct AddToCartForm {
    #[serde(default)]
    pub product_id: String,
    pub quantity: Option<String>,
}

impl AddToCartForm {
    /// Requested quantity. Missing or blank means one.
    ///
    /// # Errors
    ///
    /// Returns an error if the quantity is not a whole number above zero.
    pub fn quantity(&self) -> Result<u32, &'static str> {
        match self.quantity.as_deref().map(str::trim) {
            None | Some("") => Ok(1),
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|q| *q > 0)
                .ok_or("Quantity must be a whole number above zero."),
        }
    }
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub cart_id: String,
    pub product_id: String,
}

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub cart_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: Option<CartView>,
    pub notice: Option<NoticeView>,
    pub error: Option<String>,
}

/// Checkout confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/checkout_complete.html")]
pub struct CheckoutCompleteTemplate {
    pub message: String,
}

/// Display cart page.
///
/// A cart the API no longer knows is shown as empty.
#[instrument(skip(state, session, query))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<NoticeQuery>,
) -> Response {
    let notice = query.view();

    let cart = match state.cart(session).load_current().await {
        Ok(loaded) => loaded.into_non_empty(),
        Err(CartError::Store(e)) => return AppError::from(e).into_response(),
        Err(e) => {
            tracing::error!("Failed to load cart: {e}");
            return (
                StatusCode::BAD_GATEWAY,
                CartShowTemplate {
                    cart: None,
                    notice,
                    error: Some("Error loading cart.".to_string()),
                },
            )
                .into_response();
        }
    };

    let Some(cart) = cart else {
        return CartShowTemplate {
            cart: None,
            notice,
            error: None,
        }
        .into_response();
    };

    let names = match state.api().list_products().await {
        Ok(products) => product_names(products),
        Err(e) => {
            tracing::warn!("Failed to load product names for cart {}: {e}", cart.id);
            HashMap::new()
        }
    };

    CartShowTemplate {
        cart: Some(CartView::new(&cart, &names)),
        notice,
        error: None,
    }
    .into_response()
}

/// Add item to cart, then return to the listing.
///
/// Creates a cart on first use and replaces a cart the API has forgotten.
#[instrument(skip(state, session, request_id))]
pub async fn add(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect, AppError> {
    let request = form
        .product_id
        .parse::<ProductId>()
        .map_err(|e| e.to_string())
        .and_then(|product_id| Ok((product_id, form.quantity()?)));
    let (product_id, quantity) = match request {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Rejected add-to-cart request: {e}");
            return Ok(Redirect::to(&Notice::AddFailed.redirect_to("/")));
        }
    };

    let notice = match state.cart(session).add_item(&product_id, quantity).await {
        Ok(cart) => {
            add_breadcrumb(
                "cart",
                "Added item",
                Some(&[
                    ("cart_id", cart.id.as_str()),
                    ("product_id", product_id.as_str()),
                    ("request_id", request_id.as_str()),
                ]),
            );
            Notice::Added
        }
        Err(CartError::Store(e)) => return Err(e.into()),
        Err(e) => {
            tracing::error!("Failed to add {product_id} to cart: {e}");
            Notice::AddFailed
        }
    };

    Ok(Redirect::to(&notice.redirect_to("/")))
}

/// Remove a line from the cart named in the form.
#[instrument(skip(state, session, request_id))]
pub async fn remove(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Redirect {
    let ids = (
        form.cart_id.parse::<CartId>(),
        form.product_id.parse::<ProductId>(),
    );

    let result = match ids {
        (Ok(cart_id), Ok(product_id)) => state
            .cart(session)
            .remove_item(&cart_id, &product_id)
            .await
            .map_err(|e| e.to_string()),
        (Err(e), _) | (_, Err(e)) => Err(e.to_string()),
    };

    match result {
        Ok(cart) => {
            add_breadcrumb(
                "cart",
                "Removed item",
                Some(&[
                    ("cart_id", cart.id.as_str()),
                    ("product_id", form.product_id.as_str()),
                    ("request_id", request_id.as_str()),
                ]),
            );
            Redirect::to("/cart")
        }
        Err(e) => {
            tracing::error!("Failed to remove item from cart: {e}");
            Redirect::to(&Notice::RemoveFailed.redirect_to("/cart"))
        }
    }
}

/// Check out the cart named in the form and show the confirmation.
///
/// A successful checkout ends the visitor's cart; the next add starts a new
/// one.
#[instrument(skip(state, session, request_id))]
pub async fn checkout(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Response {
    let cart_id = match form.cart_id.parse::<CartId>() {
        Ok(cart_id) => cart_id,
        Err(e) => {
            tracing::warn!("Rejected checkout request: {e}");
            return Redirect::to(&Notice::CheckoutFailed.redirect_to("/cart")).into_response();
        }
    };

    match state.cart(session).checkout(&cart_id).await {
        Ok(receipt) => {
            add_breadcrumb(
                "cart",
                "Checked out",
                Some(&[
                    ("cart_id", cart_id.as_str()),
                    ("request_id", request_id.as_str()),
                ]),
            );
            let message = if receipt.message.trim().is_empty() {
                "Purchase completed successfully.".to_string()
            } else {
                receipt.message
            };
            CheckoutCompleteTemplate { message }.into_response()
        }
        Err(CartError::Store(e)) => AppError::from(e).into_response(),
        Err(e) => {
            tracing::error!("Checkout of cart {cart_id} failed: {e}");
            Redirect::to(&Notice::CheckoutFailed.redirect_to("/cart")).into_response()
        }
    }
}
