//! Cart commands.
//!
//! The held cart ID lives in the cart file (see [`FileCartStore`]), so
//! `tienda cart add` keeps filling the same cart until checkout. A cart the
//! API has forgotten is replaced on the next add.

use std::collections::HashMap;

use tracing::{info, warn};

use tienda_core::{Cart, ProductId};
use tienda_storefront::api::ApiClient;
use tienda_storefront::cart_session::{CartSessionManager, CartState};

use super::CommandError;
use crate::output;
use crate::store::FileCartStore;

/// Cart session manager persisting its cart ID to a file.
pub type FileCart = CartSessionManager<ApiClient, FileCartStore>;

/// Product names for display; a failed lookup only loses the names.
async fn product_names(api: &ApiClient) -> HashMap<ProductId, String> {
    match api.list_products().await {
        Ok(products) => products
            .into_iter()
            .map(|product| (product.id, product.name))
            .collect(),
        Err(e) => {
            warn!("Could not load product names: {e}");
            HashMap::new()
        }
    }
}

async fn print_cart(cart: &FileCart, contents: &Cart) {
    let names = product_names(cart.api()).await;
    output::print(&output::cart(contents, &names));
}

/// Add a product to the held cart, creating one if needed.
///
/// # Errors
///
/// Returns an error if the product does not exist or the cart cannot be
/// created or updated.
pub async fn add(cart: &FileCart, product_id: &ProductId, quantity: u32) -> Result<(), CommandError> {
    let updated = cart.add_item(product_id, quantity).await?;
    info!(cart_id = %updated.id, %product_id, quantity, "Added to cart");
    print_cart(cart, &updated).await;
    Ok(())
}

/// Show the held cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded for a reason other than
/// the API no longer knowing it.
pub async fn show(cart: &FileCart) -> Result<(), CommandError> {
    match cart.load_current().await? {
        CartState::Active(contents) => print_cart(cart, &contents).await,
        CartState::Empty => output::print("Your cart is empty."),
    }
    Ok(())
}

/// Remove a product from the held cart.
///
/// # Errors
///
/// Returns an error if no cart is held or the removal fails.
pub async fn remove(cart: &FileCart, product_id: &ProductId) -> Result<(), CommandError> {
    let cart_id = cart.current().await?.ok_or(CommandError::NoActiveCart)?;
    let updated = cart.remove_item(&cart_id, product_id).await?;
    print_cart(cart, &updated).await;
    Ok(())
}

/// Check out the held cart. The next add starts a new cart.
///
/// # Errors
///
/// Returns an error if no cart is held or the checkout fails.
pub async fn checkout(cart: &FileCart) -> Result<(), CommandError> {
    let cart_id = cart.current().await?.ok_or(CommandError::NoActiveCart)?;
    let receipt = cart.checkout(&cart_id).await?;
    info!(%cart_id, "Checked out");

    if receipt.message.is_empty() {
        output::print(&format!("Checked out cart {cart_id}"));
    } else {
        output::print(&receipt.message);
    }
    Ok(())
}
