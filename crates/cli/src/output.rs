//! Plain-text rendering of command results.
//!
//! Formatting is kept separate from printing so it can be tested.

use std::collections::HashMap;
use std::fmt::Write;

use tienda_core::{Cart, Product, ProductId, TopSellingEntry};

/// Name shown for cart lines whose product no longer exists.
const MISSING_PRODUCT_NAME: &str = "Product not found";

/// Write command output to stdout.
#[allow(clippy::print_stdout)]
pub fn print(text: &str) {
    println!("{}", text.trim_end());
}

/// Render the product listing.
#[must_use]
pub fn products(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products available.".to_string();
    }

    let mut out = format!("{:<12} {:<30} {:>12} {:>6}\n", "ID", "NAME", "PRICE", "STOCK");
    for product in products {
        let _ = writeln!(
            out,
            "{:<12} {:<30} {:>12} {:>6}",
            product.id.as_str(),
            product.name,
            product.price.display(),
            product.stock
        );
    }
    out
}

/// Render a single product.
#[must_use]
pub fn product(product: &Product) -> String {
    let mut out = format!("{} {}\n", product.id, product.name);
    if !product.description.is_empty() {
        let _ = writeln!(out, "  {}", product.description);
    }
    let _ = writeln!(
        out,
        "  {} ({} in stock)",
        product.price.display(),
        product.stock
    );
    out
}

/// Render a cart, resolving product names from `names`.
#[must_use]
pub fn cart(cart: &Cart, names: &HashMap<ProductId, String>) -> String {
    if cart.is_empty() {
        return "Your cart is empty.".to_string();
    }

    let mut out = format!("Cart {}\n", cart.id);
    for item in &cart.items {
        let name = names
            .get(&item.product_id)
            .map_or(MISSING_PRODUCT_NAME, String::as_str);
        let _ = writeln!(
            out,
            "  {:<12} {:<30} {:>4} x {:>10} = {:>12}",
            item.product_id.as_str(),
            name,
            item.quantity,
            item.price.display(),
            item.subtotal().display()
        );
    }
    let _ = writeln!(
        out,
        "Total: {} ({} items)",
        cart.total.display(),
        cart.item_count()
    );
    out
}

/// Render the top-selling report in the order the API returned it.
#[must_use]
pub fn top_selling(entries: &[TopSellingEntry]) -> String {
    if entries.is_empty() {
        return "No sales data yet. Make a purchase first!".to_string();
    }

    let mut out = format!("{:<30} {:>8}  {}\n", "PRODUCT", "SOLD", "DESCRIPTION");
    for entry in entries {
        let _ = writeln!(
            out,
            "{:<30} {:>8}  {}",
            entry.product.name, entry.quantity_sold, entry.product.description
        );
    }
    out
}
