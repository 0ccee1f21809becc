//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Product listing
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products/new           - Add-product form
//! POST /products               - Create product (re-renders the form)
//! POST /products/delete        - Delete product, redirect to listing
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart, redirect to listing
//! POST /cart/remove            - Remove line, redirect to cart
//! POST /cart/checkout          - Checkout, render confirmation
//!
//! # Reports
//! GET  /reports/top-selling    - Top-selling products table
//! ```
//!
//! Redirecting handlers report their outcome through the `notice` query
//! parameter, see [`Notice`].

pub mod cart;
pub mod products;
pub mod reports;

use std::str::FromStr;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Deserialize;

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(products::create))
        .route("/new", get(products::new))
        .route("/delete", post(products::delete))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/checkout", post(cart::checkout))
}

/// Create the report routes router.
pub fn report_routes() -> Router<AppState> {
    Router::new().route("/top-selling", get(reports::top_selling))
}

/// Create all storefront routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/reports", report_routes())
}

// =============================================================================
// Notices
// =============================================================================

/// Outcome of a redirecting action, carried in `?notice=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Added,
    AddFailed,
    Deleted,
    DeleteFailed,
    RemoveFailed,
    CheckoutFailed,
}

impl Notice {
    /// Query string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::AddFailed => "add_failed",
            Self::Deleted => "deleted",
            Self::DeleteFailed => "delete_failed",
            Self::RemoveFailed => "remove_failed",
            Self::CheckoutFailed => "checkout_failed",
        }
    }

    /// Message shown to the visitor.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Added => "Product added to cart.",
            Self::AddFailed => "Error adding to cart.",
            Self::Deleted => "Product deleted.",
            Self::DeleteFailed => "Error deleting product.",
            Self::RemoveFailed => "Error removing item from cart.",
            Self::CheckoutFailed => "Checkout failed. Please try again.",
        }
    }

    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(
            self,
            Self::AddFailed | Self::DeleteFailed | Self::RemoveFailed | Self::CheckoutFailed
        )
    }

    /// Location to redirect to after an action with this outcome.
    #[must_use]
    pub fn redirect_to(self, path: &str) -> String {
        format!("{path}?notice={}", self.as_str())
    }
}

impl FromStr for Notice {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "added" => Ok(Self::Added),
            "add_failed" => Ok(Self::AddFailed),
            "deleted" => Ok(Self::Deleted),
            "delete_failed" => Ok(Self::DeleteFailed),
            "remove_failed" => Ok(Self::RemoveFailed),
            "checkout_failed" => Ok(Self::CheckoutFailed),
            _ => Err(()),
        }
    }
}

/// Query parameters accepted by pages that display notices.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

impl NoticeQuery {
    /// The notice to display, ignoring unknown values.
    #[must_use]
    pub fn view(&self) -> Option<NoticeView> {
        self.notice
            .as_deref()
            .and_then(|value| value.parse::<Notice>().ok())
            .map(NoticeView::from)
    }
}

/// Status banner display data for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeView {
    pub message: String,
    pub is_error: bool,
}

impl NoticeView {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

impl From<Notice> for NoticeView {
    fn from(notice: Notice) -> Self {
        Self {
            message: notice.message().to_string(),
            is_error: notice.is_error(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_query_roundtrip() {
        for notice in [
            Notice::Added,
            Notice::AddFailed,
            Notice::Deleted,
            Notice::DeleteFailed,
            Notice::RemoveFailed,
            Notice::CheckoutFailed,
        ] {
            assert_eq!(notice.as_str().parse::<Notice>().unwrap(), notice);
        }
    }

    #[test]
    fn test_unknown_notice_is_ignored() {
        let query = NoticeQuery {
            notice: Some("<script>".to_string()),
        };
        assert_eq!(query.view(), None);
        assert_eq!(NoticeQuery::default().view(), None);
    }

    #[test]
    fn test_notice_view() {
        let query = NoticeQuery {
            notice: Some("add_failed".to_string()),
        };
        let view = query.view().unwrap();
        assert!(view.is_error);
        assert_eq!(view.message, "Error adding to cart.");

        assert!(!NoticeView::from(Notice::Added).is_error);
    }

    #[test]
    fn test_redirect_to() {
        assert_eq!(Notice::Deleted.redirect_to("/"), "/?notice=deleted");
        assert_eq!(
            Notice::CheckoutFailed.redirect_to("/cart"),
            "/cart?notice=checkout_failed"
        );
    }
}
