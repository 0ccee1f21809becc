//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use tienda_core::{NewProduct, Price, Product, ProductId};

use super::{Notice, NoticeQuery, NoticeView};
use crate::error::add_breadcrumb;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: i64,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.display(),
            stock: product.stock,
        }
    }
}

/// Add-product form data.
///
/// Fields stay as submitted so an invalid form can be re-rendered as typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock: String,
}

impl ProductForm {
    /// Validate the submitted fields into a create request.
    ///
    /// # Errors
    ///
    /// Returns a visitor-facing message describing the first invalid field.
    pub fn validate(&self) -> Result<NewProduct, &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name is required.");
        }

        let price = self
            .price
            .parse::<Price>()
            .map_err(|_| "Price must be a number of zero or more.")?;

        let stock = match self.stock.trim() {
            "" => 0,
            raw => raw
                .parse::<i64>()
                .ok()
                .filter(|stock| *stock >= 0)
                .ok_or("Stock must be a whole number of zero or more.")?,
        };

        Ok(NewProduct {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            price,
            stock,
        })
    }
}

/// Delete-product form data.
#[derive(Debug, Deserialize)]
pub struct DeleteProductForm {
    pub product_id: String,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductView>,
    pub notice: Option<NoticeView>,
    pub error: Option<String>,
}

/// Add-product form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/new.html")]
pub struct ProductFormTemplate {
    pub form: ProductForm,
    pub status: Option<NoticeView>,
}

/// Display product listing page.
#[instrument(skip(state, query))]
pub async fn index(State(state): State<AppState>, Query(query): Query<NoticeQuery>) -> Response {
    let notice = query.view();

    match state.api().list_products().await {
        Ok(products) => ProductsIndexTemplate {
            products: products.iter().map(ProductView::from).collect(),
            notice,
            error: None,
        }
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to list products: {e}");
            (
                StatusCode::BAD_GATEWAY,
                ProductsIndexTemplate {
                    products: Vec::new(),
                    notice,
                    error: Some("Error loading products.".to_string()),
                },
            )
                .into_response()
        }
    }
}

/// Display the add-product form.
pub async fn new() -> impl IntoResponse {
    ProductFormTemplate {
        form: ProductForm::default(),
        status: None,
    }
}

/// Create a product and re-render the form with the outcome.
///
/// On success the form is cleared; on failure the submitted values are kept.
#[instrument(skip(state, form))]
pub async fn create(State(state): State<AppState>, Form(form): Form<ProductForm>) -> Response {
    let product = match form.validate() {
        Ok(product) => product,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                ProductFormTemplate {
                    form,
                    status: Some(NoticeView::error(message)),
                },
            )
                .into_response();
        }
    };

    match state.api().create_product(&product).await {
        Ok(created) => {
            add_breadcrumb(
                "products",
                "Created product",
                Some(&[("product_id", created.id.as_str())]),
            );
            ProductFormTemplate {
                form: ProductForm::default(),
                status: Some(NoticeView::success("Product added successfully!")),
            }
            .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to create product: {e}");
            (
                StatusCode::BAD_GATEWAY,
                ProductFormTemplate {
                    form,
                    status: Some(NoticeView::error("Error adding product.")),
                },
            )
                .into_response()
        }
    }
}

/// Delete a product, then return to the listing.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Form(form): Form<DeleteProductForm>,
) -> Redirect {
    let notice = match form.product_id.parse::<ProductId>() {
        Ok(id) => match state.api().delete_product(&id).await {
            Ok(()) => Notice::Deleted,
            Err(e) => {
                tracing::error!("Failed to delete product {id}: {e}");
                Notice::DeleteFailed
            }
        },
        Err(e) => {
            tracing::warn!("Rejected delete request: {e}");
            Notice::DeleteFailed
        }
    };

    Redirect::to(&notice.redirect_to("/"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, price: &str, stock: &str) -> ProductForm {
        ProductForm {
            name: name.to_string(),
            description: "  Roasted daily  ".to_string(),
            price: price.to_string(),
            stock: stock.to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_valid_form() {
        let product = form(" Coffee ", "12.50", "3").validate().unwrap();
        assert_eq!(product.name, "Coffee");
        assert_eq!(product.description, "Roasted daily");
        assert_eq!(product.price, Price::from_cents(1250));
        assert_eq!(product.stock, 3);
    }

    #[test]
    fn test_validate_defaults_blank_stock() {
        let product = form("Tea", "4", "").validate().unwrap();
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        assert_eq!(form("  ", "1", "1").validate(), Err("Name is required."));
        assert!(form("Tea", "abc", "1").validate().is_err());
        assert!(form("Tea", "-1", "1").validate().is_err());
        assert!(form("Tea", "1", "-2").validate().is_err());
        assert!(form("Tea", "1", "1.5").validate().is_err());
    }

    #[test]
    fn test_product_view_formats_price() {
        let product = Product {
            id: ProductId::new("p1"),
            name: "Grinder".to_string(),
            description: String::new(),
            price: Price::from_cents(123_450),
            stock: 2,
        };
        let view = ProductView::from(&product);
        assert_eq!(view.id, "p1");
        assert_eq!(view.price, "$1,234.50");
    }

    #[test]
    fn test_index_template_renders_empty_state() {
        let html = ProductsIndexTemplate {
            products: Vec::new(),
            notice: None,
            error: None,
        }
        .render()
        .unwrap();
        assert!(html.contains("No products available."));
    }

    #[test]
    fn test_index_template_escapes_names() {
        let html = ProductsIndexTemplate {
            products: vec![ProductView {
                id: "p1".to_string(),
                name: "<b>Mug</b>".to_string(),
                description: String::new(),
                price: "$1.00".to_string(),
                stock: 1,
            }],
            notice: Some(Notice::Added.into()),
            error: None,
        }
        .render()
        .unwrap();
        assert!(html.contains("&#60;b&#62;Mug") || html.contains("&lt;b&gt;Mug"));
        assert!(!html.contains("<b>Mug</b>"));
        assert!(html.contains("Product added to cart."));
    }

    #[test]
    fn test_index_template_confirms_delete() {
        let html = ProductsIndexTemplate {
            products: vec![ProductView {
                id: "p1".to_string(),
                name: "Mug".to_string(),
                description: String::new(),
                price: "$1.00".to_string(),
                stock: 1,
            }],
            notice: None,
            error: None,
        }
        .render()
        .unwrap();
        assert!(html.contains(
            "action=\"/products/delete\" onsubmit=\"return confirm('Are you sure you want to delete this product?');\""
        ));
        // Adding to the cart is not confirmed
        assert!(html.contains("<form method=\"post\" action=\"/cart/add\">"));
    }

    #[test]
    fn test_form_template_keeps_values() {
        let html = ProductFormTemplate {
            form: form("Kettle", "30", "1"),
            status: Some(NoticeView::error("Error adding product.")),
        }
        .render()
        .unwrap();
        assert!(html.contains("value=\"Kettle\""));
        assert!(html.contains("Error adding product."));
    }
}
