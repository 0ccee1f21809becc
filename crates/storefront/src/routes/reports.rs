//! Report route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use tienda_core::TopSellingEntry;

use crate::state::AppState;

/// Top-selling row display data for templates.
#[derive(Debug, Clone)]
pub struct TopSellingRowView {
    pub name: String,
    pub description: String,
    pub quantity_sold: u64,
}

impl From<&TopSellingEntry> for TopSellingRowView {
    fn from(entry: &TopSellingEntry) -> Self {
        Self {
            name: entry.product.name.clone(),
            description: entry.product.description.clone(),
            quantity_sold: entry.quantity_sold,
        }
    }
}

/// Top-selling report template.
#[derive(Template, WebTemplate)]
#[template(path = "reports/top_selling.html")]
pub struct TopSellingTemplate {
    pub rows: Vec<TopSellingRowView>,
    pub error: Option<String>,
}

/// Display the top-selling products report.
///
/// Rows are shown in the order the API returns them.
#[instrument(skip(state))]
pub async fn top_selling(State(state): State<AppState>) -> Response {
    match state.api().top_selling_report().await {
        Ok(entries) => TopSellingTemplate {
            rows: entries.iter().map(TopSellingRowView::from).collect(),
            error: None,
        }
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to load top-selling report: {e}");
            (
                StatusCode::BAD_GATEWAY,
                TopSellingTemplate {
                    rows: Vec::new(),
                    error: Some("Error loading report.".to_string()),
                },
            )
                .into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tienda_core::{Price, Product, ProductId};

    use super::*;

    #[test]
    fn test_empty_report_message() {
        let html = TopSellingTemplate {
            rows: Vec::new(),
            error: None,
        }
        .render()
        .unwrap();
        assert!(html.contains("No sales data yet. Make a purchase first!"));
    }

    #[test]
    fn test_error_hides_empty_message() {
        let html = TopSellingTemplate {
            rows: Vec::new(),
            error: Some("Error loading report.".to_string()),
        }
        .render()
        .unwrap();
        assert!(html.contains("Error loading report."));
        assert!(!html.contains("No sales data yet."));
    }

    #[test]
    fn test_rows_render_in_order() {
        let entry = |id: &str, name: &str, sold| TopSellingEntry {
            product: Product {
                id: ProductId::new(id),
                name: name.to_string(),
                description: format!("{name} description"),
                price: Price::from_cents(500),
                stock: 0,
            },
            quantity_sold: sold,
        };
        let rows: Vec<TopSellingRowView> = [entry("p2", "Beans", 9), entry("p1", "Mug", 2)]
            .iter()
            .map(TopSellingRowView::from)
            .collect();

        let html = TopSellingTemplate { rows, error: None }.render().unwrap();
        let beans = html.find("Beans").unwrap();
        let mug = html.find("Mug").unwrap();
        assert!(beans < mug);
        assert!(html.contains("Beans description"));
    }
}
