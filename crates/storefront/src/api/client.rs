//! Shop API client implementation.
//!
//! Uses `reqwest` for HTTP and `serde_json` for bodies. The client is cheap to
//! clone; all clones share one connection pool.

use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use tienda_core::{
    AddItemRequest, Cart, CartId, CheckoutReceipt, NewProduct, Product, ProductId,
    TopSellingEntry,
};

use super::{ApiError, ERROR_BODY_LIMIT};
use crate::cart_session::CartApi;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the shop HTTP API.
///
/// Covers products, carts and the top-selling report.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client for the given base URL (e.g.
    /// `http://localhost:8080/api`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if the URL cannot be parsed or
    /// cannot carry path segments.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a new API client that reuses an existing `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if the URL cannot be parsed or
    /// cannot carry path segments.
    pub fn with_client(base_url: &str, client: reqwest::Client) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner { client, base_url }),
        })
    }

    /// The base URL all endpoints are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build an endpoint URL from path segments, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and map non-success statuses to errors.
    ///
    /// `resource` names the thing being addressed, for `NotFound` messages.
    async fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!(resource, "Shop API returned 404");
            return Err(ApiError::NotFound(resource.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Shop API returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: body.trim().chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        Ok(response)
    }

    /// Decode a JSON response body.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        // Read as text first for better error diagnostics
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse shop API response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// List every product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let url = self.endpoint(&["products"])?;
        let response = self.send(self.inner.client.get(url), "products").await?;
        // An empty catalogue may come back as `null`
        let products: Option<Vec<Product>> = Self::decode(response).await?;
        Ok(products.unwrap_or_default())
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let url = self.endpoint(&["products", id.as_str()])?;
        let response = self
            .send(self.inner.client.get(url), &format!("product {id}"))
            .await?;
        Self::decode(response).await
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the product or the request fails.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, ApiError> {
        let url = self.endpoint(&["products"])?;
        let response = self
            .send(self.inner.client.post(url).json(product), "products")
            .await?;
        Self::decode(response).await
    }

    /// Create several products in one request.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the batch or the request fails.
    #[instrument(skip(self, products), fields(count = products.len()))]
    pub async fn create_products_batch(
        &self,
        products: &[NewProduct],
    ) -> Result<Vec<Product>, ApiError> {
        let url = self.endpoint(&["products", "batch"])?;
        let response = self
            .send(self.inner.client.post(url).json(products), "products")
            .await?;
        let created: Option<Vec<Product>> = Self::decode(response).await?;
        Ok(created.unwrap_or_default())
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist, or another
    /// error if the API request fails.
    #[instrument(skip(self, product), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        product: &NewProduct,
    ) -> Result<Product, ApiError> {
        let url = self.endpoint(&["products", id.as_str()])?;
        let response = self
            .send(
                self.inner.client.put(url).json(product),
                &format!("product {id}"),
            )
            .await?;
        Self::decode(response).await
    }

    /// Delete a product.
    ///
    /// Only `204 No Content` counts as success.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist, or
    /// `ApiError::Status` for any other status than 204.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        let url = self.endpoint(&["products", id.as_str()])?;
        let response = self
            .send(self.inner.client.delete(url), &format!("product {id}"))
            .await?;

        let status = response.status();
        if status != StatusCode::NO_CONTENT {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: "expected 204 No Content".to_string(),
            });
        }
        Ok(())
    }

    // =========================================================================
    // Report Methods
    // =========================================================================

    /// Get the top-selling products, highest quantity first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn top_selling_report(&self) -> Result<Vec<TopSellingEntry>, ApiError> {
        let url = self.endpoint(&["reports", "top-selling"])?;
        let response = self.send(self.inner.client.get(url), "report").await?;
        let rows: Option<Vec<TopSellingEntry>> = Self::decode(response).await?;
        Ok(rows.unwrap_or_default())
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Create a new, empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn create_cart(&self) -> Result<Cart, ApiError> {
        let url = self.endpoint(&["cart"])?;
        let response = self.send(self.inner.client.post(url), "cart").await?;
        Self::decode(response).await
    }

    /// Get a cart by ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the cart no longer exists, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &CartId) -> Result<Cart, ApiError> {
        let url = self.endpoint(&["cart", cart_id.as_str()])?;
        let response = self
            .send(self.inner.client.get(url), &format!("cart {cart_id}"))
            .await?;
        Self::decode(response).await
    }

    /// Add a product to a cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if either the cart or the product is
    /// unknown to the server, or another error if the API request fails.
    #[instrument(skip(self, item), fields(cart_id = %cart_id, product_id = %item.product_id))]
    pub async fn add_item(&self, cart_id: &CartId, item: &AddItemRequest) -> Result<Cart, ApiError> {
        let url = self.endpoint(&["cart", cart_id.as_str(), "add"])?;
        let response = self
            .send(
                self.inner.client.post(url).json(item),
                &format!("cart {cart_id} or product {}", item.product_id),
            )
            .await?;
        Self::decode(response).await
    }

    /// Remove a product's line from a cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the cart or the line does not exist, or
    /// another error if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id, product_id = %product_id))]
    pub async fn remove_item(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
    ) -> Result<Cart, ApiError> {
        let url = self.endpoint(&["cart", cart_id.as_str(), "item", product_id.as_str()])?;
        let response = self
            .send(
                self.inner.client.delete(url),
                &format!("item {product_id} in cart {cart_id}"),
            )
            .await?;
        Self::decode(response).await
    }

    /// Check out a cart, turning it into an order.
    ///
    /// The server deletes the cart afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the cart no longer exists, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn checkout(&self, cart_id: &CartId) -> Result<CheckoutReceipt, ApiError> {
        let url = self.endpoint(&["cart", cart_id.as_str(), "checkout"])?;
        let response = self
            .send(self.inner.client.post(url), &format!("cart {cart_id}"))
            .await?;
        Self::decode(response).await
    }
}

impl CartApi for ApiClient {
    async fn create_cart(&self) -> Result<Cart, ApiError> {
        Self::create_cart(self).await
    }

    async fn get_cart(&self, cart_id: &CartId) -> Result<Cart, ApiError> {
        Self::get_cart(self, cart_id).await
    }

    async fn add_item(&self, cart_id: &CartId, item: &AddItemRequest) -> Result<Cart, ApiError> {
        Self::add_item(self, cart_id, item).await
    }

    async fn remove_item(&self, cart_id: &CartId, product_id: &ProductId) -> Result<Cart, ApiError> {
        Self::remove_item(self, cart_id, product_id).await
    }

    async fn checkout(&self, cart_id: &CartId) -> Result<CheckoutReceipt, ApiError> {
        Self::checkout(self, cart_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_segments() {
        let client = ApiClient::new("http://localhost:8080/api").unwrap();
        let url = client.endpoint(&["cart", "c1", "add"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/cart/c1/add");
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash() {
        let client = ApiClient::new("http://localhost:8080/api/").unwrap();
        let url = client.endpoint(&["products"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/products");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = ApiClient::new("http://localhost:8080/api").unwrap();
        let url = client.endpoint(&["cart", "a/b c", "checkout"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/cart/a%2Fb%20c/checkout"
        );
    }

    #[test]
    fn test_new_rejects_unusable_base() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ApiError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            ApiClient::new("mailto:shop@example.com"),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_debug_shows_base_url() {
        let client = ApiClient::new("http://localhost:8080/api").unwrap();
        assert!(format!("{client:?}").contains("localhost:8080/api"));
    }
}
