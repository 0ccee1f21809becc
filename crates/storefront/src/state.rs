//! Application state shared across handlers.

use std::sync::Arc;

use tower_sessions::Session;

use crate::api::{ApiClient, ApiError};
use crate::cart_session::{CartSessionManager, SessionCartStore};
use crate::config::StorefrontConfig;

/// Cart session manager bound to one visitor's session.
pub type SessionCart = CartSessionManager<ApiClient, SessionCartStore>;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the shop API client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured API URL cannot be used as a base.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(config.api_url.as_str())?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, api }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the shop API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Build the cart session manager for the current visitor.
    #[must_use]
    pub fn cart(&self, session: Session) -> SessionCart {
        CartSessionManager::new(self.inner.api.clone(), SessionCartStore::new(session))
    }
}
