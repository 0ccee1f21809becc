//! Cart ID stores.

use thiserror::Error;
use tokio::sync::Mutex;
use tower_sessions::Session;

use tienda_core::CartId;

use super::CartIdStore;
use crate::models::session_keys;

/// Errors reading or writing a held cart ID.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The web session could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// A file-backed store could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored value was not valid.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// =============================================================================
// MemoryCartStore
// =============================================================================

/// Process-local store. Useful for tests and one-shot tools.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    cart_id: Mutex<Option<CartId>>,
}

impl MemoryCartStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `cart_id`.
    #[must_use]
    pub fn with_cart_id(cart_id: CartId) -> Self {
        Self {
            cart_id: Mutex::new(Some(cart_id)),
        }
    }
}

impl CartIdStore for MemoryCartStore {
    async fn load(&self) -> Result<Option<CartId>, StoreError> {
        Ok(self.cart_id.lock().await.clone())
    }

    async fn save(&self, cart_id: &CartId) -> Result<(), StoreError> {
        *self.cart_id.lock().await = Some(cart_id.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.cart_id.lock().await = None;
        Ok(())
    }
}

// =============================================================================
// SessionCartStore
// =============================================================================

/// Keeps the cart ID in the visitor's web session under
/// [`session_keys::CART_ID`].
#[derive(Clone)]
pub struct SessionCartStore {
    session: Session,
}

impl std::fmt::Debug for SessionCartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCartStore").finish_non_exhaustive()
    }
}

impl SessionCartStore {
    /// Wrap the current request's session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl CartIdStore for SessionCartStore {
    async fn load(&self) -> Result<Option<CartId>, StoreError> {
        Ok(self.session.get::<CartId>(session_keys::CART_ID).await?)
    }

    async fn save(&self, cart_id: &CartId) -> Result<(), StoreError> {
        Ok(self.session.insert(session_keys::CART_ID, cart_id).await?)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.session.remove::<CartId>(session_keys::CART_ID).await?;
        Ok(())
    }
}
