//! Session-related types.

/// Session keys.
pub mod keys {
    /// Key for storing the current cart ID.
    pub const CART_ID: &str = "cart_id";
}
