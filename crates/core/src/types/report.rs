//! Sales report rows.

use serde::{Deserialize, Serialize};

use super::product::Product;

/// One row of the top-selling report.
///
/// The server sorts rows by `quantity_sold`, highest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopSellingEntry {
    pub product: Product,
    pub quantity_sold: u64,
}
