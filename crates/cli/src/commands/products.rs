//! Product management commands.
//!
//! # Usage
//!
//! ```bash
//! tienda products list
//! tienda products add --name "Coffee" --price 12.50 --stock 10
//! tienda products update p1 --price 11.00
//! tienda products delete p1
//! tienda products seed products.yaml
//! ```
//!
//! # Seed File Format
//!
//! ```yaml
//! - name: Coffee
//!   description: Whole beans
//!   price: 12.50
//!   stock: 10
//! - name: Mug
//!   price: 8
//! ```

use std::path::Path;

use tracing::info;

use tienda_core::{NewProduct, Price, Product, ProductId};
use tienda_storefront::api::ApiClient;

use super::CommandError;
use crate::output;

/// Fields to change on an existing product. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub stock: Option<i64>,
}

impl ProductChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock.is_none()
    }

    /// Merge the changes over `current`, producing the full replacement.
    #[must_use]
    pub fn apply(self, current: Product) -> NewProduct {
        NewProduct {
            name: self.name.unwrap_or(current.name),
            description: self.description.unwrap_or(current.description),
            price: self.price.unwrap_or(current.price),
            stock: self.stock.unwrap_or(current.stock),
        }
    }
}

/// Reject products the API would store but the storefront cannot show.
fn validate(product: &NewProduct) -> Result<(), CommandError> {
    if product.name.trim().is_empty() {
        return Err(CommandError::InvalidInput(
            "Product name must not be empty".to_string(),
        ));
    }
    if product.stock < 0 {
        return Err(CommandError::InvalidInput(format!(
            "Stock for '{}' must not be negative",
            product.name
        )));
    }
    Ok(())
}

/// Parse and validate a YAML seed file's contents.
///
/// # Errors
///
/// Returns an error if the YAML is malformed, the list is empty, or any
/// product is invalid.
pub fn parse_seed(contents: &str) -> Result<Vec<NewProduct>, CommandError> {
    let products: Vec<NewProduct> = serde_yaml::from_str(contents)?;

    if products.is_empty() {
        return Err(CommandError::InvalidInput(
            "Seed file contains no products".to_string(),
        ));
    }
    for product in &products {
        validate(product)?;
    }

    Ok(products)
}

/// List all products.
///
/// # Errors
///
/// Returns an error if the listing request fails.
pub async fn list(api: &ApiClient) -> Result<(), CommandError> {
    let products = api.list_products().await?;
    output::print(&output::products(&products));
    Ok(())
}

/// Create one product.
///
/// # Errors
///
/// Returns an error if the product is invalid or the request fails.
pub async fn add(api: &ApiClient, product: NewProduct) -> Result<(), CommandError> {
    validate(&product)?;

    let created = api.create_product(&product).await?;
    info!(product_id = %created.id, "Product created");
    output::print(&output::product(&created));
    Ok(())
}

/// Update a product, keeping fields that were not given.
///
/// # Errors
///
/// Returns an error if no change was given, the product does not exist, or
/// the update request fails.
pub async fn update(
    api: &ApiClient,
    id: &ProductId,
    changes: ProductChanges,
) -> Result<(), CommandError> {
    if changes.is_empty() {
        return Err(CommandError::InvalidInput(
            "Nothing to update. Pass at least one of --name, --description, --price, --stock"
                .to_string(),
        ));
    }

    let current = api.get_product(id).await?;
    let replacement = changes.apply(current);
    validate(&replacement)?;

    let updated = api.update_product(id, &replacement).await?;
    info!(product_id = %updated.id, "Product updated");
    output::print(&output::product(&updated));
    Ok(())
}

/// Delete a product.
///
/// # Errors
///
/// Returns an error unless the API confirms the deletion.
pub async fn delete(api: &ApiClient, id: &ProductId) -> Result<(), CommandError> {
    api.delete_product(id).await?;
    output::print(&format!("Deleted product {id}"));
    Ok(())
}

/// Create every product listed in a YAML file with a single batch request.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the batch
/// request fails.
pub async fn seed(api: &ApiClient, path: &Path) -> Result<(), CommandError> {
    info!(path = %path.display(), "Loading products from file");

    let contents =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CommandError::ReadFile {
                path: path.display().to_string(),
                source,
            })?;
    let products = parse_seed(&contents)?;
    info!(count = products.len(), "Parsed seed file");

    let created = api.create_products_batch(&products).await?;
    info!(count = created.len(), "Seeding complete");
    output::print(&output::products(&created));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn current() -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Coffee".to_string(),
            description: "Whole beans".to_string(),
            price: Price::from_cents(1250),
            stock: 4,
        }
    }

    #[test]
    fn test_changes_keep_unset_fields() {
        let changes = ProductChanges {
            price: Some(Price::from_cents(1100)),
            ..Default::default()
        };
        let replacement = changes.apply(current());

        assert_eq!(replacement.name, "Coffee");
        assert_eq!(replacement.description, "Whole beans");
        assert_eq!(replacement.price, Price::from_cents(1100));
        assert_eq!(replacement.stock, 4);
    }

    #[test]
    fn test_changes_is_empty() {
        assert!(ProductChanges::default().is_empty());
        assert!(
            !ProductChanges {
                stock: Some(0),
                ..Default::default()
            }
            .is_empty()
        );
    }

    #[test]
    fn test_parse_seed() {
        let products = parse_seed(
            "- name: Coffee\n  description: Whole beans\n  price: 12.50\n  stock: 10\n- name: Mug\n  price: 8\n",
        )
        .unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].price, Price::from_cents(1250));
        assert_eq!(products[1].name, "Mug");
        assert_eq!(products[1].description, "");
        assert_eq!(products[1].stock, 0);
    }

    #[test]
    fn test_parse_seed_rejects_bad_input() {
        assert!(matches!(
            parse_seed("[]"),
            Err(CommandError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_seed("- name: ''\n  price: 1\n"),
            Err(CommandError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_seed("- name: Mug\n  price: 1\n  stock: -3\n"),
            Err(CommandError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_seed("name: not a list"),
            Err(CommandError::Yaml(_))
        ));
    }
}
