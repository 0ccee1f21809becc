//! Tienda CLI - Command-line client for the shop API.
//!
//! # Usage
//!
//! ```bash
//! # Browse and manage products
//! tienda products list
//! tienda products add --name "Coffee" --price 12.50 --stock 10
//! tienda products seed products.yaml
//!
//! # Shop
//! tienda cart add p1 --quantity 2
//! tienda cart show
//! tienda cart checkout
//!
//! # Reports
//! tienda report top-selling
//! ```
//!
//! # Environment Variables
//!
//! - `TIENDA_API_URL` - Shop API base URL (default: `http://localhost:8080/api`)
//! - `TIENDA_CART_FILE` - Where the held cart ID is kept
//!   (default: `.tienda/cart.json`)
//! - `RUST_LOG` - Log filter (default: `tienda_cli=warn`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use tienda_core::{NewProduct, Price, ProductId};
use tienda_storefront::api::ApiClient;
use tienda_storefront::cart_session::CartSessionManager;
use tienda_storefront::config::DEFAULT_API_URL;

use tienda_cli::commands::{self, products::ProductChanges};
use tienda_cli::store::{DEFAULT_CART_FILE, FileCartStore};

#[derive(Parser)]
#[command(name = "tienda")]
#[command(author, version, about = "Tienda shop command-line client")]
struct Cli {
    /// Shop API base URL
    #[arg(long, global = true, env = "TIENDA_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// File holding the current cart ID
    #[arg(long, global = true, env = "TIENDA_CART_FILE", default_value = DEFAULT_CART_FILE)]
    cart_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Work with the current cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Sales reports
    Report {
        #[command(subcommand)]
        report: ReportKind,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List all products
    List,
    /// Create a product
    Add {
        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Unit price, e.g. 12.50
        #[arg(short, long)]
        price: Price,

        #[arg(short, long, default_value_t = 0)]
        stock: i64,
    },
    /// Change some fields of a product
    Update {
        id: ProductId,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        price: Option<Price>,

        #[arg(short, long)]
        stock: Option<i64>,
    },
    /// Delete a product
    Delete { id: ProductId },
    /// Create products from a YAML file in one batch
    Seed {
        /// Path to a YAML list of products
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product, creating a cart if needed
    Add {
        product_id: ProductId,

        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,
    },
    /// Show the current cart
    Show,
    /// Remove a product from the current cart
    Remove { product_id: ProductId },
    /// Buy everything in the current cart
    Checkout,
}

#[derive(Subcommand)]
enum ReportKind {
    /// Best-selling products, most sold first
    TopSelling,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tienda_cli=warn,tienda_storefront=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let api = ApiClient::new(&cli.api_url)?;

    match cli.command {
        Commands::Products { action } => match action {
            ProductAction::List => commands::products::list(&api).await?,
            ProductAction::Add {
                name,
                description,
                price,
                stock,
            } => {
                let product = NewProduct {
                    name,
                    description,
                    price,
                    stock,
                };
                commands::products::add(&api, product).await?;
            }
            ProductAction::Update {
                id,
                name,
                description,
                price,
                stock,
            } => {
                let changes = ProductChanges {
                    name,
                    description,
                    price,
                    stock,
                };
                commands::products::update(&api, &id, changes).await?;
            }
            ProductAction::Delete { id } => commands::products::delete(&api, &id).await?,
            ProductAction::Seed { file } => commands::products::seed(&api, &file).await?,
        },
        Commands::Cart { action } => {
            let cart = CartSessionManager::new(api, FileCartStore::new(cli.cart_file));
            match action {
                CartAction::Add {
                    product_id,
                    quantity,
                } => commands::cart::add(&cart, &product_id, quantity).await?,
                CartAction::Show => commands::cart::show(&cart).await?,
                CartAction::Remove { product_id } => {
                    commands::cart::remove(&cart, &product_id).await?;
                }
                CartAction::Checkout => commands::cart::checkout(&cart).await?,
            }
        }
        Commands::Report { report } => match report {
            ReportKind::TopSelling => commands::report::top_selling(&api).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_quantity_must_be_positive() {
        assert!(Cli::try_parse_from(["tienda", "cart", "add", "p1", "--quantity", "0"]).is_err());
        assert!(Cli::try_parse_from(["tienda", "cart", "add", "p1", "-q", "2"]).is_ok());
    }

    #[test]
    fn test_price_is_validated() {
        assert!(
            Cli::try_parse_from(["tienda", "products", "add", "-n", "Mug", "--price=-1"]).is_err()
        );
        assert!(
            Cli::try_parse_from(["tienda", "products", "add", "-n", "Mug", "-p", "$8.00"]).is_ok()
        );
    }
}
