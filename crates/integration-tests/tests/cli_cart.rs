//! CLI cart commands against the fake shop API, with the cart ID kept in a
//! file between invocations.

#![allow(clippy::unwrap_used)]

use std::path::Path;

use tienda_cli::commands::{CommandError, cart};
use tienda_cli::store::FileCartStore;
use tienda_core::{CartId, Price};
use tienda_integration_tests::{Endpoint, FakeShop};
use tienda_storefront::cart_session::{CartIdStore, CartSessionManager};

/// One `tienda` invocation: a fresh manager over the shared cart file.
fn invocation(shop: &FakeShop, path: &Path) -> cart::FileCart {
    CartSessionManager::new(shop.client(), FileCartStore::new(path))
}

async fn held(path: &Path) -> Option<CartId> {
    FileCartStore::new(path).load().await.unwrap()
}

#[tokio::test]
async fn test_cart_id_survives_between_invocations() {
    let shop = FakeShop::start().await;
    let coffee = shop.seed_product("Coffee", Price::from_cents(1250), 5);
    let mug = shop.seed_product("Mug", Price::from_cents(800), 5);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".tienda").join("cart.json");
    let c1 = CartId::new("c1");

    cart::add(&invocation(&shop, &path), &coffee.id, 2).await.unwrap();
    assert_eq!(held(&path).await, Some(c1.clone()));

    // A later invocation picks up the same cart
    let second = invocation(&shop, &path);
    assert_eq!(second.current().await.unwrap(), Some(c1.clone()));
    cart::add(&second, &mug.id, 1).await.unwrap();
    assert_eq!(shop.hits(Endpoint::CreateCart), 1);
    assert_eq!(shop.cart(&c1).unwrap().items.len(), 2);

    // The server forgets c1: the next add lands in c2 and the file follows
    shop.forget_cart(&c1);
    cart::add(&invocation(&shop, &path), &mug.id, 1).await.unwrap();
    assert_eq!(held(&path).await, Some(CartId::new("c2")));
    assert_eq!(
        tokio::fs::read_to_string(&path).await.unwrap(),
        r#"{"cart_id":"c2"}"#
    );

    cart::checkout(&invocation(&shop, &path)).await.unwrap();
    assert!(!path.exists());
    assert_eq!(shop.order_count(), 1);

    let err = cart::checkout(&invocation(&shop, &path)).await.unwrap_err();
    assert!(matches!(err, CommandError::NoActiveCart));
}

#[tokio::test]
async fn test_truncated_cart_file_starts_new_cart() {
    let shop = FakeShop::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cart.json");
    tokio::fs::write(&path, r#"{"cart_id":"c1"#).await.unwrap();

    let first = invocation(&shop, &path).ensure_cart().await.unwrap();
    let second = invocation(&shop, &path).ensure_cart().await.unwrap();

    assert_eq!(first, CartId::new("c1"));
    assert_eq!(second, first);
    assert_eq!(shop.hits(Endpoint::CreateCart), 1);
    assert_eq!(held(&path).await, Some(first));
}

#[tokio::test]
async fn test_show_forgotten_cart_clears_file() {
    let shop = FakeShop::start().await;
    let coffee = shop.seed_product("Coffee", Price::from_cents(1250), 5);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cart.json");

    cart::add(&invocation(&shop, &path), &coffee.id, 1).await.unwrap();
    shop.forget_cart(&CartId::new("c1"));

    cart::show(&invocation(&shop, &path)).await.unwrap();
    assert!(!path.exists());
}

#[tokio::test]
async fn test_remove_without_cart_fails_without_request() {
    let shop = FakeShop::start().await;
    let coffee = shop.seed_product("Coffee", Price::from_cents(1250), 5);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cart.json");

    let err = cart::remove(&invocation(&shop, &path), &coffee.id)
        .await
        .unwrap_err();

    assert!(matches!(err, CommandError::NoActiveCart));
    assert_eq!(shop.hits(Endpoint::RemoveItem), 0);
    assert_eq!(shop.hits(Endpoint::CreateCart), 0);
}
