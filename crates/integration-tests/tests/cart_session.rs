//! Cart session manager against the fake shop API over HTTP.

#![allow(clippy::unwrap_used)]

use tienda_core::{CartId, Price, ProductId};
use tienda_integration_tests::{CHECKOUT_MESSAGE, Endpoint, FakeShop};
use tienda_storefront::api::ApiClient;
use tienda_storefront::cart_session::{
    CartError, CartIdStore, CartSessionManager, CartState, MemoryCartStore,
};

type Manager = CartSessionManager<ApiClient, MemoryCartStore>;

fn manager(shop: &FakeShop) -> Manager {
    CartSessionManager::new(shop.client(), MemoryCartStore::new())
}

#[tokio::test]
async fn test_first_add_creates_cart() {
    let shop = FakeShop::start().await;
    let coffee = shop.seed_product("Coffee", Price::from_cents(1250), 5);
    let cart = manager(&shop);

    assert_eq!(cart.ensure_cart().await.unwrap(), CartId::new("c1"));

    let updated = cart.add_item(&coffee.id, 1).await.unwrap();
    assert_eq!(updated.id, CartId::new("c1"));
    assert_eq!(updated.items.len(), 1);
    assert_eq!(updated.total, Price::from_cents(1250));
    assert_eq!(shop.hits(Endpoint::CreateCart), 1);
}

#[tokio::test]
async fn test_ensure_cart_is_stable() {
    let shop = FakeShop::start().await;
    let cart = manager(&shop);

    let first = cart.ensure_cart().await.unwrap();
    let second = cart.ensure_cart().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(shop.hits(Endpoint::CreateCart), 1);
}

#[tokio::test]
async fn test_forgotten_cart_heals_on_add() {
    let shop = FakeShop::start().await;
    shop.seed_product("Coffee", Price::from_cents(1250), 5);
    let mug = shop.seed_product("Mug", Price::from_cents(800), 5);
    let cart = manager(&shop);

    let stale = cart.ensure_cart().await.unwrap();
    assert_eq!(stale, CartId::new("c1"));
    shop.forget_cart(&stale);

    let updated = cart.add_item(&mug.id, 1).await.unwrap();

    assert_eq!(updated.id, CartId::new("c2"));
    assert_eq!(cart.current().await.unwrap(), Some(CartId::new("c2")));
    assert_eq!(shop.cart(&CartId::new("c2")).unwrap().items.len(), 1);
    assert_eq!(shop.hits(Endpoint::AddItem), 2);
    assert_eq!(shop.hits(Endpoint::CreateCart), 2);
}

#[tokio::test]
async fn test_self_heal_retries_only_once() {
    let shop = FakeShop::start().await;
    let coffee = shop.seed_product("Coffee", Price::from_cents(1250), 5);
    shop.forget_new_carts(true);
    let cart = manager(&shop);

    let err = cart.add_item(&coffee.id, 1).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(shop.hits(Endpoint::AddItem), 2);
    assert_eq!(shop.hits(Endpoint::CreateCart), 2);
    assert_eq!(cart.current().await.unwrap(), None);
}

#[tokio::test]
async fn test_unknown_product_keeps_cart() {
    let shop = FakeShop::start().await;
    let cart = manager(&shop);
    let held = cart.ensure_cart().await.unwrap();

    let err = cart
        .add_item(&ProductId::new("nope"), 1)
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::ProductNotFound(ref id) if id.as_str() == "nope"));
    assert_eq!(cart.current().await.unwrap(), Some(held));
    assert_eq!(shop.hits(Endpoint::CreateCart), 1);
}

#[tokio::test]
async fn test_checkout_starts_next_cart() {
    let shop = FakeShop::start().await;
    let coffee = shop.seed_product("Coffee", Price::from_cents(1250), 5);
    let cart = manager(&shop);

    let active = cart.add_item(&coffee.id, 2).await.unwrap().id;

    let receipt = cart.checkout(&active).await.unwrap();
    assert_eq!(receipt.message, CHECKOUT_MESSAGE);
    assert_eq!(cart.current().await.unwrap(), None);
    assert_eq!(shop.order_count(), 1);

    let next = cart.ensure_cart().await.unwrap();
    assert_ne!(next, active);
}

#[tokio::test]
async fn test_cart_lifecycle_walkthrough() {
    let shop = FakeShop::start().await;
    let p1 = shop.seed_product("Coffee", Price::from_cents(1250), 5);
    let p2 = shop.seed_product("Mug", Price::from_cents(800), 5);
    let cart = manager(&shop);

    // Nothing held: first cart is c1
    assert_eq!(cart.ensure_cart().await.unwrap(), CartId::new("c1"));
    assert_eq!(cart.add_item(&p1.id, 1).await.unwrap().id, CartId::new("c1"));

    // c1 forgotten by the server: the add lands in c2
    shop.forget_cart(&CartId::new("c1"));
    assert_eq!(cart.add_item(&p2.id, 1).await.unwrap().id, CartId::new("c2"));
    assert_eq!(cart.current().await.unwrap(), Some(CartId::new("c2")));

    // Checkout of c2 clears the held ID; next cart is c3
    cart.checkout(&CartId::new("c2")).await.unwrap();
    assert_eq!(cart.current().await.unwrap(), None);
    assert_eq!(cart.ensure_cart().await.unwrap(), CartId::new("c3"));
}

#[tokio::test]
async fn test_load_forgotten_cart_is_empty() {
    let shop = FakeShop::start().await;
    let cart = manager(&shop);
    let held = cart.ensure_cart().await.unwrap();
    shop.forget_cart(&held);

    let state = cart.load_cart(&held).await.unwrap();

    assert_eq!(state, CartState::Empty);
    assert_eq!(cart.store().load().await.unwrap(), None);
}

#[tokio::test]
async fn test_load_current_without_cart_skips_api() {
    let shop = FakeShop::start().await;
    let cart = manager(&shop);

    assert_eq!(cart.load_current().await.unwrap(), CartState::Empty);
    assert_eq!(shop.hits(Endpoint::GetCart), 0);
}

#[tokio::test]
async fn test_remove_does_not_heal() {
    let shop = FakeShop::start().await;
    let coffee = shop.seed_product("Coffee", Price::from_cents(1250), 5);
    let cart = manager(&shop);
    let held = cart.add_item(&coffee.id, 1).await.unwrap().id;
    shop.forget_cart(&held);

    let err = cart.remove_item(&held, &coffee.id).await.unwrap_err();

    assert!(err.is_not_found());
    // Still held until a lookup or checkout confirms it is gone
    assert_eq!(cart.current().await.unwrap(), Some(held));
    assert_eq!(shop.hits(Endpoint::CreateCart), 1);
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let shop = FakeShop::start().await;
    let coffee = shop.seed_product("Coffee", Price::from_cents(1250), 5);
    let cart = manager(&shop);
    cart.ensure_cart().await.unwrap();
    shop.set_failing(true);

    let err = cart.add_item(&coffee.id, 1).await.unwrap_err();

    assert!(!err.is_not_found());
    assert_eq!(shop.hits(Endpoint::AddItem), 1);
    assert_eq!(cart.current().await.unwrap(), Some(CartId::new("c1")));
}
