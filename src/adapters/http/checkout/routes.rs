//! Route configuration for checkout endpoints.

use axum::routing::post;
use axum::Router;

use super::handlers::{checkout, CheckoutAppState};

/// Creates the checkout router.
///
/// Routes:
/// - `POST /api/checkout` - Create an order and a payment session
pub fn checkout_router() -> Router<CheckoutAppState> {
    Router::new().route("/api/checkout", post(checkout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::gateway::MockGateway;
    use crate::adapters::memory::{
        InMemoryAutomationRepository, InMemoryCartStore, InMemoryCatalog, InMemoryJobQueue,
        InMemoryOrderRepository, InMemoryPaymentRepository,
    };
    use crate::adapters::notifier::LoggingNotifier;
    use crate::application::handlers::AutomationEngine;
    use crate::domain::foundation::{Money, ProductId, UserId};
    use crate::domain::order::ItemRef;
    use crate::ports::{CartItem, CartSnapshot, ProductRecord};

    fn state_with_cart() -> CheckoutAppState {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let payments = Arc::new(InMemoryPaymentRepository::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        let cart = Arc::new(InMemoryCartStore::new());

        let user_id = UserId::new("user-1").unwrap();
        let product = ProductRecord {
            id: ProductId::new(),
            name: "Starter Pack".to_string(),
            active: true,
            price: Money::from_cents(1_000),
            stock: None,
            digital: None,
        };
        catalog.put_product(product.clone());
        cart.put(
            &user_id,
            CartSnapshot {
                items: vec![CartItem {
                    item: ItemRef::product(product.id),
                    name: product.name.clone(),
                    quantity: 1,
                    unit_price: product.price,
                    original_price: product.price,
                }],
                coupon_code: None,
                coupon_discount: Money::ZERO,
            },
        );

        let automation = Arc::new(AutomationEngine::new(
            Arc::new(InMemoryAutomationRepository::new()),
            orders.clone(),
            Arc::new(InMemoryJobQueue::new()),
            Arc::new(LoggingNotifier::new()),
        ));

        CheckoutAppState {
            orders,
            payments,
            catalog,
            cart,
            gateway: Arc::new(MockGateway::succeeding()),
            automation,
        }
    }

    #[tokio::test]
    async fn checkout_creates_session() {
        let app = checkout_router().with_state(state_with_cart());

        let body = serde_json::json!({
            "customer_email": "u@example.com",
            "currency": "usd",
            "return_url": "https://shop.example.com/return",
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/checkout")
                    .header("X-User-Id", "user-1")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn checkout_requires_authentication() {
        let app = checkout_router().with_state(state_with_cart());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/checkout")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
