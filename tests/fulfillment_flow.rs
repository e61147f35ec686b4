//! End-to-end flows over the in-memory adapters and the mock gateway:
//! checkout through fulfillment, entitlement issuance, refunds, and
//! bulk operations.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use orderflow::adapters::gateway::MockGateway;
use orderflow::adapters::memory::{
    InMemoryAutomationRepository, InMemoryCartStore, InMemoryCatalog, InMemoryJobQueue,
    InMemoryOrderRepository, InMemoryPaymentRepository, InMemoryRefundRepository,
};
use orderflow::adapters::notifier::LoggingNotifier;
use orderflow::application::handlers::{
    AutomationEngine, BulkOperation, DownloadItemCommand, DownloadItemHandler, ExecuteBulkCommand,
    ExecuteBulkHandler, ExecuteRefundCommand, ExecuteRefundHandler, InitiatePaymentCommand,
    InitiatePaymentHandler, RequestRefundCommand, RequestRefundHandler, VerifyPaymentCommand,
    VerifyPaymentHandler, VerifyPaymentResult,
};
use orderflow::domain::entitlement::{BillingCycle, LicensePolicy, SubscriptionAccess};
use orderflow::domain::foundation::{
    ErrorCode, Money, OrderId, PaymentId, PlanId, ProductId, RefundRequestId, Timestamp, UserId,
};
use orderflow::domain::order::{ItemRef, LineItem, Order, OrderStatus, PricingSnapshot};
use orderflow::domain::payment::{GatewayMetadata, Payment};
use orderflow::domain::refund::{RefundPolicySet, RefundRequest, RefundType};
use orderflow::ports::{
    CartItem, CartSnapshot, Catalog, DigitalDelivery, OrderRepository, PaymentRepository,
    PlanRecord, ProductRecord, RefundRepository,
};

struct Stack {
    orders: Arc<InMemoryOrderRepository>,
    payments: Arc<InMemoryPaymentRepository>,
    refunds: Arc<InMemoryRefundRepository>,
    catalog: Arc<InMemoryCatalog>,
    cart: Arc<InMemoryCartStore>,
    checkout: InitiatePaymentHandler,
    verifier: VerifyPaymentHandler,
    download: DownloadItemHandler,
    request_refund: RequestRefundHandler,
    executor: Arc<ExecuteRefundHandler>,
    bulk: ExecuteBulkHandler,
}

fn stack() -> Stack {
    let orders = Arc::new(InMemoryOrderRepository::new());
    let payments = Arc::new(InMemoryPaymentRepository::new());
    let refunds = Arc::new(InMemoryRefundRepository::new());
    let catalog = Arc::new(InMemoryCatalog::new());
    let cart = Arc::new(InMemoryCartStore::new());
    let jobs = Arc::new(InMemoryJobQueue::new());
    let notifier = Arc::new(LoggingNotifier::new());
    let gateway = Arc::new(MockGateway::succeeding());

    let automation = Arc::new(AutomationEngine::new(
        Arc::new(InMemoryAutomationRepository::new()),
        orders.clone(),
        jobs.clone(),
        notifier.clone(),
    ));
    let executor = Arc::new(ExecuteRefundHandler::new(
        refunds.clone(),
        orders.clone(),
        payments.clone(),
        gateway.clone(),
        jobs.clone(),
        notifier.clone(),
    ));
    let checkout = InitiatePaymentHandler::new(
        orders.clone(),
        payments.clone(),
        catalog.clone(),
        cart.clone(),
        gateway.clone(),
        automation.clone(),
    );
    let verifier = VerifyPaymentHandler::new(
        orders.clone(),
        payments.clone(),
        catalog.clone(),
        cart.clone(),
        gateway.clone(),
        jobs.clone(),
        notifier.clone(),
        automation.clone(),
    );
    let download = DownloadItemHandler::new(orders.clone(), catalog.clone());
    let request_refund = RequestRefundHandler::new(
        orders.clone(),
        payments.clone(),
        refunds.clone(),
        catalog.clone(),
        notifier.clone(),
        RefundPolicySet::standard(),
        executor.clone(),
    );
    let bulk = ExecuteBulkHandler::new(
        orders.clone(),
        payments.clone(),
        refunds.clone(),
        automation,
        executor.clone(),
    );

    Stack {
        orders,
        payments,
        refunds,
        catalog,
        cart,
        checkout,
        verifier,
        download,
        request_refund,
        executor,
        bulk,
    }
}

fn digital_product(price_cents: i64, license: Option<LicensePolicy>) -> ProductRecord {
    ProductRecord {
        id: ProductId::new(),
        name: "Tonepack Vol. 1".to_string(),
        active: true,
        price: Money::from_cents(price_cents),
        stock: None,
        digital: Some(DigitalDelivery {
            file_url: "https://files.example.com/tonepack.zip".to_string(),
            license,
            max_downloads: Some(2),
        }),
    }
}

fn cart_for(stack: &Stack, user: &UserId, product: &ProductRecord, quantity: u32) {
    stack.cart.put(
        user,
        CartSnapshot {
            items: vec![CartItem {
                item: ItemRef::product(product.id),
                name: product.name.clone(),
                quantity,
                unit_price: product.price,
                original_price: product.price,
            }],
            coupon_code: None,
            coupon_discount: Money::ZERO,
        },
    );
}

fn checkout_cmd(user: &str) -> InitiatePaymentCommand {
    InitiatePaymentCommand {
        user_id: user.to_string(),
        customer_email: "buyer@example.com".to_string(),
        currency: "usd".to_string(),
        return_url: "https://shop.example.com/return".to_string(),
        tax: Money::ZERO,
        shipping: Money::ZERO,
    }
}

async fn verify(stack: &Stack, transaction_id: &str) -> VerifyPaymentResult {
    stack
        .verifier
        .handle(VerifyPaymentCommand {
            transaction_id: transaction_id.to_string(),
            provider_payload: serde_json::json!({}),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn duplicate_verification_fulfills_exactly_once() {
    let stack = stack();
    let user = UserId::new("buyer-1").unwrap();
    let product = digital_product(1_500, None);
    stack.catalog.put_product(product.clone());
    cart_for(&stack, &user, &product, 1);

    let session = stack.checkout.handle(checkout_cmd("buyer-1")).await.unwrap();

    let first = verify(&stack, session.transaction_id.as_str()).await;
    assert!(matches!(first, VerifyPaymentResult::Fulfilled { .. }));

    let second = verify(&stack, session.transaction_id.as_str()).await;
    assert!(matches!(
        second,
        VerifyPaymentResult::AlreadyProcessed { .. }
    ));

    let order = stack
        .orders
        .find_by_id(&session.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.download_links.len(), 1);
    assert_eq!(stack.catalog.sales_count(&product.id), 1);

    let paid_entries = order
        .status_history
        .iter()
        .filter(|e| e.note.as_deref() == Some("payment completed"))
        .count();
    assert_eq!(paid_entries, 1);
}

#[tokio::test]
async fn download_cap_is_enforced_at_the_boundary() {
    let stack = stack();
    let user = UserId::new("buyer-2").unwrap();
    let product = digital_product(900, None);
    stack.catalog.put_product(product.clone());
    cart_for(&stack, &user, &product, 1);

    let session = stack.checkout.handle(checkout_cmd("buyer-2")).await.unwrap();
    verify(&stack, session.transaction_id.as_str()).await;

    let cmd = DownloadItemCommand {
        order_id: session.order_id,
        product_id: product.id,
    };
    let granted = stack.download.handle(cmd.clone()).await.unwrap();
    assert_eq!(granted.remaining_downloads, 1);
    stack.download.handle(cmd.clone()).await.unwrap();

    let err = stack.download.handle(cmd).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::DownloadLimitExceeded);
}

#[tokio::test]
async fn checkout_snapshots_cart_pricing_with_coupon() {
    let stack = stack();
    let user = UserId::new("buyer-3").unwrap();

    let a = ProductRecord {
        id: ProductId::new(),
        name: "Product A".to_string(),
        active: true,
        price: Money::from_cents(1_000),
        stock: None,
        digital: None,
    };
    let b = ProductRecord {
        id: ProductId::new(),
        name: "Product B".to_string(),
        active: true,
        price: Money::from_cents(500),
        stock: None,
        digital: None,
    };
    stack.catalog.put_product(a.clone());
    stack.catalog.put_product(b.clone());
    stack.cart.put(
        &user,
        CartSnapshot {
            items: vec![
                CartItem {
                    item: ItemRef::product(a.id),
                    name: a.name.clone(),
                    quantity: 2,
                    unit_price: a.price,
                    original_price: a.price,
                },
                CartItem {
                    item: ItemRef::product(b.id),
                    name: b.name.clone(),
                    quantity: 1,
                    unit_price: b.price,
                    original_price: b.price,
                },
            ],
            coupon_code: Some("SAVE5".to_string()),
            coupon_discount: Money::from_cents(500),
        },
    );

    let session = stack.checkout.handle(checkout_cmd("buyer-3")).await.unwrap();
    let order = stack
        .orders
        .find_by_id(&session.order_id)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(order.pricing.subtotal, Money::from_cents(2_500));
    assert_eq!(order.pricing.coupon_discount, Money::from_cents(500));
    assert_eq!(order.pricing.total, Money::from_cents(2_000));

    let payment = stack
        .payments
        .find_by_order(&session.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.amount, Money::from_cents(2_000));
}

/// Seeds a paid order directly, bypassing checkout, for refund tests.
async fn seed_paid_order(stack: &Stack, user: &str, total_cents: i64) -> (OrderId, Payment) {
    let now = Timestamp::now();
    let user_id = UserId::new(user).unwrap();
    let item = LineItem::new(
        ItemRef::product(ProductId::new()),
        "Widget",
        1,
        Money::from_cents(total_cents),
        Money::from_cents(total_cents),
    )
    .unwrap();
    let pricing = PricingSnapshot::compute(
        std::slice::from_ref(&item),
        Money::ZERO,
        Money::ZERO,
        None,
        Money::ZERO,
    );
    let mut order = Order::create(OrderId::new(), user_id.clone(), vec![item], pricing, now).unwrap();
    order.mark_paid(false, now).unwrap();
    stack.orders.save(&order).await.unwrap();

    let txn = orderflow::domain::payment::TransactionId::generate(now);
    let mut payment = Payment::create(
        PaymentId::new(),
        order.id,
        user_id,
        txn,
        Money::from_cents(total_cents),
        now,
    )
    .unwrap();
    let metadata = GatewayMetadata {
        provider_txn_id: Some("prov-refund-1".to_string()),
        ..GatewayMetadata::default()
    };
    payment.complete(metadata, now).unwrap();
    stack.payments.create(&payment).await.unwrap();
    let payment = stack
        .payments
        .find_by_order(&order.id)
        .await
        .unwrap()
        .unwrap();
    (order.id, payment)
}

async fn approved_refund(
    stack: &Stack,
    order_id: OrderId,
    user: &str,
    amount_cents: i64,
) -> RefundRequestId {
    let request = RefundRequest::create(
        RefundRequestId::new(),
        order_id,
        UserId::new(user).unwrap(),
        RefundType::Partial,
        Money::from_cents(amount_cents),
        Vec::new(),
        "ladder",
        true,
        Timestamp::now(),
    );
    stack.refunds.create(&request).await.unwrap();
    request.id
}

#[tokio::test]
async fn partial_refund_ladder_ends_refunded_and_blocks_further_requests() {
    let stack = stack();
    let (order_id, _) = seed_paid_order(&stack, "buyer-4", 10_000).await;

    let first = approved_refund(&stack, order_id, "buyer-4", 4_000).await;
    stack
        .executor
        .handle(ExecuteRefundCommand { refund_id: first })
        .await
        .unwrap();

    let payment = stack
        .payments
        .find_by_order(&order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.refund_amount, Money::from_cents(4_000));
    assert_eq!(payment.refundable_amount(), Money::from_cents(6_000));

    let second = approved_refund(&stack, order_id, "buyer-4", 6_000).await;
    stack
        .executor
        .handle(ExecuteRefundCommand { refund_id: second })
        .await
        .unwrap();

    let payment = stack
        .payments
        .find_by_order(&order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.refund_amount, Money::from_cents(10_000));
    assert!(payment.refundable_amount().is_zero());

    // A drained payment accepts no further refund requests.
    let err = stack
        .request_refund
        .handle(RequestRefundCommand {
            order_id,
            user_id: "buyer-4".to_string(),
            refund_type: RefundType::Full,
            lines: Vec::new(),
            reason: "one more".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.code,
        ErrorCode::NotPaid | ErrorCode::RefundExceedsRefundable
    ));
}

#[tokio::test]
async fn monthly_plan_runs_one_calendar_month() {
    let start = Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap());
    let grant = SubscriptionAccess::grant(PlanId::new(), BillingCycle::Monthly, start);

    let expected = Utc.with_ymd_and_hms(2024, 2, 15, 9, 30, 0).unwrap();
    assert_eq!(*grant.ends_at.as_datetime(), expected);
    assert!(grant.active);
}

#[tokio::test]
async fn subscription_fulfillment_grants_access() {
    let stack = stack();
    let user = UserId::new("buyer-5").unwrap();
    let plan = PlanRecord {
        id: PlanId::new(),
        name: "Pro Monthly".to_string(),
        active: true,
        price: Money::from_cents(2_900),
        billing_cycle: BillingCycle::Monthly,
    };
    stack.catalog.put_plan(plan.clone());
    stack.cart.put(
        &user,
        CartSnapshot {
            items: vec![CartItem {
                item: ItemRef::subscription(plan.id),
                name: plan.name.clone(),
                quantity: 1,
                unit_price: plan.price,
                original_price: plan.price,
            }],
            coupon_code: None,
            coupon_discount: Money::ZERO,
        },
    );

    let session = stack.checkout.handle(checkout_cmd("buyer-5")).await.unwrap();
    verify(&stack, session.transaction_id.as_str()).await;

    let order = stack
        .orders
        .find_by_id(&session.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.subscriptions.len(), 1);
    assert!(order.subscriptions[0].active);
    assert_eq!(stack.catalog.subscription_sales_count(&plan.id), 1);
}

#[tokio::test]
async fn bulk_cancel_with_missing_id_changes_nothing() {
    let stack = stack();
    let (order_id, _) = seed_paid_order(&stack, "buyer-6", 3_000).await;

    let err = stack
        .bulk
        .handle(ExecuteBulkCommand {
            operation: BulkOperation::Cancel {
                reason: "cleanup".to_string(),
                refund: false,
            },
            order_ids: vec![order_id, OrderId::new()],
            actor: "admin-1".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotFound);

    let order = stack.orders.find_by_id(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
}

#[tokio::test]
async fn single_license_orders_issue_distinct_keys() {
    let stack = stack();
    let product = digital_product(5_000, Some(LicensePolicy::Single));
    stack.catalog.put_product(product.clone());

    let mut keys = Vec::new();
    for user in ["buyer-7", "buyer-8"] {
        let user_id = UserId::new(user).unwrap();
        cart_for(&stack, &user_id, &product, 1);
        let session = stack.checkout.handle(checkout_cmd(user)).await.unwrap();
        verify(&stack, session.transaction_id.as_str()).await;

        let order = stack
            .orders
            .find_by_id(&session.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.license_keys.len(), 1);
        assert_eq!(order.license_keys[0].max_activations, 1);
        keys.push(order.license_keys[0].key.clone());
    }

    assert_ne!(keys[0], keys[1]);
}

proptest! {
    /// However refunds land, the refundable amount never goes negative.
    #[test]
    fn refundable_amount_never_negative(amounts in proptest::collection::vec(1i64..20_000, 0..12)) {
        let now = Timestamp::now();
        let mut payment = Payment::create(
            PaymentId::new(),
            OrderId::new(),
            UserId::new("prop-user").unwrap(),
            orderflow::domain::payment::TransactionId::generate(now),
            Money::from_cents(10_000),
            now,
        )
        .unwrap();
        payment.complete(GatewayMetadata::default(), now).unwrap();

        for amount in amounts {
            let _ = payment.apply_refund(Money::from_cents(amount), now);
            prop_assert!(!payment.refundable_amount().is_negative());
            prop_assert!(payment.refund_amount <= payment.amount);
        }
    }
}
