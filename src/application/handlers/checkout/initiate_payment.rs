//! InitiatePaymentHandler - Command handler for opening a payment session.
//!
//! Turns the caller's cart into a pending Order and Payment, opens a
//! gateway checkout session, and hands back the redirect descriptor.
//! The cart itself is only cleared by fulfillment, so an abandoned
//! session leaves the cart intact.

use std::sync::Arc;

use crate::application::handlers::gateway_to_domain;
use crate::domain::automation::{TriggerContext, TriggerEvent};
use crate::domain::foundation::{
    DomainError, ErrorCode, Money, OrderId, PaymentId, Timestamp, UserId,
};
use crate::domain::order::{ItemRef, LineItem, Order, PricingSnapshot};
use crate::domain::payment::{Payment, TransactionId};
use crate::ports::{
    CartStore, Catalog, InitiateRequest, OrderRepository, PaymentGateway, PaymentRepository,
};

use super::super::automation::AutomationEngine;

/// Transaction id generation retries before giving up.
const MAX_TXN_ID_ATTEMPTS: u32 = 5;

/// Command to initiate a payment session for the caller's cart.
#[derive(Debug, Clone)]
pub struct InitiatePaymentCommand {
    pub user_id: String,
    pub customer_email: String,
    pub currency: String,
    /// Where the gateway sends the customer after checkout.
    pub return_url: String,
    /// Tax computed upstream, in cents.
    pub tax: Money,
    /// Shipping computed upstream, in cents.
    pub shipping: Money,
}

/// Session descriptor returned to the caller.
#[derive(Debug, Clone)]
pub struct InitiatePaymentResult {
    pub order_id: OrderId,
    pub payment_id: PaymentId,
    pub transaction_id: TransactionId,
    pub session_id: String,
    pub gateway_url: String,
    pub expires_at: Timestamp,
}

pub struct InitiatePaymentHandler {
    orders: Arc<dyn OrderRepository>,
    payments: Arc<dyn PaymentRepository>,
    catalog: Arc<dyn Catalog>,
    cart: Arc<dyn CartStore>,
    gateway: Arc<dyn PaymentGateway>,
    automation: Arc<AutomationEngine>,
}

impl InitiatePaymentHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        payments: Arc<dyn PaymentRepository>,
        catalog: Arc<dyn Catalog>,
        cart: Arc<dyn CartStore>,
        gateway: Arc<dyn PaymentGateway>,
        automation: Arc<AutomationEngine>,
    ) -> Self {
        Self {
            orders,
            payments,
            catalog,
            cart,
            gateway,
            automation,
        }
    }

    pub async fn handle(
        &self,
        cmd: InitiatePaymentCommand,
    ) -> Result<InitiatePaymentResult, DomainError> {
        let user_id = UserId::new(cmd.user_id)?;
        let now = Timestamp::now();

        // 1. Snapshot the cart
        let snapshot = self
            .cart
            .snapshot(&user_id)
            .await?
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DomainError::validation("cart", "Cart is empty"))?;

        // 2. Validate every line against the catalog and freeze prices
        let mut items = Vec::with_capacity(snapshot.items.len());
        for cart_item in &snapshot.items {
            self.validate_availability(&cart_item.item, cart_item.quantity).await?;
            items.push(LineItem::new(
                cart_item.item.clone(),
                cart_item.name.clone(),
                cart_item.quantity,
                cart_item.unit_price,
                cart_item.original_price,
            )?);
        }

        let pricing = PricingSnapshot::compute(
            &items,
            cmd.tax,
            cmd.shipping,
            snapshot.coupon_code.clone(),
            snapshot.coupon_discount,
        );

        // 3. Create the order and its payment record
        let order = Order::create(OrderId::new(), user_id.clone(), items, pricing, now)?;
        let transaction_id = self.fresh_transaction_id(now).await?;
        let mut payment = Payment::create(
            PaymentId::new(),
            order.id,
            user_id,
            transaction_id.clone(),
            order.total_amount(),
            now,
        )?;

        self.orders.save(&order).await?;
        self.payments.create(&payment).await?;

        // 4. Open the gateway session
        let session = self
            .gateway
            .initiate(InitiateRequest {
                order_id: order.id,
                transaction_id: transaction_id.clone(),
                amount: order.total_amount(),
                currency: cmd.currency,
                customer_email: cmd.customer_email,
                return_url: cmd.return_url,
            })
            .await
            .map_err(gateway_to_domain)?;

        payment.attach_session(session.session_id.clone(), session.redirect_url.clone(), now);
        self.payments.update(&payment).await?;

        tracing::info!(
            order_id = %order.id,
            transaction_id = %transaction_id.as_str(),
            amount = %order.total_amount(),
            "payment session initiated"
        );

        let ctx = TriggerContext::new(TriggerEvent::OrderCreated, order.id)
            .with_attribute("status", order.status.as_str());
        if let Err(err) = self.automation.fire(ctx).await {
            tracing::warn!(order_id = %order.id, error = %err, "order_created automation failed");
        }

        Ok(InitiatePaymentResult {
            order_id: order.id,
            payment_id: payment.id,
            transaction_id,
            session_id: session.session_id,
            gateway_url: session.redirect_url,
            expires_at: session.expires_at,
        })
    }

    async fn validate_availability(
        &self,
        item: &ItemRef,
        quantity: u32,
    ) -> Result<(), DomainError> {
        match item {
            ItemRef::Product { product_id } => {
                let product = self
                    .catalog
                    .find_product(product_id)
                    .await?
                    .ok_or_else(|| {
                        DomainError::new(
                            ErrorCode::ProductNotFound,
                            format!("Product {} not found", product_id),
                        )
                    })?;
                if !product.active {
                    return Err(DomainError::validation(
                        "items",
                        format!("Product '{}' is no longer available", product.name),
                    ));
                }
                if let Some(stock) = product.stock {
                    if stock < quantity {
                        return Err(DomainError::validation(
                            "quantity",
                            format!(
                                "Only {} of '{}' in stock, {} requested",
                                stock, product.name, quantity
                            ),
                        ));
                    }
                }
            }
            ItemRef::Subscription { plan_id } => {
                let plan = self.catalog.find_plan(plan_id).await?.ok_or_else(|| {
                    DomainError::new(
                        ErrorCode::PlanNotFound,
                        format!("Plan {} not found", plan_id),
                    )
                })?;
                if !plan.active {
                    return Err(DomainError::validation(
                        "items",
                        format!("Plan '{}' is no longer available", plan.name),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Generates a transaction id, re-rolling on the (unlikely)
    /// collision with an existing one.
    async fn fresh_transaction_id(&self, now: Timestamp) -> Result<TransactionId, DomainError> {
        for _ in 0..MAX_TXN_ID_ATTEMPTS {
            let candidate = TransactionId::generate(now);
            if !self.payments.transaction_id_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(DomainError::new(
            ErrorCode::DuplicateTransactionId,
            "Could not generate a unique transaction id",
        ))
    }
}
