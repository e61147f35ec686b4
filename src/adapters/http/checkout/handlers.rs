//! HTTP handlers for checkout endpoints.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::{
    AutomationEngine, InitiatePaymentCommand, InitiatePaymentHandler,
};
use crate::domain::foundation::Money;
use crate::ports::{Catalog, CartStore, OrderRepository, PaymentGateway, PaymentRepository};

use super::super::error::ApiError;
use super::super::middleware::AuthenticatedUser;
use super::dto::{CheckoutRequest, CheckoutResponse};

/// Shared state for checkout routes.
#[derive(Clone)]
pub struct CheckoutAppState {
    pub orders: Arc<dyn OrderRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub catalog: Arc<dyn Catalog>,
    pub cart: Arc<dyn CartStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub automation: Arc<AutomationEngine>,
}

impl CheckoutAppState {
    fn initiate_payment_handler(&self) -> InitiatePaymentHandler {
        InitiatePaymentHandler::new(
            self.orders.clone(),
            self.payments.clone(),
            self.catalog.clone(),
            self.cart.clone(),
            self.gateway.clone(),
            self.automation.clone(),
        )
    }
}

/// POST /api/checkout - create an order and a gateway payment session.
pub async fn checkout(
    State(state): State<CheckoutAppState>,
    user: AuthenticatedUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.initiate_payment_handler();
    let cmd = InitiatePaymentCommand {
        user_id: user.user_id.to_string(),
        customer_email: request.customer_email,
        currency: request.currency,
        return_url: request.return_url,
        tax: Money::from_cents(request.tax_cents),
        shipping: Money::from_cents(request.shipping_cents),
    };

    let result = handler.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(CheckoutResponse::from(result))))
}
