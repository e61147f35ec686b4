//! Orderflow server binary.
//!
//! Loads configuration, wires the Postgres repositories and gateway
//! client into the application handlers, spawns the background job
//! runner, and serves the REST API.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use orderflow::adapters::gateway::{HttpGateway, HttpGatewayConfig, IpnVerifier};
use orderflow::adapters::http::{
    admin_router, cancellation_router, checkout_router, fulfillment_router, refund_router,
    webhook_router, AdminAppState, CancellationAppState, CheckoutAppState, FulfillmentAppState,
    RefundAppState, WebhookAppState,
};
use orderflow::adapters::memory::{
    InMemoryAutomationRepository, InMemoryCartStore, InMemoryCatalog,
};
use orderflow::adapters::notifier::LoggingNotifier;
use orderflow::adapters::postgres::{
    PostgresCancellationRepository, PostgresJobQueue, PostgresOrderRepository,
    PostgresPaymentRepository, PostgresRefundRepository,
};
use orderflow::application::handlers::{
    AutomationEngine, ExecuteRefundHandler, VerifyPaymentHandler,
};
use orderflow::application::JobRunner;
use orderflow::config::AppConfig;
use orderflow::domain::refund::RefundPolicySet;
use orderflow::ports::{
    AutomationRepository, CancellationRepository, CartStore, Catalog, JobQueue, Notifier,
    OrderRepository, PaymentGateway, PaymentRepository, RefundRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    // Repositories
    let orders: Arc<dyn OrderRepository> = Arc::new(PostgresOrderRepository::new(pool.clone()));
    let payments: Arc<dyn PaymentRepository> =
        Arc::new(PostgresPaymentRepository::new(pool.clone()));
    let refunds: Arc<dyn RefundRepository> = Arc::new(PostgresRefundRepository::new(pool.clone()));
    let cancellations: Arc<dyn CancellationRepository> =
        Arc::new(PostgresCancellationRepository::new(pool.clone()));
    let jobs: Arc<dyn JobQueue> = Arc::new(PostgresJobQueue::new(pool.clone()));

    // TODO: replace the in-process catalog, cart store, and rule store
    // with adapters backed by the storefront service.
    let catalog: Arc<dyn Catalog> = Arc::new(InMemoryCatalog::new());
    let cart: Arc<dyn CartStore> = Arc::new(InMemoryCartStore::new());
    let rules: Arc<dyn AutomationRepository> = Arc::new(InMemoryAutomationRepository::new());

    // Gateway and notifications
    let gateway: Arc<dyn PaymentGateway> = Arc::new(HttpGateway::new(
        HttpGatewayConfig::new(config.gateway.api_key.clone(), config.gateway.base_url.clone())
            .with_timeout(config.gateway.request_timeout()),
    ));
    let ipn = Arc::new(IpnVerifier::new(config.gateway.webhook_secret.clone()));
    let notifier: Arc<dyn Notifier> = Arc::new(LoggingNotifier::new());

    // Shared application services
    let automation = Arc::new(AutomationEngine::new(
        rules,
        orders.clone(),
        jobs.clone(),
        notifier.clone(),
    ));
    let refund_executor = Arc::new(ExecuteRefundHandler::new(
        refunds.clone(),
        orders.clone(),
        payments.clone(),
        gateway.clone(),
        jobs.clone(),
        notifier.clone(),
    ));
    let verifier = Arc::new(VerifyPaymentHandler::new(
        orders.clone(),
        payments.clone(),
        catalog.clone(),
        cart.clone(),
        gateway.clone(),
        jobs.clone(),
        notifier.clone(),
        automation.clone(),
    ));

    // Background job runner
    let runner = JobRunner::new(
        jobs.clone(),
        orders.clone(),
        cancellations.clone(),
        automation.clone(),
        verifier,
        refund_executor.clone(),
    );
    let poll_interval = Duration::from_secs(config.server.job_poll_interval_secs);
    tokio::spawn(async move {
        runner.run(poll_interval).await;
    });

    // Route groups
    let checkout_state = CheckoutAppState {
        orders: orders.clone(),
        payments: payments.clone(),
        catalog: catalog.clone(),
        cart: cart.clone(),
        gateway: gateway.clone(),
        automation: automation.clone(),
    };
    let webhook_state = WebhookAppState {
        orders: orders.clone(),
        payments: payments.clone(),
        catalog: catalog.clone(),
        cart: cart.clone(),
        gateway: gateway.clone(),
        jobs: jobs.clone(),
        notifier: notifier.clone(),
        automation: automation.clone(),
        ipn,
    };
    let fulfillment_state = FulfillmentAppState {
        orders: orders.clone(),
        catalog: catalog.clone(),
    };
    let refund_state = RefundAppState {
        orders: orders.clone(),
        payments: payments.clone(),
        refunds: refunds.clone(),
        catalog: catalog.clone(),
        notifier: notifier.clone(),
        policies: RefundPolicySet::standard(),
        executor: refund_executor.clone(),
    };
    let cancellation_state = CancellationAppState {
        cancellations,
        orders: orders.clone(),
        payments: payments.clone(),
        refunds: refunds.clone(),
        jobs,
        notifier,
        executor: refund_executor.clone(),
    };
    let admin_state = AdminAppState {
        orders,
        payments,
        refunds,
        automation,
        executor: refund_executor,
    };

    let app = Router::new()
        .merge(checkout_router().with_state(checkout_state))
        .merge(webhook_router().with_state(webhook_state))
        .merge(fulfillment_router().with_state(fulfillment_state))
        .merge(refund_router().with_state(refund_state))
        .merge(cancellation_router().with_state(cancellation_state))
        .merge(admin_router().with_state(admin_state))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(CorsLayer::permissive());

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "starting orderflow server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
