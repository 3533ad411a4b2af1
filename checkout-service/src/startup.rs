//! Application wiring: state, router and server lifecycle.

use crate::config::CheckoutConfig;
use crate::handlers;
use crate::middleware::admin_key_middleware;
use crate::services::{build_email_provider, CheckoutDb, EmailProvider, StripeClient};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    cors_layer, http_trace_layer, metrics_middleware, request_id_middleware,
};
use service_core::routes::{metrics_endpoint, not_found};
use service_core::shutdown::shutdown_signal;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub config: CheckoutConfig,
    pub db: CheckoutDb,
    pub stripe: StripeClient,
    pub email: Arc<dyn EmailProvider>,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    db: CheckoutDb,
}

impl Application {
    pub async fn build(config: CheckoutConfig) -> Result<Self, AppError> {
        let email = build_email_provider(&config.email)?;
        Self::build_with_email(config, email).await
    }

    /// Builds with a caller-supplied email provider.
    pub async fn build_with_email(
        config: CheckoutConfig,
        email: Arc<dyn EmailProvider>,
    ) -> Result<Self, AppError> {
        let db = CheckoutDb::connect(&config.mongodb.uri, &config.mongodb.database).await?;
        db.initialize_indexes().await?;
        tracing::info!(provider = email.name(), "Email provider ready");

        let state = AppState {
            config: config.clone(),
            db: db.clone(),
            stripe: StripeClient::new(config.stripe.clone()),
            email,
        };
        let router = build_router(state);

        // Port 0 binds a random port for tests
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();
        tracing::info!(port, "checkout-service listening");

        Ok(Self {
            port,
            listener,
            router,
            db,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn db(&self) -> &CheckoutDb {
        &self.db
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!("Service shutdown complete");
        Ok(())
    }
}

pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/coupons/create", post(handlers::coupons::create_coupon))
        .route_layer(from_fn_with_state(state.clone(), admin_key_middleware));

    let allowed_origin = state.config.common.allowed_origin.clone();

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(metrics_endpoint))
        // Pricing
        .route("/pricing/plans", get(handlers::pricing::list_plans))
        .route("/pricing/team", post(handlers::pricing::team_price))
        .route("/pricing/scholarship", post(handlers::pricing::scholarship))
        .route("/pricing/personalized-plan", post(handlers::pricing::personalized_plan))
        // Coupons
        .route("/coupons/validate", post(handlers::coupons::validate_coupon))
        // Teams and registrations
        .route("/teams/create", post(handlers::teams::create_team))
        .route("/teams/:team_id", get(handlers::teams::get_team))
        .route("/mock-exams/register", post(handlers::registrations::register))
        // Checkout
        .route("/checkout/create", post(handlers::checkout::create_checkout))
        .route("/checkout/verify", post(handlers::checkout::verify_checkout))
        .route("/webhooks/stripe", post(handlers::webhooks::stripe_webhook))
        .merge(admin)
        .fallback(not_found)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(http_trace_layer())
        .layer(cors_layer(allowed_origin.as_deref()))
        .with_state(state)
}
