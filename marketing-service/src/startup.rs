//! Application wiring: state, router and server lifecycle.

use crate::config::MarketingConfig;
use crate::handlers;
use crate::middleware::{api_key_auth_middleware, master_key_middleware};
use crate::services::{build_provider, GraphClient, MarketingDb, TextProvider};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    cors_layer, http_trace_layer, metrics_middleware, request_id_middleware, ApiKeyRateLimiter,
};
use service_core::routes::{metrics_endpoint, not_found};
use service_core::shutdown::shutdown_signal;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub config: MarketingConfig,
    pub db: MarketingDb,
    pub provider: Arc<dyn TextProvider>,
    pub graph: GraphClient,
    pub rate_limiter: ApiKeyRateLimiter,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    db: MarketingDb,
}

impl Application {
    pub async fn build(config: MarketingConfig) -> Result<Self, AppError> {
        let db = MarketingDb::connect(&config.mongodb.uri, &config.mongodb.database).await?;
        db.initialize_indexes().await?;

        let provider = build_provider(&config.ai);
        tracing::info!(model = provider.model(), "Content provider ready");

        let graph = GraphClient::new(config.facebook.clone());
        let rate_limiter = ApiKeyRateLimiter::new(config.auth.rate_limit_enforce);

        let state = AppState {
            config: config.clone(),
            db: db.clone(),
            provider,
            graph,
            rate_limiter,
        };
        let router = build_router(state);

        // Port 0 binds a random port for tests
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();
        tracing::info!(port, "marketing-service listening");

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

    pub fn db(&self) -> &MarketingDb {
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
        .route("/api-keys/create", post(handlers::api_keys::create_key))
        .route("/api-keys/list", get(handlers::api_keys::list_keys))
        .route("/api-keys/revoke", post(handlers::api_keys::revoke_key))
        .route("/api-keys/update", put(handlers::api_keys::update_key))
        .route_layer(from_fn_with_state(state.clone(), master_key_middleware));

    let api = Router::new()
        // Campaigns
        .route("/campaigns/create", post(handlers::campaigns::create_campaign))
        .route("/campaigns/list", get(handlers::campaigns::list_campaigns))
        .route("/campaigns/get", get(handlers::campaigns::get_campaign))
        .route("/campaigns/update", put(handlers::campaigns::update_campaign))
        .route("/campaigns/archive", post(handlers::campaigns::archive_campaign))
        .route("/campaigns/activate", post(handlers::campaigns::activate_campaign))
        .route("/dashboard/stats", get(handlers::dashboard::dashboard_stats))
        // Content
        .route("/content/generate", post(handlers::content::generate_content))
        .route("/content/list", get(handlers::content::list_content))
        .route("/content/due", get(handlers::content::list_due_content))
        .route("/content/get", get(handlers::content::get_content))
        .route("/content/update", put(handlers::content::update_content))
        .route("/content/delete", delete(handlers::content::delete_content))
        // Facebook
        .route("/facebook/publish", post(handlers::facebook::publish_content))
        .route("/facebook/schedule", post(handlers::facebook::schedule_content))
        .route("/facebook/analytics", get(handlers::facebook::content_analytics))
        .route("/facebook/targets/list", get(handlers::facebook::list_targets))
        .route("/facebook/targets/add", post(handlers::facebook::add_target))
        .route("/facebook/targets/update", put(handlers::facebook::update_target))
        // Analytics
        .route("/analytics/collect", post(handlers::analytics::collect_analytics))
        .route_layer(from_fn_with_state(state.clone(), api_key_auth_middleware));

    let allowed_origin = state.config.common.allowed_origin.clone();

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(metrics_endpoint))
        .merge(admin)
        .merge(api)
        .fallback(not_found)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(http_trace_layer())
        .layer(cors_layer(allowed_origin.as_deref()))
        .with_state(state)
}
