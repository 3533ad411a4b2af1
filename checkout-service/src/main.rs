use checkout_service::{config::CheckoutConfig, Application};
use service_core::observability::{init_metrics, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = CheckoutConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "checkout-service",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    )?;
    init_metrics();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        email_provider = ?config.email.provider,
        "Starting checkout-service"
    );

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to start checkout-service: {}", e);
        anyhow::anyhow!("Startup error: {}", e)
    })?;
    application.run_until_stopped().await?;

    Ok(())
}
