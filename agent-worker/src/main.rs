//! Agent worker entry point.
//!
//! Usage:
//!   agent-worker all                 - every job below, in order
//!   agent-worker generate            - scheduled content generation
//!   agent-worker publish-scheduled   - publish content whose time has come
//!   agent-worker collect-analytics   - pull insights for recent posts

use agent_worker::{config::WorkerConfig, Job, MarketingApiClient};
use clap::Parser;
use service_core::observability::init_tracing;

#[derive(Parser)]
#[command(name = "agent-worker")]
#[command(about = "ProDentHub marketing automation runner")]
#[command(version)]
struct Cli {
    /// Job to run
    #[arg(value_enum, default_value = "all")]
    job: Job,

    /// Days of published content to collect analytics for
    #[arg(long)]
    analytics_days: Option<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = WorkerConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "agent-worker",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    )?;

    let analytics_days = cli.analytics_days.unwrap_or(config.analytics_days);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        job = ?cli.job,
        api = %config.api.base_url,
        "Starting agent-worker run"
    );

    let client = MarketingApiClient::new(&config.api);
    match agent_worker::run(&client, cli.job, analytics_days, chrono::Utc::now()).await {
        Ok(summary) => {
            tracing::info!(
                generated = summary.generated,
                published = summary.published,
                analytics_processed = summary.analytics_processed,
                failed = summary.failed,
                "Agent run complete"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Agent run aborted: {}", e);
            std::process::exit(1);
        }
    }
}
