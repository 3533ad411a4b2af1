//! The automation jobs. Each run is one pass: nothing here loops or sleeps,
//! an external scheduler decides when to invoke the worker.

use crate::client::{ApiError, GenerateRequest, MarketingApiClient};
use chrono::{DateTime, Utc};
use marketing_service::models::Campaign;
use marketing_service::services::scheduling;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Job {
    /// Generate, then publish due content, then collect analytics
    All,
    /// Generate content for campaigns whose schedule is due today
    Generate,
    /// Publish scheduled content whose time has passed
    PublishScheduled,
    /// Collect analytics for recently published content
    CollectAnalytics,
}

impl Job {
    fn includes(self, other: Job) -> bool {
        self == Job::All || self == other
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub generated: usize,
    pub published: usize,
    pub analytics_processed: usize,
    pub failed: usize,
}

/// Runs `job`. Only an unreachable API ends the run early; every other
/// failure is logged and counted in the summary.
pub async fn run(
    client: &MarketingApiClient,
    job: Job,
    analytics_days: i64,
    now: DateTime<Utc>,
) -> Result<RunSummary, ApiError> {
    let mut summary = RunSummary::default();

    if job.includes(Job::Generate) {
        generate_due(client, now, &mut summary).await?;
    }
    if job.includes(Job::PublishScheduled) {
        publish_due(client, now, &mut summary).await?;
    }
    if job.includes(Job::CollectAnalytics) {
        collect_analytics(client, analytics_days, &mut summary).await?;
    }

    Ok(summary)
}

/// Counts a failure, unless the API itself is gone.
fn absorb(error: ApiError, summary: &mut RunSummary, what: &str) -> Result<(), ApiError> {
    if error.is_unreachable() {
        return Err(error);
    }
    tracing::warn!(step = what, "Automation step failed: {}", error);
    summary.failed += 1;
    Ok(())
}

fn generate_request(campaign: &Campaign) -> GenerateRequest {
    let schedule = &campaign.content_schedule;
    let platform = schedule
        .platforms
        .first()
        .cloned()
        .unwrap_or_else(|| "facebook".to_string());

    // The API tags ctaUrl with UTM parameters for the platform and type.
    let mut variables = Map::new();
    variables.insert(
        "ctaUrl".to_string(),
        Value::String(campaign.landing_page_url.clone()),
    );

    GenerateRequest {
        campaign_id: campaign.campaign_id.clone(),
        content_type: scheduling::content_type_for_platform(&platform),
        variables,
        auto_publish: schedule.auto_publish,
        platform,
    }
}

async fn generate_due(
    client: &MarketingApiClient,
    now: DateTime<Utc>,
    summary: &mut RunSummary,
) -> Result<(), ApiError> {
    let campaigns = match client.active_campaigns().await {
        Ok(campaigns) => campaigns,
        Err(e) => return absorb(e, summary, "list active campaigns"),
    };
    tracing::info!(count = campaigns.len(), "Found active campaigns");

    for campaign in campaigns
        .iter()
        .filter(|c| scheduling::should_generate_content(c, now))
    {
        if let Err(e) = generate_for(client, campaign, now, summary).await {
            absorb(e, summary, "generate content")?;
        }
    }
    Ok(())
}

async fn generate_for(
    client: &MarketingApiClient,
    campaign: &Campaign,
    now: DateTime<Utc>,
    summary: &mut RunSummary,
) -> Result<(), ApiError> {
    let request = generate_request(campaign);
    let content_id = client.generate_content(&request).await?;
    summary.generated += 1;
    tracing::info!(
        campaign_id = %campaign.campaign_id,
        content_id = %content_id,
        content_type = request.content_type.as_str(),
        "Generated content"
    );

    if request.auto_publish {
        match client.publish(&content_id, None).await {
            Ok(outcome) if outcome.success_count > 0 => {
                summary.published += 1;
                tracing::info!(content_id = %content_id, posts = outcome.success_count, "Auto-published content");
            }
            Ok(_) => {
                summary.failed += 1;
                tracing::warn!(content_id = %content_id, "Auto-publish reached no target");
            }
            Err(e) => absorb(e, summary, "auto-publish")?,
        }
    } else {
        tracing::info!(content_id = %content_id, "Content queued for review");
    }

    client.record_generation(campaign, now).await
}

async fn publish_due(
    client: &MarketingApiClient,
    now: DateTime<Utc>,
    summary: &mut RunSummary,
) -> Result<(), ApiError> {
    let scheduled = match client.due_content().await {
        Ok(items) => items,
        Err(e) => return absorb(e, summary, "list due content"),
    };
    let due: Vec<_> = scheduled
        .into_iter()
        .filter(|c| scheduling::is_due(c, now))
        .collect();
    tracing::info!(count = due.len(), "Scheduled content due for publishing");

    for content in due {
        let targets = content.target_group_id.clone().map(|id| vec![id]);
        match client.publish(&content.content_id, targets).await {
            Ok(outcome) if outcome.success_count > 0 => {
                summary.published += 1;
                tracing::info!(content_id = %content.content_id, "Published scheduled content");
            }
            Ok(_) => {
                summary.failed += 1;
                tracing::warn!(content_id = %content.content_id, "Scheduled content reached no target");
            }
            Err(e) => absorb(e, summary, "publish scheduled content")?,
        }
    }
    Ok(())
}

async fn collect_analytics(
    client: &MarketingApiClient,
    days: i64,
    summary: &mut RunSummary,
) -> Result<(), ApiError> {
    match client.collect_analytics(days).await {
        Ok(collected) => {
            summary.analytics_processed += collected.items_processed;
            summary.failed += collected.failed;
            tracing::info!(
                days,
                processed = collected.items_processed,
                failed = collected.failed,
                "Analytics collected"
            );
            Ok(())
        }
        Err(e) => absorb(e, summary, "collect analytics"),
    }
}
