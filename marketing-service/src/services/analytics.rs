//! Pulls post insights from Facebook and rolls them up onto content and
//! campaign records.

use crate::models::{AnalyticsRecord, Content, ContentAnalytics, PostMetrics};
use crate::services::{GraphClient, MarketingDb};
use chrono::{DateTime, Duration, Utc};
use mongodb::bson::{self, doc};
use serde::Serialize;
use service_core::error::AppError;
use service_core::time_format;

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub items_processed: usize,
    pub failed: usize,
}

/// Collects insights for content published in the last `days` days.
/// A failure on one item is logged and counted; the run continues.
pub async fn collect(
    db: &MarketingDb,
    graph: &GraphClient,
    days: i64,
    now: DateTime<Utc>,
) -> Result<CollectionSummary, AppError> {
    let since = now - Duration::days(days.max(0));
    let items = db.content_published_since(since).await?;
    tracing::info!(count = items.len(), days, "Collecting analytics");

    let mut summary = CollectionSummary::default();
    for content in items.iter().filter(|c| !c.published_posts.is_empty()) {
        match collect_one(db, graph, content, now).await {
            Ok(metrics) => {
                summary.items_processed += 1;
                tracing::debug!(
                    content_id = %content.content_id,
                    impressions = metrics.impressions,
                    clicks = metrics.clicks,
                    "Analytics collected"
                );
            }
            Err(e) => {
                summary.failed += 1;
                tracing::warn!(content_id = %content.content_id, "Analytics collection failed: {}", e);
            }
        }
    }

    tracing::info!(
        items_processed = summary.items_processed,
        failed = summary.failed,
        "Analytics collection finished"
    );
    Ok(summary)
}

async fn collect_one(
    db: &MarketingDb,
    graph: &GraphClient,
    content: &Content,
    now: DateTime<Utc>,
) -> Result<PostMetrics, AppError> {
    let mut totals = PostMetrics::default();
    for post in &content.published_posts {
        let stored_token = db
            .find_target(&post.target_id)
            .await?
            .map(|target| target.credentials.access_token)
            .unwrap_or_default();
        let token = graph.token_for(&stored_token).ok_or_else(|| {
            AppError::BadGateway(format!("No access token for target {}", post.target_id))
        })?;

        let metrics = graph
            .post_insights(&post.post_id, &token)
            .await
            .map_err(|e| AppError::BadGateway(e.to_string()))?;
        totals.add(&metrics);
    }

    let record = AnalyticsRecord {
        analytics_id: AnalyticsRecord::daily_id(&content.content_id, &now),
        content_id: content.content_id.clone(),
        campaign_id: content.campaign_id.clone(),
        platform: content.platform.clone(),
        date: now.format("%Y-%m-%d").to_string(),
        metrics: totals.clone(),
        collected_at: now,
    };
    db.upsert_analytics(&record).await?;

    let previous = &content.analytics;
    let updated = ContentAnalytics {
        impressions: totals.impressions,
        clicks: totals.clicks,
        engagement: totals.engagement,
        conversions: previous.conversions,
    };
    db.set_content_fields(
        &content.content_id,
        doc! {
            "analytics": bson::to_bson(&updated)?,
            "updatedAt": time_format::format(&now),
        },
    )
    .await?;

    let delta = PostMetrics {
        impressions: updated.impressions - previous.impressions,
        clicks: updated.clicks - previous.clicks,
        engagement: updated.engagement - previous.engagement,
        reactions: 0,
    };
    if delta.impressions != 0 || delta.clicks != 0 {
        db.increment_campaign_analytics(&content.campaign_id, &delta)
            .await?;
    }

    Ok(totals)
}
