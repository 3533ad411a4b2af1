//! Fan-out of one content item to its Facebook targets.

use crate::models::{
    Content, PublishRecord, PublishedPost, PublishedTarget, SocialTarget, TargetType,
};
use crate::services::{audit, facebook, GraphClient, MarketingDb};
use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc};
use serde::Serialize;
use serde_json::json;
use service_core::error::AppError;
use service_core::time_format;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetResult {
    pub target_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TargetResult {
    fn failed(target_id: &str, error: impl Into<String>) -> Self {
        Self {
            target_id: target_id.to_string(),
            success: false,
            post_id: None,
            post_url: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOutcome {
    pub content_id: String,
    pub results: Vec<TargetResult>,
    pub success_count: usize,
}

/// Publishes to the given targets, or to every active Facebook target when
/// none are named. Each target succeeds or fails on its own.
pub async fn publish(
    db: &MarketingDb,
    graph: &GraphClient,
    content: &Content,
    target_ids: Option<&[String]>,
    now: DateTime<Utc>,
) -> Result<PublishOutcome, AppError> {
    let mut results = Vec::new();
    let mut targets: Vec<SocialTarget> = Vec::new();

    match target_ids {
        Some(ids) if !ids.is_empty() => {
            for id in ids {
                match db.find_target(id).await? {
                    Some(target) => targets.push(target),
                    None => results.push(TargetResult::failed(id, "Target not found")),
                }
            }
        }
        _ => targets = db.list_targets("facebook", "active", None).await?,
    }

    let link = content.metadata.cta_url.as_deref();
    let mut new_posts = Vec::new();

    for target in &targets {
        let result = publish_to_target(db, graph, content, target, link, now).await;
        match result {
            Ok(post) => {
                results.push(TargetResult {
                    target_id: target.target_id.clone(),
                    success: true,
                    post_id: Some(post.post_id.clone()),
                    post_url: Some(post.post_url.clone()),
                    error: None,
                });
                new_posts.push(post);
            }
            Err(e) => {
                tracing::warn!(
                    content_id = %content.content_id,
                    target_id = %target.target_id,
                    "Publish to target failed: {}",
                    e
                );
                results.push(TargetResult::failed(&target.target_id, e.to_string()));
            }
        }
    }

    let success_count = new_posts.len();
    if success_count > 0 {
        let mut published_posts = content.published_posts.clone();
        published_posts.extend(new_posts);
        let published_at = time_format::format(&now);
        db.set_content_fields(
            &content.content_id,
            doc! {
                "status": "published",
                "publishedAt": published_at.as_str(),
                "publishedPosts": bson::to_bson(&published_posts)?,
                "updatedAt": published_at.as_str(),
            },
        )
        .await?;

        audit::record(
            db,
            "content_published",
            "agent",
            &content.content_id,
            json!({ "platform": "facebook", "successCount": success_count }),
            audit::AUDIT_RETENTION_DAYS,
        )
        .await;
    }

    tracing::info!(
        content_id = %content.content_id,
        attempted = results.len(),
        success_count,
        "Facebook publish finished"
    );

    Ok(PublishOutcome {
        content_id: content.content_id.clone(),
        results,
        success_count,
    })
}

async fn publish_to_target(
    db: &MarketingDb,
    graph: &GraphClient,
    content: &Content,
    target: &SocialTarget,
    link: Option<&str>,
    now: DateTime<Utc>,
) -> Result<PublishedPost, AppError> {
    if target.target_type == TargetType::AdAccount {
        return Err(AppError::BadRequest(anyhow::anyhow!("Invalid target type")));
    }

    let token = graph
        .token_for(&target.credentials.access_token)
        .ok_or_else(|| AppError::BadGateway("No Facebook access token configured".to_string()))?;

    let post_id = graph
        .publish_to_feed(&target.external_id, &content.body, link, &token)
        .await
        .map_err(|e| AppError::BadGateway(e.to_string()))?;
    let post_url = facebook::post_url(target.target_type, &target.external_id, &post_id);

    let record = PublishRecord {
        publish_id: format!("pub_{}", uuid::Uuid::new_v4()),
        content_id: content.content_id.clone(),
        target_id: target.target_id.clone(),
        platform: target.platform.clone(),
        published_at: now,
        published_by: "agent".to_string(),
        target: PublishedTarget {
            target_type: target.target_type,
            id: target.external_id.clone(),
            name: target.name.clone(),
        },
        external_id: post_id.clone(),
        url: post_url.clone(),
        status: "success".to_string(),
        api_version: graph.api_version().to_string(),
    };
    db.insert_publish_record(&record).await?;
    db.record_target_post(&target.target_id, now).await?;

    Ok(PublishedPost {
        target_id: target.target_id.clone(),
        post_id,
        post_url,
    })
}
