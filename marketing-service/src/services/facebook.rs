//! Facebook Graph API client.
//!
//! Covers the two calls the service needs: posting to a group or page feed,
//! and reading post insights.

use crate::config::FacebookConfig;
use crate::models::{PostMetrics, TargetType};
use anyhow::{anyhow, Result};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const INSIGHT_METRICS: &str =
    "post_impressions,post_engaged_users,post_clicks,post_reactions_by_type_total";

#[derive(Clone)]
pub struct GraphClient {
    client: Client,
    config: FacebookConfig,
}

#[derive(Debug, Deserialize)]
struct PostCreated {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GraphErrorDetail {
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct InsightsResponse {
    #[serde(default)]
    data: Vec<Insight>,
}

#[derive(Debug, Deserialize)]
struct Insight {
    name: String,
    #[serde(default)]
    values: Vec<InsightValue>,
}

#[derive(Debug, Deserialize)]
struct InsightValue {
    #[serde(default)]
    value: Value,
}

impl GraphClient {
    pub fn new(config: FacebookConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    pub fn api_version(&self) -> &str {
        &self.config.api_version
    }

    /// Token to use for a target: its own, else the configured page token.
    pub fn token_for(&self, target_token: &str) -> Option<String> {
        if !target_token.is_empty() && target_token != crate::models::social_target::DEFAULT_TOKEN_MARKER {
            return Some(target_token.to_string());
        }
        self.config
            .page_access_token
            .as_ref()
            .map(|token| token.expose_secret().clone())
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.graph_base_url.trim_end_matches('/'),
            self.config.api_version,
            path
        )
    }

    /// Posts to `/{external_id}/feed` and returns the new post id.
    pub async fn publish_to_feed(
        &self,
        external_id: &str,
        message: &str,
        link: Option<&str>,
        access_token: &str,
    ) -> Result<String> {
        let mut form = vec![("message", message), ("access_token", access_token)];
        if let Some(link) = link {
            form.push(("link", link));
        }

        let response = self
            .client
            .post(self.url(&format!("{}/feed", external_id)))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let created: PostCreated = serde_json::from_str(&body)?;
            tracing::info!(external_id = %external_id, post_id = %created.id, "Published to Facebook feed");
            Ok(created.id)
        } else {
            let message = graph_error_message(&body);
            tracing::error!(external_id = %external_id, status = %status, error = %message, "Facebook publish failed");
            Err(anyhow!("Facebook API error: {}", message))
        }
    }

    pub async fn post_insights(&self, post_id: &str, access_token: &str) -> Result<PostMetrics> {
        let response = self
            .client
            .get(self.url(&format!("{}/insights", post_id)))
            .query(&[("metric", INSIGHT_METRICS), ("access_token", access_token)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(anyhow!(
                "Facebook insights error: {}",
                graph_error_message(&body)
            ));
        }

        let insights: InsightsResponse = serde_json::from_str(&body)?;
        Ok(parse_metrics(&insights.data))
    }
}

fn graph_error_message(body: &str) -> String {
    match serde_json::from_str::<GraphError>(body) {
        Ok(err) => match err.error.code {
            Some(code) => format!("({}) {}", code, err.error.message),
            None => err.error.message,
        },
        Err(_) => body.to_string(),
    }
}

fn parse_metrics(data: &[Insight]) -> PostMetrics {
    let mut metrics = PostMetrics::default();
    for insight in data {
        let value = insight
            .values
            .first()
            .map(|v| &v.value)
            .unwrap_or(&Value::Null);
        match insight.name.as_str() {
            "post_impressions" => metrics.impressions = value.as_i64().unwrap_or(0),
            "post_engaged_users" => metrics.engagement = value.as_i64().unwrap_or(0),
            "post_clicks" => metrics.clicks = value.as_i64().unwrap_or(0),
            "post_reactions_by_type_total" => {
                metrics.reactions = value
                    .as_object()
                    .map(|by_type| by_type.values().filter_map(Value::as_i64).sum())
                    .unwrap_or(0)
            }
            _ => {}
        }
    }
    metrics
}

/// Public URL of a post. Graph ids look like `{owner}_{post}`.
pub fn post_url(target_type: TargetType, external_id: &str, post_id: &str) -> String {
    let short_id = post_id.split_once('_').map_or(post_id, |(_, id)| id);
    match target_type {
        TargetType::Group => format!(
            "https://www.facebook.com/groups/{}/posts/{}/",
            external_id, short_id
        ),
        _ => format!("https://www.facebook.com/{}/posts/{}/", external_id, short_id),
    }
}
