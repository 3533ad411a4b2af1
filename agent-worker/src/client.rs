//! HTTP client for the marketing-service API.
//!
//! Every request carries the worker's `x-api-key`. Transport failures are kept
//! apart from error responses so a run can tell "API down" from "this item
//! was rejected".

use crate::config::ApiConfig;
use chrono::{DateTime, Utc};
use marketing_service::models::{Campaign, Content, ContentType};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;
use thiserror::Error;

/// Upper bound on items fetched per listing call.
pub const LIST_LIMIT: i64 = 200;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("marketing API unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    #[error("marketing API returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response from marketing API: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ApiError::Unreachable(_))
    }
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Generated {
    content_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub campaign_id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub variables: Map<String, Value>,
    pub auto_publish: bool,
    pub platform: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishSummary {
    pub content_id: String,
    #[serde(default)]
    pub success_count: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    #[serde(default)]
    pub items_processed: usize,
    #[serde(default)]
    pub failed: usize,
}

#[derive(Clone)]
pub struct MarketingApiClient {
    client: Client,
    base_url: String,
    api_key: Secret<String>,
}

impl MarketingApiClient {
    pub fn new(config: &ApiConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request
            .header("x-api-key", self.api_key.expose_secret())
            .send()
            .await
            .map_err(ApiError::Unreachable)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn active_campaigns(&self) -> Result<Vec<Campaign>, ApiError> {
        let limit = LIST_LIMIT.to_string();
        let listing: Listing<Campaign> = self
            .send(
                self.client
                    .get(self.url("/campaigns/list"))
                    .query(&[("status", "active"), ("limit", limit.as_str())]),
            )
            .await?;
        Ok(listing.items)
    }

    /// Scheduled content the API considers due, oldest first.
    pub async fn due_content(&self) -> Result<Vec<Content>, ApiError> {
        let listing: Listing<Content> = self
            .send(self.client.get(self.url("/content/due")))
            .await?;
        Ok(listing.items)
    }

    /// Returns the id of the new content item.
    pub async fn generate_content(&self, request: &GenerateRequest) -> Result<String, ApiError> {
        let generated: Generated = self
            .send(self.client.post(self.url("/content/generate")).json(request))
            .await?;
        Ok(generated.content_id)
    }

    /// Publishes to the named targets, or to every active Facebook target.
    pub async fn publish(
        &self,
        content_id: &str,
        target_ids: Option<Vec<String>>,
    ) -> Result<PublishSummary, ApiError> {
        let mut body = json!({ "contentId": content_id });
        if let Some(ids) = target_ids {
            body["targetIds"] = json!(ids);
        }
        self.send(self.client.post(self.url("/facebook/publish")).json(&body))
            .await
    }

    /// Stamps `contentSchedule.lastContentGenerated`. The update replaces the
    /// whole schedule object, so the rest of it is sent back unchanged.
    pub async fn record_generation(
        &self,
        campaign: &Campaign,
        at: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        let mut schedule = campaign.content_schedule.clone();
        schedule.last_content_generated = Some(at);
        let body = json!({
            "campaignId": campaign.campaign_id,
            "contentSchedule": schedule,
        });
        let _: Value = self
            .send(self.client.put(self.url("/campaigns/update")).json(&body))
            .await?;
        Ok(())
    }

    pub async fn collect_analytics(&self, days: i64) -> Result<CollectionSummary, ApiError> {
        self.send(
            self.client
                .post(self.url("/analytics/collect"))
                .json(&json!({ "days": days })),
        )
        .await
    }
}

/// 4xx bodies carry the message in `error`; 5xx bodies add `details`.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.chars().take(200).collect();
    };
    let error = value.get("error").and_then(Value::as_str);
    let details = value.get("details").and_then(Value::as_str);
    match (error, details) {
        (Some(error), Some(details)) => format!("{}: {}", error, details),
        (Some(error), None) => error.to_string(),
        _ => body.chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_prefer_structured_bodies() {
        assert_eq!(error_message(r#"{"error":"Campaign not found"}"#), "Campaign not found");
        assert_eq!(
            error_message(r#"{"error":"Database error","details":"timeout"}"#),
            "Database error: timeout"
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn generate_request_uses_wire_names() {
        let request = GenerateRequest {
            campaign_id: "camp_1".to_string(),
            content_type: ContentType::FacebookPost,
            variables: Map::new(),
            auto_publish: true,
            platform: "facebook".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["campaignId"], "camp_1");
        assert_eq!(value["type"], "facebook_post");
        assert_eq!(value["autoPublish"], true);
    }
}
