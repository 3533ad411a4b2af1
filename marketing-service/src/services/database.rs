//! MongoDB access for the marketing service.
//!
//! One collection per record type. Records are addressed by their string id
//! (`campaignId`, `contentId`, ...), never by `_id`.

use crate::models::{
    AnalyticsRecord, ApiKey, AuditLog, Campaign, Content, PostMetrics, PublishRecord,
    SocialTarget, Template,
};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::ReplaceOptions,
    Client as MongoClient, Collection, Database,
};
use service_core::error::AppError;
use service_core::{store, time_format};

#[derive(Clone)]
pub struct MarketingDb {
    client: MongoClient,
    db: Database,
}

/// Logs a driver error with the failing operation and wraps it.
fn db_error(operation: &'static str) -> impl Fn(mongodb::error::Error) -> AppError {
    move |e| {
        tracing::error!(operation, "MongoDB operation failed: {}", e);
        AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
    }
}

/// Filter on content listings, in order of precedence.
#[derive(Debug, Clone)]
pub enum ContentFilter {
    Campaign(String),
    Type(String),
    Status(String),
}

/// Counters shown on the admin dashboard.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_campaigns: u64,
    pub active_campaigns: u64,
    pub total_content: u64,
    pub pending_approval: u64,
    pub published_today: u64,
    pub total_impressions: i64,
}

impl MarketingDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        let (client, db) = store::connect(uri, database, "marketing-service").await?;
        tracing::info!(database = %database, "Connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for marketing-service");

        self.campaigns()
            .create_indexes(
                [
                    store::unique_index("campaignId", "campaign_id_idx"),
                    store::index(doc! { "status": 1, "createdAt": -1 }, "status_created_idx"),
                    store::index(doc! { "type": 1 }, "type_idx"),
                ],
                None,
            )
            .await
            .map_err(db_error("create campaign indexes"))?;

        self.content()
            .create_indexes(
                [
                    store::unique_index("contentId", "content_id_idx"),
                    store::index(doc! { "campaignId": 1 }, "campaign_id_idx"),
                    store::index(doc! { "type": 1, "createdAt": -1 }, "type_created_idx"),
                    store::index(doc! { "status": 1, "scheduledAt": -1 }, "status_scheduled_idx"),
                    store::ttl_index(),
                ],
                None,
            )
            .await
            .map_err(db_error("create content indexes"))?;

        self.social_targets()
            .create_indexes(
                [
                    store::unique_index("targetId", "target_id_idx"),
                    store::index(doc! { "platform": 1, "status": 1 }, "platform_status_idx"),
                ],
                None,
            )
            .await
            .map_err(db_error("create social target indexes"))?;

        self.api_keys()
            .create_indexes(
                [
                    store::unique_index("keyId", "key_id_idx"),
                    store::unique_index("keyHash", "key_hash_idx"),
                    store::index(doc! { "status": 1 }, "status_idx"),
                ],
                None,
            )
            .await
            .map_err(db_error("create api key indexes"))?;

        self.audit_logs()
            .create_indexes(
                [
                    store::index(doc! { "resourceId": 1, "timestamp": -1 }, "resource_time_idx"),
                    store::ttl_index(),
                ],
                None,
            )
            .await
            .map_err(db_error("create audit log indexes"))?;

        self.analytics()
            .create_indexes(
                [
                    store::unique_index("analyticsId", "analytics_id_idx"),
                    store::index(doc! { "contentId": 1, "date": -1 }, "content_date_idx"),
                ],
                None,
            )
            .await
            .map_err(db_error("create analytics indexes"))?;

        self.publishing_history()
            .create_indexes(
                [
                    store::unique_index("publishId", "publish_id_idx"),
                    store::index(doc! { "contentId": 1, "publishedAt": -1 }, "content_published_idx"),
                ],
                None,
            )
            .await
            .map_err(db_error("create publishing history indexes"))?;

        self.templates()
            .create_indexes([store::unique_index("templateId", "template_id_idx")], None)
            .await
            .map_err(db_error("create template indexes"))?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        store::ping(&self.client).await
    }

    // Collection accessors

    pub fn campaigns(&self) -> Collection<Campaign> {
        self.db.collection("campaigns")
    }

    pub fn content(&self) -> Collection<Content> {
        self.db.collection("content")
    }

    pub fn social_targets(&self) -> Collection<SocialTarget> {
        self.db.collection("social_targets")
    }

    pub fn api_keys(&self) -> Collection<ApiKey> {
        self.db.collection("api_keys")
    }

    pub fn audit_logs(&self) -> Collection<AuditLog> {
        self.db.collection("audit_logs")
    }

    pub fn analytics(&self) -> Collection<AnalyticsRecord> {
        self.db.collection("analytics")
    }

    pub fn publishing_history(&self) -> Collection<PublishRecord> {
        self.db.collection("publishing_history")
    }

    pub fn templates(&self) -> Collection<Template> {
        self.db.collection("templates")
    }

    // Campaign operations

    pub async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), AppError> {
        match self.campaigns().insert_one(campaign, None).await {
            Ok(_) => Ok(()),
            Err(e) if store::is_duplicate_key(&e) => Err(AppError::Conflict(anyhow::anyhow!(
                "Campaign already exists"
            ))),
            Err(e) => Err(db_error("insert campaign")(e)),
        }
    }

    pub async fn find_campaign(&self, campaign_id: &str) -> Result<Option<Campaign>, AppError> {
        self.campaigns()
            .find_one(doc! { "campaignId": campaign_id }, None)
            .await
            .map_err(db_error("find campaign"))
    }

    pub async fn list_campaigns(
        &self,
        status: Option<&str>,
        campaign_type: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Campaign>, AppError> {
        let mut filter = Document::new();
        if let Some(status) = status {
            filter.insert("status", status);
        }
        if let Some(campaign_type) = campaign_type {
            filter.insert("type", campaign_type);
        }
        store::find_many(
            &self.campaigns(),
            filter,
            Some(doc! { "createdAt": -1 }),
            Some(limit),
        )
        .await
    }

    /// Applies a `$set`; returns false when no campaign matched.
    pub async fn set_campaign_fields(
        &self,
        campaign_id: &str,
        set: Document,
    ) -> Result<bool, AppError> {
        let result = self
            .campaigns()
            .update_one(doc! { "campaignId": campaign_id }, doc! { "$set": set }, None)
            .await
            .map_err(db_error("update campaign"))?;
        Ok(result.matched_count > 0)
    }

    pub async fn increment_campaign_analytics(
        &self,
        campaign_id: &str,
        delta: &PostMetrics,
    ) -> Result<(), AppError> {
        self.campaigns()
            .update_one(
                doc! { "campaignId": campaign_id },
                doc! {
                    "$inc": {
                        "analytics.impressions": delta.impressions,
                        "analytics.clicks": delta.clicks,
                    },
                    "$set": { "updatedAt": time_format::now() }
                },
                None,
            )
            .await
            .map_err(db_error("increment campaign analytics"))?;
        Ok(())
    }

    // Content operations

    pub async fn insert_content(
        &self,
        content: &Content,
        expire_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        store::insert_expiring(&self.content(), content, expire_at)
            .await
            .map_err(|e| {
                tracing::error!(content_id = %content.content_id, "Failed to insert content: {}", e);
                e
            })
    }

    pub async fn find_content(&self, content_id: &str) -> Result<Option<Content>, AppError> {
        self.content()
            .find_one(doc! { "contentId": content_id }, None)
            .await
            .map_err(db_error("find content"))
    }

    pub async fn list_content(
        &self,
        filter: &ContentFilter,
        limit: i64,
    ) -> Result<Vec<Content>, AppError> {
        let (query, sort) = match filter {
            ContentFilter::Campaign(id) => (doc! { "campaignId": id }, None),
            ContentFilter::Type(t) => (doc! { "type": t }, Some(doc! { "createdAt": -1 })),
            ContentFilter::Status(s) => (doc! { "status": s }, Some(doc! { "scheduledAt": -1 })),
        };
        store::find_many(&self.content(), query, sort, Some(limit)).await
    }

    pub async fn set_content_fields(
        &self,
        content_id: &str,
        set: Document,
    ) -> Result<bool, AppError> {
        let result = self
            .content()
            .update_one(doc! { "contentId": content_id }, doc! { "$set": set }, None)
            .await
            .map_err(db_error("update content"))?;
        Ok(result.matched_count > 0)
    }

    /// Scheduled content whose `scheduledAt` is not after `now`.
    pub async fn due_content(&self, now: DateTime<Utc>) -> Result<Vec<Content>, AppError> {
        store::find_many(
            &self.content(),
            doc! {
                "status": "scheduled",
                "scheduledAt": { "$lte": time_format::format(&now) }
            },
            Some(doc! { "scheduledAt": 1 }),
            None,
        )
        .await
    }

    pub async fn content_published_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Content>, AppError> {
        store::find_many(
            &self.content(),
            doc! {
                "status": "published",
                "publishedAt": { "$gte": time_format::format(&since) }
            },
            None,
            None,
        )
        .await
    }

    // Social target operations

    pub async fn insert_target(&self, target: &SocialTarget) -> Result<(), AppError> {
        match self.social_targets().insert_one(target, None).await {
            Ok(_) => Ok(()),
            Err(e) if store::is_duplicate_key(&e) => Err(AppError::Conflict(anyhow::anyhow!(
                "Target already exists"
            ))),
            Err(e) => Err(db_error("insert social target")(e)),
        }
    }

    pub async fn find_target(&self, target_id: &str) -> Result<Option<SocialTarget>, AppError> {
        self.social_targets()
            .find_one(doc! { "targetId": target_id }, None)
            .await
            .map_err(db_error("find social target"))
    }

    pub async fn list_targets(
        &self,
        platform: &str,
        status: &str,
        target_type: Option<&str>,
    ) -> Result<Vec<SocialTarget>, AppError> {
        let mut filter = doc! { "platform": platform, "status": status };
        if let Some(target_type) = target_type {
            filter.insert("type", target_type);
        }
        store::find_many(&self.social_targets(), filter, Some(doc! { "createdAt": 1 }), None).await
    }

    pub async fn set_target_fields(&self, target_id: &str, set: Document) -> Result<bool, AppError> {
        let result = self
            .social_targets()
            .update_one(doc! { "targetId": target_id }, doc! { "$set": set }, None)
            .await
            .map_err(db_error("update social target"))?;
        Ok(result.matched_count > 0)
    }

    pub async fn record_target_post(
        &self,
        target_id: &str,
        posted_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let posted_at = time_format::format(&posted_at);
        self.social_targets()
            .update_one(
                doc! { "targetId": target_id },
                doc! {
                    "$inc": { "performance.totalPosts": 1_i64 },
                    "$set": { "lastPostedAt": posted_at.as_str(), "updatedAt": posted_at.as_str() }
                },
                None,
            )
            .await
            .map_err(db_error("record target post"))?;
        Ok(())
    }

    // Publishing history

    pub async fn insert_publish_record(&self, record: &PublishRecord) -> Result<(), AppError> {
        self.publishing_history()
            .insert_one(record, None)
            .await
            .map_err(db_error("insert publish record"))?;
        Ok(())
    }

    pub async fn publish_history(&self, content_id: &str) -> Result<Vec<PublishRecord>, AppError> {
        store::find_many(
            &self.publishing_history(),
            doc! { "contentId": content_id },
            Some(doc! { "publishedAt": -1 }),
            None,
        )
        .await
    }

    // Analytics

    pub async fn upsert_analytics(&self, record: &AnalyticsRecord) -> Result<(), AppError> {
        self.analytics()
            .replace_one(
                doc! { "analyticsId": record.analytics_id.as_str() },
                record,
                ReplaceOptions::builder().upsert(true).build(),
            )
            .await
            .map_err(db_error("upsert analytics"))?;
        Ok(())
    }

    pub async fn analytics_for_content(
        &self,
        content_id: &str,
    ) -> Result<Vec<AnalyticsRecord>, AppError> {
        store::find_many(
            &self.analytics(),
            doc! { "contentId": content_id },
            Some(doc! { "date": -1 }),
            None,
        )
        .await
    }

    // API keys

    pub async fn insert_api_key(&self, key: &ApiKey) -> Result<(), AppError> {
        self.api_keys()
            .insert_one(key, None)
            .await
            .map_err(db_error("insert api key"))?;
        Ok(())
    }

    pub async fn find_api_key(&self, key_id: &str) -> Result<Option<ApiKey>, AppError> {
        self.api_keys()
            .find_one(doc! { "keyId": key_id }, None)
            .await
            .map_err(db_error("find api key"))
    }

    pub async fn find_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, AppError> {
        self.api_keys()
            .find_one(doc! { "keyHash": key_hash }, None)
            .await
            .map_err(db_error("find api key by hash"))
    }

    pub async fn list_api_keys(&self, status: &str) -> Result<Vec<ApiKey>, AppError> {
        store::find_many(
            &self.api_keys(),
            doc! { "status": status },
            Some(doc! { "createdAt": -1 }),
            None,
        )
        .await
    }

    pub async fn set_api_key_fields(&self, key_id: &str, set: Document) -> Result<bool, AppError> {
        let result = self
            .api_keys()
            .update_one(doc! { "keyId": key_id }, doc! { "$set": set }, None)
            .await
            .map_err(db_error("update api key"))?;
        Ok(result.matched_count > 0)
    }

    // Audit

    pub async fn insert_audit(
        &self,
        entry: &AuditLog,
        expire_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        store::insert_expiring(&self.audit_logs(), entry, expire_at).await
    }

    // Templates

    pub async fn find_template(&self, template_id: &str) -> Result<Option<Template>, AppError> {
        self.templates()
            .find_one(doc! { "templateId": template_id }, None)
            .await
            .map_err(db_error("find template"))
    }

    // Dashboard

    pub async fn dashboard_stats(&self, now: DateTime<Utc>) -> Result<DashboardStats, AppError> {
        let start_of_day = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or(now);

        let campaigns = self.campaigns();
        let content = self.content();

        let total_campaigns = campaigns
            .count_documents(doc! {}, None)
            .await
            .map_err(db_error("count campaigns"))?;
        let active_campaigns = campaigns
            .count_documents(doc! { "status": "active" }, None)
            .await
            .map_err(db_error("count active campaigns"))?;
        let total_content = content
            .count_documents(doc! {}, None)
            .await
            .map_err(db_error("count content"))?;
        let pending_approval = content
            .count_documents(doc! { "status": "draft" }, None)
            .await
            .map_err(db_error("count draft content"))?;
        let published_today = content
            .count_documents(
                doc! {
                    "status": "published",
                    "publishedAt": { "$gte": time_format::format(&start_of_day) }
                },
                None,
            )
            .await
            .map_err(db_error("count published content"))?;

        let mut cursor = campaigns
            .aggregate(
                [doc! {
                    "$group": {
                        "_id": null,
                        "impressions": { "$sum": "$analytics.impressions" }
                    }
                }],
                None,
            )
            .await
            .map_err(db_error("sum impressions"))?;
        let total_impressions = match cursor.try_next().await.map_err(db_error("sum impressions"))? {
            Some(row) => match row.get("impressions") {
                Some(mongodb::bson::Bson::Int64(n)) => *n,
                Some(mongodb::bson::Bson::Int32(n)) => i64::from(*n),
                Some(mongodb::bson::Bson::Double(n)) => *n as i64,
                _ => 0,
            },
            None => 0,
        };

        Ok(DashboardStats {
            total_campaigns,
            active_campaigns,
            total_content,
            pending_approval,
            published_today,
            total_impressions,
        })
    }
}
