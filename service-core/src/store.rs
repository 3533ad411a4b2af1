//! MongoDB helpers shared by the service repositories.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{self, DateTime as BsonDateTime, Document, doc},
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, FindOptions, IndexOptions},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::time::Duration;

/// BSON date field carrying the TTL for expiring records. It lives next to the
/// JSON model, which ignores it on read.
pub const EXPIRE_AT_FIELD: &str = "expireAt";

const DUPLICATE_KEY_CODE: i32 = 11000;

pub async fn connect(
    uri: &str,
    database: &str,
    app_name: &str,
) -> Result<(Client, Database), AppError> {
    tracing::info!(database = %database, "Connecting to MongoDB");

    let mut options = ClientOptions::parse(uri).await.map_err(|e| {
        tracing::error!("Failed to parse MongoDB connection string: {}", e);
        AppError::DatabaseError(e.into())
    })?;
    options.app_name = Some(app_name.to_string());
    options.server_selection_timeout = Some(Duration::from_secs(5));

    let client = Client::with_options(options).map_err(|e| {
        tracing::error!("Failed to create MongoDB client: {}", e);
        AppError::DatabaseError(e.into())
    })?;
    let db = client.database(database);

    Ok((client, db))
}

pub async fn ping(client: &Client) -> Result<(), AppError> {
    client
        .database("admin")
        .run_command(doc! { "ping": 1 }, None)
        .await
        .map_err(|e| {
            tracing::error!("MongoDB health check failed: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
    Ok(())
}

pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

pub fn unique_index(field: &str, name: &str) -> IndexModel {
    IndexModel::builder()
        .keys(doc! { field: 1 })
        .options(
            IndexOptions::builder()
                .name(name.to_string())
                .unique(true)
                .build(),
        )
        .build()
}

pub fn index(keys: Document, name: &str) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().name(name.to_string()).build())
        .build()
}

/// TTL index removing documents once `expireAt` has passed.
pub fn ttl_index() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { EXPIRE_AT_FIELD: 1 })
        .options(
            IndexOptions::builder()
                .name("expire_at_ttl_idx".to_string())
                .expire_after(Duration::from_secs(0))
                .build(),
        )
        .build()
}

pub fn bson_date(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

/// Inserts `record` with an `expireAt` date so the TTL index reaps it.
pub async fn insert_expiring<T: Serialize>(
    collection: &Collection<T>,
    record: &T,
    expire_at: DateTime<Utc>,
) -> Result<(), AppError> {
    let mut document = bson::to_document(record)?;
    document.insert(EXPIRE_AT_FIELD, bson_date(expire_at));

    collection
        .clone_with_type::<Document>()
        .insert_one(document, None)
        .await?;
    Ok(())
}

pub async fn find_many<T>(
    collection: &Collection<T>,
    filter: Document,
    sort: Option<Document>,
    limit: Option<i64>,
) -> Result<Vec<T>, AppError>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let options = FindOptions::builder().sort(sort).limit(limit).build();
    let cursor = collection.find(filter, options).await?;
    let items: Vec<T> = cursor.try_collect().await?;
    Ok(items)
}

/// Result of applying a client-supplied field map to a stored record.
#[derive(Debug)]
pub struct FieldUpdate<T> {
    /// The record as it reads after the update.
    pub record: T,
    /// `$set` body containing only the supplied, recognised fields.
    pub set: Document,
}

/// Overlays `fields` on `current`, type-checks the result by round-tripping it
/// through `T`, and builds the matching `$set` document. Unknown fields are
/// dropped; fields listed in `immutable` are rejected.
pub fn merge_fields<T>(
    current: &T,
    fields: &Map<String, Value>,
    immutable: &[&str],
) -> Result<FieldUpdate<T>, AppError>
where
    T: Serialize + DeserializeOwned,
{
    if let Some(key) = fields.keys().find(|k| immutable.contains(&k.as_str())) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Field '{}' cannot be updated",
            key
        )));
    }

    let mut merged = serde_json::to_value(current)?;
    let object = merged
        .as_object_mut()
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Record is not an object")))?;
    for (key, value) in fields {
        object.insert(key.clone(), value.clone());
    }

    let record: T = serde_json::from_value(merged)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid update: {}", e)))?;

    let normalized = serde_json::to_value(&record)?;
    let mut set = Document::new();
    for key in fields.keys() {
        match normalized.get(key) {
            Some(value) => {
                set.insert(key.clone(), bson::to_bson(value)?);
            }
            None => tracing::debug!(field = %key, "Ignoring unknown field in update"),
        }
    }

    Ok(FieldUpdate { record, set })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Sample {
        sample_id: String,
        name: String,
        #[serde(default)]
        count: u32,
    }

    fn sample() -> Sample {
        Sample {
            sample_id: "s1".to_string(),
            name: "first".to_string(),
            count: 1,
        }
    }

    #[test]
    fn merge_builds_set_for_known_fields() {
        let fields = json!({ "name": "second", "bogus": true });
        let update = merge_fields(&sample(), fields.as_object().unwrap(), &["sampleId"]).unwrap();

        assert_eq!(update.record.name, "second");
        assert_eq!(update.set.get_str("name").unwrap(), "second");
        assert!(!update.set.contains_key("bogus"));
    }

    #[test]
    fn merge_rejects_immutable_fields() {
        let fields = json!({ "sampleId": "s2" });
        let err = merge_fields(&sample(), fields.as_object().unwrap(), &["sampleId"]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn merge_rejects_wrong_types() {
        let fields = json!({ "count": "many" });
        let err = merge_fields(&sample(), fields.as_object().unwrap(), &[]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
