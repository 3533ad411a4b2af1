mod common;

use chrono::{Duration, Utc};
use common::{TestApp, TEST_MASTER_KEY};
use mongodb::bson::doc;
use serde_json::{json, Value};
use service_core::time_format;

#[tokio::test]
async fn missing_api_key_is_unauthorized() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .client
        .get(app.url("/campaigns/list"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing API key");

    app.cleanup().await;
}

#[tokio::test]
async fn unknown_api_key_is_forbidden() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .client
        .get(app.url("/campaigns/list"))
        .header("x-api-key", "pdh_live_not-a-real-key")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 403);
    app.cleanup().await;
}

#[tokio::test]
async fn admin_routes_require_master_key() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .client
        .post(app.url("/api-keys/create"))
        .header("x-master-key", "wrong")
        .json(&json!({ "name": "agent" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
    app.cleanup().await;
}

#[tokio::test]
async fn created_key_authenticates_and_is_listed_without_secret() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let secret = app.api_key().await;
    assert!(secret.starts_with("pdh_live_"));

    let response = app
        .client
        .get(app.url("/campaigns/list"))
        .header("x-api-key", &secret)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let listed: Value = app
        .client
        .get(app.url("/api-keys/list"))
        .header("x-master-key", TEST_MASTER_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["count"], 1);
    let item = &listed["items"][0];
    assert!(item.get("keyHash").is_none());
    assert!(item.get("apiKey").is_none());
    assert!(item["lastUsedAt"].is_string());

    app.cleanup().await;
}

#[tokio::test]
async fn revoked_key_is_forbidden() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let created: Value = app
        .client
        .post(app.url("/api-keys/create"))
        .header("x-master-key", TEST_MASTER_KEY)
        .json(&json!({ "name": "short-lived", "permissions": ["content:write"] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let secret = created["apiKey"].as_str().unwrap().to_string();
    let key_id = created["keyId"].as_str().unwrap().to_string();
    assert_eq!(created["key"]["permissions"], json!(["content:write"]));

    let revoke = app
        .client
        .post(app.url("/api-keys/revoke"))
        .header("x-master-key", TEST_MASTER_KEY)
        .json(&json!({ "keyId": key_id, "reason": "rotated" }))
        .send()
        .await
        .unwrap();
    assert_eq!(revoke.status().as_u16(), 200);

    let response = app
        .client
        .get(app.url("/campaigns/list"))
        .header("x-api-key", &secret)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    app.cleanup().await;
}

#[tokio::test]
async fn key_secret_cannot_be_updated() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let created: Value = app
        .client
        .post(app.url("/api-keys/create"))
        .header("x-master-key", TEST_MASTER_KEY)
        .json(&json!({ "name": "agent" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = app
        .client
        .put(app.url("/api-keys/update"))
        .header("x-master-key", TEST_MASTER_KEY)
        .json(&json!({ "keyId": created["keyId"], "apiKey": "pdh_live_forged" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = app
        .client
        .put(app.url("/api-keys/update"))
        .header("x-master-key", TEST_MASTER_KEY)
        .json(&json!({ "keyId": created["keyId"], "description": "nightly agent" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    app.cleanup().await;
}

#[tokio::test]
async fn expired_api_key_is_forbidden() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let (key_id, secret) = app.api_key_with(json!({})).await;
    let yesterday = Utc::now() - Duration::days(1);
    app.db
        .set_api_key_fields(&key_id, doc! { "expiresAt": time_format::format(&yesterday) })
        .await
        .unwrap();

    let response = app
        .client
        .get(app.url("/campaigns/list"))
        .header("x-api-key", &secret)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "API key expired");

    app.cleanup().await;
}

#[tokio::test]
async fn enforced_rate_limit_answers_429_with_retry_after() {
    let Some(app) = TestApp::spawn_enforcing_rate_limits().await else {
        return;
    };
    let (_, secret) = app
        .api_key_with(json!({ "rateLimit": { "requestsPerMinute": 2 } }))
        .await;

    for _ in 0..2 {
        let response = app
            .client
            .get(app.url("/campaigns/list"))
            .header("x-api-key", &secret)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let response = app
        .client
        .get(app.url("/campaigns/list"))
        .header("x-api-key", &secret)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 429);
    let retry_after: u64 = response.headers()["retry-after"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after >= 1);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Rate limit exceeded");

    app.cleanup().await;
}
