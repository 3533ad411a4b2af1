mod common;

use chrono::{DateTime, Duration, Utc};
use common::TestApp;
use marketing_service::models::Content;
use serde_json::{json, Value};
use service_core::time_format;

async fn generate(app: &TestApp, key: &str, body: Value) -> reqwest::Response {
    app.client
        .post(app.url("/content/generate"))
        .header("x-api-key", key)
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
async fn generate_blog_post_parses_title_and_metadata() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let key = app.api_key().await;
    app.create_campaign(&key, "Blog Series").await;

    let response = generate(
        &app,
        &key,
        json!({
            "campaignId": "campaign-blog-series",
            "type": "blog_post",
            "variables": { "ctaUrl": "https://prodenthub.com.au/start" }
        }),
    )
    .await;
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.unwrap();
    let content = &body["content"];
    assert!(body["contentId"].as_str().unwrap().starts_with("content_"));
    assert_eq!(content["title"], "Study smarter for the ADC");
    assert_eq!(content["status"], "draft");
    assert_eq!(content["metadata"]["aiModel"], "mock");
    assert_eq!(content["metadata"]["tone"], "professional");
    assert_eq!(content["metadata"]["hashtags"], json!(["#ADCExam", "#DentalStudy"]));
    let cta = content["metadata"]["ctaUrl"].as_str().unwrap();
    assert!(cta.contains("utm_source=facebook"));
    assert!(cta.contains("utm_medium=organic"));
    assert!(cta.contains("utm_campaign=campaign-blog-series"));

    app.cleanup().await;
}

#[tokio::test]
async fn scheduled_generation_is_listed_by_status() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let key = app.api_key().await;
    app.create_campaign(&key, "Weekly Posts").await;

    let response = generate(
        &app,
        &key,
        json!({
            "campaignId": "campaign-weekly-posts",
            "type": "facebook_post",
            "scheduledAt": "2030-01-01T09:00:00.000Z",
            "customPrompt": "Write a short post about mock exams"
        }),
    )
    .await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["content"]["status"], "scheduled");

    let listed: Value = app
        .client
        .get(app.url("/content/list?status=scheduled"))
        .header("x-api-key", &key)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["count"], 1);

    let no_filter = app
        .client
        .get(app.url("/content/list"))
        .header("x-api-key", &key)
        .send()
        .await
        .unwrap();
    assert_eq!(no_filter.status().as_u16(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn generate_rejects_bad_requests() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let key = app.api_key().await;

    let missing = generate(&app, &key, json!({ "type": "email" })).await;
    assert_eq!(missing.status().as_u16(), 400);

    let bad_type = generate(&app, &key, json!({ "campaignId": "campaign-x", "type": "tweet" })).await;
    assert_eq!(bad_type.status().as_u16(), 400);

    let unknown = generate(&app, &key, json!({ "campaignId": "campaign-x", "type": "email" })).await;
    assert_eq!(unknown.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn review_and_soft_delete_content() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let key = app.api_key().await;
    app.create_campaign(&key, "Review Flow").await;

    let created: Value = generate(
        &app,
        &key,
        json!({ "campaignId": "campaign-review-flow", "type": "email" }),
    )
    .await
    .json()
    .await
    .unwrap();
    let content_id = created["contentId"].as_str().unwrap().to_string();

    let rejected = app
        .client
        .put(app.url("/content/update"))
        .header("x-api-key", &key)
        .json(&json!({
            "contentId": content_id,
            "status": "rejected",
            "rejectionReason": "Off brand",
            "reviewedBy": "marketing@prodenthub.com.au"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status().as_u16(), 200);

    let fetched: Value = app
        .client
        .get(app.url(&format!("/content/get?contentId={}", content_id)))
        .header("x-api-key", &key)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["status"], "rejected");
    assert_eq!(fetched["rejectionReason"], "Off brand");
    assert!(fetched["reviewedAt"].is_string());

    let deleted = app
        .client
        .delete(app.url(&format!("/content/delete?contentId={}", content_id)))
        .header("x-api-key", &key)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 200);

    let fetched: Value = app
        .client
        .get(app.url(&format!("/content/get?contentId={}", content_id)))
        .header("x-api-key", &key)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["status"], "archived");
    assert!(fetched["archivedAt"].is_string());

    app.cleanup().await;
}

fn scheduled(id: &str, scheduled_at: DateTime<Utc>) -> Content {
    serde_json::from_value(json!({
        "contentId": id,
        "type": "facebook_post",
        "campaignId": "campaign-backlog",
        "title": "Exam tips",
        "body": "Revise the periodontics notes",
        "status": "scheduled",
        "platform": "facebook",
        "scheduledAt": time_format::format(&scheduled_at),
        "createdAt": time_format::format(&scheduled_at),
        "updatedAt": time_format::format(&scheduled_at)
    }))
    .unwrap()
}

#[tokio::test]
async fn overdue_content_is_not_hidden_by_a_future_backlog() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let key = app.api_key().await;
    let now = Utc::now();
    let expire_at = now + Duration::days(180);

    for day in 1..=201 {
        let item = scheduled(&format!("content_future_{}", day), now + Duration::days(day));
        app.db.insert_content(&item, expire_at).await.unwrap();
    }
    let overdue = scheduled("content_overdue", now - Duration::hours(2));
    app.db.insert_content(&overdue, expire_at).await.unwrap();

    let response = app
        .client
        .get(app.url("/content/due"))
        .header("x-api-key", &key)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["items"][0]["contentId"], "content_overdue");

    app.cleanup().await;
}
