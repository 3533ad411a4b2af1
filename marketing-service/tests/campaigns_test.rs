mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn create_campaign_applies_defaults() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let key = app.api_key().await;

    let body = app.create_campaign(&key, "ADC Part 1 - 2025").await;
    let campaign = &body["campaign"];

    assert_eq!(body["success"], true);
    assert_eq!(campaign["campaignId"], "campaign-adc-part-1-2025");
    assert_eq!(campaign["status"], "draft");
    assert_eq!(
        campaign["landingPageUrl"],
        "https://prodenthub.com.au/campaign-adc-part-1-2025/"
    );
    assert_eq!(campaign["targetAudience"]["location"], json!(["Australia"]));
    assert_eq!(campaign["budget"]["currency"], "AUD");
    assert_eq!(campaign["goals"]["leads"], 100);
    assert_eq!(campaign["contentSchedule"]["frequency"], "weekly");
    assert_eq!(campaign["analytics"]["impressions"], 0);

    app.cleanup().await;
}

#[tokio::test]
async fn duplicate_campaign_name_conflicts() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let key = app.api_key().await;
    app.create_campaign(&key, "Spring Intake").await;

    let response = app
        .client
        .post(app.url("/campaigns/create"))
        .header("x-api-key", &key)
        .json(&json!({ "name": "spring intake", "description": "again", "type": "free" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 409);
    app.cleanup().await;
}

#[tokio::test]
async fn create_campaign_validates_input() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let key = app.api_key().await;

    let missing = app
        .client
        .post(app.url("/campaigns/create"))
        .header("x-api-key", &key)
        .json(&json!({ "name": "No type", "description": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 400);

    let bad_type = app
        .client
        .post(app.url("/campaigns/create"))
        .header("x-api-key", &key)
        .json(&json!({ "name": "Bad type", "description": "x", "type": "sponsored" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_type.status().as_u16(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn update_activate_and_archive_campaign() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let key = app.api_key().await;
    app.create_campaign(&key, "Mock Exam Push").await;
    let id = "campaign-mock-exam-push";

    let update = app
        .client
        .put(app.url("/campaigns/update"))
        .header("x-api-key", &key)
        .json(&json!({ "campaignId": id, "description": "Updated", "goals": { "leads": 250 } }))
        .send()
        .await
        .unwrap();
    assert_eq!(update.status().as_u16(), 200);

    let bad_status = app
        .client
        .put(app.url("/campaigns/update"))
        .header("x-api-key", &key)
        .json(&json!({ "campaignId": id, "status": "exploded" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_status.status().as_u16(), 400);

    let activated: Value = app
        .client
        .post(app.url("/campaigns/activate"))
        .header("x-api-key", &key)
        .json(&json!({ "campaignId": id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(activated["status"], "active");

    let fetched: Value = app
        .client
        .get(app.url(&format!("/campaigns/get?campaignId={}", id)))
        .header("x-api-key", &key)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["description"], "Updated");
    assert_eq!(fetched["goals"]["leads"], 250);
    assert_eq!(fetched["status"], "active");

    let listed: Value = app
        .client
        .get(app.url("/campaigns/list?status=active"))
        .header("x-api-key", &key)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["count"], 1);

    let archived = app
        .client
        .post(app.url("/campaigns/archive"))
        .header("x-api-key", &key)
        .json(&json!({ "campaignId": id }))
        .send()
        .await
        .unwrap();
    assert_eq!(archived.status().as_u16(), 200);

    let stats: Value = app
        .client
        .get(app.url("/dashboard/stats"))
        .header("x-api-key", &key)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["totalCampaigns"], 1);
    assert_eq!(stats["activeCampaigns"], 0);

    app.cleanup().await;
}

#[tokio::test]
async fn get_unknown_campaign_is_404() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let key = app.api_key().await;

    let missing_param = app
        .client
        .get(app.url("/campaigns/get"))
        .header("x-api-key", &key)
        .send()
        .await
        .unwrap();
    assert_eq!(missing_param.status().as_u16(), 400);

    let unknown = app
        .client
        .get(app.url("/campaigns/get?campaignId=campaign-nope"))
        .header("x-api-key", &key)
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status().as_u16(), 404);

    app.cleanup().await;
}
