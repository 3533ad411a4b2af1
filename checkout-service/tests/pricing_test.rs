mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn plans_are_listed() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .client
        .get(app.url("/pricing/plans"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["plans"].as_array().unwrap().len(), 4);
    assert_eq!(body["mockExam"]["premium"], 29.0);

    app.cleanup().await;
}

#[tokio::test]
async fn team_price_is_split_between_members() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app.post("/pricing/team", json!({ "memberCount": 4 })).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["totalPrice"], 299.0);
    assert_eq!(body["pricePerMember"], 74.75);

    let response = app.post("/pricing/team", json!({ "memberCount": 6 })).await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Team must have 2-5 members");

    app.cleanup().await;
}

#[tokio::test]
async fn scholarship_quote_and_validation() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .post(
            "/pricing/scholarship",
            json!({ "attempts": 4, "lastScore": 35, "financialNeed": "High" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["scholarshipPercent"], 75);
    assert_eq!(body["breakdown"]["scoreBonus"], 30);

    let response = app
        .post(
            "/pricing/scholarship",
            json!({ "attempts": 2, "lastScore": 120, "financialNeed": "Low" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Score must be between 0 and 100");

    app.cleanup().await;
}

#[tokio::test]
async fn personalized_plan_picks_cluster() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .post(
            "/pricing/personalized-plan",
            json!({ "clinicalScore": 3, "theoryScore": 8, "timeScore": 6 }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["cluster"], 1);
    assert_eq!(body["name"], "Clinical Knowledge Gap");
    assert_eq!(body["price"], 179.0);

    let response = app
        .post(
            "/pricing/personalized-plan",
            json!({ "clinicalScore": 0, "theoryScore": 8, "timeScore": 6 }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn negative_counts_are_rejected_as_json() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .post(
            "/pricing/scholarship",
            json!({ "attempts": -1, "lastScore": 40, "financialNeed": "High" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("attempts"));

    let response = app.post("/pricing/team", json!({ "memberCount": -2 })).await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("memberCount"));

    app.cleanup().await;
}
