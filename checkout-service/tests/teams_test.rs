mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn team_is_created_and_fetched() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let body = app.create_team().await;
    assert_eq!(body["message"], "Team created successfully");
    let team_id = body["teamId"].as_str().unwrap().to_string();
    assert!(team_id.starts_with("team_"));

    let team = &body["team"];
    assert_eq!(team["totalMembers"], 3);
    assert_eq!(team["totalAmount"], 299.0);
    assert_eq!(team["pricePerMember"], 99.67);
    assert_eq!(team["status"], "created");
    assert_eq!(team["planType"], "full-6months");
    assert_eq!(team["members"][0]["status"], "pending");
    assert_eq!(team["members"][0]["shareAmount"], 99.67);

    let response = app
        .client
        .get(app.url(&format!("/teams/{}", team_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let fetched: Value = response.json().await.unwrap();
    assert_eq!(fetched["leaderEmail"], "ana@example.com");

    app.cleanup().await;
}

#[tokio::test]
async fn unknown_team_returns_404() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .client
        .get(app.url("/teams/team_missing"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Team not found");

    app.cleanup().await;
}

#[tokio::test]
async fn invalid_teams_are_rejected() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .post(
            "/teams/create",
            json!({
                "leader": { "firstName": "Ana", "lastName": "Lee", "email": "ana@example.com" },
                "members": []
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Invalid team data. Must have 1-4 members plus leader."
    );

    let response = app
        .post(
            "/teams/create",
            json!({
                "leader": { "firstName": "Ana", "lastName": "Lee", "email": "ana@example.com" },
                "members": [{ "name": "Twin", "email": "ana@example.com" }]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn mock_exam_registration_depends_on_type() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let base = json!({
        "firstName": "Dee",
        "lastName": "Rao",
        "email": "dee@example.com",
        "mockExamId": "adc-part1-march"
    });

    let response = app.post("/mock-exams/register", base.clone()).await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["price"], 0.0);

    let mut premium = base.clone();
    premium["registrationType"] = json!("premium");
    let response = app.post("/mock-exams/register", premium).await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "pending");
    assert_eq!(body["price"], 29.0);

    let response = app
        .post("/mock-exams/register", json!({ "firstName": "Dee" }))
        .await;
    assert_eq!(response.status().as_u16(), 400);

    app.cleanup().await;
}
