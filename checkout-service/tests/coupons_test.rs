mod common;

use common::{TestApp, TEST_ADMIN_KEY};
use serde_json::{json, Value};

async fn create_coupon(app: &TestApp, body: Value) -> reqwest::Response {
    app.client
        .post(app.url("/coupons/create"))
        .header("x-admin-key", TEST_ADMIN_KEY)
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
async fn coupon_creation_requires_admin_key() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .post(
            "/coupons/create",
            json!({ "code": "SAVE20", "discountType": "percentage", "discountValue": 20 }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 401);

    app.cleanup().await;
}

#[tokio::test]
async fn duplicate_coupon_conflicts() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let body = json!({ "code": "save20", "discountType": "percentage", "discountValue": 20 });
    let response = create_coupon(&app, body.clone()).await;
    assert_eq!(response.status().as_u16(), 201);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["coupon"]["code"], "SAVE20");

    let response = create_coupon(&app, body).await;
    assert_eq!(response.status().as_u16(), 409);

    app.cleanup().await;
}

#[tokio::test]
async fn coupon_validation_quotes_discount() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = create_coupon(
        &app,
        json!({
            "code": "HALF",
            "discountType": "percentage",
            "discountValue": 50,
            "maxDiscount": 60,
            "applicablePlans": ["full", "premium"]
        }),
    )
    .await;
    assert_eq!(response.status().as_u16(), 201);

    let response = app
        .post(
            "/coupons/validate",
            json!({ "couponCode": "half", "originalAmount": 199, "planType": "full" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["valid"], true);
    assert_eq!(body["discountAmount"], 60.0);
    assert_eq!(body["finalPrice"], 139.0);

    let response = app
        .post(
            "/coupons/validate",
            json!({ "couponCode": "HALF", "originalAmount": 49, "planType": "basic" }),
        )
        .await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["valid"], false);
    assert_eq!(body["message"], "Coupon is not valid for this plan");

    let response = app
        .post(
            "/coupons/validate",
            json!({ "couponCode": "NOPE", "originalAmount": 49 }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["valid"], false);

    app.cleanup().await;
}
