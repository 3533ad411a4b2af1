mod common;

use common::TestApp;
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mock_session_created(app: &TestApp) {
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_1",
            "url": "https://checkout.stripe.com/c/pay/cs_test_1"
        })))
        .mount(&app.stripe_server)
        .await;
}

#[tokio::test]
async fn missing_fields_are_rejected() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .post("/checkout/create", json!({ "campaignId": "discount-purchase" }))
        .await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing required fields: campaignId, email, amount");

    let response = app.post("/checkout/verify", json!({})).await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing sessionId");

    app.cleanup().await;
}

#[tokio::test]
async fn discount_checkout_creates_pending_purchase() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(body_string_contains("line_items%5B0%5D%5Bprice_data%5D%5Bunit_amount%5D=15920"))
        .and(body_string_contains("metadata%5BpurchaseId%5D=purchase_"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_1",
            "url": "https://checkout.stripe.com/c/pay/cs_test_1"
        })))
        .expect(1)
        .mount(&app.stripe_server)
        .await;

    let response = app
        .post(
            "/checkout/create",
            json!({
                "campaignId": "discount-purchase",
                "email": "ana@example.com",
                "amount": 159.2,
                "metadata": {
                    "planType": "full",
                    "originalPrice": 199,
                    "couponCode": "save20",
                    "discountAmount": 39.8
                }
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["sessionId"], "cs_test_1");
    assert_eq!(body["checkoutUrl"], "https://checkout.stripe.com/c/pay/cs_test_1");

    app.cleanup().await;
}

#[tokio::test]
async fn team_checkout_requires_existing_team() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    mock_session_created(&app).await;

    let response = app
        .post(
            "/checkout/create",
            json!({
                "campaignId": "team-creation",
                "email": "ana@example.com",
                "amount": 299,
                "metadata": { "teamId": "team_missing" }
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 404);

    let team = app.create_team().await;
    let response = app
        .post(
            "/checkout/create",
            json!({
                "campaignId": "team-creation",
                "email": "ana@example.com",
                "amount": 299,
                "metadata": { "teamId": team["teamId"] }
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    app.cleanup().await;
}

#[tokio::test]
async fn verify_reports_session_in_major_units() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_test_9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_9",
            "status": "complete",
            "payment_status": "paid",
            "customer_email": "ana@example.com",
            "amount_total": 19900,
            "currency": "aud",
            "metadata": { "campaignId": "discount-purchase" }
        })))
        .mount(&app.stripe_server)
        .await;

    let response = app
        .post("/checkout/verify", json!({ "sessionId": "cs_test_9" }))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["paymentStatus"], "paid");
    assert_eq!(body["amountTotal"], 199.0);
    assert_eq!(body["currency"], "AUD");
    assert_eq!(body["metadata"]["campaignId"], "discount-purchase");

    app.cleanup().await;
}
