#![allow(dead_code)]

use checkout_service::config::{
    CheckoutConfig, EmailConfig, EmailProviderKind, MongoConfig, StripeConfig,
};
use checkout_service::services::email::MockEmailProvider;
use checkout_service::services::CheckoutDb;
use checkout_service::startup::Application;
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CommonConfig;
use service_core::utils::hmac_sha256_hex;
use std::sync::Arc;
use wiremock::MockServer;

pub const TEST_ADMIN_KEY: &str = "test-admin-key";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test";

pub struct TestApp {
    pub address: String,
    pub db: CheckoutDb,
    pub client: reqwest::Client,
    /// Stands in for the Stripe API.
    pub stripe_server: MockServer,
    pub email: Arc<MockEmailProvider>,
}

impl TestApp {
    /// Returns `None` when `SKIP_MONGO_TESTS` is set or MongoDB is unreachable.
    pub async fn spawn() -> Option<Self> {
        if std::env::var("SKIP_MONGO_TESTS").is_ok() {
            eprintln!("SKIP_MONGO_TESTS set; skipping");
            return None;
        }

        let db_name = format!("checkout_test_{}", uuid::Uuid::new_v4().simple());
        let stripe_server = MockServer::start().await;

        let config = CheckoutConfig {
            common: CommonConfig {
                port: 0,
                log_level: "warn".to_string(),
                otlp_endpoint: None,
                allowed_origin: None,
            },
            mongodb: MongoConfig {
                uri: std::env::var("TEST_MONGODB_URI")
                    .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
                database: db_name,
            },
            stripe: StripeConfig {
                secret_key: Secret::new("sk_test_123".to_string()),
                webhook_secret: Secret::new(TEST_WEBHOOK_SECRET.to_string()),
                api_base_url: stripe_server.uri(),
                webhook_tolerance_secs: 300,
            },
            admin_key: Secret::new(TEST_ADMIN_KEY.to_string()),
            frontend_url: "https://prodenthub.com.au".to_string(),
            email: EmailConfig {
                provider: EmailProviderKind::Mock,
                smtp_host: "localhost".to_string(),
                smtp_port: 587,
                smtp_user: String::new(),
                smtp_password: Secret::new(String::new()),
                from_email: "noreply@prodenthub.com.au".to_string(),
                from_name: "ProDentHub".to_string(),
            },
        };

        let email = Arc::new(MockEmailProvider::new());
        let app = match Application::build_with_email(config, email.clone()).await {
            Ok(app) => app,
            Err(e) => {
                eprintln!("MongoDB unavailable, skipping: {}", e);
                return None;
            }
        };
        let address = format!("http://127.0.0.1:{}", app.port());
        let db = app.db().clone();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client.get(format!("{}/health", address)).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }

        Some(TestApp {
            address,
            db,
            client,
            stripe_server,
            email,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn create_team(&self) -> Value {
        let response = self
            .post(
                "/teams/create",
                json!({
                    "leader": {
                        "firstName": "Ana",
                        "lastName": "Lee",
                        "email": "ana@example.com",
                        "country": "AU"
                    },
                    "members": [
                        { "name": "Ben Ng", "email": "ben@example.com" },
                        { "name": "Cy Ho", "email": "cy@example.com" }
                    ]
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Invalid team body")
    }

    /// Posts `payload` to the webhook with a valid signature.
    pub async fn send_webhook(&self, payload: &Value) -> reqwest::Response {
        let body = payload.to_string();
        let timestamp = chrono::Utc::now().timestamp();
        let signature =
            hmac_sha256_hex(TEST_WEBHOOK_SECRET, &format!("{}.{}", timestamp, body)).unwrap();

        self.client
            .post(self.url("/webhooks/stripe"))
            .header("stripe-signature", format!("t={},v1={}", timestamp, signature))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn cleanup(&self) {
        self.db
            .database()
            .drop(None)
            .await
            .expect("Failed to drop test database");
    }
}

/// A `checkout.session.completed` event as Stripe would send it.
pub fn completed_event(session_id: &str, metadata: Value, amount_total: i64) -> Value {
    json!({
        "id": format!("evt_{}", session_id),
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "object": "checkout.session",
                "status": "complete",
                "payment_status": "paid",
                "customer_email": "ana@example.com",
                "amount_total": amount_total,
                "currency": "aud",
                "metadata": metadata
            }
        }
    })
}
