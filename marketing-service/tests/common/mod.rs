#![allow(dead_code)]

use marketing_service::config::{
    AiConfig, AiProviderKind, AuthConfig, FacebookConfig, MarketingConfig, MongoConfig,
};
use marketing_service::services::MarketingDb;
use marketing_service::startup::Application;
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CommonConfig;
use wiremock::MockServer;

pub const TEST_MASTER_KEY: &str = "test-master-key";

pub struct TestApp {
    pub address: String,
    pub db: MarketingDb,
    pub db_name: String,
    pub client: reqwest::Client,
    /// Stands in for the Facebook Graph API.
    pub graph_server: MockServer,
}

impl TestApp {
    /// Returns `None` when `SKIP_MONGO_TESTS` is set or MongoDB is unreachable.
    pub async fn spawn() -> Option<Self> {
        Self::spawn_with(false).await
    }

    /// Like [`TestApp::spawn`] with per-key rate limits switched on.
    pub async fn spawn_enforcing_rate_limits() -> Option<Self> {
        Self::spawn_with(true).await
    }

    async fn spawn_with(rate_limit_enforce: bool) -> Option<Self> {
        if std::env::var("SKIP_MONGO_TESTS").is_ok() {
            eprintln!("SKIP_MONGO_TESTS set; skipping");
            return None;
        }

        let db_name = format!("marketing_test_{}", uuid::Uuid::new_v4().simple());
        let graph_server = MockServer::start().await;

        let config = MarketingConfig {
            common: CommonConfig {
                port: 0,
                log_level: "warn".to_string(),
                otlp_endpoint: None,
                allowed_origin: None,
            },
            mongodb: MongoConfig {
                uri: std::env::var("TEST_MONGODB_URI")
                    .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
                database: db_name.clone(),
            },
            auth: AuthConfig {
                master_key: Secret::new(TEST_MASTER_KEY.to_string()),
                rate_limit_enforce,
            },
            ai: AiConfig {
                provider: AiProviderKind::Mock,
                model: "mock".to_string(),
                max_tokens: 2000,
                anthropic_api_key: None,
                anthropic_base_url: "http://localhost:1".to_string(),
                openai_api_key: None,
                openai_base_url: "http://localhost:1".to_string(),
            },
            facebook: FacebookConfig {
                graph_base_url: graph_server.uri(),
                api_version: "v18.0".to_string(),
                page_access_token: Some(Secret::new("page-token".to_string())),
            },
            landing_base_url: "https://prodenthub.com.au".to_string(),
        };

        let app = match Application::build(config).await {
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
            db_name,
            client,
            graph_server,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Mints an API key through the admin route and returns the secret.
    pub async fn api_key(&self) -> String {
        let response = self
            .client
            .post(self.url("/api-keys/create"))
            .header("x-master-key", TEST_MASTER_KEY)
            .json(&json!({ "name": "integration-test" }))
            .send()
            .await
            .expect("Failed to create API key");
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.expect("Invalid create key body");
        body["apiKey"]
            .as_str()
            .expect("apiKey missing from response")
            .to_string()
    }

    /// Mints a key with `body` merged into the create request and returns
    /// `(keyId, secret)`.
    pub async fn api_key_with(&self, body: Value) -> (String, String) {
        let mut request = json!({ "name": "integration-test" });
        if let (Some(target), Value::Object(extra)) = (request.as_object_mut(), body) {
            target.extend(extra);
        }
        let response = self
            .client
            .post(self.url("/api-keys/create"))
            .header("x-master-key", TEST_MASTER_KEY)
            .json(&request)
            .send()
            .await
            .expect("Failed to create API key");
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.expect("Invalid create key body");
        (
            body["keyId"].as_str().expect("keyId missing").to_string(),
            body["apiKey"].as_str().expect("apiKey missing").to_string(),
        )
    }

    pub async fn create_campaign(&self, api_key: &str, name: &str) -> Value {
        let response = self
            .client
            .post(self.url("/campaigns/create"))
            .header("x-api-key", api_key)
            .json(&json!({
                "name": name,
                "description": "Pass the ADC written exam first time",
                "type": "hybrid"
            }))
            .send()
            .await
            .expect("Failed to create campaign");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Invalid campaign body")
    }

    pub async fn cleanup(&self) {
        self.db
            .database()
            .drop(None)
            .await
            .expect("Failed to drop test database");
    }
}
