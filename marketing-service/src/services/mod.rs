pub mod analytics;
pub mod api_keys;
pub mod audit;
pub mod content_builder;
pub mod database;
pub mod facebook;
pub mod providers;
pub mod publishing;
pub mod scheduling;

pub use database::{ContentFilter, DashboardStats, MarketingDb};
pub use facebook::GraphClient;
pub use providers::{build_provider, GenerationParams, ProviderError, TextProvider};
