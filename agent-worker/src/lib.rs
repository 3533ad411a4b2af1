pub mod client;
pub mod config;
pub mod jobs;

pub use client::{ApiError, MarketingApiClient};
pub use jobs::{run, Job, RunSummary};
