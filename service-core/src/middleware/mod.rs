pub mod cors;
pub mod metrics;
pub mod rate_limit;
pub mod tracing;

pub use cors::cors_layer;
pub use metrics::metrics_middleware;
pub use rate_limit::{ApiKeyRateLimiter, create_unkeyed_rate_limiter};
pub use tracing::{REQUEST_ID_HEADER, RequestId, http_trace_layer, request_id_middleware};
