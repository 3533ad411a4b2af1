pub mod analytics;
pub mod api_key;
pub mod audit_log;
pub mod campaign;
pub mod content;
pub mod social_target;

pub use analytics::{AnalyticsRecord, PostMetrics};
pub use api_key::{ApiKey, ApiKeyContext, ApiKeyStatus, RateLimit};
pub use audit_log::AuditLog;
pub use campaign::{
    Assets, Budget, Campaign, CampaignAnalytics, CampaignStatus, CampaignType, ContentSchedule,
    Goals, TargetAudience, campaign_id_for,
};
pub use content::{
    Content, ContentAnalytics, ContentMetadata, ContentStatus, ContentType, PublishedPost,
    Template,
};
pub use social_target::{
    PostingSchedule, PublishRecord, PublishedTarget, SocialTarget, TargetCredentials,
    TargetPerformance, TargetStatus, TargetType,
};
