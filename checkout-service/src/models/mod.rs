pub mod checkout_campaign;
pub mod coupon;
pub mod registration;
pub mod team;

pub use checkout_campaign::CheckoutCampaign;
pub use coupon::{Coupon, DiscountType};
pub use registration::{
    DiscountPurchase, MockExamRegistration, PersonalizedPlan, RecordStatus, RegistrationType,
    ScholarshipApplication,
};
pub use team::{Team, TeamMember, TeamStatus, TEAM_CAMPAIGN_ID};
