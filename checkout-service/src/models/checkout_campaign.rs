/// Landing-page campaigns that take payment through checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutCampaign {
    TeamCreation,
    ScholarshipApplication,
    DiscountPurchase,
    PersonalizedPlan,
    MockExamRegistration,
}

impl CheckoutCampaign {
    pub const ALL: [CheckoutCampaign; 5] = [
        CheckoutCampaign::TeamCreation,
        CheckoutCampaign::ScholarshipApplication,
        CheckoutCampaign::DiscountPurchase,
        CheckoutCampaign::PersonalizedPlan,
        CheckoutCampaign::MockExamRegistration,
    ];

    pub fn from_id(campaign_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == campaign_id)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutCampaign::TeamCreation => "team-creation",
            CheckoutCampaign::ScholarshipApplication => "scholarship-application",
            CheckoutCampaign::DiscountPurchase => "discount-purchase",
            CheckoutCampaign::PersonalizedPlan => "personalized-plan",
            CheckoutCampaign::MockExamRegistration => "mock-exam-registration",
        }
    }

    /// Metadata key carrying the id of the record the payment settles.
    pub fn record_key(&self) -> &'static str {
        match self {
            CheckoutCampaign::TeamCreation => "teamId",
            CheckoutCampaign::ScholarshipApplication => "scholarshipId",
            CheckoutCampaign::DiscountPurchase => "purchaseId",
            CheckoutCampaign::PersonalizedPlan => "planId",
            CheckoutCampaign::MockExamRegistration => "registrationId",
        }
    }

    pub fn product_name(campaign_id: &str) -> &'static str {
        match Self::from_id(campaign_id) {
            Some(CheckoutCampaign::TeamCreation) => "ProDentHub Full Version - 6 Months (Team Plan)",
            Some(CheckoutCampaign::ScholarshipApplication) => "ProDentHub Scholarship Access - 3 Months",
            Some(CheckoutCampaign::DiscountPurchase) => "ProDentHub Access Plan",
            Some(CheckoutCampaign::PersonalizedPlan) => "ProDentHub Personalized Study Plan",
            Some(CheckoutCampaign::MockExamRegistration) => "Universal Mock Exam - Premium Access",
            None => "ProDentHub Access",
        }
    }

    pub fn product_description(campaign_id: &str) -> &'static str {
        match Self::from_id(campaign_id) {
            Some(CheckoutCampaign::TeamCreation) => "Full access for your study team (6 months)",
            Some(CheckoutCampaign::ScholarshipApplication) => "Scholarship-subsidized access (3 months)",
            Some(CheckoutCampaign::DiscountPurchase) => "Discounted access to ADC exam preparation",
            Some(CheckoutCampaign::PersonalizedPlan) => "Tailored study plan based on your performance",
            Some(CheckoutCampaign::MockExamRegistration) => "Premium analytics and statistics",
            None => "ADC exam preparation",
        }
    }

    pub fn email_subject(campaign_id: &str) -> &'static str {
        match Self::from_id(campaign_id) {
            Some(CheckoutCampaign::TeamCreation) => "Your Team Has Been Created - ProDentHub",
            Some(CheckoutCampaign::ScholarshipApplication) => "Scholarship Approved - ProDentHub",
            Some(CheckoutCampaign::DiscountPurchase) => "Purchase Confirmed - ProDentHub",
            Some(CheckoutCampaign::PersonalizedPlan) => "Your Personalized Plan is Ready - ProDentHub",
            Some(CheckoutCampaign::MockExamRegistration) => {
                "Mock Exam Registration Confirmed - ProDentHub"
            }
            None => "Purchase Confirmation - ProDentHub",
        }
    }
}
