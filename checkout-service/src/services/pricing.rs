//! Price calculations shared by the pricing routes and checkout.
//!
//! All amounts are AUD in major units, rounded to cents.

use crate::models::{DiscountType, RegistrationType};
use serde::Serialize;
use service_core::error::AppError;
use std::str::FromStr;
use thiserror::Error;

pub const TEAM_PLAN_PRICE: f64 = 299.0;
pub const INDIVIDUAL_FULL_PRICE: f64 = 199.0;
pub const TEAM_MIN_MEMBERS: u32 = 2;
pub const TEAM_MAX_MEMBERS: u32 = 5;

pub const SCHOLARSHIP_BASE_PRICE: f64 = 199.0;
pub const SCHOLARSHIP_MAX_PERCENT: u32 = 75;

pub const MOCK_EXAM_PREMIUM_PRICE: f64 = 29.0;
pub const DEFAULT_EXAM_SCORE: f64 = 65.0;

#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("Team must have 2-5 members")]
    TeamSize,
    #[error("Invalid number of attempts")]
    Attempts,
    #[error("Score must be between 0 and 100")]
    ExamScore,
    #[error("Invalid financial need level")]
    FinancialNeed,
    #[error("All scores must be between 1 and 10")]
    AssessmentScore,
    #[error("Minimum purchase of ${0:.2} required")]
    MinimumPurchase(f64),
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        AppError::BadRequest(anyhow::Error::new(err))
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Plan {
    pub id: &'static str,
    pub duration: &'static str,
    pub price: f64,
}

pub const PLANS: [Plan; 4] = [
    Plan { id: "basic", duration: "1month", price: 49.0 },
    Plan { id: "standard", duration: "3months", price: 129.0 },
    Plan { id: "full", duration: "6months", price: 199.0 },
    Plan { id: "premium", duration: "12months", price: 299.0 },
];

pub fn plan(id: &str) -> Option<&'static Plan> {
    PLANS.iter().find(|p| p.id == id)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamPrice {
    pub total_price: f64,
    pub member_count: u32,
    pub price_per_member: f64,
    /// Against everyone buying the individual full plan.
    pub savings: f64,
}

/// `member_count` includes the leader.
pub fn team_price(member_count: u32) -> Result<TeamPrice, PricingError> {
    if !(TEAM_MIN_MEMBERS..=TEAM_MAX_MEMBERS).contains(&member_count) {
        return Err(PricingError::TeamSize);
    }
    let per_member = TEAM_PLAN_PRICE / member_count as f64;
    Ok(TeamPrice {
        total_price: TEAM_PLAN_PRICE,
        member_count,
        price_per_member: round2(per_member),
        savings: round2((INDIVIDUAL_FULL_PRICE - per_member) * member_count as f64),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinancialNeed {
    Low,
    Medium,
    High,
}

impl FromStr for FinancialNeed {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(FinancialNeed::Low),
            "Medium" => Ok(FinancialNeed::Medium),
            "High" => Ok(FinancialNeed::High),
            _ => Err(PricingError::FinancialNeed),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScholarshipBreakdown {
    pub attempts_bonus: u32,
    pub score_bonus: u32,
    pub need_bonus: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScholarshipQuote {
    pub base_price: f64,
    pub eligibility_score: u32,
    pub scholarship_percent: u32,
    pub scholarship_amount: f64,
    pub final_price: f64,
    pub breakdown: ScholarshipBreakdown,
}

/// More attempts, lower scores and higher need earn more, capped at 75%.
pub fn scholarship(
    attempts: u32,
    last_score: f64,
    need: FinancialNeed,
) -> Result<ScholarshipQuote, PricingError> {
    if !(1..=10).contains(&attempts) {
        return Err(PricingError::Attempts);
    }
    if !(0.0..=100.0).contains(&last_score) {
        return Err(PricingError::ExamScore);
    }

    let attempts_bonus = match attempts {
        4.. => 25,
        3 => 20,
        2 => 10,
        _ => 0,
    };
    let score_bonus = if last_score < 40.0 {
        30
    } else if last_score < 55.0 {
        20
    } else if last_score < 65.0 {
        15
    } else if last_score < 75.0 {
        10
    } else {
        0
    };
    let need_bonus = match need {
        FinancialNeed::High => 25,
        FinancialNeed::Medium => 15,
        FinancialNeed::Low => 5,
    };

    let percent = (attempts_bonus + score_bonus + need_bonus).min(SCHOLARSHIP_MAX_PERCENT);
    let amount = SCHOLARSHIP_BASE_PRICE * percent as f64 / 100.0;

    Ok(ScholarshipQuote {
        base_price: SCHOLARSHIP_BASE_PRICE,
        eligibility_score: percent,
        scholarship_percent: percent,
        scholarship_amount: round2(amount),
        final_price: round2(SCHOLARSHIP_BASE_PRICE - amount),
        breakdown: ScholarshipBreakdown {
            attempts_bonus,
            score_bonus,
            need_bonus,
        },
    })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiscountQuote {
    pub original_price: f64,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub discount_amount: f64,
    pub final_price: f64,
    pub savings_percent: u32,
}

/// The discount never exceeds the original price.
pub fn discount(
    original_price: f64,
    discount_type: DiscountType,
    discount_value: f64,
    max_discount: Option<f64>,
    min_purchase: f64,
) -> Result<DiscountQuote, PricingError> {
    if original_price < min_purchase {
        return Err(PricingError::MinimumPurchase(min_purchase));
    }

    let mut amount = match discount_type {
        DiscountType::Percentage => {
            let raw = original_price * discount_value / 100.0;
            match max_discount {
                Some(cap) if cap > 0.0 && raw > cap => cap,
                _ => raw,
            }
        }
        DiscountType::FixedAmount => discount_value,
    };
    amount = amount.clamp(0.0, original_price);

    let savings_percent = if original_price > 0.0 {
        (amount / original_price * 100.0).round() as u32
    } else {
        0
    };

    Ok(DiscountQuote {
        original_price,
        discount_type,
        discount_value,
        discount_amount: round2(amount),
        final_price: round2(original_price - amount),
        savings_percent,
    })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClusterPlan {
    pub cluster: u8,
    pub name: &'static str,
    pub duration: &'static str,
    pub price: f64,
    pub reason: &'static str,
    pub features: &'static [&'static str],
}

const CLINICAL_GAP: ClusterPlan = ClusterPlan {
    cluster: 1,
    name: "Clinical Knowledge Gap",
    duration: "3months",
    price: 179.0,
    reason: "Your clinical case analysis needs improvement, but your theoretical knowledge is strong. Focus on practical application.",
    features: &[
        "100+ Clinical Case Studies",
        "Step-by-Step Analysis Videos",
        "Weekly Mock Exams",
        "1-on-1 Mentorship Session",
        "Clinical Reasoning Workshop",
    ],
};

const THEORY_FUNDAMENTALS: ClusterPlan = ClusterPlan {
    cluster: 2,
    name: "Theory Fundamentals",
    duration: "4months",
    price: 199.0,
    reason: "Your theoretical foundations need strengthening. We'll build a solid knowledge base systematically.",
    features: &[
        "Comprehensive Theory Review",
        "Topic-by-Topic Video Lectures",
        "Daily Practice Quizzes",
        "Spaced Repetition System",
        "Theory Mastery Tracker",
    ],
};

const TIME_MANAGEMENT: ClusterPlan = ClusterPlan {
    cluster: 3,
    name: "Time Management",
    duration: "2months",
    price: 149.0,
    reason: "You have the knowledge, but need to improve speed and exam strategy. Let's optimize your performance.",
    features: &[
        "Timed Practice Sessions",
        "Test-Taking Strategies Workshop",
        "Speed Reading Techniques",
        "Question Prioritization Training",
        "50+ Speed Drills",
    ],
};

const COMPREHENSIVE_REVIEW: ClusterPlan = ClusterPlan {
    cluster: 4,
    name: "Comprehensive Review",
    duration: "6months",
    price: 249.0,
    reason: "You need a comprehensive review across all areas. Our full program will cover all your needs systematically.",
    features: &[
        "Full Access to All Resources",
        "Personalized Study Plan",
        "Weekly 1-on-1 Coaching",
        "Unlimited Mock Exams",
        "Performance Analytics Dashboard",
        "Study Group Access",
    ],
};

/// Picks a study plan from 1-10 self-assessment scores. The first matching
/// rule wins.
pub fn personalized_plan(
    clinical: f64,
    theory: f64,
    time: f64,
    exam_score: Option<f64>,
) -> Result<ClusterPlan, PricingError> {
    if [clinical, theory, time]
        .iter()
        .any(|score| !(1.0..=10.0).contains(score))
    {
        return Err(PricingError::AssessmentScore);
    }
    let exam_score = exam_score.unwrap_or(DEFAULT_EXAM_SCORE);
    let average = (clinical + theory + time) / 3.0;

    let plan = if clinical <= 5.0 && theory >= 6.0 {
        CLINICAL_GAP
    } else if theory <= 5.0 && average < 6.0 {
        THEORY_FUNDAMENTALS
    } else if time <= 5.0 && average >= 6.0 && exam_score >= 60.0 {
        TIME_MANAGEMENT
    } else {
        COMPREHENSIVE_REVIEW
    };
    Ok(plan)
}

pub fn mock_exam_price(registration_type: RegistrationType) -> f64 {
    match registration_type {
        RegistrationType::Free => 0.0,
        RegistrationType::Premium => MOCK_EXAM_PREMIUM_PRICE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEEDS: [FinancialNeed; 3] = [FinancialNeed::Low, FinancialNeed::Medium, FinancialNeed::High];

    #[test]
    fn team_total_is_reproduced_by_members() {
        for count in TEAM_MIN_MEMBERS..=TEAM_MAX_MEMBERS {
            let price = team_price(count).unwrap();
            assert_eq!(price.total_price, TEAM_PLAN_PRICE);
            let reconstructed = price.price_per_member * count as f64;
            assert!((reconstructed - TEAM_PLAN_PRICE).abs() <= 0.01 * count as f64);
            assert!(price.savings > 0.0);
        }
    }

    #[test]
    fn team_of_three_matches_known_values() {
        let price = team_price(3).unwrap();
        assert_eq!(price.price_per_member, 99.67);
        assert_eq!(price.savings, 298.0);
    }

    #[test]
    fn team_size_outside_range_is_rejected() {
        assert_eq!(team_price(1), Err(PricingError::TeamSize));
        assert_eq!(team_price(6), Err(PricingError::TeamSize));
        assert_eq!(PricingError::TeamSize.to_string(), "Team must have 2-5 members");
    }

    #[test]
    fn scholarship_is_capped_and_consistent_across_grid() {
        for attempts in 1..=10 {
            for score in 0..=100 {
                for need in NEEDS {
                    let quote = scholarship(attempts, score as f64, need).unwrap();
                    assert!(quote.scholarship_percent <= SCHOLARSHIP_MAX_PERCENT);
                    assert!(quote.final_price >= 0.0);
                    assert!(
                        (quote.scholarship_amount + quote.final_price - SCHOLARSHIP_BASE_PRICE).abs()
                            < 0.011
                    );
                    let b = &quote.breakdown;
                    assert_eq!(
                        quote.scholarship_percent,
                        (b.attempts_bonus + b.score_bonus + b.need_bonus).min(SCHOLARSHIP_MAX_PERCENT)
                    );
                }
            }
        }
    }

    #[test]
    fn scholarship_never_shrinks_with_more_attempts_or_lower_scores() {
        for need in NEEDS {
            for score in 0..=100 {
                for attempts in 1..10 {
                    let fewer = scholarship(attempts, score as f64, need).unwrap();
                    let more = scholarship(attempts + 1, score as f64, need).unwrap();
                    assert!(more.scholarship_percent >= fewer.scholarship_percent);
                }
            }
            for attempts in 1..=10 {
                for score in 1..=100 {
                    let higher = scholarship(attempts, score as f64, need).unwrap();
                    let lower = scholarship(attempts, (score - 1) as f64, need).unwrap();
                    assert!(lower.scholarship_percent >= higher.scholarship_percent);
                }
            }
        }
    }

    #[test]
    fn scholarship_example() {
        let quote = scholarship(3, 50.0, FinancialNeed::Medium).unwrap();
        assert_eq!(quote.scholarship_percent, 55);
        assert_eq!(quote.scholarship_amount, 109.45);
        assert_eq!(quote.final_price, 89.55);
    }

    #[test]
    fn scholarship_validation() {
        assert_eq!(scholarship(0, 50.0, FinancialNeed::Low), Err(PricingError::Attempts));
        assert_eq!(scholarship(11, 50.0, FinancialNeed::Low), Err(PricingError::Attempts));
        assert_eq!(scholarship(2, 101.0, FinancialNeed::Low), Err(PricingError::ExamScore));
        assert_eq!("Extreme".parse::<FinancialNeed>(), Err(PricingError::FinancialNeed));
    }

    #[test]
    fn discount_never_exceeds_original() {
        for original in [0.0, 10.0, 49.0, 199.0, 299.0] {
            for value in [0.0, 5.0, 20.0, 50.0, 100.0, 150.0, 500.0] {
                for kind in [DiscountType::Percentage, DiscountType::FixedAmount] {
                    let quote = discount(original, kind, value, None, 0.0).unwrap();
                    assert!(quote.discount_amount <= original);
                    assert!(quote.final_price >= 0.0);
                    assert!(quote.savings_percent <= 100);
                }
            }
        }
    }

    #[test]
    fn percentage_discount_respects_cap() {
        let quote = discount(199.0, DiscountType::Percentage, 50.0, Some(40.0), 0.0).unwrap();
        assert_eq!(quote.discount_amount, 40.0);
        assert_eq!(quote.final_price, 159.0);
        assert_eq!(quote.savings_percent, 20);
    }

    #[test]
    fn minimum_purchase_is_enforced() {
        let err = discount(49.0, DiscountType::FixedAmount, 10.0, None, 100.0).unwrap_err();
        assert_eq!(err.to_string(), "Minimum purchase of $100.00 required");
    }

    #[test]
    fn clusters_follow_rule_order() {
        assert_eq!(personalized_plan(4.0, 7.0, 8.0, None).unwrap().cluster, 1);
        assert_eq!(personalized_plan(6.0, 4.0, 5.0, None).unwrap().cluster, 2);
        assert_eq!(personalized_plan(7.0, 7.0, 4.0, Some(70.0)).unwrap().cluster, 3);
        assert_eq!(personalized_plan(7.0, 7.0, 4.0, Some(50.0)).unwrap().cluster, 4);
        assert_eq!(personalized_plan(8.0, 8.0, 8.0, None).unwrap().price, 249.0);
    }

    #[test]
    fn every_valid_assessment_gets_a_plan() {
        for clinical in 1..=10 {
            for theory in 1..=10 {
                for time in 1..=10 {
                    let plan =
                        personalized_plan(clinical as f64, theory as f64, time as f64, None).unwrap();
                    assert!((1..=4).contains(&plan.cluster));
                }
            }
        }
        assert_eq!(
            personalized_plan(0.0, 5.0, 5.0, None),
            Err(PricingError::AssessmentScore)
        );
    }

    #[test]
    fn plans_and_mock_exam_prices() {
        assert_eq!(plan("full").unwrap().price, 199.0);
        assert!(plan("lifetime").is_none());
        assert_eq!(mock_exam_price(RegistrationType::Premium), 29.0);
        assert_eq!(mock_exam_price(RegistrationType::Free), 0.0);
    }
}
