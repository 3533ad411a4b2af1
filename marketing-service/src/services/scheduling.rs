//! Decides when the automation run should produce or publish content.

use crate::models::{Campaign, Content, ContentStatus, ContentType};
use chrono::{DateTime, Datelike, Utc, Weekday};

const DEFAULT_THRICE_WEEKLY: [Weekday; 3] = [Weekday::Mon, Weekday::Wed, Weekday::Fri];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn is_listed(days: &[String], today: Weekday) -> bool {
    let name = weekday_name(today);
    days.iter().any(|d| d.eq_ignore_ascii_case(name))
}

/// At most one generation per calendar day (UTC), on the days the campaign's
/// content schedule selects.
pub fn should_generate_content(campaign: &Campaign, now: DateTime<Utc>) -> bool {
    let schedule = &campaign.content_schedule;
    if !schedule.auto_generate {
        return false;
    }

    if let Some(last) = schedule.last_content_generated {
        if last.date_naive() == now.date_naive() {
            return false;
        }
    }

    let today = now.weekday();
    match schedule.frequency.as_str() {
        "daily" => true,
        "weekly" => is_listed(&schedule.days_of_week, today),
        "3_times_per_week" => {
            if schedule.days_of_week.is_empty() {
                DEFAULT_THRICE_WEEKLY.contains(&today)
            } else {
                is_listed(&schedule.days_of_week, today)
            }
        }
        _ => false,
    }
}

pub fn content_type_for_platform(platform: &str) -> ContentType {
    match platform {
        "blog" => ContentType::BlogPost,
        "email" => ContentType::Email,
        _ => ContentType::FacebookPost,
    }
}

pub fn is_due(content: &Content, now: DateTime<Utc>) -> bool {
    content.status == ContentStatus::Scheduled
        && content.scheduled_at.is_some_and(|at| at <= now)
}
