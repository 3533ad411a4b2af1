//! Prompt assembly and parsing of generated copy.

use crate::models::{Campaign, ContentType, Template};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

fn hashtag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"#\w+").expect("Invalid hashtag regex"))
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{(\w+)\}").expect("Invalid placeholder regex"))
}

/// Picks the prompt: an explicit custom prompt, then a stored template, then
/// the built-in prompt for the content type.
pub fn build_prompt(
    campaign: &Campaign,
    template: Option<&Template>,
    custom_prompt: Option<&str>,
    variables: &Map<String, Value>,
    content_type: ContentType,
) -> String {
    if let Some(prompt) = custom_prompt.filter(|p| !p.trim().is_empty()) {
        return prompt.to_string();
    }

    if let Some(template) = template {
        return fill_template(&template.prompt, campaign, variables);
    }

    default_prompt(campaign, content_type)
}

/// Replaces `{name}` placeholders. Request variables win over campaign fields;
/// unknown placeholders are left untouched.
pub fn fill_template(prompt: &str, campaign: &Campaign, variables: &Map<String, Value>) -> String {
    placeholder_pattern()
        .replace_all(prompt, |caps: &regex::Captures| {
            let key = &caps[1];
            if let Some(value) = variables.get(key) {
                return match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
            }
            match key {
                "campaignId" => campaign.campaign_id.clone(),
                "name" | "campaignName" => campaign.name.clone(),
                "description" => campaign.description.clone(),
                "landingPageUrl" => campaign.landing_page_url.clone(),
                "audience" => describe_audience(campaign),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn describe_audience(campaign: &Campaign) -> String {
    let audience = &campaign.target_audience;
    format!(
        "{} in {}, exam status: {}",
        audience.profession.join(", "),
        audience.location.join(", "),
        audience.exam_status.join(", ")
    )
}

fn default_prompt(campaign: &Campaign, content_type: ContentType) -> String {
    let context = format!(
        "Campaign: {}\nDescription: {}\nAudience: {}",
        campaign.name,
        campaign.description,
        describe_audience(campaign)
    );

    match content_type {
        ContentType::FacebookPost => format!(
            "Write an engaging Facebook post promoting the \"{}\" campaign.\n\n{}\nLanding page: {}\n\n\
             Guidelines:\n- Open with a hook in the first line\n- State the main benefit plainly\n\
             - End with a clear call to action\n- Add 2-3 relevant hashtags\n- Stay under 250 words\n\
             - Friendly, supportive tone",
            campaign.name, context, campaign.landing_page_url
        ),
        ContentType::BlogPost => format!(
            "Write a blog post about \"{}\".\n\n{}\n\nGuidelines:\n\
             - Put an SEO-friendly title on the first line\n- Engaging introduction\n\
             - 3-5 sections with subheadings and practical advice\n\
             - Conclude with a call to action\n- 800-1200 words, professional but approachable",
            campaign.name, context
        ),
        ContentType::AdCopy => format!(
            "Write ad copy for \"{}\".\n\n{}\n\nGuidelines:\n- Attention-grabbing headline\n\
             - Body of 50-100 words with a clear value proposition\n\
             - Strong call to action, with urgency where it fits",
            campaign.name, context
        ),
        ContentType::Email => format!(
            "Write a promotional email for \"{}\".\n\n{}\n\nGuidelines:\n- Subject line first\n\
             - Personal greeting and 2-3 short paragraphs\n- Clear value proposition\n\
             - Call-to-action button text\n- Professional, warm tone",
            campaign.name, context
        ),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedContent {
    pub title: Option<String>,
    pub body: String,
    pub word_count: usize,
    pub hashtags: Vec<String>,
}

/// Blog posts take their title from the first non-empty line; every other
/// type keeps the full completion as the body.
pub fn parse_generated(text: &str, content_type: ContentType) -> ParsedContent {
    let hashtags = hashtag_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();
    let word_count = text.split_whitespace().count();

    let (title, body) = match content_type {
        ContentType::BlogPost => {
            let mut lines = text.lines().filter(|line| !line.trim().is_empty());
            match lines.next() {
                Some(first) => {
                    let title = first.trim().trim_start_matches('#').trim().to_string();
                    let body = lines.collect::<Vec<_>>().join("\n");
                    (Some(title), body)
                }
                None => (None, String::new()),
            }
        }
        _ => (None, text.to_string()),
    };

    ParsedContent {
        title,
        body,
        word_count,
        hashtags,
    }
}

/// Appends UTM parameters so conversions can be attributed to the post.
pub fn with_utm(url: &str, platform: &str, content_type: ContentType, campaign_id: &str) -> String {
    let medium = if content_type == ContentType::AdCopy {
        "paid"
    } else {
        "organic"
    };
    let params = [
        ("utm_source", platform),
        ("utm_medium", medium),
        ("utm_campaign", campaign_id),
        ("utm_content", content_type.as_str()),
    ];

    match reqwest::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.query_pairs_mut().extend_pairs(params.iter());
            parsed.to_string()
        }
        Err(_) => {
            let query = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            let separator = if url.contains('?') { '&' } else { '?' };
            format!("{}{}{}", url, separator, query)
        }
    }
}
