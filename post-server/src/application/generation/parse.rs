use serde::Deserialize;

use crate::domain::post::EngagementStats;

pub const MAX_TIPS: usize = 5;

#[derive(Deserialize)]
struct EngagementScores {
    likes: f64,
    comments: f64,
    shares: f64,
    clicks: f64,
    overall: f64,
}

/// Comma-separated tags, each normalized to a leading `#`. Empty entries dropped.
pub fn hashtags(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty() && *tag != "#")
        .map(|tag| {
            if tag.starts_with('#') {
                tag.to_string()
            } else {
                format!("#{tag}")
            }
        })
        .collect()
}

/// Strict: the whole trimmed response must be the five-metric JSON object.
pub fn engagement(text: &str) -> Result<EngagementStats, serde_json::Error> {
    let scores: EngagementScores = serde_json::from_str(text.trim())?;
    Ok([
        ("likes", scores.likes),
        ("comments", scores.comments),
        ("shares", scores.shares),
        ("clicks", scores.clicks),
        ("overall", scores.overall),
    ]
    .into_iter()
    .map(|(metric, score)| (metric.to_string(), score))
    .collect())
}

/// One tip per non-blank line, numbering and bullets stripped, at most five.
pub fn tips(text: &str) -> Vec<String> {
    text.lines()
        .map(strip_marker)
        .filter(|tip| !tip.is_empty())
        .map(str::to_string)
        .take(MAX_TIPS)
        .collect()
}

fn strip_marker(line: &str) -> &str {
    let line = line.trim().trim_start_matches(['-', '*', '•']).trim_start();
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix(['.', ')', '、', ':']) {
            return rest.trim();
        }
    }
    line
}
