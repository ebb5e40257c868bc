use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::dto::response::ScoreRaw;

static FRACTION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*/\s*(\d+(?:\.\d+)?)\s*$")
        .expect("FRACTION_REGEX is a valid regex pattern")
});

static PERCENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*%?\s*$").expect("PERCENT_REGEX is a valid regex pattern")
});

/// Percentage for display. `"got/total"` is converted, `"NN%"` and bare
/// numbers are taken as percentages already. `None` when the text matches
/// neither form or the total is zero.
pub fn score_percentage(score: &ScoreRaw) -> Option<u32> {
    match score {
        ScoreRaw::Number(n) => round_percentage(*n),
        ScoreRaw::Text(text) => {
            if let Some(caps) = FRACTION_REGEX.captures(text) {
                let got: f64 = caps[1].parse().ok()?;
                let total: f64 = caps[2].parse().ok()?;
                if total == 0.0 {
                    return None;
                }
                return round_percentage(got / total * 100.0);
            }
            let caps = PERCENT_REGEX.captures(text)?;
            round_percentage(caps[1].parse().ok()?)
        }
    }
}

/// `"70%"`, or the raw score text when it cannot be read as a percentage.
pub fn format_percentage(score: &ScoreRaw) -> String {
    match score_percentage(score) {
        Some(pct) => format!("{}%", pct),
        None => score.to_string(),
    }
}

fn round_percentage(value: f64) -> Option<u32> {
    if value.is_finite() && value >= 0.0 {
        Some(value.round() as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> ScoreRaw {
        ScoreRaw::Text(s.to_string())
    }

    #[test]
    fn fraction_is_converted() {
        assert_eq!(format_percentage(&text("7/10")), "70%");
        assert_eq!(format_percentage(&text(" 2 / 3 ")), "67%");
    }

    #[test]
    fn numeric_percentage_used_directly() {
        assert_eq!(format_percentage(&ScoreRaw::Number(82.0)), "82%");
        assert_eq!(format_percentage(&ScoreRaw::Number(82.4)), "82%");
    }

    #[test]
    fn percent_string_used_directly() {
        assert_eq!(format_percentage(&text("91%")), "91%");
        assert_eq!(score_percentage(&text("45")), Some(45));
    }

    #[test]
    fn unreadable_scores_fall_back_to_raw_text() {
        assert_eq!(score_percentage(&text("5/0")), None);
        assert_eq!(score_percentage(&text("pending")), None);
        assert_eq!(format_percentage(&text("pending")), "pending");
        assert_eq!(score_percentage(&ScoreRaw::Number(f64::NAN)), None);
    }
}
