//! Assessment content: title, shuffle and rule-separated questions.

use std::sync::LazyLock;

use freetext_config::FreetextConfig;
use regex::Regex;

use super::entries::{is_strict_comma_config, parse_bool, strip_tags};
use super::{AssessmentConfig, parse_with_options};

/// Title used when an assessment does not name one.
pub const DEFAULT_TITLE: &str = "Assessment";

static RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<hr[^>]*>").unwrap());

static TITLE_PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<p(?:\s[^>]*)?>\s*title:\s*([^<]*?)\s*</p>").unwrap());

static SHUFFLE_PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<p(?:\s[^>]*)?>\s*shuffle:\s*(true|false|yes|no|1|0)\s*</p>").unwrap()
});

/// Remove the first paragraph matching `pattern`, returning its value.
///
/// A paragraph that is a whole comma-separated config line is left for the
/// question parser, which reads assessment keys from it as well.
fn take_paragraph(section: &mut String, pattern: &Regex) -> Option<String> {
    let (range, value) = {
        let caps = pattern.captures(section)?;
        let whole = caps.get(0)?;
        let value = caps.get(1)?.as_str().trim();
        if value.contains(',') && is_strict_comma_config(&strip_tags(whole.as_str())) {
            return None;
        }
        (whole.range(), value.to_owned())
    };
    section.replace_range(range, "");
    Some(value)
}

/// Parse an assessment's inner content.
///
/// Questions are separated by rule elements. Assessment-level `title:` and
/// `shuffle:` are read from the first section only and removed from it before
/// that section is parsed as a question. Sections whose question is empty are
/// dropped.
pub fn parse_assessment(content: &str, settings: &FreetextConfig) -> AssessmentConfig {
    let mut title: Option<String> = None;
    let mut shuffle: Option<bool> = None;
    let mut questions = Vec::new();

    for (index, section) in RULE.split(content).enumerate() {
        let mut section = section.trim().to_owned();
        if index == 0 {
            title = take_paragraph(&mut section, &TITLE_PARAGRAPH);
            shuffle = take_paragraph(&mut section, &SHUFFLE_PARAGRAPH).map(|v| parse_bool(&v));
            section = section.trim().to_owned();
        }
        if section.is_empty() {
            continue;
        }

        let parsed = parse_with_options(&section, settings);
        if index == 0 {
            title = title.or(parsed.options.title);
            shuffle = shuffle.or(parsed.options.shuffle);
        }

        if parsed.config.question.trim().is_empty() {
            tracing::debug!(section = index, "Assessment section without question dropped");
            continue;
        }
        questions.push(parsed.config);
    }

    AssessmentConfig {
        title: title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
        shuffle,
        questions,
    }
}
