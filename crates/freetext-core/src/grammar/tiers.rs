//! The ordered grammar tiers for a question's inner content.
//!
//! Each tier either claims the content ([`ParseOutcome::Matched`]) or declines
//! it ([`ParseOutcome::NotApplicable`]); [`TIERS`] are tried in order and the
//! first match wins.

use std::ops::Range;
use std::str::FromStr;
use std::sync::LazyLock;

use freetext_config::FreetextConfig;
use regex::Regex;

use super::entries::{
    self, AssessmentOptions, ConfigEntries, ConfigKey, ConfigSection, is_strict_comma_config,
};
use super::QuestionConfig;
use crate::escape::escape_html;

static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

static RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<hr[^>]*/?>").unwrap());

/// Preformatted and inline code, where separators are literal text.
static CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?si)<pre\b.*?</pre>|<code\b.*?</code>").unwrap());

static DASH_PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<p(?:\s[^>]*)?>\s*---\s*</p>").unwrap());

static PLAIN_PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<p(?:\s[^>]*)?>\s*([^<]*?)\s*</p>").unwrap());

static EMPTY_PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<p(?:\s[^>]*)?>\s*</p>").unwrap());

static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Standalone `key: value` paragraphs of the legacy form, in lookup order.
///
/// Numeric, boolean and type values are matched loosely so that malformed
/// values are still consumed and reported instead of leaking into the
/// question text.
static LEGACY_PARAGRAPHS: LazyLock<Vec<(ConfigKey, Regex)>> = LazyLock::new(|| {
    let text = |key: &str| format!(r"(?si)<p(?:\s[^>]*)?>\s*{key}:\s*(.*?)\s*</p>");
    let word = |key: &str| format!(r"(?i)<p(?:\s[^>]*)?>\s*{key}:\s*([^<]*?)\s*</p>");
    [
        (ConfigKey::Question, text("question")),
        (ConfigKey::Marks, word("marks")),
        (ConfigKey::Placeholder, text("placeholder")),
        (ConfigKey::ShowAnswer, word("show_answer")),
        (ConfigKey::Answer, text("answer")),
        (ConfigKey::Rows, word("rows")),
        (ConfigKey::Type, word("type")),
    ]
    .into_iter()
    .map(|(key, pattern)| (key, Regex::new(&pattern).unwrap()))
    .collect()
});

/// Configuration produced by a tier.
#[derive(Debug)]
pub(crate) struct Parsed {
    pub config: QuestionConfig,
    pub options: AssessmentOptions,
}

/// Result of trying one tier.
#[derive(Debug)]
pub(crate) enum ParseOutcome {
    Matched(Parsed),
    NotApplicable,
}

/// One way of reading a question's configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Tier {
    /// Question content, a rule (`<hr>` or `---`), then a comma config section.
    Separator,
    /// A single paragraph holding only comma-separated `key: value` items.
    CommaParagraph,
    /// Scattered `key: value` paragraphs among rich content.
    LegacyParagraphs,
    /// `key: value` lines in content without markup.
    PlainText,
}

/// Tiers in priority order.
pub(crate) const TIERS: [Tier; 4] = [
    Tier::Separator,
    Tier::CommaParagraph,
    Tier::LegacyParagraphs,
    Tier::PlainText,
];

impl Tier {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Separator => "separator",
            Self::CommaParagraph => "comma-paragraph",
            Self::LegacyParagraphs => "legacy-paragraphs",
            Self::PlainText => "plain-text",
        }
    }

    pub(crate) fn parse(self, content: &str, settings: &FreetextConfig) -> ParseOutcome {
        match self {
            Self::Separator => parse_separator(content, settings),
            Self::CommaParagraph => parse_comma_paragraph(content, settings),
            Self::LegacyParagraphs => parse_legacy(content, settings),
            Self::PlainText => parse_plain_text(content, settings),
        }
    }
}

fn is_html(content: &str) -> bool {
    ANY_TAG.is_match(content)
}

/// Split at the first rule element, else the first `<p>---</p>`, else the
/// first literal `---`. In markup, separators inside `<pre>` or `<code>` are
/// skipped.
fn split_at_separator(content: &str) -> Option<(&str, &str)> {
    let code: Vec<Range<usize>> = if is_html(content) {
        CODE.find_iter(content).map(|m| m.range()).collect()
    } else {
        Vec::new()
    };
    let in_code = |pos: usize| {
        let i = code.partition_point(|range| range.end <= pos);
        code.get(i).is_some_and(|range| range.start <= pos)
    };

    let separator = RULE
        .find_iter(content)
        .map(|m| m.range())
        .find(|range| !in_code(range.start))
        .or_else(|| {
            DASH_PARAGRAPH
                .find_iter(content)
                .map(|m| m.range())
                .find(|range| !in_code(range.start))
        })
        .or_else(|| {
            content
                .match_indices("---")
                .map(|(start, dashes)| start..start + dashes.len())
                .find(|range| !in_code(range.start))
        })?;
    Some((&content[..separator.start], &content[separator.end..]))
}

fn parse_separator(content: &str, settings: &FreetextConfig) -> ParseOutcome {
    let Some((question, section)) = split_at_separator(content) else {
        return ParseOutcome::NotApplicable;
    };
    let entries = match entries::parse_config_section(section) {
        ConfigSection::Entries(entries) => entries,
        ConfigSection::LineBased => ConfigEntries::default(),
        ConfigSection::NotConfig => return ParseOutcome::NotApplicable,
    };

    let question = question.trim();
    let mut config = QuestionConfig::with_defaults(settings);
    let options = entries.apply(&mut config, settings);
    // Content before the separator wins over a `question` entry.
    if !question.is_empty() {
        config.question = question.to_owned();
    }
    ParseOutcome::Matched(Parsed { config, options })
}

/// Remove empty paragraphs and collapse blank lines.
fn tidy(content: &str) -> String {
    let without_empty = EMPTY_PARAGRAPH.replace_all(content, "");
    BLANK_LINES
        .replace_all(&without_empty, "\n")
        .trim()
        .to_owned()
}

/// Combine an explicit `question` value with the content left after config
/// paragraphs were removed.
fn compose_question(explicit: &str, remaining: &str) -> String {
    let explicit = explicit.trim();
    match (explicit.is_empty(), remaining.is_empty()) {
        (true, _) => remaining.to_owned(),
        (false, true) => format!("<p>{explicit}</p>"),
        (false, false) => format!("<p>{explicit}</p>\n{remaining}"),
    }
}

fn remove_range(content: &str, range: Range<usize>) -> String {
    let mut out = String::with_capacity(content.len());
    out.push_str(&content[..range.start]);
    out.push_str(&content[range.end..]);
    out
}

fn parse_comma_paragraph(content: &str, settings: &FreetextConfig) -> ParseOutcome {
    if !is_html(content) {
        return ParseOutcome::NotApplicable;
    }
    let found = PLAIN_PARAGRAPH.captures_iter(content).find_map(|caps| {
        let text = caps.get(1)?.as_str();
        (text.contains(',') && is_strict_comma_config(text))
            .then(|| (caps.get(0).map_or(0..0, |m| m.range()), text))
    });
    let Some((range, text)) = found else {
        return ParseOutcome::NotApplicable;
    };

    // Scattered paragraphs may still accompany the comma paragraph; its items win.
    let (mut entries, remaining) = collect_legacy(&remove_range(content, range));
    entries.extend(entries::parse_comma_items(text));

    let mut config = QuestionConfig::with_defaults(settings);
    let options = entries.apply(&mut config, settings);
    config.question = compose_question(&config.question, &remaining);
    ParseOutcome::Matched(Parsed { config, options })
}

/// Consume standalone `key: value` paragraphs, returning their entries and
/// the tidied content left behind.
fn collect_legacy(content: &str) -> (ConfigEntries, String) {
    let mut remaining = content.to_owned();
    let mut entries = ConfigEntries::default();
    for (key, pattern) in LEGACY_PARAGRAPHS.iter() {
        let range = {
            let Some(caps) = pattern.captures(&remaining) else {
                continue;
            };
            let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            tracing::debug!(key = ?key, value = %value.as_str(), "Config paragraph found");
            entries.push(*key, value.as_str().trim());
            whole.range()
        };
        remaining = remove_range(&remaining, range);
    }
    (entries, tidy(&remaining))
}

fn parse_legacy(content: &str, settings: &FreetextConfig) -> ParseOutcome {
    if !is_html(content) {
        return ParseOutcome::NotApplicable;
    }

    let (entries, remaining) = collect_legacy(content);
    let mut config = QuestionConfig::with_defaults(settings);
    let options = entries.apply(&mut config, settings);
    config.question = compose_question(&config.question, &remaining);
    ParseOutcome::Matched(Parsed { config, options })
}

fn parse_plain_text(content: &str, settings: &FreetextConfig) -> ParseOutcome {
    let mut entries = ConfigEntries::default();
    let mut text_lines: Vec<&str> = Vec::new();
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let key = line
            .split_once(':')
            .and_then(|(key, value)| Some((ConfigKey::from_str(key).ok()?, value.trim())));
        match key {
            Some((key, value)) if key.is_question_field() => entries.push(key, value),
            _ => text_lines.push(line),
        }
    }

    let mut config = QuestionConfig::with_defaults(settings);
    let options = entries.apply(&mut config, settings);
    if config.question.is_empty() {
        config.question = text_lines.join("\n");
    }
    config.question = escape_html(&config.question);
    ParseOutcome::Matched(Parsed { config, options })
}
