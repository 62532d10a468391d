//! Recognized configuration keys and the comma-separated config section.

use std::str::FromStr;
use std::sync::LazyLock;

use freetext_config::{FreetextConfig, QuestionType};
use regex::Regex;

use super::QuestionConfig;

/// Longest tag-stripped text still considered a config section.
const MAX_SECTION_LEN: usize = 200;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Keys accepted in question and assessment configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ConfigKey {
    Question,
    Type,
    Marks,
    Placeholder,
    Rows,
    ShowAnswer,
    Answer,
    Title,
    Shuffle,
}

impl FromStr for ConfigKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "question" => Ok(Self::Question),
            "type" => Ok(Self::Type),
            "marks" => Ok(Self::Marks),
            "placeholder" => Ok(Self::Placeholder),
            "rows" => Ok(Self::Rows),
            "show_answer" => Ok(Self::ShowAnswer),
            "answer" => Ok(Self::Answer),
            "title" => Ok(Self::Title),
            "shuffle" => Ok(Self::Shuffle),
            _ => Err(()),
        }
    }
}

impl ConfigKey {
    fn as_str(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Type => "type",
            Self::Marks => "marks",
            Self::Placeholder => "placeholder",
            Self::Rows => "rows",
            Self::ShowAnswer => "show_answer",
            Self::Answer => "answer",
            Self::Title => "title",
            Self::Shuffle => "shuffle",
        }
    }

    /// Whether the key configures a question (as opposed to an assessment).
    pub(crate) fn is_question_field(self) -> bool {
        !matches!(self, Self::Title | Self::Shuffle)
    }
}

/// Assessment-level values found while parsing a question's configuration.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct AssessmentOptions {
    pub title: Option<String>,
    pub shuffle: Option<bool>,
}

/// Configuration values in the order they were written, not yet converted.
#[derive(Debug, Default)]
pub(crate) struct ConfigEntries {
    entries: Vec<(ConfigKey, String)>,
}

impl ConfigEntries {
    pub(crate) fn push(&mut self, key: ConfigKey, value: impl Into<String>) {
        self.entries.push((key, value.into()));
    }

    /// Append `other`, whose entries take precedence when applied.
    pub(crate) fn extend(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Convert and apply every entry, returning assessment-level values.
    ///
    /// Conversion failures keep the field's default and log a warning.
    pub(crate) fn apply(
        self,
        config: &mut QuestionConfig,
        settings: &FreetextConfig,
    ) -> AssessmentOptions {
        let mut options = AssessmentOptions::default();
        for (key, value) in self.entries {
            match key {
                ConfigKey::Question => config.question = value,
                ConfigKey::Placeholder => config.placeholder = value,
                ConfigKey::Answer => config.answer = value,
                ConfigKey::Title => options.title = Some(value),
                ConfigKey::ShowAnswer => config.show_answer = parse_bool(&value),
                ConfigKey::Shuffle => options.shuffle = Some(parse_bool(&value)),
                ConfigKey::Type => match QuestionType::from_str(&value) {
                    Ok(question_type) => config.question_type = question_type,
                    Err(e) => tracing::warn!(value = %value, "{e}, keeping default"),
                },
                ConfigKey::Marks => {
                    config.marks = value.trim().parse().unwrap_or_else(|_| {
                        tracing::warn!(
                            key = key.as_str(),
                            value = %value,
                            "Marks must be a non-negative integer, using default"
                        );
                        settings.default_marks
                    });
                }
                ConfigKey::Rows => config.rows = parse_rows(&value),
            }
        }
        options
    }
}

/// `true`, `yes` and `1` (any case) are true; everything else is false.
pub(crate) fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "1"
    )
}

/// Explicit row count; absent when not a positive integer.
fn parse_rows(value: &str) -> Option<u32> {
    match value.trim().parse::<i64>() {
        Ok(rows) if rows > 0 => u32::try_from(rows).ok(),
        Ok(_) => {
            tracing::debug!(value = %value, "Non-positive rows, using type default");
            None
        }
        Err(_) => {
            tracing::warn!(value = %value, "Rows must be an integer, using type default");
            None
        }
    }
}

/// Remove all tags from a fragment.
pub(crate) fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, "").into_owned()
}

/// Split one `key: value` item, stripping matching quotes around the value.
fn split_item(item: &str) -> Option<(&str, &str)> {
    let (key, value) = item.split_once(':')?;
    let value = value.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| {
            value
                .strip_prefix(*q)
                .and_then(|v| v.strip_suffix(*q))
        })
        .unwrap_or(value);
    Some((key.trim(), unquoted))
}

/// Parse comma-separated `key: value` items.
///
/// Items without a colon and unknown keys are reported and skipped.
pub(crate) fn parse_comma_items(text: &str) -> ConfigEntries {
    let mut entries = ConfigEntries::default();
    for item in text.split(',').map(str::trim).filter(|i| !i.is_empty()) {
        let Some((key, value)) = split_item(item) else {
            tracing::warn!(item = %item, "Invalid config item, expected 'key: value'");
            continue;
        };
        match ConfigKey::from_str(key) {
            Ok(key) => entries.push(key, value),
            Err(()) => tracing::warn!(key = %key, "Unknown config key ignored"),
        }
    }
    entries
}

/// Whether every comma item is `key: value` with a recognized key.
pub(crate) fn is_strict_comma_config(text: &str) -> bool {
    let mut items = text.split(',').map(str::trim).filter(|i| !i.is_empty()).peekable();
    items.peek().is_some()
        && items.all(|item| {
            split_item(item).is_some_and(|(key, _)| ConfigKey::from_str(key).is_ok())
        })
}

/// Whether a line starts with a recognized `key:`.
fn starts_with_key(line: &str) -> bool {
    line.split_once(':')
        .is_some_and(|(key, _)| ConfigKey::from_str(key).is_ok())
}

/// How the text after a separator was read.
#[derive(Debug)]
pub(crate) enum ConfigSection {
    /// Comma-separated configuration, possibly empty.
    Entries(ConfigEntries),
    /// One `key: value` per line. Recognized as configuration but not
    /// applied; the question keeps its defaults.
    LineBased,
    /// Not configuration; the separator belongs to the question content.
    NotConfig,
}

/// Parse the config section that follows a separator.
pub(crate) fn parse_config_section(section: &str) -> ConfigSection {
    let text = strip_tags(section);
    let text = text.trim();
    if text.is_empty() {
        return ConfigSection::Entries(ConfigEntries::default());
    }

    if text.chars().count() > MAX_SECTION_LEN {
        tracing::debug!(
            len = text.len(),
            "Text after separator too long for configuration"
        );
        return ConfigSection::NotConfig;
    }

    if text.contains('\n') && !text.contains(',') {
        if text.lines().any(|line| starts_with_key(line.trim())) {
            tracing::warn!(
                "Configuration uses one line per key; expected comma-separated \
                 format like 'marks: 10, type: long, rows: 5'. Using defaults"
            );
            return ConfigSection::LineBased;
        }
        return ConfigSection::NotConfig;
    }

    let entries = parse_comma_items(text);
    if entries.is_empty() {
        tracing::warn!(section = %text, "No configuration found after separator");
        return ConfigSection::NotConfig;
    }
    ConfigSection::Entries(entries)
}
