//! Configuration grammar of question and assessment admonitions.
//!
//! A question's inner content is read by the first tier in
//! [`tiers::TIERS`] that claims it:
//!
//! 1. Separator form: question content, `<hr>` (or `---`), then
//!    `marks: 10, type: long, rows: 4`.
//! 2. A single comma-separated config paragraph among the content.
//! 3. Scattered `<p>key: value</p>` paragraphs, removed one by one so that
//!    rich content (code, images, diagrams) around them survives untouched.
//! 4. Plain `key: value` lines for content without markup.
//!
//! Parsing never fails. Malformed values fall back to defaults with a warning.

mod assessment;
mod entries;
mod tiers;

use freetext_config::{FreetextConfig, QuestionType};

pub use assessment::{DEFAULT_TITLE, parse_assessment};

use tiers::{ParseOutcome, Parsed, TIERS};

/// Normalized configuration of one question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionConfig {
    /// Question body, trusted HTML from the documentation renderer.
    pub question: String,
    pub question_type: QuestionType,
    pub marks: u32,
    pub placeholder: String,
    /// Explicit answer rows; `None` uses the type's default.
    pub rows: Option<u32>,
    /// Reveal the sample answer after submission.
    pub show_answer: bool,
    /// Sample answer, echoed back verbatim.
    pub answer: String,
}

impl QuestionConfig {
    /// Configuration with every field at its default.
    pub fn with_defaults(settings: &FreetextConfig) -> Self {
        Self {
            question: String::new(),
            question_type: settings.default_question_type,
            marks: settings.default_marks,
            placeholder: settings.default_placeholder.clone(),
            rows: None,
            show_answer: settings.default_show_answer,
            answer: String::new(),
        }
    }

    /// Answer rows: explicit value, else the default for the question type.
    pub fn resolved_rows(&self, settings: &FreetextConfig) -> u32 {
        self.rows
            .filter(|rows| *rows > 0)
            .unwrap_or_else(|| settings.rows_for(self.question_type))
    }
}

/// Configuration of one assessment block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssessmentConfig {
    pub title: String,
    /// Explicit shuffle setting; `None` defers to the global default.
    pub shuffle: Option<bool>,
    /// Questions in document order.
    pub questions: Vec<QuestionConfig>,
}

impl AssessmentConfig {
    /// Whether questions are shuffled on page load.
    pub fn resolved_shuffle(&self, settings: &FreetextConfig) -> bool {
        self.shuffle.unwrap_or(settings.shuffle_questions)
    }

    /// Sum of all question marks.
    pub fn total_marks(&self) -> u32 {
        self.questions.iter().map(|q| q.marks).sum()
    }
}

/// Parse a question's inner content (title paragraph already removed).
pub fn parse_question(content: &str, settings: &FreetextConfig) -> QuestionConfig {
    parse_with_options(content, settings).config
}

fn parse_with_options(content: &str, settings: &FreetextConfig) -> Parsed {
    for tier in TIERS {
        if let ParseOutcome::Matched(parsed) = tier.parse(content, settings) {
            tracing::debug!(tier = tier.name(), "Question configuration parsed");
            return parsed;
        }
    }
    // Plain text claims everything; only reachable if the tier list changes.
    Parsed {
        config: QuestionConfig {
            question: content.trim().to_owned(),
            ..QuestionConfig::with_defaults(settings)
        },
        options: entries::AssessmentOptions::default(),
    }
}
