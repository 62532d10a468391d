//! Settings for the freetext question transform.
//!
//! Parses `freetext.toml` with serde and provides auto-discovery of the
//! settings file in parent directories. Every option has a default, so an
//! empty (or missing) file yields a usable [`FreetextConfig`].
//!
//! Command-line settings can be applied during load via [`ConfigOverrides`].
//!
//! ## Path Expansion
//!
//! `debug_dir` supports `~`, `${VAR}` and `${VAR:-default}` expansion and is
//! resolved relative to the directory containing the settings file.

mod expand;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

/// Settings filename to search for.
const CONFIG_FILENAME: &str = "freetext.toml";

/// Directory (relative to the project root) for debug snapshots when
/// `debug_dir` is not set.
const DEFAULT_DEBUG_DIR: &str = ".freetext/debug";

/// Answer field size class of a question.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Single-paragraph answer.
    #[default]
    Short,
    /// Essay-style answer with a taller input.
    Long,
}

impl QuestionType {
    /// Lowercase name as written in question configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Long => "long",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is neither `short` nor `long`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid question type '{0}' (expected 'short' or 'long')")]
pub struct InvalidQuestionType(pub String);

impl FromStr for QuestionType {
    type Err = InvalidQuestionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "long" => Ok(Self::Long),
            _ => Err(InvalidQuestionType(s.to_owned())),
        }
    }
}

/// Command-line settings that override values from the settings file.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    /// Override debug snapshot writing.
    pub debug: Option<bool>,
    /// Override the debug snapshot directory.
    pub debug_dir: Option<PathBuf>,
    /// Override the global shuffle default for assessments.
    pub shuffle_questions: Option<bool>,
    /// Override style sheet injection.
    pub enable_css: Option<bool>,
}

/// Process-wide settings for the transform.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FreetextConfig {
    /// CSS class of a rendered single question.
    pub question_class: String,
    /// CSS class of a rendered assessment.
    pub assessment_class: String,
    /// CSS class of every answer field.
    pub answer_class: String,
    /// CSS class reserved for host page containers.
    pub container_class: String,
    /// Inject the style sheet into pages with questions.
    pub enable_css: bool,
    /// Emit theme variable references instead of static colors.
    pub dark_mode_support: bool,
    /// Shuffle assessment questions unless an assessment says otherwise.
    pub shuffle_questions: bool,
    /// Render a live character counter below each answer field.
    pub show_character_count: bool,
    /// Accepted for compatibility with older settings files. No behavior
    /// depends on it.
    pub enable_auto_save: bool,
    /// Rows of a `short` answer field.
    pub default_answer_rows: u32,
    /// Rows of a `long` answer field.
    pub default_long_answer_rows: u32,
    /// Placeholder of answer fields without an explicit one.
    pub default_placeholder: String,
    /// Marks of questions without an explicit value.
    pub default_marks: u32,
    /// Reveal the sample answer after submission unless configured otherwise.
    pub default_show_answer: bool,
    /// Type of questions without an explicit one.
    pub default_question_type: QuestionType,
    /// Write before/after snapshots of every transformed page.
    pub debug: bool,
    /// Snapshot directory as written in the settings file.
    debug_dir: Option<String>,

    /// Resolved snapshot directory (set after loading).
    #[serde(skip)]
    resolved_debug_dir: PathBuf,
    /// Path to the settings file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for FreetextConfig {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Settings error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Setting name (e.g., "`debug_dir`").
        field: String,
        /// Error message (e.g., "${`DUMP_DIR`} environment variable not found").
        message: String,
    },
}

/// Require a CSS class name to be usable inside a double-quoted attribute.
fn require_class_name(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    if value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>' | '&'))
    {
        return Err(ConfigError::Validation(format!(
            "{field} must be a single class name, got '{value}'"
        )));
    }
    Ok(())
}

/// Require a row count to be positive.
fn require_rows(value: u32, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl FreetextConfig {
    /// Load settings from file with optional command-line overrides.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `freetext.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// a value is invalid.
    pub fn load(
        config_path: Option<&Path>,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(overrides) = overrides {
            config.apply_overrides(overrides);
        }

        Ok(config)
    }

    /// Parse settings from a TOML string, resolving paths against `base`.
    ///
    /// # Errors
    ///
    /// Returns error if parsing, expansion or validation fails.
    pub fn from_toml_str(content: &str, base: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.resolve_paths(base)?;
        config.validate()?;
        Ok(config)
    }

    /// Directory that receives debug snapshots.
    #[must_use]
    pub fn debug_dir(&self) -> &Path {
        &self.resolved_debug_dir
    }

    /// Answer rows for a question of the given type.
    #[must_use]
    pub fn rows_for(&self, question_type: QuestionType) -> u32 {
        match question_type {
            QuestionType::Short => self.default_answer_rows,
            QuestionType::Long => self.default_long_answer_rows,
        }
    }

    /// Validate settings values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_class_name(&self.question_class, "question_class")?;
        require_class_name(&self.assessment_class, "assessment_class")?;
        require_class_name(&self.answer_class, "answer_class")?;
        require_class_name(&self.container_class, "container_class")?;
        require_rows(self.default_answer_rows, "default_answer_rows")?;
        require_rows(self.default_long_answer_rows, "default_long_answer_rows")?;
        Ok(())
    }

    /// Apply command-line overrides to the settings.
    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(debug) = overrides.debug {
            self.debug = debug;
        }
        if let Some(debug_dir) = &overrides.debug_dir {
            self.resolved_debug_dir.clone_from(debug_dir);
        }
        if let Some(shuffle) = overrides.shuffle_questions {
            self.shuffle_questions = shuffle;
        }
        if let Some(enable_css) = overrides.enable_css {
            self.enable_css = enable_css;
        }
    }

    /// Search for settings file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default settings with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default settings with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            question_class: "freetext-question".to_owned(),
            assessment_class: "freetext-assessment".to_owned(),
            answer_class: "freetext-answer".to_owned(),
            container_class: "freetext-container".to_owned(),
            enable_css: true,
            dark_mode_support: true,
            shuffle_questions: false,
            show_character_count: true,
            enable_auto_save: true,
            default_answer_rows: 3,
            default_long_answer_rows: 6,
            default_placeholder: "Enter your answer...".to_owned(),
            default_marks: 0,
            default_show_answer: true,
            default_question_type: QuestionType::Short,
            debug: false,
            debug_dir: None,
            resolved_debug_dir: base.join(DEFAULT_DEBUG_DIR),
            config_path: None,
        }
    }

    /// Load settings from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        let mut config = Self::from_toml_str(&content, config_dir)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Resolve the snapshot directory relative to the settings directory.
    fn resolve_paths(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        self.resolved_debug_dir = match &self.debug_dir {
            Some(raw) => config_dir.join(expand::expand_env(raw, "debug_dir")?),
            None => config_dir.join(DEFAULT_DEBUG_DIR),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = FreetextConfig::default_with_base(Path::new("/site"));
        assert_eq!(config.question_class, "freetext-question");
        assert_eq!(config.assessment_class, "freetext-assessment");
        assert_eq!(config.answer_class, "freetext-answer");
        assert_eq!(config.default_answer_rows, 3);
        assert_eq!(config.default_long_answer_rows, 6);
        assert_eq!(config.default_placeholder, "Enter your answer...");
        assert_eq!(config.default_marks, 0);
        assert_eq!(config.default_question_type, QuestionType::Short);
        assert!(config.default_show_answer);
        assert!(config.show_character_count);
        assert!(config.enable_css);
        assert!(!config.shuffle_questions);
        assert!(!config.debug);
        assert_eq!(config.debug_dir(), Path::new("/site/.freetext/debug"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = FreetextConfig::from_toml_str("", Path::new("/site")).unwrap();
        assert_eq!(config.default_answer_rows, 3);
        assert_eq!(config.default_placeholder, "Enter your answer...");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
question_class = "quiz-question"
assessment_class = "quiz-assessment"
shuffle_questions = true
show_character_count = false
default_answer_rows = 4
default_long_answer_rows = 10
default_placeholder = "Your answer"
default_marks = 2
default_show_answer = false
default_question_type = "long"
debug = true
debug_dir = "dumps"
"#;
        let config = FreetextConfig::from_toml_str(toml, Path::new("/site")).unwrap();
        assert_eq!(config.question_class, "quiz-question");
        assert_eq!(config.assessment_class, "quiz-assessment");
        assert!(config.shuffle_questions);
        assert!(!config.show_character_count);
        assert_eq!(config.default_answer_rows, 4);
        assert_eq!(config.default_long_answer_rows, 10);
        assert_eq!(config.default_placeholder, "Your answer");
        assert_eq!(config.default_marks, 2);
        assert!(!config.default_show_answer);
        assert_eq!(config.default_question_type, QuestionType::Long);
        assert!(config.debug);
        assert_eq!(config.debug_dir(), Path::new("/site/dumps"));
    }

    #[test]
    fn test_unknown_option_rejected() {
        let result = FreetextConfig::from_toml_str("auto_grade = true", Path::new("."));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_invalid_question_type_rejected() {
        let result =
            FreetextConfig::from_toml_str(r#"default_question_type = "essay""#, Path::new("."));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_negative_marks_rejected() {
        let result = FreetextConfig::from_toml_str("default_marks = -1", Path::new("."));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_rows_rejected() {
        let err =
            FreetextConfig::from_toml_str("default_answer_rows = 0", Path::new(".")).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("default_answer_rows"));
    }

    #[test]
    fn test_class_with_space_rejected() {
        let err = FreetextConfig::from_toml_str(r#"answer_class = "a b""#, Path::new("."))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("answer_class"));
    }

    #[test]
    fn test_empty_class_rejected() {
        let err = FreetextConfig::from_toml_str(r#"question_class = """#, Path::new("."))
            .unwrap_err();
        assert!(err.to_string().contains("question_class cannot be empty"));
    }

    #[test]
    fn test_debug_dir_expands_env() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("FREETEXT_TEST_DUMPS", "/tmp/ft-dumps");
        }
        let config =
            FreetextConfig::from_toml_str(r#"debug_dir = "${FREETEXT_TEST_DUMPS}""#, Path::new("/site"))
                .unwrap();
        assert_eq!(config.debug_dir(), Path::new("/tmp/ft-dumps"));
        unsafe {
            std::env::remove_var("FREETEXT_TEST_DUMPS");
        }
    }

    #[test]
    fn test_rows_for() {
        let config = FreetextConfig::default();
        assert_eq!(config.rows_for(QuestionType::Short), 3);
        assert_eq!(config.rows_for(QuestionType::Long), 6);
    }

    #[test]
    fn test_question_type_from_str() {
        assert_eq!("short".parse::<QuestionType>(), Ok(QuestionType::Short));
        assert_eq!(" LONG ".parse::<QuestionType>(), Ok(QuestionType::Long));
        assert_eq!(
            "medium".parse::<QuestionType>(),
            Err(InvalidQuestionType("medium".to_owned()))
        );
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = FreetextConfig::default_with_base(Path::new("/site"));
        let overrides = ConfigOverrides {
            debug: Some(true),
            debug_dir: Some(PathBuf::from("/tmp/out")),
            shuffle_questions: Some(true),
            ..Default::default()
        };

        config.apply_overrides(&overrides);

        assert!(config.debug);
        assert!(config.shuffle_questions);
        assert!(config.enable_css); // Unchanged
        assert_eq!(config.debug_dir(), Path::new("/tmp/out"));
    }

    #[test]
    fn test_apply_overrides_empty() {
        let mut config = FreetextConfig::default_with_base(Path::new("/site"));
        config.apply_overrides(&ConfigOverrides::default());
        assert!(!config.debug);
        assert!(!config.shuffle_questions);
        assert_eq!(config.debug_dir(), Path::new("/site/.freetext/debug"));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let result = FreetextConfig::load(Some(Path::new("/nonexistent/freetext.toml")), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "default_marks = 5\n").unwrap();

        let config = FreetextConfig::load(Some(&path), None).unwrap();

        assert_eq!(config.default_marks, 5);
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(config.debug_dir(), dir.path().join(".freetext/debug"));
    }

    #[test]
    fn test_load_applies_overrides_after_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "enable_css = true\n").unwrap();

        let overrides = ConfigOverrides {
            enable_css: Some(false),
            ..Default::default()
        };
        let config = FreetextConfig::load(Some(&path), Some(&overrides)).unwrap();

        assert!(!config.enable_css);
    }
}
