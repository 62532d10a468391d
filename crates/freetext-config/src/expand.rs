//! Environment variable and home directory expansion for path settings.

use crate::ConfigError;

/// Expand `~`, `${VAR}` and `${VAR:-default}` references in a setting value.
///
/// `field` names the setting in error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::full(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} {}", e.var_name, e.cause),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_value_unchanged() {
        assert_eq!(expand_env("debug/out", "debug_dir").unwrap(), "debug/out");
    }

    #[test]
    fn test_default_value_used_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("FREETEXT_EXPAND_UNSET");
        }
        let expanded = expand_env("${FREETEXT_EXPAND_UNSET:-fallback}/dumps", "debug_dir").unwrap();
        assert_eq!(expanded, "fallback/dumps");
    }

    #[test]
    fn test_missing_variable_reports_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("FREETEXT_EXPAND_MISSING");
        }
        let err = expand_env("${FREETEXT_EXPAND_MISSING}", "debug_dir").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        let msg = err.to_string();
        assert!(msg.contains("debug_dir"));
        assert!(msg.contains("FREETEXT_EXPAND_MISSING"));
    }
}
