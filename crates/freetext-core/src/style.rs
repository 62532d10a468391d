//! Style sheet for rendered questions.
//!
//! With `dark_mode_support` colors reference the Material theme variables
//! (falling back to light colors outside the theme); without it only the
//! static light colors are emitted.

use std::fmt::Write;

use freetext_config::FreetextConfig;

/// A color resolved either through a theme variable or statically.
struct Palette {
    themed: bool,
}

impl Palette {
    fn color(&self, variable: &str, fallback: &str) -> String {
        if self.themed {
            format!("var(--md-{variable}, {fallback})")
        } else {
            fallback.to_owned()
        }
    }
}

/// Build the `<style>` element for the configured class names.
pub fn style_sheet(settings: &FreetextConfig) -> String {
    let p = Palette {
        themed: settings.dark_mode_support,
    };
    let question = &settings.question_class;
    let assessment = &settings.assessment_class;
    let answer = &settings.answer_class;

    let fg = p.color("default-fg-color", "#333333");
    let fg_light = p.color("default-fg-color--light", "#666666");
    let border = p.color("default-fg-color--lighter", "#e1e4e8");
    let bg = p.color("default-bg-color", "#ffffff");
    let code_bg = p.color("code-bg-color", "#f5f5f5");
    let primary = p.color("primary-fg-color", "#0366d6");
    let primary_dark = p.color("primary-fg-color--dark", "#0256cc");
    let primary_light = p.color("primary-fg-color--light", "#b6dbff");

    let mut css = String::with_capacity(4096);
    css.push_str("<style>\n");
    let _ = write!(
        css,
        ".{question}, .{assessment} {{
    margin: 20px 0;
    padding: 20px;
    background-color: {code_bg};
    border: 1px solid {border};
    border-radius: 8px;
    color: {fg};
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
}}

.question-header, .assessment-header {{
    margin-bottom: 15px;
    display: flex;
    justify-content: space-between;
    align-items: center;
    flex-wrap: wrap;
    gap: 10px;
}}

.assessment-header h3, .question-text {{
    margin: 0;
    color: {fg} !important;
    font-weight: 600;
    line-height: 1.5;
    flex: 1;
    text-transform: none !important;
}}

.assessment-header h3 {{
    font-size: 1.2em;
}}

.question-text p {{
    margin: 0 0 10px 0;
}}

.question-text p:last-child {{
    margin-bottom: 0;
}}

.question-text img {{
    max-width: 100%;
    height: auto;
    border-radius: 4px;
    margin: 10px 0;
}}

.question-text a {{
    color: {primary} !important;
    text-decoration: none;
}}

.question-text a:hover {{
    text-decoration: underline;
}}

.question-text pre, .question-text code {{
    background-color: {bg};
    border: 1px solid {border};
    border-radius: 4px;
    font-size: 0.9em;
}}

.question-text pre {{
    padding: 12px;
    margin: 10px 0;
    overflow-x: auto;
}}

.question-text code {{
    padding: 2px 4px;
    font-family: 'SFMono-Regular', Consolas, 'Liberation Mono', Menlo, monospace;
}}

.question-text .mermaid {{
    text-align: center;
    margin: 15px 0;
    background-color: {bg};
    border: 1px solid {border};
    border-radius: 4px;
    padding: 10px;
}}

.question-number {{
    font-weight: 600;
    margin-right: 8px;
    color: {fg};
}}

.marks, .total-marks {{
    background-color: {primary};
    color: white;
    padding: 4px 8px;
    border-radius: 12px;
    font-size: 12px;
    font-weight: 600;
    white-space: nowrap;
}}

.answer-section {{
    margin: 15px 0;
}}

textarea.{answer} {{
    width: 100%;
    padding: 12px;
    border: 1px solid {border};
    border-radius: 4px;
    font-size: 14px;
    line-height: 1.5;
    resize: vertical;
    font-family: inherit;
    background-color: {bg};
    color: {fg};
    box-sizing: border-box;
    min-height: 80px;
}}

textarea.{answer}:focus {{
    outline: none;
    border-color: {primary};
}}

.char-count {{
    text-align: right;
    font-size: 12px;
    color: {fg_light};
    margin-top: 5px;
}}

.button-group, .assessment-buttons {{
    margin-top: 15px;
}}

.submit-btn, .submit-assessment-btn {{
    padding: 8px 16px;
    border: none;
    border-radius: 4px;
    font-size: 14px;
    font-weight: 500;
    cursor: pointer;
    background-color: {primary};
    color: white;
}}

.submit-btn:hover, .submit-assessment-btn:hover {{
    background-color: {primary_dark};
}}

.feedback, .assessment-feedback {{
    margin-top: 15px;
    padding: 12px;
    border-radius: 4px;
}}

.feedback .warning, .assessment-feedback .warning {{
    background-color: {warning_bg};
    border: 1px solid {warning_border};
    color: {warning_fg};
}}

.feedback .answer-display {{
    background-color: {answer_bg};
    border: 1px solid {primary_light};
    color: {primary};
    margin-top: 10px;
}}

.assessment-question {{
    margin: 15px 0;
    padding: 15px;
    background-color: {code_bg};
    border-radius: 6px;
    color: {fg};
}}

@media (max-width: 768px) {{
    .{question}, .{assessment} {{
        padding: 15px;
        margin: 15px 0;
    }}

    .question-header, .assessment-header {{
        flex-direction: column;
        align-items: flex-start;
    }}
}}
",
        warning_bg = p.color("code-bg-color", "#fff3cd"),
        warning_border = p.color("default-fg-color--lighter", "#ffeaa7"),
        warning_fg = p.color("default-fg-color", "#856404"),
        answer_bg = p.color("code-bg-color", "#e2f3ff"),
    );
    css.push_str("</style>\n");
    css
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uses_configured_classes() {
        let mut settings = FreetextConfig::default();
        settings.question_class = "quiz-q".to_owned();
        settings.assessment_class = "quiz-a".to_owned();
        settings.answer_class = "quiz-answer".to_owned();

        let css = style_sheet(&settings);

        assert!(css.starts_with("<style>\n"));
        assert!(css.ends_with("</style>\n"));
        assert!(css.contains(".quiz-q, .quiz-a {"));
        assert!(css.contains("textarea.quiz-answer {"));
        assert!(!css.contains("freetext-question"));
    }

    #[test]
    fn test_theme_variables_with_dark_mode() {
        let settings = FreetextConfig::default();
        let css = style_sheet(&settings);
        assert!(css.contains("var(--md-primary-fg-color, #0366d6)"));
        assert!(css.contains("var(--md-default-bg-color, #ffffff)"));
    }

    #[test]
    fn test_static_colors_without_dark_mode() {
        let mut settings = FreetextConfig::default();
        settings.dark_mode_support = false;
        let css = style_sheet(&settings);
        assert!(!css.contains("var(--md-"));
        assert!(css.contains("background-color: #0366d6;"));
    }
}
