//! Client-side behavior for rendered questions.
//!
//! Every function name and element lookup is derived from the block's
//! [`Identifier`], matching the element ids written by [`crate::markup`].

use std::fmt::Write;

use freetext_config::FreetextConfig;

use crate::escape::escape_js_string;
use crate::grammar::{AssessmentConfig, QuestionConfig};
use crate::ids::Identifier;

/// Feedback shown when a question has no sample answer.
const NO_SAMPLE_ANSWER: &str = "No sample answer provided.";

/// Script fragments generated for one block.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Behavior {
    /// Function definitions.
    pub functions: String,
    /// Statements to run once the document has loaded.
    pub dom_ready: Option<String>,
}

/// Answer text as a script string literal body.
fn answer_literal(answer: &str) -> String {
    let answer = answer.trim();
    let answer = answer
        .strip_prefix("\"\"\"")
        .and_then(|a| a.strip_suffix("\"\"\""))
        .unwrap_or(answer);
    if answer.is_empty() {
        return NO_SAMPLE_ANSWER.to_owned();
    }
    escape_js_string(answer)
}

fn write_char_count(js: &mut String, id: &Identifier) {
    let _ = write!(
        js,
        "function updateCharCount_{id}() {{
    const textarea = document.getElementById('answer_{id}');
    const counter = document.getElementById('charCount_{id}');
    if (counter) {{
        counter.textContent = textarea.value.length + ' characters';
    }}
}}
"
    );
}

/// Statements showing the sample answer inside the `target` element.
fn write_reveal(js: &mut String, target: &str, config: &QuestionConfig, indent: &str) {
    let _ = write!(
        js,
        "{indent}{target}.innerHTML = '<div class=\"answer-display\"><strong>Sample Answer:</strong><br>{}</div>';
{indent}{target}.style.display = 'block';
",
        answer_literal(&config.answer)
    );
}

/// Behavior of a single question: character counter and submit handler.
pub fn question(config: &QuestionConfig, id: &Identifier, settings: &FreetextConfig) -> Behavior {
    let mut js = String::with_capacity(1024);
    if settings.show_character_count {
        write_char_count(&mut js, id);
        js.push('\n');
    }

    let _ = write!(
        js,
        "function submitAnswer_{id}() {{
    const answer = document.getElementById('answer_{id}').value;
    const feedback = document.getElementById('feedback_{id}');
    const submitBtn = document.querySelector('[data-question-id=\"{id}\"] .submit-btn');

    if (answer.trim() === '') {{
        feedback.innerHTML = '<div class=\"warning\">Please enter an answer before submitting.</div>';
        feedback.style.display = 'block';
        return;
    }}

    submitBtn.textContent = 'Submitted';
    submitBtn.title = 'Click to resubmit';

"
    );
    if config.show_answer {
        write_reveal(&mut js, "feedback", config, "    ");
    } else {
        js.push_str("    feedback.style.display = 'none';\n");
    }
    js.push_str("}\n");

    Behavior {
        functions: js,
        dom_ready: None,
    }
}

/// Behavior of an assessment: combined submit, counters and load-time shuffle.
pub fn assessment(
    assessment: &AssessmentConfig,
    id: &Identifier,
    settings: &FreetextConfig,
) -> Behavior {
    let ids: Vec<Identifier> = (1..=assessment.questions.len())
        .map(|n| id.sub_question(n))
        .collect();
    let mut js = String::with_capacity(2048);

    let _ = write!(
        js,
        "function submitAssessment_{id}() {{
    let allAnswered = true;
"
    );
    for qid in &ids {
        let _ = write!(
            js,
            "    if (document.getElementById('answer_{qid}').value.trim() === '') allAnswered = false;\n"
        );
    }
    let _ = write!(
        js,
        "
    const assessmentFeedback = document.getElementById('assessment_feedback_{id}');
    const submitBtn = document.querySelector('[data-assessment-id=\"{id}\"] .submit-assessment-btn');

    if (!allAnswered) {{
        assessmentFeedback.innerHTML = '<div class=\"warning\">Please answer all questions before submitting.</div>';
        assessmentFeedback.style.display = 'block';
        return;
    }}

    submitBtn.textContent = 'Submitted';
    submitBtn.title = 'Click to resubmit';
    assessmentFeedback.style.display = 'none';
"
    );
    for (qid, config) in ids.iter().zip(&assessment.questions) {
        if !config.show_answer {
            continue;
        }
        let _ = write!(
            js,
            "
    const feedback_{qid} = document.getElementById('feedback_{qid}');
"
        );
        write_reveal(&mut js, &format!("feedback_{qid}"), config, "    ");
    }
    js.push_str("}\n");

    if settings.show_character_count {
        for qid in &ids {
            js.push('\n');
            write_char_count(&mut js, qid);
        }
    }

    let _ = write!(
        js,
        "
function shuffleQuestions_{id}() {{
    const assessment = document.querySelector('[data-assessment-id=\"{id}\"]');
    if (!assessment || assessment.getAttribute('data-shuffle') !== 'true') {{
        return;
    }}
    const questions = Array.from(assessment.querySelectorAll('[data-question-id]'));
    const header = assessment.querySelector('.assessment-header');
    const buttons = assessment.querySelector('.assessment-buttons');
    const feedback = assessment.querySelector('.assessment-feedback');

    // Fisher-Yates
    for (let i = questions.length - 1; i > 0; i--) {{
        const j = Math.floor(Math.random() * (i + 1));
        [questions[i], questions[j]] = [questions[j], questions[i]];
    }}

    assessment.innerHTML = '';
    assessment.appendChild(header);
    questions.forEach((question, index) => {{
        const number = question.querySelector('.question-number');
        if (number) {{
            number.textContent = (index + 1) + '.';
        }}
        assessment.appendChild(question);
    }});
    assessment.appendChild(buttons);
    assessment.appendChild(feedback);
}}
"
    );

    Behavior {
        functions: js,
        dom_ready: Some(format!("shuffleQuestions_{id}();")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::DEFAULT_TITLE;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> Identifier {
        Identifier::sanitized(s).unwrap()
    }

    fn question_config(answer: &str, show_answer: bool) -> QuestionConfig {
        QuestionConfig {
            answer: answer.to_owned(),
            show_answer,
            ..QuestionConfig::with_defaults(&FreetextConfig::default())
        }
    }

    #[test]
    fn test_question_functions_reference_id() {
        let behavior = question(&question_config("", true), &id("abc"), &FreetextConfig::default());
        assert!(behavior.functions.contains("function updateCharCount_abc()"));
        assert!(behavior.functions.contains("function submitAnswer_abc()"));
        assert!(behavior.functions.contains("getElementById('answer_abc')"));
        assert!(behavior.functions.contains("getElementById('charCount_abc')"));
        assert!(behavior.functions.contains("getElementById('feedback_abc')"));
        assert!(behavior.functions.contains(NO_SAMPLE_ANSWER));
        assert_eq!(behavior.dom_ready, None);
    }

    #[test]
    fn test_char_count_omitted_when_disabled() {
        let mut settings = FreetextConfig::default();
        settings.show_character_count = false;
        let behavior = question(&question_config("", true), &id("abc"), &settings);
        assert!(!behavior.functions.contains("updateCharCount_"));
    }

    #[test]
    fn test_hidden_answer_not_embedded() {
        let behavior = question(
            &question_config("secret", false),
            &id("abc"),
            &FreetextConfig::default(),
        );
        assert!(!behavior.functions.contains("secret"));
        assert!(behavior.functions.contains("feedback.style.display = 'none';"));
    }

    #[test]
    fn test_answer_escaped_for_script() {
        let behavior = question(
            &question_config("It's \"C:\\tmp\"\nnext</script>", true),
            &id("abc"),
            &FreetextConfig::default(),
        );
        assert!(
            behavior
                .functions
                .contains(r#"It\'s \"C:\\tmp\"\nnext<\/script>"#)
        );
    }

    #[test]
    fn test_answer_literal_triple_quotes() {
        assert_eq!(answer_literal("\"\"\"Ownership\"\"\""), "Ownership");
        assert_eq!(answer_literal("   "), NO_SAMPLE_ANSWER);
    }

    #[test]
    fn test_assessment_behavior() {
        let settings = FreetextConfig::default();
        let assessment_config = AssessmentConfig {
            title: DEFAULT_TITLE.to_owned(),
            shuffle: None,
            questions: vec![question_config("one", true), question_config("two", false)],
        };
        let behavior = assessment(&assessment_config, &id("as1"), &settings);

        assert!(behavior.functions.contains("function submitAssessment_as1()"));
        assert!(behavior.functions.contains("function updateCharCount_as1_q1()"));
        assert!(behavior.functions.contains("function updateCharCount_as1_q2()"));
        assert!(behavior.functions.contains("function shuffleQuestions_as1()"));
        assert!(behavior.functions.contains("getElementById('answer_as1_q2')"));
        assert!(behavior.functions.contains("feedback_as1_q1.innerHTML"));
        assert!(!behavior.functions.contains("feedback_as1_q2.innerHTML"));
        assert_eq!(behavior.dom_ready.as_deref(), Some("shuffleQuestions_as1();"));
    }
}
