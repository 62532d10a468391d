//! Interactive markup replacing question and assessment admonitions.
//!
//! Rendering a block also records its behavior on the page context, so markup
//! and behavior are always produced together from the same identifier.

use std::fmt::Write;

use freetext_config::FreetextConfig;

use crate::behavior;
use crate::escape::escape_attr;
use crate::grammar::{AssessmentConfig, QuestionConfig};
use crate::ids::Identifier;
use crate::page::PageContext;

/// Replacement for an assessment that has no usable questions.
pub const EMPTY_ASSESSMENT: &str =
    r#"<div class="error">No valid questions found in assessment</div>"#;

fn write_marks(html: &mut String, marks: u32) {
    if marks > 0 {
        let _ = writeln!(html, r#"        <span class="marks">({marks} marks)</span>"#);
    }
}

/// Answer field, optional counter and feedback slot of question `id`.
fn write_answer_section(
    html: &mut String,
    config: &QuestionConfig,
    id: &Identifier,
    settings: &FreetextConfig,
) {
    let oninput = if settings.show_character_count {
        format!(r#" oninput="updateCharCount_{id}();""#)
    } else {
        String::new()
    };
    html.push_str("    <div class=\"answer-section\">\n");
    let _ = writeln!(
        html,
        r#"        <textarea id="answer_{id}" class="{}" rows="{}" placeholder="{}" aria-label="Answer"{oninput}></textarea>"#,
        escape_attr(&settings.answer_class),
        config.resolved_rows(settings),
        escape_attr(&config.placeholder),
    );
    if settings.show_character_count {
        let _ = writeln!(
            html,
            r#"        <div id="charCount_{id}" class="char-count">0 characters</div>"#
        );
    }
    html.push_str("    </div>\n");
}

fn write_feedback(html: &mut String, id: &Identifier) {
    let _ = writeln!(
        html,
        r#"    <div id="feedback_{id}" class="feedback" style="display: none;"></div>"#
    );
}

/// Render a single question and record its behavior.
pub fn question(
    config: &QuestionConfig,
    id: &Identifier,
    settings: &FreetextConfig,
    page: &mut PageContext,
) -> String {
    let mut html = String::with_capacity(1024 + config.question.len());
    let _ = writeln!(
        html,
        r#"<div class="{}" data-question-id="{id}">"#,
        escape_attr(&settings.question_class)
    );
    html.push_str("    <div class=\"question-header\">\n");
    let _ = writeln!(
        html,
        r#"        <div class="question-text">{}</div>"#,
        config.question
    );
    write_marks(&mut html, config.marks);
    html.push_str("    </div>\n");

    write_answer_section(&mut html, config, id, settings);

    html.push_str("    <div class=\"button-group\">\n");
    let _ = writeln!(
        html,
        r#"        <button onclick="submitAnswer_{id}()" class="submit-btn">Submit Answer</button>"#
    );
    html.push_str("    </div>\n");
    write_feedback(&mut html, id);
    html.push_str("</div>\n");

    page.record_block(behavior::question(config, id, settings));
    page.report_mut().questions += 1;
    html
}

/// Render an assessment and record its behavior.
///
/// An assessment without questions renders [`EMPTY_ASSESSMENT`] and records
/// nothing.
pub fn assessment(
    assessment: &AssessmentConfig,
    id: &Identifier,
    settings: &FreetextConfig,
    page: &mut PageContext,
) -> String {
    if assessment.questions.is_empty() {
        tracing::warn!(page = %page.page(), id = %id, "No valid questions found in assessment");
        page.report_mut().empty_assessments += 1;
        return EMPTY_ASSESSMENT.to_owned();
    }

    let mut html = String::with_capacity(2048);
    let _ = writeln!(
        html,
        r#"<div class="{}" data-assessment-id="{id}" data-shuffle="{}">"#,
        escape_attr(&settings.assessment_class),
        assessment.resolved_shuffle(settings)
    );
    html.push_str("    <div class=\"assessment-header\">\n");
    let _ = writeln!(html, "        <h3>{}</h3>", assessment.title);
    let total = assessment.total_marks();
    if total > 0 {
        let _ = writeln!(
            html,
            r#"        <span class="total-marks">Total: {total} marks</span>"#
        );
    }
    html.push_str("    </div>\n");

    for (index, config) in assessment.questions.iter().enumerate() {
        let number = index + 1;
        let qid = id.sub_question(number);
        let _ = writeln!(
            html,
            r#"<div class="assessment-question" data-question-id="{qid}">"#
        );
        html.push_str("    <div class=\"question-header\">\n");
        let _ = writeln!(
            html,
            r#"        <div class="question-number">{number}.</div>"#
        );
        let _ = writeln!(
            html,
            r#"        <div class="question-text">{}</div>"#,
            config.question
        );
        write_marks(&mut html, config.marks);
        html.push_str("    </div>\n");
        write_answer_section(&mut html, config, &qid, settings);
        write_feedback(&mut html, &qid);
        html.push_str("</div>\n");
    }

    html.push_str("    <div class=\"assessment-buttons\">\n");
    let _ = writeln!(
        html,
        r#"        <button onclick="submitAssessment_{id}()" class="submit-assessment-btn">Submit Assessment</button>"#
    );
    html.push_str("    </div>\n");
    let _ = writeln!(
        html,
        r#"    <div id="assessment_feedback_{id}" class="assessment-feedback" style="display: none;"></div>"#
    );
    html.push_str("</div>\n");

    page.record_block(behavior::assessment(assessment, id, settings));
    let report = page.report_mut();
    report.assessments += 1;
    report.assessment_questions += assessment.questions.len();
    html
}
