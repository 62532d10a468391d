//! The two-pass page transform.
//!
//! [`FreetextPlugin::transform_page`] runs on each page's rendered content
//! and replaces question admonitions with interactive markup.
//! [`FreetextPlugin::assemble_page`] runs on the same page's final document
//! and adds the collected script and the style sheet.

use freetext_config::FreetextConfig;

use crate::assemble::assemble;
use crate::dump;
use crate::extract::{Block, BlockKind, extract_blocks, splice};
use crate::grammar::{parse_assessment, parse_question};
use crate::ids::{IdAllocator, IdGenerator, Identifier, RandomIds};
use crate::markup;
use crate::page::{PageContext, PageReport, PageStore};
use crate::style::style_sheet;

/// Question transform for a documentation site build.
pub struct FreetextPlugin {
    settings: FreetextConfig,
    ids: Box<dyn IdGenerator>,
    store: PageStore,
}

impl FreetextPlugin {
    /// Create a plugin with random identifiers.
    pub fn new(settings: FreetextConfig) -> Self {
        Self {
            settings,
            ids: Box::new(RandomIds),
            store: PageStore::new(),
        }
    }

    /// Use a different identifier source (e.g. [`crate::SequentialIds`] for
    /// reproducible output).
    #[must_use]
    pub fn with_id_generator(mut self, generator: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(generator);
        self
    }

    pub fn settings(&self) -> &FreetextConfig {
        &self.settings
    }

    /// Number of pages transformed but not yet assembled.
    pub fn pending_pages(&self) -> usize {
        self.store.len()
    }

    /// Replace the question blocks in a page's rendered content.
    pub fn transform_page(&mut self, html: &str, page: &str) -> String {
        self.transform_page_with_report(html, page).0
    }

    /// Like [`Self::transform_page`], also returning what was rendered.
    pub fn transform_page_with_report(&mut self, html: &str, page: &str) -> (String, PageReport) {
        let mut context = self.store.begin_page(page);
        let mut allocator = IdAllocator::new(self.ids.as_mut());

        // Assessments first, so their sections are gone before single questions are scanned.
        let reduced = replace_blocks(
            html,
            BlockKind::Assessment,
            &mut allocator,
            &self.settings,
            &mut context,
        );
        let output = replace_blocks(
            &reduced,
            BlockKind::SingleQuestion,
            &mut allocator,
            &self.settings,
            &mut context,
        );

        let report = self.store.end_page(context);
        if report.blocks() > 0 {
            tracing::info!(
                page = %page,
                questions = report.questions,
                assessments = report.assessments,
                "Transformed page"
            );
        }

        if self.settings.debug && output != html {
            match dump::write_snapshots(self.settings.debug_dir(), page, html, &output) {
                Ok((_, after)) => {
                    tracing::debug!(page = %page, path = %after.display(), "Wrote debug snapshots");
                }
                Err(e) => {
                    tracing::error!(page = %page, error = %e, "Failed to write debug snapshots");
                }
            }
        }

        (output, report)
    }

    /// Add the page's script and style to its final document.
    ///
    /// Pages without transformed questions are returned unchanged.
    pub fn assemble_page(&mut self, output: &str, page: &str) -> String {
        let Some(bundle) = self.store.take(page) else {
            return output.to_owned();
        };
        let style = self
            .settings
            .enable_css
            .then(|| style_sheet(&self.settings));
        assemble(output, &bundle, style.as_deref())
    }
}

/// Render one block, recording its behavior on the page.
fn render_block(
    block: &Block<'_>,
    id: &Identifier,
    settings: &FreetextConfig,
    page: &mut PageContext,
) -> String {
    tracing::debug!(page = %page.page(), id = %id, kind = ?block.kind, "Rendering block");
    match block.kind {
        BlockKind::Assessment => {
            let assessment = parse_assessment(block.inner_content, settings);
            markup::assessment(&assessment, id, settings, page)
        }
        BlockKind::SingleQuestion => {
            let config = parse_question(block.inner_content, settings);
            markup::question(&config, id, settings, page)
        }
    }
}

/// One extraction pass: allocate identifiers for every block up front, then
/// substitute each block by its span.
fn replace_blocks(
    html: &str,
    target: BlockKind,
    allocator: &mut IdAllocator<'_>,
    settings: &FreetextConfig,
    page: &mut PageContext,
) -> String {
    let blocks = extract_blocks(html, target);
    if blocks.is_empty() {
        return html.to_owned();
    }
    let ids = allocator.allocate(blocks.len());
    let replacements = blocks
        .iter()
        .zip(&ids)
        .map(|(block, id)| (block.span.clone(), render_block(block, id, settings, page)))
        .collect();
    splice(html, replacements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::markup::EMPTY_ASSESSMENT;
    use pretty_assertions::assert_eq;

    const LEGACY: &str = r#"<div class="admonition freetext"><p class="admonition-title">Freetext</p><p>question: X</p><p>marks: 5</p></div>"#;

    fn plugin(settings: FreetextConfig) -> FreetextPlugin {
        FreetextPlugin::new(settings).with_id_generator(SequentialIds::default())
    }

    fn page(body: &str) -> String {
        format!("<html><head><title>T</title></head><body>{body}</body></html>")
    }

    #[test]
    fn test_legacy_question() {
        let mut plugin = plugin(FreetextConfig::default());
        let html = plugin.transform_page(LEGACY, "quiz.md");

        assert!(html.contains("(5 marks)"));
        assert!(html.contains(r#"rows="3""#));
        assert!(html.contains(r#"placeholder="Enter your answer...""#));
        assert!(html.contains(r#"<div class="question-text"><p>X</p></div>"#));
        assert!(!html.contains("admonition-title"));
        assert!(!html.contains("admonition freetext"));
    }

    #[test]
    fn test_every_answer_field_has_one_submit_handler() {
        let mut plugin = plugin(FreetextConfig::default());
        let content = plugin.transform_page(LEGACY, "quiz.md");
        let output = plugin.assemble_page(&page(&content), "quiz.md");

        assert_eq!(output.matches("<textarea").count(), 1);
        assert_eq!(output.matches(r#"id="answer_q0001""#).count(), 1);
        assert_eq!(output.matches("function submitAnswer_q0001()").count(), 1);
        assert_eq!(output.matches("onclick=\"submitAnswer_q0001()\"").count(), 1);
    }

    #[test]
    fn test_separator_rows_win_over_type() {
        let mut plugin = plugin(FreetextConfig::default());
        let html = plugin.transform_page(
            r#"<div class="admonition freetext"><p class="admonition-title">Freetext</p><p>X</p>
<hr />
<p>marks: 10, type: long, rows: 4</p></div>"#,
            "quiz.md",
        );

        assert!(html.contains(r#"rows="4""#));
        assert!(html.contains("(10 marks)"));
        assert!(html.contains(r#"<div class="question-text"><p>X</p></div>"#));
    }

    #[test]
    fn test_long_type_uses_long_rows() {
        let mut plugin = plugin(FreetextConfig::default());
        let html = plugin.transform_page(
            r#"<div class="admonition freetext"><p>Essay</p><hr><p>type: long, marks: 3</p></div>"#,
            "quiz.md",
        );
        assert!(html.contains(r#"rows="6""#));
    }

    #[test]
    fn test_two_questions_distinct_ids_content_preserved() {
        let mut plugin = plugin(FreetextConfig::default());
        let between = "\n<p>Some <strong>prose</strong> between.</p>\n";
        let input = format!("{LEGACY}{between}{LEGACY}");

        let content = plugin.transform_page(&input, "quiz.md");
        let output = plugin.assemble_page(&page(&content), "quiz.md");

        assert!(content.contains(between));
        assert!(output.contains(r#"data-question-id="q0001""#));
        assert!(output.contains(r#"data-question-id="q0002""#));
        assert_eq!(output.matches("function submitAnswer_q0001()").count(), 1);
        assert_eq!(output.matches("function submitAnswer_q0002()").count(), 1);
    }

    #[test]
    fn test_identical_blocks_each_replaced_once() {
        let mut plugin = plugin(FreetextConfig::default());
        let input = format!("<p>a</p>{LEGACY}<p>b</p>{LEGACY}<p>c</p>");
        let content = plugin.transform_page(&input, "quiz.md");

        let a = content.find("<p>a</p>").unwrap();
        let q1 = content.find(r#"data-question-id="q0001""#).unwrap();
        let b = content.find("<p>b</p>").unwrap();
        let q2 = content.find(r#"data-question-id="q0002""#).unwrap();
        let c = content.find("<p>c</p>").unwrap();
        assert!(a < q1 && q1 < b && b < q2 && q2 < c);
    }

    #[test]
    fn test_assessment_shuffle_from_global_default() {
        let mut settings = FreetextConfig::default();
        settings.shuffle_questions = true;
        let mut plugin = plugin(settings);
        let html = plugin.transform_page(
            r#"<div class="admonition freetext-assessment"><p class="admonition-title">Quiz</p><p>question: A?</p><hr><p>question: B?</p></div>"#,
            "quiz.md",
        );
        assert!(html.contains(r#"data-shuffle="true""#));
    }

    #[test]
    fn test_assessment_explicit_shuffle_wins() {
        let mut settings = FreetextConfig::default();
        settings.shuffle_questions = true;
        let mut plugin = plugin(settings);
        let html = plugin.transform_page(
            r#"<div class="admonition freetext-assessment"><p>shuffle: false</p><p>question: A?</p><hr><p>question: B?</p></div>"#,
            "quiz.md",
        );
        assert!(html.contains(r#"data-shuffle="false""#));
    }

    #[test]
    fn test_assessment_sub_question_ids() {
        let mut plugin = plugin(FreetextConfig::default());
        let html = plugin.transform_page(
            r#"<div class="admonition freetext-assessment"><p>title: Review</p><p>question: A?</p><p>marks: 2</p><hr><p>question: B?</p><p>marks: 3</p><hr><p>question: C?</p></div>"#,
            "quiz.md",
        );
        let positions: Vec<usize> = (1..=3)
            .map(|k| html.find(&format!(r#"data-question-id="q0001_q{k}""#)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(html.contains("<h3>Review</h3>"));
        assert!(html.contains("Total: 5 marks"));
    }

    #[test]
    fn test_non_numeric_marks_use_default() {
        let mut settings = FreetextConfig::default();
        settings.default_marks = 2;
        let mut plugin = plugin(settings);
        let html = plugin.transform_page(
            r#"<div class="admonition freetext"><p>question: X</p><p>marks: abc</p></div>"#,
            "quiz.md",
        );
        assert!(html.contains("(2 marks)"));
        assert!(!html.contains("abc"));
    }

    #[test]
    fn test_config_lookalike_in_code_not_applied() {
        let mut plugin = plugin(FreetextConfig::default());
        let html = plugin.transform_page(
            r#"<div class="admonition freetext"><p>What does this print?</p><pre><code>marks: 100
</code></pre><p><img alt="marks: 100" src="x.png"></p></div>"#,
            "quiz.md",
        );
        assert!(!html.contains("(100 marks)"));
        assert!(html.contains("<code>marks: 100\n</code>"));
        assert!(html.contains(r#"alt="marks: 100""#));
    }

    #[test]
    fn test_front_matter_dashes_in_code_not_a_separator() {
        let mut plugin = plugin(FreetextConfig::default());
        let html = plugin.transform_page(
            "<div class=\"admonition freetext\"><p>What does this front matter do?</p>\n<pre><code>---\nmarks: 100, rows: 2\n</code></pre></div>",
            "quiz.md",
        );
        assert!(!html.contains("(100 marks)"));
        assert!(html.contains(r#"rows="3""#));
        assert!(html.contains("<pre><code>---\nmarks: 100, rows: 2\n</code></pre>"));
    }

    #[test]
    fn test_line_based_config_after_rule_uses_defaults() {
        let mut plugin = plugin(FreetextConfig::default());
        let html = plugin.transform_page(
            "<div class=\"admonition freetext\"><p>Q</p>\n<hr>\n<p>marks: 7</p>\n<p>type: long</p></div>",
            "quiz.md",
        );
        assert!(!html.contains("(7 marks)"));
        assert!(html.contains(r#"rows="3""#));
        assert!(html.contains(r#"<div class="question-text"><p>Q</p></div>"#));
    }

    #[test]
    fn test_question_inside_callout_and_callout_inside_question() {
        let mut plugin = plugin(FreetextConfig::default());
        let input = r#"<div class="admonition freetext"><p>Look:</p><div class="admonition note"><p class="admonition-title">Note</p><p>hint</p></div><p>marks: 1</p></div><p>after</p>"#;
        let html = plugin.transform_page(input, "quiz.md");
        assert!(html.contains(r#"<div class="admonition note">"#));
        assert!(html.contains("(1 marks)"));
        assert!(html.ends_with("<p>after</p>"));
    }

    #[test]
    fn test_mixed_page_ids_unique() {
        let mut plugin = plugin(FreetextConfig::default());
        let input = format!(
            r#"{LEGACY}<div class="admonition freetext-assessment"><p>question: A?</p></div>"#
        );
        let html = plugin.transform_page(&input, "quiz.md");
        // Assessments are allocated first.
        assert!(html.contains(r#"data-assessment-id="q0001""#));
        assert!(html.contains(r#"data-question-id="q0001_q1""#));
        assert!(html.contains(r#"data-question-id="q0002""#));
    }

    #[test]
    fn test_unterminated_block_left_untouched() {
        let mut plugin = plugin(FreetextConfig::default());
        let input = r#"<div class="admonition freetext"><p>question: X</p>"#;
        assert_eq!(plugin.transform_page(input, "quiz.md"), input);
        assert_eq!(plugin.pending_pages(), 0);
    }

    #[test]
    fn test_empty_assessment_renders_error() {
        let mut plugin = plugin(FreetextConfig::default());
        let (html, report) = plugin.transform_page_with_report(
            r#"<div class="admonition freetext-assessment"><p>title: Nothing</p></div>"#,
            "quiz.md",
        );
        assert_eq!(html, EMPTY_ASSESSMENT);
        assert_eq!(report.empty_assessments, 1);
        assert_eq!(plugin.assemble_page("<head></head>", "quiz.md"), "<head></head>");
    }

    #[test]
    fn test_page_without_questions_unchanged() {
        let mut plugin = plugin(FreetextConfig::default());
        let content = "<p>Just prose.</p>";
        assert_eq!(plugin.transform_page(content, "plain.md"), content);
        let output = page(content);
        assert_eq!(plugin.assemble_page(&output, "plain.md"), output);
    }

    #[test]
    fn test_assemble_adds_script_and_style_once() {
        let mut plugin = plugin(FreetextConfig::default());
        let input = format!(
            r#"{LEGACY}<div class="admonition freetext-assessment"><p>question: A?</p><hr><p>question: B?</p></div>"#
        );
        let content = plugin.transform_page(&input, "quiz.md");
        let output = plugin.assemble_page(&page(&content), "quiz.md");

        assert_eq!(output.matches("<script>").count(), 1);
        assert_eq!(output.matches("<style>").count(), 1);
        assert_eq!(output.matches("DOMContentLoaded").count(), 1);
        assert!(output.starts_with("<html><head>\n<script>"));
        let load = output.find("DOMContentLoaded").unwrap();
        assert!(output.find("function shuffleQuestions_q0001()").unwrap() < load);
        assert!(output.find("function submitAnswer_q0002()").unwrap() < load);

        // The bundle is consumed by assembly.
        let again = plugin.assemble_page(&page(&content), "quiz.md");
        assert!(!again.contains("<script>"));
    }

    #[test]
    fn test_css_disabled() {
        let mut settings = FreetextConfig::default();
        settings.enable_css = false;
        let mut plugin = plugin(settings);
        let content = plugin.transform_page(LEGACY, "quiz.md");
        let output = plugin.assemble_page(&page(&content), "quiz.md");
        assert!(output.contains("<script>"));
        assert!(!output.contains("<style>"));
    }

    #[test]
    fn test_pages_do_not_share_behavior() {
        let mut plugin = plugin(FreetextConfig::default());
        let first = plugin.transform_page(LEGACY, "a.md");
        let second = plugin.transform_page(LEGACY, "b.md");
        assert_eq!(plugin.pending_pages(), 2);

        let a = plugin.assemble_page(&page(&first), "a.md");
        let b = plugin.assemble_page(&page(&second), "b.md");
        assert!(a.contains("function submitAnswer_q0001()"));
        assert!(!a.contains("function submitAnswer_q0002()"));
        assert!(b.contains("function submitAnswer_q0002()"));
        assert_eq!(plugin.pending_pages(), 0);
    }

    #[test]
    fn test_debug_snapshots_written() {
        let dir = tempfile::tempdir().unwrap();
        let settings =
            FreetextConfig::from_toml_str("debug = true\ndebug_dir = \"snapshots\"", dir.path())
                .unwrap();
        let mut plugin = plugin(settings);

        let html = plugin.transform_page(LEGACY, "guide/quiz.md");

        let snapshots = dir.path().join("snapshots");
        let before = std::fs::read_to_string(snapshots.join("guide_quiz_before.html")).unwrap();
        let after = std::fs::read_to_string(snapshots.join("guide_quiz_after.html")).unwrap();
        assert_eq!(before, LEGACY);
        assert_eq!(after, html);
    }

    #[test]
    fn test_debug_snapshot_failure_does_not_affect_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blocker"), "").unwrap();
        let settings = FreetextConfig::from_toml_str(
            "debug = true\ndebug_dir = \"blocker/debug\"",
            dir.path(),
        )
        .unwrap();
        let mut plugin = plugin(settings);

        let html = plugin.transform_page(LEGACY, "quiz.md");
        assert!(html.contains("(5 marks)"));
    }

    #[test]
    fn test_no_snapshots_when_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let settings =
            FreetextConfig::from_toml_str("debug = true\ndebug_dir = \"snapshots\"", dir.path())
                .unwrap();
        let mut plugin = plugin(settings);
        plugin.transform_page("<p>nothing</p>", "plain.md");
        assert!(!dir.path().join("snapshots").exists());
    }
}
