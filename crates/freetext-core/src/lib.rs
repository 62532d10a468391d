//! Interactive free-text questions for rendered documentation pages.
//!
//! Question admonitions in a page's rendered HTML are replaced with an answer
//! form, and the behavior those forms need is injected into the final page.
//!
//! # Architecture
//!
//! A page goes through two passes of a [`FreetextPlugin`]:
//!
//! - **Content pass** ([`FreetextPlugin::transform_page`]): the extractor
//!   finds `admonition freetext-assessment` and then `admonition freetext`
//!   blocks, the grammar turns each block's body into a [`QuestionConfig`] or
//!   [`AssessmentConfig`], and the markup generator replaces the block while
//!   recording its behavior for the page.
//! - **Assembly pass** ([`FreetextPlugin::assemble_page`]): the page's
//!   behavior is merged into one script placed early in `<head>`, and the
//!   style sheet is added once.
//!
//! Markup and behavior are generated from the same [`Identifier`], allocated
//! per block before anything is rendered, so every handler referenced by the
//! markup is defined by the script.
//!
//! # Example
//!
//! ```
//! use freetext_config::FreetextConfig;
//! use freetext_core::{FreetextPlugin, SequentialIds};
//!
//! let mut plugin = FreetextPlugin::new(FreetextConfig::default())
//!     .with_id_generator(SequentialIds::default());
//!
//! let content = plugin.transform_page(
//!     r#"<div class="admonition freetext"><p>question: Why?</p><p>marks: 2</p></div>"#,
//!     "guide/quiz.md",
//! );
//! assert!(content.contains("(2 marks)"));
//!
//! let page = format!("<html><head></head><body>{content}</body></html>");
//! let output = plugin.assemble_page(&page, "guide/quiz.md");
//! assert!(output.contains("function submitAnswer_q0001()"));
//! ```

mod assemble;
mod behavior;
mod dump;
pub mod escape;
mod extract;
mod grammar;
mod ids;
mod markup;
mod page;
mod plugin;
mod style;

pub use assemble::{assemble, consolidated_script};
pub use behavior::Behavior;
pub use dump::{snapshot_stem, write_snapshots};
pub use extract::{ASSESSMENT_MARKER, Block, BlockKind, QUESTION_MARKER, extract_blocks, splice};
pub use grammar::{
    AssessmentConfig, DEFAULT_TITLE, QuestionConfig, parse_assessment, parse_question,
};
pub use ids::{IdAllocator, IdGenerator, Identifier, RandomIds, SequentialIds};
pub use markup::EMPTY_ASSESSMENT;
pub use page::{PageBundle, PageContext, PageReport, PageStore};
pub use plugin::FreetextPlugin;
pub use style::style_sheet;
