//! Per-page accumulation of generated behavior.
//!
//! The content pass opens a [`PageContext`] with [`PageStore::begin_page`],
//! records one [`Behavior`] per rendered block and hands the context back
//! with [`PageStore::end_page`]. The assembly pass for the same page takes the
//! bundle out with [`PageStore::take`], which clears the entry.

use std::collections::HashMap;

use crate::behavior::Behavior;

/// Behavior collected for one page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageBundle {
    /// Function definitions, in block order.
    pub functions: Vec<String>,
    /// Load-time statements, in block order.
    pub dom_ready: Vec<String>,
}

impl PageBundle {
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.dom_ready.is_empty()
    }
}

/// Counts of what the content pass rendered on a page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageReport {
    /// Single questions rendered.
    pub questions: usize,
    /// Assessments rendered.
    pub assessments: usize,
    /// Questions rendered inside assessments.
    pub assessment_questions: usize,
    /// Assessments rendered as an error because they had no questions.
    pub empty_assessments: usize,
}

impl PageReport {
    /// Total number of blocks replaced.
    pub fn blocks(&self) -> usize {
        self.questions + self.assessments + self.empty_assessments
    }
}

/// State of one page during its content pass.
#[derive(Debug)]
pub struct PageContext {
    page: String,
    bundle: PageBundle,
    report: PageReport,
}

impl PageContext {
    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn report(&self) -> PageReport {
        self.report
    }

    /// Record the behavior of a rendered block.
    pub fn record_block(&mut self, behavior: Behavior) {
        self.bundle.functions.push(behavior.functions);
        if let Some(dom_ready) = behavior.dom_ready {
            self.bundle.dom_ready.push(dom_ready);
        }
    }

    pub(crate) fn report_mut(&mut self) -> &mut PageReport {
        &mut self.report
    }
}

/// Behavior bundles of pages awaiting assembly, keyed by page path.
#[derive(Debug, Default)]
pub struct PageStore {
    pages: HashMap<String, PageBundle>,
}

impl PageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the content pass of `page`, discarding any unassembled bundle
    /// left from an earlier pass over the same page.
    pub fn begin_page(&mut self, page: &str) -> PageContext {
        if self.pages.remove(page).is_some() {
            tracing::debug!(page = %page, "Discarding unassembled behavior from earlier pass");
        }
        PageContext {
            page: page.to_owned(),
            bundle: PageBundle::default(),
            report: PageReport::default(),
        }
    }

    /// Finish the content pass, keeping the bundle if anything was recorded.
    pub fn end_page(&mut self, context: PageContext) -> PageReport {
        let PageContext {
            page,
            bundle,
            report,
        } = context;
        if !bundle.is_empty() {
            self.pages.insert(page, bundle);
        }
        report
    }

    /// Remove and return the bundle of `page`.
    pub fn take(&mut self, page: &str) -> Option<PageBundle> {
        self.pages.remove(page)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
