//! `freetext process` command implementation.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use freetext_config::{ConfigOverrides, FreetextConfig};
use freetext_core::{FreetextPlugin, PageReport};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the process command.
#[derive(Args)]
pub(crate) struct ProcessArgs {
    /// Built site directory or a single HTML file.
    path: PathBuf,

    /// Path to configuration file (default: auto-discover freetext.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write before/after snapshots of every changed page.
    #[arg(long)]
    debug: bool,

    /// Directory for debug snapshots (overrides config).
    #[arg(long, env = "FREETEXT_DEBUG_DIR")]
    debug_dir: Option<PathBuf>,

    /// Shuffle assessment questions unless a block says otherwise.
    #[arg(long)]
    shuffle: bool,

    /// Do not inject the question style sheet.
    #[arg(long)]
    no_css: bool,

    /// Report what would change without writing any file.
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl ProcessArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let overrides = ConfigOverrides {
            debug: self.debug.then_some(true),
            debug_dir: self.debug_dir.clone(),
            shuffle_questions: self.shuffle.then_some(true),
            enable_css: self.no_css.then_some(false),
        };
        let config = FreetextConfig::load(self.config.as_deref(), Some(&overrides))?;

        let pages = collect_pages(&self.path)?;
        if pages.is_empty() {
            output.warning(&format!("No HTML files found in {}", self.path.display()));
            return Ok(());
        }
        output.info(&format!(
            "Processing {} page(s) in {}",
            pages.len(),
            self.path.display()
        ));

        let mut plugin = FreetextPlugin::new(config);
        let summary = process_pages(&mut plugin, &pages, self.dry_run)?;

        for page in &summary.changed {
            output.detail(&format!("  {page}"));
        }
        let verb = if self.dry_run { "Would update" } else { "Updated" };
        output.success(&format!(
            "{verb} {} of {} page(s): {} question(s), {} assessment(s) with {} question(s)",
            summary.changed.len(),
            summary.pages,
            summary.totals.questions,
            summary.totals.assessments,
            summary.totals.assessment_questions,
        ));
        if summary.totals.empty_assessments > 0 {
            output.warning(&format!(
                "{} assessment(s) had no valid questions",
                summary.totals.empty_assessments
            ));
        }
        Ok(())
    }
}

/// One HTML file and its identity within the site.
#[derive(Debug, PartialEq, Eq)]
struct SitePage {
    path: PathBuf,
    name: String,
}

/// Outcome of processing a set of pages.
#[derive(Debug, Default)]
struct Summary {
    pages: usize,
    changed: Vec<String>,
    totals: PageReport,
}

/// Resolve `target` to the pages to process, sorted by name.
///
/// A file is its own page. A directory yields every `*.html` file below it,
/// named by its path relative to the directory with `/` separators.
fn collect_pages(target: &Path) -> Result<Vec<SitePage>, CliError> {
    if target.is_file() {
        let name = target
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(vec![SitePage {
            path: target.to_path_buf(),
            name,
        }]);
    }
    if !target.is_dir() {
        return Err(CliError::Validation(format!(
            "Path not found: {}",
            target.display()
        )));
    }

    let pattern = format!(
        "{}/**/*.html",
        glob::Pattern::escape(&target.to_string_lossy())
    );
    let mut pages = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry.map_err(glob::GlobError::into_error)?;
        if !path.is_file() {
            continue;
        }
        let name = path
            .strip_prefix(target)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        pages.push(SitePage { path, name });
    }
    pages.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(pages)
}

/// Run both passes over every page, writing changed pages back unless
/// `dry_run` is set.
fn process_pages(
    plugin: &mut FreetextPlugin,
    pages: &[SitePage],
    dry_run: bool,
) -> Result<Summary, CliError> {
    let mut summary = Summary::default();
    for page in pages {
        let original = fs::read_to_string(&page.path)?;
        let (content, report) = plugin.transform_page_with_report(&original, &page.name);
        let result = plugin.assemble_page(&content, &page.name);

        summary.pages += 1;
        summary.totals.questions += report.questions;
        summary.totals.assessments += report.assessments;
        summary.totals.assessment_questions += report.assessment_questions;
        summary.totals.empty_assessments += report.empty_assessments;

        if result == original {
            continue;
        }
        if !dry_run {
            fs::write(&page.path, &result)?;
        }
        tracing::debug!(page = %page.name, dry_run, "Page updated");
        summary.changed.push(page.name.clone());
    }
    Ok(summary)
}
