//! Locating question admonitions in rendered page HTML.
//!
//! [`extract_blocks`] walks the `<div>` tag sequence once, keeping a stack of
//! open elements, so the matching `</div>` of a question is found even when
//! its body holds other containers (callouts, highlighted code, diagrams).
//!
//! Blocks are returned as byte spans into the input, which lets the caller
//! substitute each block by position instead of searching for its text.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// Admonition type that marks a single question.
pub const QUESTION_MARKER: &str = "freetext";

/// Admonition type that marks an assessment.
pub const ASSESSMENT_MARKER: &str = "freetext-assessment";

/// Class shared by every admonition container.
const ADMONITION_CLASS: &str = "admonition";

static TITLE_PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\A\s*<p\s+class="admonition-title"[^>]*>.*?</p>"#).unwrap()
});

/// Variant of a detected block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// One question with one answer field.
    SingleQuestion,
    /// Several questions sharing a title and one submit action.
    Assessment,
}

impl BlockKind {
    fn marker(self) -> &'static str {
        match self {
            Self::SingleQuestion => QUESTION_MARKER,
            Self::Assessment => ASSESSMENT_MARKER,
        }
    }
}

/// One detected admonition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block<'a> {
    /// Kind of the block. A block found by a question scan that also carries
    /// the assessment marker is reported as [`BlockKind::Assessment`].
    pub kind: BlockKind,
    /// Byte range of the whole element in the scanned HTML.
    pub span: Range<usize>,
    /// The element's full markup, including its own tags.
    pub raw_markup: &'a str,
    /// Markup between the tags with the admonition title removed, trimmed.
    pub inner_content: &'a str,
}

/// Find every admonition carrying the marker of `target`, in document order.
///
/// A candidate without a matching `</div>` is dropped and left untouched in
/// the page. Matches nested inside an earlier match are not returned
/// separately; they are part of the outer block's content.
pub fn extract_blocks(html: &str, target: BlockKind) -> Vec<Block<'_>> {
    // Each open div records whether it is a candidate: (open start, inner start, kind).
    let mut stack: Vec<Option<(usize, usize, BlockKind)>> = Vec::new();
    let mut found: Vec<Block<'_>> = Vec::new();

    for tag in TagScanner::new(html) {
        match tag.kind {
            TagKind::Open => {
                let candidate = classify(tag.attrs, target).map(|kind| (tag.start, tag.end, kind));
                stack.push(candidate);
            }
            TagKind::SelfClosing => {}
            TagKind::Close => {
                let Some(entry) = stack.pop() else {
                    continue;
                };
                if let Some((start, inner_start, kind)) = entry {
                    let inner = &html[inner_start..tag.start];
                    found.push(Block {
                        kind,
                        span: start..tag.end,
                        raw_markup: &html[start..tag.end],
                        inner_content: strip_title(inner),
                    });
                }
            }
        }
    }

    let unterminated = stack.iter().flatten().count();
    if unterminated > 0 {
        tracing::warn!(
            count = unterminated,
            marker = target.marker(),
            "Unterminated admonition left unchanged"
        );
    }

    // Inner blocks close first, so restore document order before dropping nested ones.
    found.sort_by_key(|b| b.span.start);
    let mut blocks: Vec<Block<'_>> = Vec::with_capacity(found.len());
    for block in found {
        if blocks.last().is_some_and(|prev| block.span.start < prev.span.end) {
            continue;
        }
        blocks.push(block);
    }
    blocks
}

/// Replace non-overlapping byte ranges of `html`, given in ascending order.
pub fn splice(html: &str, replacements: Vec<(Range<usize>, String)>) -> String {
    let mut output = String::with_capacity(html.len());
    let mut last = 0;
    for (range, replacement) in replacements {
        output.push_str(&html[last..range.start]);
        output.push_str(&replacement);
        last = range.end;
    }
    output.push_str(&html[last..]);
    output
}

/// Remove the leading admonition title paragraph and surrounding whitespace.
fn strip_title(inner: &str) -> &str {
    match TITLE_PARAGRAPH.find(inner) {
        Some(m) => inner[m.end()..].trim(),
        None => inner.trim(),
    }
}

/// Decide whether an opening tag starts a block for `target`.
fn classify(attrs: &str, target: BlockKind) -> Option<BlockKind> {
    let classes = attr_value(attrs, "class")?;
    let mut is_admonition = false;
    let mut is_question = false;
    let mut is_assessment = false;
    for class in classes.split_whitespace() {
        match class {
            ADMONITION_CLASS => is_admonition = true,
            QUESTION_MARKER => is_question = true,
            ASSESSMENT_MARKER => is_assessment = true,
            _ => {}
        }
    }
    if !is_admonition {
        return None;
    }
    match target {
        BlockKind::Assessment if is_assessment => Some(BlockKind::Assessment),
        BlockKind::SingleQuestion if is_question && is_assessment => Some(BlockKind::Assessment),
        BlockKind::SingleQuestion if is_question => Some(BlockKind::SingleQuestion),
        _ => None,
    }
}

/// Look up an attribute value in the attribute text of a tag.
///
/// Supports `name="value"`, `name='value'` and `name=value`.
fn attr_value<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    let mut remaining = attrs.trim_start();
    while !remaining.is_empty() {
        let name_end = remaining
            .find(|c: char| c.is_whitespace() || c == '=' || c == '/' || c == '>')
            .unwrap_or(remaining.len());
        let attr_name = &remaining[..name_end];
        let after_name = remaining[name_end..].trim_start();

        let (value, rest) = if let Some(after_eq) = after_name.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            if let Some(quoted) = after_eq.strip_prefix('"') {
                let end = quoted.find('"').unwrap_or(quoted.len());
                (&quoted[..end], quoted.get(end + 1..).unwrap_or(""))
            } else if let Some(quoted) = after_eq.strip_prefix('\'') {
                let end = quoted.find('\'').unwrap_or(quoted.len());
                (&quoted[..end], quoted.get(end + 1..).unwrap_or(""))
            } else {
                let end = after_eq
                    .find(char::is_whitespace)
                    .unwrap_or(after_eq.len());
                (&after_eq[..end], &after_eq[end..])
            }
        } else {
            ("", after_name)
        };

        if attr_name.eq_ignore_ascii_case(name) {
            return Some(value);
        }

        // Guarantee progress on stray characters such as a lone '/'.
        remaining = if rest.len() == remaining.len() {
            &remaining[1..]
        } else {
            rest
        };
        remaining = remaining.trim_start();
    }
    None
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TagKind {
    Open,
    SelfClosing,
    Close,
}

/// A `<div>` or `</div>` tag found by [`TagScanner`].
#[derive(Debug)]
struct Tag<'a> {
    kind: TagKind,
    /// Byte offset of `<`.
    start: usize,
    /// Byte offset just past `>`.
    end: usize,
    /// Attribute text between the tag name and `>`.
    attrs: &'a str,
}

/// Forward-only scanner over the `div` tags of an HTML string.
///
/// Comments and the bodies of `<script>` and `<style>` elements are skipped.
struct TagScanner<'a> {
    html: &'a str,
    pos: usize,
}

impl<'a> TagScanner<'a> {
    fn new(html: &'a str) -> Self {
        Self { html, pos: 0 }
    }

    /// Byte offset just past the `>` closing a tag whose name ends at `from`,
    /// ignoring `>` inside quoted attribute values.
    fn tag_end(&self, from: usize) -> Option<usize> {
        let bytes = self.html.as_bytes();
        let mut quote: Option<u8> = None;
        for (offset, &b) in bytes[from..].iter().enumerate() {
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None if b == b'"' || b == b'\'' => quote = Some(b),
                None if b == b'>' => return Some(from + offset + 1),
                None => {}
            }
        }
        None
    }

    /// Skip past `needle` (case-insensitive) starting at `from`.
    fn skip_past(&mut self, from: usize, needle: &str) {
        let needle = needle.as_bytes();
        self.pos = self.html.as_bytes()[from..]
            .windows(needle.len())
            .position(|window| window.eq_ignore_ascii_case(needle))
            .map_or(self.html.len(), |i| from + i + needle.len());
    }
}

/// Whether `name` starts at `at` as a complete tag name.
fn has_tag_name(html: &str, at: usize, name: &str) -> bool {
    let end = at + name.len();
    html.get(at..end)
        .is_some_and(|s| s.eq_ignore_ascii_case(name))
        && html[end..]
            .chars()
            .next()
            .is_none_or(|c| c.is_whitespace() || c == '>' || c == '/')
}

impl<'a> Iterator for TagScanner<'a> {
    type Item = Tag<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let html = self.html;
        loop {
            let start = self.pos + html[self.pos..].find('<')?;
            let rest = &html[start..];

            if rest.starts_with("<!--") {
                self.skip_past(start + 4, "-->");
                continue;
            }

            for raw_text in ["script", "style"] {
                if has_tag_name(html, start + 1, raw_text) {
                    self.skip_past(start + 1, &format!("</{raw_text}"));
                }
            }
            if self.pos > start {
                continue;
            }

            if has_tag_name(html, start + 1, "div") {
                let name_end = start + 4;
                let Some(end) = self.tag_end(name_end) else {
                    self.pos = html.len();
                    return None;
                };
                self.pos = end;
                let inner = &html[name_end..end - 1];
                let (kind, attrs) = match inner.trim_end().strip_suffix('/') {
                    Some(attrs) => (TagKind::SelfClosing, attrs),
                    None => (TagKind::Open, inner),
                };
                return Some(Tag {
                    kind,
                    start,
                    end,
                    attrs,
                });
            }

            if rest.starts_with("</") && has_tag_name(html, start + 2, "div") {
                let Some(end) = self.tag_end(start + 5) else {
                    self.pos = html.len();
                    return None;
                };
                self.pos = end;
                return Some(Tag {
                    kind: TagKind::Close,
                    start,
                    end,
                    attrs: "",
                });
            }

            self.pos = start + 1;
        }
    }
}
