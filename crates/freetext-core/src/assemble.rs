//! Splicing a page's behavior and style into the final document.

use std::fmt::Write;

use crate::page::PageBundle;

/// Join a page's behavior into one script: every function definition first,
/// then a single load handler running all load-time statements.
pub fn consolidated_script(bundle: &PageBundle) -> String {
    let mut js = bundle.functions.join("\n");
    if !bundle.dom_ready.is_empty() {
        js.push_str("\ndocument.addEventListener('DOMContentLoaded', function() {\n");
        for line in bundle
            .dom_ready
            .iter()
            .flat_map(|fragment| fragment.lines())
            .filter(|line| !line.trim().is_empty())
        {
            let _ = writeln!(js, "    {line}");
        }
        js.push_str("});\n");
    }
    js
}

/// Insert `snippet` right after the first `<head>` tag, else before
/// `</head>`, else at the start of the document.
fn insert_early_in_head(output: &str, snippet: &str) -> String {
    let mut html = String::with_capacity(output.len() + snippet.len());
    if let Some(pos) = output.find("<head>") {
        let at = pos + "<head>".len();
        html.push_str(&output[..at]);
        html.push_str(snippet);
        html.push_str(&output[at..]);
    } else if let Some(at) = output.find("</head>") {
        html.push_str(&output[..at]);
        html.push_str(snippet);
        html.push_str(&output[at..]);
    } else {
        html.push_str(snippet);
        html.push_str(output);
    }
    html
}

/// Insert `snippet` before `</head>`, else at the start of the document.
fn insert_before_head_end(output: &str, snippet: &str) -> String {
    match output.find("</head>") {
        Some(at) => {
            let mut html = String::with_capacity(output.len() + snippet.len());
            html.push_str(&output[..at]);
            html.push_str(snippet);
            html.push_str(&output[at..]);
            html
        }
        None => format!("{snippet}{output}"),
    }
}

/// Add the page's script block and, if given, the style sheet.
pub fn assemble(output: &str, bundle: &PageBundle, style: Option<&str>) -> String {
    let mut html = if bundle.is_empty() {
        output.to_owned()
    } else {
        let script = format!("\n<script>\n{}</script>\n", consolidated_script(bundle));
        insert_early_in_head(output, &script)
    };
    if let Some(style) = style {
        html = insert_before_head_end(&html, style);
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bundle() -> PageBundle {
        PageBundle {
            functions: vec![
                "function a() {}\n".to_owned(),
                "function b() {}\n".to_owned(),
            ],
            dom_ready: vec!["b();".to_owned(), "c();\n\nd();".to_owned()],
        }
    }

    #[test]
    fn test_consolidated_script_order() {
        let js = consolidated_script(&bundle());
        assert_eq!(
            js,
            "function a() {}\n\nfunction b() {}\n\ndocument.addEventListener('DOMContentLoaded', function() {\n    b();\n    c();\n    d();\n});\n"
        );
        assert_eq!(js.matches("DOMContentLoaded").count(), 1);
    }

    #[test]
    fn test_no_load_handler_without_dom_ready() {
        let only_functions = PageBundle {
            functions: vec!["function a() {}\n".to_owned()],
            dom_ready: Vec::new(),
        };
        assert!(!consolidated_script(&only_functions).contains("DOMContentLoaded"));
    }

    #[test]
    fn test_script_after_head_open() {
        let html = assemble(
            "<html><head><title>T</title></head><body></body></html>",
            &bundle(),
            None,
        );
        assert!(html.starts_with("<html><head>\n<script>\nfunction a()"));
        assert!(html.contains("</script>\n<title>T</title></head>"));
    }

    #[test]
    fn test_script_before_head_close_when_head_has_attributes() {
        let html = assemble("<head lang=\"en\"><title>T</title></head><body></body>", &bundle(), None);
        assert!(html.contains("<title>T</title>\n<script>"));
        assert!(html.contains("</script>\n</head>"));
    }

    #[test]
    fn test_script_prepended_without_head() {
        let html = assemble("<p>fragment</p>", &bundle(), None);
        assert!(html.starts_with("\n<script>\n"));
        assert!(html.ends_with("<p>fragment</p>"));
    }

    #[test]
    fn test_style_before_head_close() {
        let html = assemble(
            "<head><title>T</title></head><body></body>",
            &bundle(),
            Some("<style>x</style>\n"),
        );
        assert!(html.contains("<title>T</title><style>x</style>\n</head>"));
        let script_at = html.find("<script>").unwrap();
        let style_at = html.find("<style>").unwrap();
        assert!(script_at < style_at);
    }

    #[test]
    fn test_style_prepended_without_head() {
        let html = assemble("<p>x</p>", &PageBundle::default(), Some("<style>x</style>\n"));
        assert_eq!(html, "<style>x</style>\n<p>x</p>");
    }
}
