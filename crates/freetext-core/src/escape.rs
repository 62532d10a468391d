//! Escaping for the three contexts generated output is embedded in.
//!
//! Every piece of configuration text that ends up in markup or behavior
//! source goes through exactly one of these functions.

/// Escape text for a double- or single-quoted HTML attribute value.
pub fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape text for an HTML element body.
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape text for a single- or double-quoted string literal inside a
/// `<script>` element.
///
/// Backslashes are escaped first, then quotes, then line breaks, so no
/// character is escaped twice. `</` becomes `<\/` so the literal can never
/// terminate the enclosing script element.
pub fn escape_js_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_attr() {
        assert_eq!(
            escape_attr(r#"Say "hi" & <wave> it's"#),
            "Say &quot;hi&quot; &amp; &lt;wave&gt; it&#x27;s"
        );
    }

    #[test]
    fn test_escape_attr_plain_text_unchanged() {
        assert_eq!(escape_attr("Enter your answer..."), "Enter your answer...");
    }

    #[test]
    fn test_escape_html_keeps_quotes() {
        assert_eq!(escape_html(r#"a < b & "c""#), r#"a &lt; b &amp; "c""#);
    }

    #[test]
    fn test_escape_js_string_order() {
        // A literal backslash followed by n must not turn into an escaped newline.
        assert_eq!(escape_js_string(r"C:\new"), r"C:\\new");
        assert_eq!(escape_js_string("line1\nline2"), r"line1\nline2");
        assert_eq!(escape_js_string("it's"), r"it\'s");
        assert_eq!(escape_js_string(r#"say "x""#), r#"say \"x\""#);
        assert_eq!(escape_js_string("a\r\nb"), r"a\r\nb");
    }

    #[test]
    fn test_escape_js_string_script_close() {
        assert_eq!(
            escape_js_string("</script><script>alert(1)"),
            r"<\/script><script>alert(1)"
        );
    }
}
