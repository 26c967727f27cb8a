//! String-level narrowing of a page before it is parsed.

/// Returns the markup between `<body ...>` and `</body>`, or the whole
/// document when either tag is missing.
pub fn isolate_body(html: &str) -> &str {
    // ASCII lowercasing keeps byte offsets valid for slicing `html`.
    let lower = html.to_ascii_lowercase();

    let Some(start) = lower.find("<body") else {
        return html;
    };
    let Some(open_end) = lower[start..].find('>').map(|i| start + i + 1) else {
        return html;
    };
    let Some(end) = lower[open_end..].find("</body>").map(|i| open_end + i) else {
        return html;
    };
    &html[open_end..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolates_body() {
        let html = r#"<html><head><title>x</title></head><body class="page"><p>hi</p></body></html>"#;
        assert_eq!(isolate_body(html), "<p>hi</p>");
    }

    #[test]
    fn test_uppercase_tags() {
        let html = "<HTML><BODY><p>hé</p></BODY></HTML>";
        assert_eq!(isolate_body(html), "<p>hé</p>");
    }

    #[test]
    fn test_missing_close_tag_keeps_everything() {
        let html = "<html><body><p>truncated";
        assert_eq!(isolate_body(html), html);
    }

    #[test]
    fn test_missing_body_keeps_everything() {
        let html = "<article><p>bare</p></article>";
        assert_eq!(isolate_body(html), html);
        assert_eq!(isolate_body(""), "");
    }
}
