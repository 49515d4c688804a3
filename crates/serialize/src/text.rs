//! Privacy-safe text extraction from elements.

use autocapture_classify::is_sensitive_element;
use autocapture_dom::DomNode;
use autocapture_privacy::should_capture_value;

/// Ceiling applied to captured text and attribute values.
pub const MAX_CAPTURED_TEXT_LEN: usize = 1024;

/// Truncate to the capture ceiling, marking truncation with an ellipsis.
pub fn truncate_text(value: &str) -> String {
    if value.chars().count() > MAX_CAPTURED_TEXT_LEN {
        let mut out: String = value.chars().take(MAX_CAPTURED_TEXT_LEN).collect();
        out.push_str("...");
        out
    } else {
        value.to_string()
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of the element's *direct* text-node children only, whitespace
/// collapsed. Descendant element text is excluded with no separator inserted
/// in its place. Input-like and contenteditable elements yield `""`, and any
/// text chunk containing a PII-shaped token is dropped wholesale.
pub fn safe_text(el: &DomNode) -> String {
    if is_sensitive_element(el) {
        return String::new();
    }
    let mut combined = String::new();
    for chunk in el.direct_text_chunks() {
        if !should_capture_value(chunk.trim(), false) {
            continue;
        }
        combined.push_str(&chunk);
    }
    collapse_whitespace(&combined)
}

fn collect_span_text(el: &DomNode, pieces: &mut Vec<String>) {
    for child in el.children() {
        if child.is_tag("span") {
            let piece = safe_text(&child);
            if !piece.is_empty() {
                pieces.push(piece);
            }
        }
        if child.is_element() {
            collect_span_text(&child, pieces);
        }
    }
}

/// For anchor/button-like elements: direct text plus the safe text of every
/// descendant `span`, space-joined and truncated.
pub fn direct_and_nested_span_text(el: &DomNode) -> String {
    let mut pieces = Vec::new();
    let direct = safe_text(el);
    if !direct.is_empty() {
        pieces.push(direct);
    }
    collect_span_text(el, &mut pieces);
    truncate_text(&pieces.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collapses_runs_of_whitespace() {
        let el = DomNode::element("div").with_child(DomNode::text("  Why  hello  there  "));
        assert_eq!(safe_text(&el), "Why hello there");
    }

    #[test]
    fn excludes_descendant_element_text_without_separator() {
        let el = DomNode::element("div")
            .with_child(DomNode::text("Why"))
            .with_child(DomNode::element("p").with_child(DomNode::text("not")))
            .with_child(DomNode::text("hello"))
            .with_child(DomNode::element("p").with_child(DomNode::text("not")))
            .with_child(DomNode::text("there"));
        assert_eq!(safe_text(&el), "Whyhellothere");
    }

    #[test]
    fn sensitive_elements_yield_empty_text() {
        for tag in ["input", "textarea", "select"] {
            let el = DomNode::element(tag).with_child(DomNode::text("secret"));
            assert_eq!(safe_text(&el), "");
        }
        let editable = DomNode::element("div")
            .with_attr("contenteditable", "true")
            .with_child(DomNode::text("secret"));
        assert_eq!(safe_text(&editable), "");
    }

    #[test]
    fn drops_pii_chunks_but_keeps_safe_ones() {
        let el = DomNode::element("div")
            .with_child(DomNode::text("your ssn 123-45-6789 "))
            .with_child(DomNode::text("is on file"));
        assert_eq!(safe_text(&el), "is on file");
    }

    #[test]
    fn nested_span_text_is_collected_at_any_depth() {
        let el = DomNode::element("a")
            .with_child(DomNode::text("Click"))
            .with_child(
                DomNode::element("div").with_child(
                    DomNode::element("span")
                        .with_child(DomNode::text("deep"))
                        .with_child(DomNode::element("span").with_child(DomNode::text("deeper"))),
                ),
            );
        assert_eq!(direct_and_nested_span_text(&el), "Click deep deeper");
    }

    #[test]
    fn truncation_appends_ellipsis() {
        let long = "x".repeat(MAX_CAPTURED_TEXT_LEN + 10);
        let truncated = truncate_text(&long);
        assert_eq!(truncated.chars().count(), MAX_CAPTURED_TEXT_LEN + 3);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_text("short"), "short");
    }
}
