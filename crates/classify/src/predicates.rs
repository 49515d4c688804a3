//! Per-element capture predicates: sensitivity, marker classes, and the
//! sensitive-field name heuristic.

use once_cell::sync::Lazy;
use regex::Regex;

use autocapture_dom::DomNode;

/// Marker class excluding an element (and its subtree) from capture.
pub const NO_CAPTURE_CLASS: &str = "ph-no-capture";
/// Marker class flagging an element as sensitive; behaves like no-capture.
pub const SENSITIVE_CLASS: &str = "ph-sensitive";
/// Marker class force-including an element despite field heuristics.
pub const INCLUDE_CLASS: &str = "ph-include";

// Prefix heuristic applied to name/id/class tokens with non-alphanumerics
// stripped, so "credit-card" and "credit_card" both hit "creditcard".
static SENSITIVE_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^cc|cardnum|ccnum|creditcard|csc|cvc|cvv|exp|pass|pwd|routing|seccode|securitycode|securitynum|socialsec|socsec|ssn",
    )
    .expect("static pattern")
});

/// Input-like elements whose values must never be captured as text.
pub fn is_sensitive_element(el: &DomNode) -> bool {
    el.is_form_field() || el.is_content_editable()
}

fn name_looks_sensitive(raw: &str) -> bool {
    let stripped: String = raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    !stripped.is_empty() && SENSITIVE_FIELD.is_match(&stripped)
}

/// Whether an element may appear in captured output at all.
///
/// Exclusion markers on the element or any ancestor (body excluded) always
/// win. The include marker overrides the field heuristics below it, so a
/// deliberately-annotated password-manager button can still be captured.
pub fn should_capture_element(el: &DomNode) -> bool {
    let mut current = Some(el.clone());
    while let Some(node) = current {
        if node.is_tag("body") {
            break;
        }
        if node.has_class(NO_CAPTURE_CLASS) || node.has_class(SENSITIVE_CLASS) {
            return false;
        }
        current = if node.is_shadow_root() {
            node.host()
        } else {
            node.parent()
        };
    }

    if el.has_class(INCLUDE_CLASS) {
        return true;
    }

    if el.is_tag("input") {
        if let Some(input_type) = el.attribute("type") {
            if input_type.eq_ignore_ascii_case("hidden")
                || input_type.eq_ignore_ascii_case("password")
            {
                return false;
            }
        }
    }

    if is_sensitive_element(el) {
        let mut candidates: Vec<String> = Vec::new();
        if let Some(name) = el.attribute("name") {
            candidates.push(name);
        }
        if let Some(id) = el.attribute("id") {
            candidates.push(id);
        }
        candidates.extend(el.class_names());
        if candidates.iter().any(|value| name_looks_sensitive(value)) {
            return false;
        }
    }

    true
}
