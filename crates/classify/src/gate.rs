//! The event-level capture gate: given a resolved target and event type,
//! decide whether the pipeline should proceed at all.

use autocapture_dom::{has_pointer_cursor, DomNode};

use crate::config::CompiledAutocaptureConfig;
use crate::predicates::should_capture_element;

/// Tags autocapture knows how to attribute interactions to.
pub const CAPTURE_COMPATIBLE_TAGS: [&str; 7] =
    ["a", "button", "form", "input", "select", "textarea", "label"];

const DEFAULT_EVENT_TYPES: [&str; 3] = ["click", "change", "submit"];

/// Whether an element is a plausible interaction target: one of the known
/// interactive tags, or styled `cursor: pointer`.
pub fn is_capture_compatible(el: &DomNode) -> bool {
    el.tag_name()
        .is_some_and(|tag| CAPTURE_COMPATIBLE_TAGS.contains(&tag.as_str()))
        || has_pointer_cursor(el)
}

/// Combined gate over event type, target shape, element predicates and every
/// configured allowlist. All present allowlists must pass simultaneously.
pub fn should_capture_dom_event(
    target: &DomNode,
    event_type: &str,
    current_url: &str,
    config: &CompiledAutocaptureConfig,
    is_copy_autocapture: bool,
    copy_event_types: &[&str],
) -> bool {
    let allowed_types: &[&str] = if is_copy_autocapture {
        copy_event_types
    } else {
        &DEFAULT_EVENT_TYPES
    };
    if !allowed_types
        .iter()
        .any(|t| t.eq_ignore_ascii_case(event_type))
    {
        return false;
    }

    if !target.is_element() || target.is_tag("html") {
        return false;
    }
    // A click on the page chrome itself carries no element semantics.
    if event_type.eq_ignore_ascii_case("click") && target.is_tag("body") {
        return false;
    }

    if !is_capture_compatible(target) {
        return false;
    }

    if !should_capture_element(target) {
        return false;
    }

    config.url_allowed(current_url)
        && config.event_allowed(event_type)
        && config.element_allowed(target)
        && config.selector_allowed(target)
}
