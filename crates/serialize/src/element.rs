//! Serialization of a single element into a flat property bag.

use serde_json::{json, Value};

use autocapture_classify::{is_capture_compatible, is_sensitive_element, should_capture_element};
use autocapture_core_types::{Properties, PROP_EL_TEXT};
use autocapture_dom::DomNode;
use autocapture_privacy::should_capture_value;

use crate::text::{direct_and_nested_span_text, safe_text, truncate_text};

/// Attribute prefix carrying user-defined augment properties.
pub const AUGMENT_ATTR_PREFIX: &str = "data-ph-capture-attribute-";

// Attributes still captured on input-like elements.
const SENSITIVE_SAFE_ATTRS: [&str; 4] = ["name", "id", "class", "aria-label"];

/// The `$el_text` rule: anchors and buttons pull nested span text, everything
/// else direct text only.
pub fn element_text(el: &DomNode) -> String {
    if el.is_tag("a") || el.is_tag("button") {
        direct_and_nested_span_text(el)
    } else {
        safe_text(el)
    }
}

/// Serialize one element into `tag_name`, `classes`, `attr__*`, positions and
/// optional `$el_text`. A value failing its own check is skipped without
/// aborting the rest.
pub fn properties_from_element(
    el: &DomNode,
    mask_all_attributes: bool,
    mask_all_text: bool,
    attribute_ignorelist: &[String],
) -> Properties {
    let mut props = Properties::new();
    let tag = el.tag_name().unwrap_or_default();
    props.insert("tag_name".into(), json!(tag));

    if is_capture_compatible(el) && !mask_all_text {
        let text = truncate_text(&element_text(el));
        if !text.is_empty() {
            props.insert(PROP_EL_TEXT.into(), json!(text));
        }
    }

    props.insert("classes".into(), json!(el.class_names()));

    let sensitive = is_sensitive_element(el);
    for (name, value) in el.attributes() {
        if sensitive && !SENSITIVE_SAFE_ATTRS.contains(&name.as_str()) {
            continue;
        }
        if attribute_ignorelist.iter().any(|ignored| ignored == &name) {
            continue;
        }
        if mask_all_attributes {
            continue;
        }
        // Framework-internal attribute soup adds nothing semantic.
        if name.starts_with("_ngcontent") || name.starts_with("_nghost") {
            continue;
        }
        if !should_capture_value(&value, true) {
            continue;
        }
        let captured = if name == "class" {
            value.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            value
        };
        props.insert(format!("attr__{name}"), json!(truncate_text(&captured)));
    }

    let (nth_child, nth_of_type) = el.nth_position();
    props.insert("nth_child".into(), json!(nth_child));
    props.insert("nth_of_type".into(), json!(nth_of_type));
    props
}

/// Extract `data-ph-capture-attribute-<key>` augment properties. Hidden and
/// password inputs contribute nothing at all; string values that merely look
/// falsy (`"0"`, `"false"`) are business data and captured verbatim.
pub fn augment_properties_from_element(el: &DomNode) -> Properties {
    let mut props = Properties::new();
    if el.is_tag("input") {
        if let Some(input_type) = el.attribute("type") {
            if input_type.eq_ignore_ascii_case("hidden")
                || input_type.eq_ignore_ascii_case("password")
            {
                return props;
            }
        }
    }
    if !should_capture_element(el) {
        return props;
    }
    for (name, value) in el.attributes() {
        if let Some(key) = name.strip_prefix(AUGMENT_ATTR_PREFIX) {
            if key.is_empty() {
                continue;
            }
            if should_capture_value(&value, true) {
                props.insert(key.to_string(), Value::String(value));
            }
        }
    }
    props
}
