//! Compact string encoding of a serialized ancestor chain, used instead of
//! the structured `$elements` array when the chain-as-string mode is on.

use serde_json::Value;

use autocapture_core_types::{Properties, PROP_EL_TEXT};

fn escape(value: &str) -> String {
    value.replace('"', "\\\"")
}

fn push_pair(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

fn segment(props: &Properties) -> String {
    let mut out = String::new();
    if let Some(Value::String(tag)) = props.get("tag_name") {
        out.push_str(tag);
    }
    if let Some(Value::Array(classes)) = props.get("classes") {
        let mut names: Vec<&str> = classes.iter().filter_map(Value::as_str).collect();
        names.sort_unstable();
        for name in names {
            out.push('.');
            out.push_str(name);
        }
    }
    out.push(':');
    if let Some(Value::String(text)) = props.get(PROP_EL_TEXT) {
        push_pair(&mut out, "text", text);
    }
    if let Some(nth_child) = props.get("nth_child").and_then(Value::as_u64) {
        push_pair(&mut out, "nth-child", &nth_child.to_string());
    }
    if let Some(nth_of_type) = props.get("nth_of_type").and_then(Value::as_u64) {
        push_pair(&mut out, "nth-of-type", &nth_of_type.to_string());
    }
    if let Some(Value::String(href)) = props.get("attr__href") {
        push_pair(&mut out, "href", href);
    }
    let mut attr_keys: Vec<&String> = props
        .keys()
        .filter(|key| key.starts_with("attr__") && key.as_str() != "attr__href")
        .collect();
    attr_keys.sort_unstable();
    for key in attr_keys {
        if let Some(Value::String(value)) = props.get(key) {
            push_pair(&mut out, key, value);
        }
    }
    out
}

/// Join each element's segment with `;`, target first.
pub fn elements_chain(elements: &[Properties]) -> String {
    elements
        .iter()
        .map(segment)
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::properties_from_element;
    use autocapture_dom::DomNode;
    use pretty_assertions::assert_eq;

    #[test]
    fn encodes_tag_classes_and_attributes_deterministically() {
        let el = DomNode::element("a")
            .with_attr("class", "zeta alpha")
            .with_attr("href", "http://test.com")
            .with_child(DomNode::text("Go"));
        let props = properties_from_element(&el, false, false, &[]);
        let chain = elements_chain(&[props]);
        assert_eq!(
            chain,
            "a.alpha.zeta:text=\"Go\"nth-child=\"1\"nth-of-type=\"1\"href=\"http://test.com\"attr__class=\"zeta alpha\""
        );
    }

    #[test]
    fn joins_segments_with_semicolons() {
        let span = properties_from_element(&DomNode::element("span"), false, false, &[]);
        let div = properties_from_element(&DomNode::element("div"), false, false, &[]);
        let chain = elements_chain(&[span, div]);
        assert_eq!(
            chain,
            "span:nth-child=\"1\"nth-of-type=\"1\";div:nth-child=\"1\"nth-of-type=\"1\""
        );
    }

    #[test]
    fn escapes_embedded_quotes() {
        let el = DomNode::element("button").with_child(DomNode::text("say \"hi\""));
        let props = properties_from_element(&el, false, false, &[]);
        let chain = elements_chain(&[props]);
        assert!(chain.contains("text=\"say \\\"hi\\\"\""));
    }
}
