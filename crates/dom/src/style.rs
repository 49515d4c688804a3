//! Inline-style inspection. Only the declarations the pipeline cares about
//! are parsed; anything malformed is ignored.

use std::collections::BTreeMap;

use crate::DomNode;

/// Parse the `style` attribute into a lowercase property map.
pub fn inline_style(el: &DomNode) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    let Some(style) = el.attribute("style") else {
        return out;
    };
    for declaration in style.split(';') {
        let Some((name, value)) = declaration.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim().to_ascii_lowercase();
        if !name.is_empty() && !value.is_empty() {
            out.insert(name, value);
        }
    }
    out
}

/// Elements styled `cursor: pointer` advertise themselves as clickable.
pub fn has_pointer_cursor(el: &DomNode) -> bool {
    inline_style(el)
        .get("cursor")
        .is_some_and(|value| value == "pointer")
}
