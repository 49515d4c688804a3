//! Autocapture configuration value object and its precompiled form.
//!
//! Allowlists follow the "unset means unrestricted, empty means deny all"
//! rule. Patterns compile once per config change, not per capture decision.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use autocapture_dom::DomNode;

use crate::selector::Selector;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AutocaptureConfig {
    #[serde(default)]
    pub url_allowlist: Option<Vec<String>>,
    #[serde(default)]
    pub dom_event_allowlist: Option<Vec<String>>,
    #[serde(default)]
    pub element_allowlist: Option<Vec<String>>,
    #[serde(default)]
    pub css_selector_allowlist: Option<Vec<String>>,
    #[serde(default)]
    pub element_attribute_ignorelist: Vec<String>,
    #[serde(default)]
    pub capture_copied_text: bool,
}

#[derive(Clone, Debug, Default)]
pub struct CompiledAutocaptureConfig {
    url_allowlist: Option<Vec<Regex>>,
    dom_event_allowlist: Option<Vec<String>>,
    element_allowlist: Option<Vec<String>>,
    css_selector_allowlist: Option<Vec<Selector>>,
    pub element_attribute_ignorelist: Vec<String>,
    pub capture_copied_text: bool,
}

impl CompiledAutocaptureConfig {
    pub fn compile(config: &AutocaptureConfig) -> Self {
        let url_allowlist = config.url_allowlist.as_ref().map(|patterns| {
            patterns
                .iter()
                .filter_map(|pattern| match Regex::new(pattern) {
                    Ok(regex) => Some(regex),
                    Err(err) => {
                        warn!(target: "autocapture-classify", %pattern, %err, "invalid url allowlist pattern, treating as non-matching");
                        None
                    }
                })
                .collect()
        });
        let css_selector_allowlist = config.css_selector_allowlist.as_ref().map(|selectors| {
            selectors
                .iter()
                .filter_map(|selector| {
                    let parsed = Selector::parse(selector);
                    if parsed.is_none() {
                        warn!(target: "autocapture-classify", %selector, "unsupported css selector, treating as non-matching");
                    }
                    parsed
                })
                .collect()
        });
        Self {
            url_allowlist,
            dom_event_allowlist: config
                .dom_event_allowlist
                .as_ref()
                .map(|events| events.iter().map(|e| e.to_ascii_lowercase()).collect()),
            element_allowlist: config
                .element_allowlist
                .as_ref()
                .map(|tags| tags.iter().map(|t| t.to_ascii_lowercase()).collect()),
            css_selector_allowlist,
            element_attribute_ignorelist: config.element_attribute_ignorelist.clone(),
            capture_copied_text: config.capture_copied_text,
        }
    }

    /// A provided-but-empty allowlist matches nothing.
    pub fn url_allowed(&self, url: &str) -> bool {
        match &self.url_allowlist {
            None => true,
            Some(patterns) => patterns.iter().any(|pattern| pattern.is_match(url)),
        }
    }

    pub fn event_allowed(&self, event_type: &str) -> bool {
        match &self.dom_event_allowlist {
            None => true,
            Some(events) => events.iter().any(|e| e.eq_ignore_ascii_case(event_type)),
        }
    }

    pub fn element_allowed(&self, el: &DomNode) -> bool {
        match &self.element_allowlist {
            None => true,
            Some(tags) => el
                .tag_name()
                .is_some_and(|tag| tags.iter().any(|allowed| allowed == &tag)),
        }
    }

    pub fn selector_allowed(&self, el: &DomNode) -> bool {
        match &self.css_selector_allowlist {
            None => true,
            Some(selectors) => selectors.iter().any(|selector| selector.matches(el)),
        }
    }
}
