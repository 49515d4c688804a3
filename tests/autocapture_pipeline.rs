//! End-to-end pipeline tests through the `Autocapture` facade: target
//! resolution, chain serialization, privacy gates and config toggles acting
//! together.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use autocapture::{
    Autocapture, AutocaptureConfig, AutocaptureToggle, CaptureConfig, CollectorSink, DomNode,
    MemoryPersistence, RawDomEvent, RemoteConfigResponse,
};

fn pipeline(config: CaptureConfig) -> (Autocapture, Arc<CollectorSink>) {
    let sink = CollectorSink::new();
    let mut config = config;
    config.disable_remote_config = true;
    let capture = Autocapture::new(config, sink.clone(), MemoryPersistence::new());
    capture.set_current_url("https://app.example.com/dashboard");
    (capture, sink)
}

/// body > table > div > span > a, click on the anchor.
fn nested_anchor_page() -> (DomNode, DomNode) {
    let body = DomNode::element("body");
    let table = DomNode::element("table");
    let div = DomNode::element("div");
    let span = DomNode::element("span");
    let anchor = DomNode::element("a")
        .with_attr("href", "https://example.com/next")
        .with_child(DomNode::text("Click"));
    span.append_child(anchor.clone());
    div.append_child(span);
    table.append_child(div);
    body.append_child(table);
    (body, anchor)
}

#[test]
fn serializes_the_full_ancestor_chain() {
    let (capture, sink) = pipeline(CaptureConfig::default());
    let (_body, anchor) = nested_anchor_page();

    assert!(capture.on_dom_event(&RawDomEvent::new("click", Some(anchor))));

    let events = sink.events();
    assert_eq!(events.len(), 1);
    let (name, props) = &events[0];
    assert_eq!(name, "$autocapture");
    assert_eq!(props["$event_type"], json!("click"));
    assert_eq!(props["$ce_version"], json!(1));
    assert_eq!(props["$el_text"], json!("Click"));

    let elements = props["$elements"].as_array().unwrap();
    let tags: Vec<&str> = elements
        .iter()
        .map(|el| el["tag_name"].as_str().unwrap())
        .collect();
    assert_eq!(tags, vec!["a", "span", "div", "table", "body"]);
    assert_eq!(elements[0]["attr__href"], json!("https://example.com/next"));
    assert_eq!(elements[0]["$el_text"], json!("Click"));
    // Non-target elements never carry the target's text.
    assert!(elements[1].get("$el_text").is_none());
}

#[test]
fn ancestor_href_is_mirrored_onto_the_target() {
    let (capture, sink) = pipeline(CaptureConfig::default());
    let body = DomNode::element("body");
    let anchor = DomNode::element("a").with_attr("href", "/pricing");
    let button = DomNode::element("button").with_child(DomNode::text("See plans"));
    anchor.append_child(button.clone());
    body.append_child(anchor);

    assert!(capture.on_dom_event(&RawDomEvent::new("click", Some(button))));

    let events = sink.events();
    let elements = events[0].1["$elements"].as_array().unwrap();
    assert_eq!(elements[0]["tag_name"], json!("button"));
    assert_eq!(elements[0]["attr__href"], json!("/pricing"));
}

#[test]
fn long_attribute_values_truncate_with_ellipsis() {
    let (capture, sink) = pipeline(CaptureConfig::default());
    let body = DomNode::element("body");
    let button = DomNode::element("button").with_attr("data-props", "prop".repeat(400));
    body.append_child(button.clone());

    assert!(capture.on_dom_event(&RawDomEvent::new("click", Some(button))));

    let events = sink.events();
    let elements = events[0].1["$elements"].as_array().unwrap();
    let captured = elements[0]["attr__data-props"].as_str().unwrap();
    assert_eq!(captured.len(), 1024 + 3);
    assert_eq!(captured, format!("{}...", "prop".repeat(256)));
}

#[test]
fn no_capture_marker_on_any_ancestor_drops_the_event() {
    let (capture, sink) = pipeline(CaptureConfig::default());
    let body = DomNode::element("body");
    let section = DomNode::element("section").with_attr("class", "ph-no-capture");
    let button = DomNode::element("button");
    section.append_child(button.clone());
    body.append_child(section);

    assert!(!capture.on_dom_event(&RawDomEvent::new("click", Some(button))));
    assert!(sink.is_empty());
}

#[test]
fn include_marker_overrides_password_exclusion() {
    let (capture, sink) = pipeline(CaptureConfig::default());
    let body = DomNode::element("body");
    let plain = DomNode::element("input").with_attr("type", "password");
    let included = DomNode::element("input")
        .with_attr("type", "password")
        .with_attr("class", "ph-include");
    body.append_child(plain.clone());
    body.append_child(included.clone());

    assert!(!capture.on_dom_event(&RawDomEvent::new("change", Some(plain))));
    assert!(capture.on_dom_event(&RawDomEvent::new("change", Some(included))));
    assert_eq!(sink.len(), 1);
}

#[test]
fn sensitive_field_names_are_excluded() {
    let (capture, sink) = pipeline(CaptureConfig::default());
    let body = DomNode::element("body");
    let card = DomNode::element("input").with_attr("name", "credit-card-number");
    let search = DomNode::element("input").with_attr("name", "q");
    body.append_child(card.clone());
    body.append_child(search.clone());

    assert!(!capture.on_dom_event(&RawDomEvent::new("change", Some(card))));
    assert!(capture.on_dom_event(&RawDomEvent::new("change", Some(search))));
    assert_eq!(sink.len(), 1);
}

#[test]
fn clicks_directly_on_body_are_not_captured() {
    let (capture, sink) = pipeline(CaptureConfig::default());
    let body = DomNode::element("body").with_attr("style", "cursor: pointer");
    assert!(!capture.on_dom_event(&RawDomEvent::new("click", Some(body))));
    assert!(sink.is_empty());
}

#[test]
fn url_allowlist_gates_by_current_page() {
    let rules = AutocaptureConfig {
        url_allowlist: Some(vec!["example\\.com/dashboard".to_string()]),
        ..Default::default()
    };
    let mut config = CaptureConfig::default();
    config.autocapture = AutocaptureToggle::Rules(rules);
    let (capture, sink) = pipeline(config);
    let body = DomNode::element("body");
    let button = DomNode::element("button");
    body.append_child(button.clone());

    assert!(capture.on_dom_event(&RawDomEvent::new("click", Some(button.clone()))));

    capture.set_current_url("https://other.example.net/");
    assert!(!capture.on_dom_event(&RawDomEvent::new("click", Some(button))));
    assert_eq!(sink.len(), 1);
}

#[test]
fn empty_allowlist_denies_everything() {
    let rules = AutocaptureConfig {
        element_allowlist: Some(Vec::new()),
        ..Default::default()
    };
    let mut config = CaptureConfig::default();
    config.autocapture = AutocaptureToggle::Rules(rules);
    let (capture, sink) = pipeline(config);
    let body = DomNode::element("body");
    let button = DomNode::element("button");
    body.append_child(button.clone());

    assert!(!capture.on_dom_event(&RawDomEvent::new("click", Some(button))));
    assert!(sink.is_empty());
}

#[test]
fn css_selector_allowlist_matches_the_target() {
    let rules = AutocaptureConfig {
        css_selector_allowlist: Some(vec!["[data-track]".to_string()]),
        ..Default::default()
    };
    let mut config = CaptureConfig::default();
    config.autocapture = AutocaptureToggle::Rules(rules);
    let (capture, sink) = pipeline(config);
    let body = DomNode::element("body");
    let tracked = DomNode::element("button").with_attr("data-track", "");
    let untracked = DomNode::element("button");
    body.append_child(tracked.clone());
    body.append_child(untracked.clone());

    assert!(capture.on_dom_event(&RawDomEvent::new("click", Some(tracked))));
    assert!(!capture.on_dom_event(&RawDomEvent::new("click", Some(untracked))));
    assert_eq!(sink.len(), 1);
}

#[test]
fn augment_attributes_merge_onto_the_event() {
    let (capture, sink) = pipeline(CaptureConfig::default());
    let body = DomNode::element("body");
    let wrapper = DomNode::element("div").with_attr("data-ph-capture-attribute-plan", "free");
    let button = DomNode::element("button").with_attr("data-ph-capture-attribute-cta", "buy");
    wrapper.append_child(button.clone());
    body.append_child(wrapper);

    assert!(capture.on_dom_event(&RawDomEvent::new("click", Some(button))));
    let events = sink.events();
    assert_eq!(events[0].1["cta"], json!("buy"));
    assert_eq!(events[0].1["plan"], json!("free"));
}

#[test]
fn pii_text_is_stripped_from_el_text() {
    let (capture, sink) = pipeline(CaptureConfig::default());
    let body = DomNode::element("body");
    let button = DomNode::element("button")
        .with_child(DomNode::text("pay with 4111111111111111"))
        .with_child(DomNode::text("now"));
    body.append_child(button.clone());

    assert!(capture.on_dom_event(&RawDomEvent::new("click", Some(button))));
    let events = sink.events();
    // The chunk with the card number is dropped whole; the other survives.
    assert_eq!(events[0].1["$el_text"], json!("now"));
}

#[test]
fn elements_chain_replaces_the_structured_array() {
    let sink = CollectorSink::new();
    let capture = Autocapture::new(
        CaptureConfig::default(),
        sink.clone(),
        MemoryPersistence::new(),
    );
    capture.set_current_url("https://app.example.com/");
    capture.after_remote_config(&RemoteConfigResponse {
        autocapture_opt_out: Some(false),
        elements_chain_as_string: Some(true),
        ..Default::default()
    });
    let (_body, anchor) = nested_anchor_page();

    assert!(capture.on_dom_event(&RawDomEvent::new("click", Some(anchor))));

    let events = sink.events();
    let props = &events[0].1;
    assert!(props.get("$elements").is_none());
    let chain = props["$elements_chain"].as_str().unwrap();
    assert!(chain.contains("href=\"https://example.com/next\""));
    assert!(chain.contains(";span:"));
    assert!(chain.ends_with("nth-of-type=\"1\""));
    assert_eq!(chain.matches(';').count(), 4);
}

#[test]
fn server_opt_out_survives_a_restart_via_persistence() {
    let sink = CollectorSink::new();
    let persistence = MemoryPersistence::new();
    let capture = Autocapture::new(CaptureConfig::default(), sink.clone(), persistence.clone());
    capture.set_current_url("https://app.example.com/");
    capture.after_remote_config(&RemoteConfigResponse {
        autocapture_opt_out: Some(true),
        ..Default::default()
    });
    let body = DomNode::element("body");
    let button = DomNode::element("button");
    body.append_child(button.clone());
    assert!(!capture.on_dom_event(&RawDomEvent::new("click", Some(button.clone()))));

    // Fresh pipeline, same persistence, no remote answer yet.
    let capture = Autocapture::new(CaptureConfig::default(), sink.clone(), persistence);
    capture.set_current_url("https://app.example.com/");
    assert!(!capture.on_dom_event(&RawDomEvent::new("click", Some(button))));
    assert!(sink.is_empty());
}

#[test]
fn copy_capture_flows_through_the_facade() {
    let rules = AutocaptureConfig {
        capture_copied_text: true,
        ..Default::default()
    };
    let mut config = CaptureConfig::default();
    config.autocapture = AutocaptureToggle::Rules(rules);
    let (capture, sink) = pipeline(config);
    let body = DomNode::element("body");
    let para = DomNode::element("p").with_attr("style", "cursor: pointer");
    body.append_child(para.clone());

    let event = RawDomEvent::new("cut", Some(para)).with_selected_text("quarterly numbers");
    assert!(capture.on_copy_event(&event));
    let events = sink.events();
    assert_eq!(events[0].0, "$copy_autocapture");
    assert_eq!(events[0].1["$selected_content"], json!("quarterly numbers"));
    assert_eq!(events[0].1["$copy_type"], json!("cut"));
    assert_eq!(events[0].1["$event_type"], json!("cut"));
}

#[test]
fn rage_click_fires_alongside_regular_capture() {
    let (capture, sink) = pipeline(CaptureConfig::default());
    let body = DomNode::element("body");
    let button = DomNode::element("button");
    body.append_child(button.clone());

    for (ts, x) in [(0u64, 100), (200, 110), (400, 105)] {
        let event = RawDomEvent::new("click", Some(button.clone()))
            .at(x, 50)
            .with_timestamp(ts);
        capture.on_dom_event(&event);
    }
    let events = sink.events();
    let names: Vec<&str> = events.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec!["$autocapture", "$autocapture", "$rageclick", "$autocapture"]
    );
}
