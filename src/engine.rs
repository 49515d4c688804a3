//! The event capture orchestrator: resolves the semantic target of a raw DOM
//! event, gates it, serializes the ancestor chain and hands the assembled
//! event to the capture sink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::json;
use tracing::{debug, warn};

use autocapture_classify::{should_capture_dom_event, should_capture_element, NO_CAPTURE_CLASS};
use autocapture_core_types::{
    CaptureResult, CaptureSink, PersistenceStore, Properties, EVENT_AUTOCAPTURE,
    EVENT_COPY_AUTOCAPTURE, EVENT_RAGECLICK, PROP_AUTOCAPTURE_DISABLED_SERVER_SIDE,
    PROP_CE_VERSION, PROP_COPY_TYPE, PROP_ELEMENTS, PROP_ELEMENTS_CHAIN, PROP_EL_TEXT,
    PROP_EVENT_TYPE, PROP_SELECTED_CONTENT,
};
use autocapture_dom::{AncestorWalker, DomNode};
use autocapture_privacy::should_capture_value;
use autocapture_serialize::{
    augment_properties_from_element, element_text, elements_chain, properties_from_element,
    truncate_text,
};

use crate::config::{CaptureConfig, CaptureConfigHandle};
use crate::rage::RageClickRing;
use crate::remote::RemoteConfigResponse;

pub const COPY_EVENT_TYPES: [&str; 2] = ["copy", "cut"];

/// A raw DOM event as handed over by the embedding page glue. Fields mirror
/// what a browser event exposes; anything unavailable stays `None`.
#[derive(Clone, Debug, Default)]
pub struct RawDomEvent {
    pub event_type: String,
    pub target: Option<DomNode>,
    pub src_element: Option<DomNode>,
    /// Composed path for events crossing shadow boundaries; first entry is
    /// the innermost node actually interacted with.
    pub composed_path: Vec<DomNode>,
    pub client_x: Option<i32>,
    pub client_y: Option<i32>,
    pub timestamp: u64,
    /// Current window selection at event time; the clipboard payload itself
    /// is not accessible.
    pub selected_text: Option<String>,
}

impl RawDomEvent {
    pub fn new(event_type: impl Into<String>, target: Option<DomNode>) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            ..Default::default()
        }
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.client_x = Some(x);
        self.client_y = Some(y);
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_composed_path(mut self, path: Vec<DomNode>) -> Self {
        self.composed_path = path;
        self
    }

    pub fn with_selected_text(mut self, text: impl Into<String>) -> Self {
        self.selected_text = Some(text.into());
        self
    }
}

/// Resolve the semantic target: `src_element` fallback, shadow composed-path
/// attribution, text nodes attributed to their parent element.
pub fn resolve_event_target(event: &RawDomEvent) -> Option<DomNode> {
    let mut node = event.target.clone().or_else(|| event.src_element.clone())?;
    if node.shadow_root().is_some() {
        if let Some(inner) = event.composed_path.first() {
            node = inner.clone();
        }
    }
    if node.is_text() {
        node = node.parent()?;
    }
    node.is_element().then_some(node)
}

pub struct AutocaptureEngine {
    sink: Arc<dyn CaptureSink>,
    persistence: Arc<dyn PersistenceStore>,
    config: CaptureConfigHandle,
    current_url: RwLock<String>,
    rage: Mutex<RageClickRing>,
    elements_chain_as_string: AtomicBool,
    remote_opt_out: RwLock<Option<bool>>,
    remote_dead_clicks: RwLock<Option<bool>>,
}

impl AutocaptureEngine {
    pub fn new(
        config: CaptureConfigHandle,
        sink: Arc<dyn CaptureSink>,
        persistence: Arc<dyn PersistenceStore>,
    ) -> Self {
        Self {
            sink,
            persistence,
            config,
            current_url: RwLock::new(String::new()),
            rage: Mutex::new(RageClickRing::default()),
            elements_chain_as_string: AtomicBool::new(false),
            remote_opt_out: RwLock::new(None),
            remote_dead_clicks: RwLock::new(None),
        }
    }

    pub fn config_handle(&self) -> &CaptureConfigHandle {
        &self.config
    }

    pub fn set_current_url(&self, url: impl Into<String>) {
        *self.current_url.write() = url.into();
    }

    /// Ingest the remote configuration answer; the opt-out flag is cached in
    /// persistence so it survives reloads.
    pub fn after_remote_config(&self, response: &RemoteConfigResponse) {
        let opt_out = response.autocapture_opt_out.unwrap_or(false);
        let mut cached = Properties::new();
        cached.insert(PROP_AUTOCAPTURE_DISABLED_SERVER_SIDE.into(), json!(opt_out));
        self.persistence.register(cached);
        *self.remote_opt_out.write() = Some(opt_out);
        if let Some(as_string) = response.elements_chain_as_string {
            self.elements_chain_as_string
                .store(as_string, Ordering::SeqCst);
        }
        *self.remote_dead_clicks.write() = response.capture_dead_clicks;
        debug!(target: "autocapture", opt_out, "remote config applied");
    }

    fn server_side_disabled(&self, config: &CaptureConfig) -> bool {
        if let Some(opt_out) = *self.remote_opt_out.read() {
            return opt_out;
        }
        if config.disable_remote_config {
            // No server answer will ever arrive; client config governs.
            return false;
        }
        // Unknown: trust the cached answer from a previous load, otherwise
        // stay disabled until the server speaks.
        self.persistence
            .get(PROP_AUTOCAPTURE_DISABLED_SERVER_SIDE)
            .and_then(|value| value.as_bool())
            .unwrap_or(true)
    }

    pub fn is_enabled(&self) -> bool {
        let config = self.config.snapshot();
        config.autocapture_enabled() && !self.server_side_disabled(&config)
    }

    /// Whether the dead-click feature should run: the remote toggle wins when
    /// present, otherwise the client flag.
    pub fn dead_clicks_enabled(&self) -> bool {
        if let Some(remote) = *self.remote_dead_clicks.read() {
            return remote;
        }
        self.config.snapshot().capture_dead_clicks
    }

    /// Entry point for click/change/submit events. Returns whether an event
    /// was delivered to the sink. Failures are logged, never propagated, so
    /// one bad element cannot disable autocapture globally.
    pub fn handle_event(&self, event: &RawDomEvent) -> bool {
        if !self.is_enabled() {
            return false;
        }
        match self.process(event) {
            Ok(captured) => captured,
            Err(err) => {
                warn!(target: "autocapture", %err, event_type = %event.event_type, "event processing failed");
                false
            }
        }
    }

    /// Entry point for copy/cut events when `capture_copied_text` is set.
    pub fn handle_copy(&self, event: &RawDomEvent) -> bool {
        if !self.is_enabled() {
            return false;
        }
        match self.process_copy(event) {
            Ok(captured) => captured,
            Err(err) => {
                warn!(target: "autocapture", %err, "copy event processing failed");
                false
            }
        }
    }

    fn process(&self, event: &RawDomEvent) -> CaptureResult<bool> {
        let Some(target) = resolve_event_target(event) else {
            debug!(target: "autocapture", event_type = %event.event_type, "no resolvable target");
            return Ok(false);
        };
        let config = self.config.snapshot();

        if event.event_type.eq_ignore_ascii_case("click") && config.rageclick {
            if let (Some(x), Some(y)) = (event.client_x, event.client_y) {
                if self.rage.lock().record(x, y, event.timestamp) {
                    // In addition to the normal event, with the same target.
                    self.capture_with_target(
                        event,
                        &target,
                        EVENT_RAGECLICK,
                        Properties::new(),
                        &config,
                    )?;
                }
            }
        }

        self.capture_with_target(event, &target, EVENT_AUTOCAPTURE, Properties::new(), &config)
    }

    fn process_copy(&self, event: &RawDomEvent) -> CaptureResult<bool> {
        let compiled = self.config.compiled();
        if !compiled.capture_copied_text {
            return Ok(false);
        }
        let Some(target) = resolve_event_target(event) else {
            return Ok(false);
        };
        let Some(selected) = event.selected_text.as_deref() else {
            return Ok(false);
        };
        let sanitized = sanitize_selection(selected);
        if sanitized.is_empty() {
            return Ok(false);
        }
        let copy_type = if event.event_type.eq_ignore_ascii_case("cut") {
            "cut"
        } else {
            "copy"
        };
        let mut extra = Properties::new();
        extra.insert(PROP_SELECTED_CONTENT.into(), json!(sanitized));
        extra.insert(PROP_COPY_TYPE.into(), json!(copy_type));
        let config = self.config.snapshot();
        self.capture_with_target(event, &target, EVENT_COPY_AUTOCAPTURE, extra, &config)
    }

    fn capture_with_target(
        &self,
        event: &RawDomEvent,
        target: &DomNode,
        event_name: &str,
        extra: Properties,
        config: &CaptureConfig,
    ) -> CaptureResult<bool> {
        let compiled = self.config.compiled();
        let url = self.current_url.read().clone();
        let is_copy = event_name == EVENT_COPY_AUTOCAPTURE;
        if !should_capture_dom_event(
            target,
            &event.event_type,
            &url,
            &compiled,
            is_copy,
            &COPY_EVENT_TYPES,
        ) {
            return Ok(false);
        }

        let mask_attributes = config.mask_all_element_attributes;
        let mask_text = config.mask_all_text;

        let mut elements: Vec<Properties> = Vec::new();
        let mut href: Option<String> = None;
        let mut explicit_no_capture = false;
        let mut augments = Properties::new();

        for step in AncestorWalker::from(target) {
            let el = &step.node;
            if href.is_none() && el.is_tag("a") {
                if let Some(value) = el.attribute("href") {
                    if should_capture_element(el) && should_capture_value(&value, true) {
                        href = Some(value);
                    }
                }
            }
            if el.has_class(NO_CAPTURE_CLASS) {
                explicit_no_capture = true;
            }
            elements.push(properties_from_element(
                el,
                mask_attributes,
                mask_text,
                &compiled.element_attribute_ignorelist,
            ));
            for (key, value) in augment_properties_from_element(el) {
                // First occurrence walking outward from the target wins.
                augments.entry(key).or_insert(value);
            }
        }

        if explicit_no_capture {
            debug!(target: "autocapture", "no-capture marker on ancestor chain; dropping event");
            return Ok(false);
        }
        if elements.is_empty() {
            return Ok(false);
        }

        // Recompute the target's own text with the target-specific rule so
        // index 0 is consistent regardless of generic serialization.
        if !mask_text {
            let text = truncate_text(&element_text(target));
            if text.is_empty() {
                elements[0].remove(PROP_EL_TEXT);
            } else {
                elements[0].insert(PROP_EL_TEXT.into(), json!(text));
            }
        }
        if let Some(href) = href {
            elements[0]
                .entry("attr__href".to_string())
                .or_insert(json!(href));
        }

        let mut props = Properties::new();
        props.insert(PROP_EVENT_TYPE.into(), json!(event.event_type));
        props.insert(PROP_CE_VERSION.into(), json!(1));
        if let Some(text) = elements[0].get(PROP_EL_TEXT).cloned() {
            props.insert(PROP_EL_TEXT.into(), text);
        }
        if self.elements_chain_as_string.load(Ordering::SeqCst) {
            props.insert(PROP_ELEMENTS_CHAIN.into(), json!(elements_chain(&elements)));
        } else {
            props.insert(PROP_ELEMENTS.into(), serde_json::to_value(&elements)?);
        }
        for (key, value) in augments {
            props.entry(key).or_insert(value);
        }
        for (key, value) in extra {
            props.insert(key, value);
        }

        self.sink.capture(event_name, props);
        Ok(true)
    }
}

/// Whitespace-collapse and PII-check copied selection text.
fn sanitize_selection(selected: &str) -> String {
    let collapsed = selected.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() || !should_capture_value(&collapsed, false) {
        return String::new();
    }
    truncate_text(&collapsed)
}
