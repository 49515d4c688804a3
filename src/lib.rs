//! Client-side autocapture pipeline: classifies DOM events, serializes the
//! element ancestor chain into capture-ready properties and watches for
//! frustration signals (rage clicks, dead clicks).
//!
//! The crate is browser-agnostic. The embedding layer feeds [`RawDomEvent`]s
//! and activity signals in; captured events come out through a
//! [`CaptureSink`].

pub mod config;
pub mod engine;
pub mod rage;
pub mod remote;

use std::sync::Arc;

pub use autocapture_classify::AutocaptureConfig;
pub use autocapture_core_types::{
    CaptureError, CaptureResult, CaptureSink, CollectorSink, MemoryPersistence, PersistenceStore,
    Properties,
};
pub use autocapture_dead_clicks::{
    Clock, DeadClickConfig, DeadClickTracker, ManualClock, SystemClock,
};
pub use autocapture_dom::DomNode;
pub use config::{AutocaptureToggle, CaptureConfig, CaptureConfigHandle};
pub use engine::{resolve_event_target, AutocaptureEngine, RawDomEvent};
pub use remote::RemoteConfigResponse;

/// Top-level handle wiring the capture engine and the dead-click tracker to
/// one sink and one config.
pub struct Autocapture {
    engine: Arc<AutocaptureEngine>,
    dead_clicks: Arc<DeadClickTracker>,
}

impl Autocapture {
    pub fn new(
        config: CaptureConfig,
        sink: Arc<dyn CaptureSink>,
        persistence: Arc<dyn PersistenceStore>,
    ) -> Self {
        Self::with_clock(config, sink, persistence, Arc::new(SystemClock))
    }

    /// Like [`Autocapture::new`] but with an injectable clock for the
    /// dead-click tracker.
    pub fn with_clock(
        config: CaptureConfig,
        sink: Arc<dyn CaptureSink>,
        persistence: Arc<dyn PersistenceStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let dead_click_config = dead_click_config(&config);
        let handle = CaptureConfigHandle::new(config);
        let engine = Arc::new(AutocaptureEngine::new(
            handle,
            sink.clone(),
            persistence,
        ));
        let dead_clicks = DeadClickTracker::new(clock, sink, dead_click_config);
        let this = Self {
            engine,
            dead_clicks,
        };
        this.sync_dead_clicks();
        this
    }

    pub fn engine(&self) -> &Arc<AutocaptureEngine> {
        &self.engine
    }

    pub fn dead_clicks(&self) -> &Arc<DeadClickTracker> {
        &self.dead_clicks
    }

    pub fn set_current_url(&self, url: impl Into<String>) {
        self.engine.set_current_url(url);
    }

    /// Apply the remote configuration answer and reconcile the dead-click
    /// tracker with the merged toggles.
    pub fn after_remote_config(&self, response: &RemoteConfigResponse) {
        self.engine.after_remote_config(response);
        self.sync_dead_clicks();
    }

    /// Replace the client configuration at runtime. Capture rules are
    /// recompiled and the dead-click tracker picks up the new masking and
    /// ignorelist options along with its on/off toggle.
    pub fn update_config(&self, config: CaptureConfig) {
        self.dead_clicks.set_config(dead_click_config(&config));
        self.engine.config_handle().update(config);
        self.sync_dead_clicks();
    }

    fn sync_dead_clicks(&self) {
        if self.engine.dead_clicks_enabled() {
            self.dead_clicks.start();
        } else {
            self.dead_clicks.stop();
        }
    }

    /// Route a DOM event through the capture pipeline. Clicks additionally
    /// feed the dead-click tracker, whether or not they were captured.
    pub fn on_dom_event(&self, event: &RawDomEvent) -> bool {
        if event.event_type.eq_ignore_ascii_case("click") {
            if let Some(target) = resolve_event_target(event) {
                self.dead_clicks.on_click(&target);
            }
        }
        self.engine.handle_event(event)
    }

    /// Route a copy or cut event; captured only when `capture_copied_text`
    /// is enabled and the selection survives sanitization.
    pub fn on_copy_event(&self, event: &RawDomEvent) -> bool {
        self.engine.handle_copy(event)
    }

    pub fn on_scroll(&self) {
        self.dead_clicks.on_scroll();
    }

    pub fn on_mutation(&self) {
        self.dead_clicks.on_mutation();
    }

    pub fn on_selection_change(&self) {
        self.dead_clicks.on_selection_change();
    }
}

fn dead_click_config(config: &CaptureConfig) -> DeadClickConfig {
    DeadClickConfig {
        mask_all_element_attributes: config.mask_all_element_attributes,
        mask_all_text: config.mask_all_text,
        element_attribute_ignorelist: config.autocapture_rules().element_attribute_ignorelist,
        ..DeadClickConfig::default()
    }
}
