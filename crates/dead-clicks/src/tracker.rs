//! Timer-driven correlation of clicks against scroll/mutation/selection
//! signals. Clicks with no observable page effect within the thresholds are
//! reported as dead clicks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;
use tracing::{debug, warn};

use autocapture_classify::is_capture_compatible;
use autocapture_core_types::{CaptureSink, Properties, EVENT_DEAD_CLICK};
use autocapture_dom::DomNode;
use autocapture_serialize::properties_from_element;

use crate::clock::Clock;

/// Element id marking the embedded tooling UI; clicks inside it are noise.
pub const TOOLBAR_ID: &str = "__ph_toolbar__";

const SWEEP_INTERVAL_MS: u64 = 1_000;
const DUPLICATE_CLICK_WINDOW_MS: u64 = 1_000;

pub const PROP_SCROLL_DELAY_MS: &str = "$dead_click_scroll_delay_ms";
pub const PROP_MUTATION_DELAY_MS: &str = "$dead_click_mutation_delay_ms";
pub const PROP_SELECTION_CHANGED_DELAY_MS: &str = "$dead_click_selection_changed_delay_ms";
pub const PROP_ABSOLUTE_DELAY_MS: &str = "$dead_click_absolute_delay_ms";
pub const PROP_SCROLL_TIMEOUT: &str = "$dead_click_scroll_timeout";
pub const PROP_MUTATION_TIMEOUT: &str = "$dead_click_mutation_timeout";
pub const PROP_SELECTION_CHANGED_TIMEOUT: &str = "$dead_click_selection_changed_timeout";
pub const PROP_ABSOLUTE_TIMEOUT: &str = "$dead_click_absolute_timeout";
pub const PROP_EVENT_TIMESTAMP: &str = "$dead_click_event_timestamp";
pub const PROP_LAST_MUTATION_TIMESTAMP: &str = "$dead_click_last_mutation_timestamp";

#[derive(Clone, Debug)]
pub struct DeadClickConfig {
    pub scroll_threshold_ms: u64,
    pub selection_change_threshold_ms: u64,
    pub mutation_threshold_ms: u64,
    pub mask_all_element_attributes: bool,
    pub mask_all_text: bool,
    pub element_attribute_ignorelist: Vec<String>,
}

impl Default for DeadClickConfig {
    fn default() -> Self {
        Self {
            scroll_threshold_ms: 100,
            selection_change_threshold_ms: 100,
            mutation_threshold_ms: 2_500,
            mask_all_element_attributes: false,
            mask_all_text: false,
            element_attribute_ignorelist: Vec::new(),
        }
    }
}

impl DeadClickConfig {
    /// Safety net so clicks are never buffered forever even with no signals.
    fn absolute_threshold_ms(&self) -> u64 {
        self.mutation_threshold_ms + self.mutation_threshold_ms / 10
    }
}

#[derive(Clone, Debug)]
struct ClickCandidate {
    node: DomNode,
    timestamp: u64,
    scroll_delay_ms: Option<u64>,
    mutation_delay_ms: Option<u64>,
    selection_changed_delay_ms: Option<u64>,
}

#[derive(Default)]
struct TrackerState {
    pending: Vec<ClickCandidate>,
    last_mutation: Option<u64>,
    last_selection_change: Option<u64>,
    last_scroll: Option<u64>,
    last_click: Option<(DomNode, u64)>,
}

pub struct DeadClickTracker {
    clock: Arc<dyn Clock>,
    sink: Arc<dyn CaptureSink>,
    config: Mutex<DeadClickConfig>,
    state: Mutex<TrackerState>,
    started: AtomicBool,
    sweep_armed: AtomicBool,
}

impl DeadClickTracker {
    pub fn new(
        clock: Arc<dyn Clock>,
        sink: Arc<dyn CaptureSink>,
        config: DeadClickConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            clock,
            sink,
            config: Mutex::new(config),
            state: Mutex::new(TrackerState::default()),
            started: AtomicBool::new(false),
            sweep_armed: AtomicBool::new(false),
        })
    }

    /// Replace thresholds and serializer options; already-buffered clicks are
    /// classified and serialized under the new configuration.
    pub fn set_config(&self, config: DeadClickConfig) {
        *self.config.lock() = config;
    }

    /// Idempotent: a second `start` neither double-registers nor resets state.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(target: "dead-clicks", "tracker started");
    }

    /// Idempotent: `stop` without `start` is a no-op.
    pub fn stop(&self) {
        if !self.started.swap(false, Ordering::SeqCst) {
            return;
        }
        let mut state = self.state.lock();
        state.pending.clear();
        state.last_click = None;
        debug!(target: "dead-clicks", "tracker stopped");
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    fn ignore_click(&self, node: &DomNode, now: u64, state: &TrackerState) -> bool {
        if !node.is_element() || node.is_tag("html") {
            return true;
        }
        if in_toolbar(node) {
            return true;
        }
        // Interactive elements are already attributed by normal autocapture.
        if is_capture_compatible(node) {
            return true;
        }
        if has_blank_target_anchor(node) {
            return true;
        }
        if let Some((last_node, last_ts)) = &state.last_click {
            if last_node.same_node(node) && now.saturating_sub(*last_ts) < DUPLICATE_CLICK_WINDOW_MS
            {
                return true;
            }
        }
        false
    }

    /// Record a qualifying click as a pending candidate.
    pub fn on_click(self: &Arc<Self>, node: &DomNode) {
        if !self.is_started() {
            return;
        }
        let now = self.clock.now_ms();
        {
            let mut state = self.state.lock();
            if self.ignore_click(node, now, &state) {
                return;
            }
            state.last_click = Some((node.clone(), now));
            state.pending.push(ClickCandidate {
                node: node.clone(),
                timestamp: now,
                scroll_delay_ms: None,
                mutation_delay_ms: None,
                selection_changed_delay_ms: None,
            });
        }
        self.arm_sweep_timer();
    }

    /// Scroll signals are frequent; the shared timestamp is sampled on 50 ms
    /// time-modulo boundaries so per-scroll work stays constant. Scrolls at
    /// off-boundary instants are invisible to classification.
    pub fn on_scroll(&self) {
        if !self.is_started() {
            return;
        }
        let now = self.clock.now_ms();
        if now % 50 == 0 {
            self.state.lock().last_scroll = Some(now);
        }
    }

    pub fn on_mutation(&self) {
        if !self.is_started() {
            return;
        }
        let now = self.clock.now_ms();
        self.state.lock().last_mutation = Some(now);
    }

    pub fn on_selection_change(&self) {
        if !self.is_started() {
            return;
        }
        let now = self.clock.now_ms();
        self.state.lock().last_selection_change = Some(now);
    }

    /// Resolve pending clicks against the observed signals.
    ///
    /// The buffer is swapped out and survivors are put back *before* any
    /// capture call is made, so re-entrant signals cannot corrupt the pass.
    pub fn sweep(self: &Arc<Self>) {
        let now = self.clock.now_ms();
        let config = self.config.lock().clone();
        let (candidates, last_scroll, last_mutation, last_selection_change) = {
            let mut state = self.state.lock();
            (
                std::mem::take(&mut state.pending),
                state.last_scroll,
                state.last_mutation,
                state.last_selection_change,
            )
        };

        let mut dead = Vec::new();
        let mut keep = Vec::new();
        for mut click in candidates {
            // A signal from before the click cannot exonerate it.
            if click.scroll_delay_ms.is_none() {
                if let Some(last) = last_scroll {
                    if last >= click.timestamp {
                        click.scroll_delay_ms = Some(last - click.timestamp);
                    }
                }
            }
            if click.mutation_delay_ms.is_none() {
                if let Some(last) = last_mutation {
                    if last >= click.timestamp {
                        click.mutation_delay_ms = Some(last - click.timestamp);
                    }
                }
            }
            if click.selection_changed_delay_ms.is_none() {
                if let Some(last) = last_selection_change {
                    if last >= click.timestamp {
                        click.selection_changed_delay_ms = Some(last - click.timestamp);
                    }
                }
            }
            let absolute_delay_ms = now.saturating_sub(click.timestamp);

            let had_scroll = click
                .scroll_delay_ms
                .is_some_and(|d| d < config.scroll_threshold_ms);
            let had_mutation = click
                .mutation_delay_ms
                .is_some_and(|d| d < config.mutation_threshold_ms);
            let had_selection = click
                .selection_changed_delay_ms
                .is_some_and(|d| d < config.selection_change_threshold_ms);
            if had_scroll || had_mutation || had_selection {
                // The page reacted; this was a live click.
                continue;
            }

            let scroll_timeout = click
                .scroll_delay_ms
                .is_some_and(|d| d >= config.scroll_threshold_ms);
            let mutation_timeout = click
                .mutation_delay_ms
                .is_some_and(|d| d >= config.mutation_threshold_ms);
            let selection_timeout = click
                .selection_changed_delay_ms
                .is_some_and(|d| d >= config.selection_change_threshold_ms);
            let absolute_timeout = absolute_delay_ms >= config.absolute_threshold_ms();

            if scroll_timeout || mutation_timeout || selection_timeout || absolute_timeout {
                dead.push((click, absolute_delay_ms));
            } else {
                keep.push(click);
            }
        }

        {
            let mut state = self.state.lock();
            // Clicks recorded while the lock was released stay behind survivors.
            let mut pending = keep;
            pending.append(&mut state.pending);
            state.pending = pending;
        }

        for (click, absolute_delay_ms) in dead {
            self.emit_dead_click(&click, absolute_delay_ms, last_mutation, &config);
        }

        if self.pending_len() > 0 {
            self.arm_sweep_timer();
        }
    }

    fn emit_dead_click(
        &self,
        click: &ClickCandidate,
        absolute_delay_ms: u64,
        last_mutation: Option<u64>,
        config: &DeadClickConfig,
    ) {
        let mut props = properties_from_element(
            &click.node,
            config.mask_all_element_attributes,
            config.mask_all_text,
            &config.element_attribute_ignorelist,
        );
        props.insert(PROP_EVENT_TIMESTAMP.into(), json!(click.timestamp));
        if let Some(last) = last_mutation {
            props.insert(PROP_LAST_MUTATION_TIMESTAMP.into(), json!(last));
        }
        insert_delay(&mut props, PROP_SCROLL_DELAY_MS, click.scroll_delay_ms);
        insert_delay(&mut props, PROP_MUTATION_DELAY_MS, click.mutation_delay_ms);
        insert_delay(
            &mut props,
            PROP_SELECTION_CHANGED_DELAY_MS,
            click.selection_changed_delay_ms,
        );
        props.insert(PROP_ABSOLUTE_DELAY_MS.into(), json!(absolute_delay_ms));
        props.insert(
            PROP_SCROLL_TIMEOUT.into(),
            json!(click
                .scroll_delay_ms
                .is_some_and(|d| d >= config.scroll_threshold_ms)),
        );
        props.insert(
            PROP_MUTATION_TIMEOUT.into(),
            json!(click
                .mutation_delay_ms
                .is_some_and(|d| d >= config.mutation_threshold_ms)),
        );
        props.insert(
            PROP_SELECTION_CHANGED_TIMEOUT.into(),
            json!(click
                .selection_changed_delay_ms
                .is_some_and(|d| d >= config.selection_change_threshold_ms)),
        );
        props.insert(
            PROP_ABSOLUTE_TIMEOUT.into(),
            json!(absolute_delay_ms >= config.absolute_threshold_ms()),
        );
        self.sink.capture(EVENT_DEAD_CLICK, props);
    }

    /// Arm the sweep timer if a tokio runtime is available and no timer is
    /// already outstanding. Without a runtime the embedder drives `sweep`.
    fn arm_sweep_timer(self: &Arc<Self>) {
        if self.sweep_armed.swap(true, Ordering::SeqCst) {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            self.sweep_armed.store(false, Ordering::SeqCst);
            return;
        };
        let tracker = Arc::clone(self);
        handle.spawn(async move {
            tokio::time::sleep(Duration::from_millis(SWEEP_INTERVAL_MS)).await;
            tracker.sweep_armed.store(false, Ordering::SeqCst);
            if tracker.is_started() {
                tracker.sweep();
            } else {
                warn!(target: "dead-clicks", "sweep timer fired after stop; discarding");
            }
        });
    }
}

fn in_toolbar(node: &DomNode) -> bool {
    let mut current = Some(node.clone());
    while let Some(el) = current {
        if el.attribute("id").as_deref() == Some(TOOLBAR_ID) {
            return true;
        }
        current = if el.is_shadow_root() {
            el.host()
        } else {
            el.parent()
        };
    }
    false
}

fn has_blank_target_anchor(node: &DomNode) -> bool {
    let mut current = Some(node.clone());
    while let Some(el) = current {
        if el.is_tag("a") && el.attribute("target").as_deref() == Some("_blank") {
            return true;
        }
        if el.is_tag("body") {
            return false;
        }
        current = if el.is_shadow_root() {
            el.host()
        } else {
            el.parent()
        };
    }
    false
}

fn insert_delay(props: &mut Properties, key: &str, delay: Option<u64>) {
    if let Some(delay) = delay {
        props.insert(key.into(), json!(delay));
    }
}
