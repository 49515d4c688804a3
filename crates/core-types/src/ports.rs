//! Collaborator contracts consumed by the pipeline but implemented elsewhere
//! (transport, persistence). In-memory implementations are provided for unit
//! tests and early integration.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::Properties;

/// Fire-and-forget delivery sink for assembled events.
pub trait CaptureSink: Send + Sync {
    fn capture(&self, event_name: &str, properties: Properties);
}

/// Key/value store surviving page reloads (cookies/localStorage outside the core).
pub trait PersistenceStore: Send + Sync {
    fn register(&self, props: Properties);
    fn get(&self, key: &str) -> Option<Value>;
}

/// Simple in-memory sink recording every capture call.
#[derive(Default)]
pub struct CollectorSink {
    events: Mutex<Vec<(String, Properties)>>,
}

impl CollectorSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<(String, Properties)> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl CaptureSink for CollectorSink {
    fn capture(&self, event_name: &str, properties: Properties) {
        self.events.lock().push((event_name.to_string(), properties));
    }
}

/// In-memory persistence with `register`/`get` semantics.
#[derive(Default)]
pub struct MemoryPersistence {
    props: Mutex<Properties>,
}

impl MemoryPersistence {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl PersistenceStore for MemoryPersistence {
    fn register(&self, props: Properties) {
        let mut stored = self.props.lock();
        for (key, value) in props {
            stored.insert(key, value);
        }
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.props.lock().get(key).cloned()
    }
}
