pub mod names;
pub mod ports;

use thiserror::Error;

pub use names::*;
pub use ports::{CaptureSink, CollectorSink, MemoryPersistence, PersistenceStore};

/// Flat property bag attached to captured events.
pub type Properties = serde_json::Map<String, serde_json::Value>;

// A missing or unusable target is a degrade-to-no-capture outcome, not an
// error, so the error type only covers genuine failures.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type CaptureResult<T> = Result<T, CaptureError>;
