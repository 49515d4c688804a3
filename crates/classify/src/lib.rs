pub mod config;
pub mod gate;
pub mod predicates;
pub mod selector;

pub use config::{AutocaptureConfig, CompiledAutocaptureConfig};
pub use gate::{is_capture_compatible, should_capture_dom_event, CAPTURE_COMPATIBLE_TAGS};
pub use predicates::{
    is_sensitive_element, should_capture_element, INCLUDE_CLASS, NO_CAPTURE_CLASS, SENSITIVE_CLASS,
};
pub use selector::Selector;
