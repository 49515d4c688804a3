pub mod chain;
pub mod element;
pub mod text;

pub use chain::elements_chain;
pub use element::{
    augment_properties_from_element, element_text, properties_from_element, AUGMENT_ATTR_PREFIX,
};
pub use text::{direct_and_nested_span_text, safe_text, truncate_text, MAX_CAPTURED_TEXT_LEN};
