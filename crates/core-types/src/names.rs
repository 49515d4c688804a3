//! Event and property names shared across the pipeline.

pub const EVENT_AUTOCAPTURE: &str = "$autocapture";
pub const EVENT_RAGECLICK: &str = "$rageclick";
pub const EVENT_COPY_AUTOCAPTURE: &str = "$copy_autocapture";
pub const EVENT_DEAD_CLICK: &str = "$dead_click";

pub const PROP_EVENT_TYPE: &str = "$event_type";
pub const PROP_CE_VERSION: &str = "$ce_version";
pub const PROP_ELEMENTS: &str = "$elements";
pub const PROP_ELEMENTS_CHAIN: &str = "$elements_chain";
pub const PROP_EL_TEXT: &str = "$el_text";
pub const PROP_SELECTED_CONTENT: &str = "$selected_content";
pub const PROP_COPY_TYPE: &str = "$copy_type";

/// Persistence key caching the server-side opt-out flag across reloads.
pub const PROP_AUTOCAPTURE_DISABLED_SERVER_SIDE: &str = "$autocapture_disabled_server_side";
