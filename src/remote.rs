//! Remote-config ("decide"-style) response surfaced to the pipeline after
//! the surrounding SDK fetches it.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RemoteConfigResponse {
    #[serde(default)]
    pub autocapture_opt_out: Option<bool>,
    #[serde(default, rename = "elementsChainAsString")]
    pub elements_chain_as_string: Option<bool>,
    #[serde(default, rename = "captureDeadClicks")]
    pub capture_dead_clicks: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_wire_names() {
        let response: RemoteConfigResponse = serde_json::from_str(
            r#"{"autocapture_opt_out": true, "elementsChainAsString": true, "captureDeadClicks": false}"#,
        )
        .unwrap();
        assert_eq!(response.autocapture_opt_out, Some(true));
        assert_eq!(response.elements_chain_as_string, Some(true));
        assert_eq!(response.capture_dead_clicks, Some(false));
    }

    #[test]
    fn missing_fields_default_to_none() {
        let response: RemoteConfigResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response, RemoteConfigResponse::default());
    }
}
