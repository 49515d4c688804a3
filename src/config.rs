//! Client-side capture configuration and its shared handle.
//!
//! The handle caches a precompiled form of the autocapture rules so pattern
//! compilation happens once per update rather than per capture decision.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use autocapture_classify::{AutocaptureConfig, CompiledAutocaptureConfig};

/// `autocapture` accepts either a plain on/off flag or a rule object.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AutocaptureToggle {
    Flag(bool),
    Rules(AutocaptureConfig),
}

impl Default for AutocaptureToggle {
    fn default() -> Self {
        Self::Flag(true)
    }
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CaptureConfig {
    #[serde(default)]
    pub autocapture: AutocaptureToggle,
    #[serde(default)]
    pub mask_all_element_attributes: bool,
    #[serde(default)]
    pub mask_all_text: bool,
    #[serde(default)]
    pub capture_dead_clicks: bool,
    #[serde(default = "default_true")]
    pub rageclick: bool,
    /// When remote config fetching is disabled the client flag alone governs
    /// the enabled decision.
    #[serde(default)]
    pub disable_remote_config: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            autocapture: AutocaptureToggle::default(),
            mask_all_element_attributes: false,
            mask_all_text: false,
            capture_dead_clicks: false,
            rageclick: true,
            disable_remote_config: false,
        }
    }
}

impl CaptureConfig {
    pub fn autocapture_enabled(&self) -> bool {
        !matches!(self.autocapture, AutocaptureToggle::Flag(false))
    }

    pub fn autocapture_rules(&self) -> AutocaptureConfig {
        match &self.autocapture {
            AutocaptureToggle::Rules(rules) => rules.clone(),
            AutocaptureToggle::Flag(_) => AutocaptureConfig::default(),
        }
    }
}

/// Shared config accessor with snapshot/update semantics.
#[derive(Clone)]
pub struct CaptureConfigHandle {
    inner: Arc<RwLock<CaptureConfig>>,
    compiled: Arc<RwLock<CompiledAutocaptureConfig>>,
}

impl CaptureConfigHandle {
    pub fn new(config: CaptureConfig) -> Self {
        let compiled = CompiledAutocaptureConfig::compile(&config.autocapture_rules());
        Self {
            inner: Arc::new(RwLock::new(config)),
            compiled: Arc::new(RwLock::new(compiled)),
        }
    }

    pub fn snapshot(&self) -> CaptureConfig {
        self.inner.read().clone()
    }

    pub fn compiled(&self) -> CompiledAutocaptureConfig {
        self.compiled.read().clone()
    }

    pub fn update(&self, config: CaptureConfig) {
        *self.compiled.write() = CompiledAutocaptureConfig::compile(&config.autocapture_rules());
        *self.inner.write() = config;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn toggle_deserializes_from_bool_or_rules() {
        let config: CaptureConfig = serde_json::from_str(r#"{"autocapture": false}"#).unwrap();
        assert!(!config.autocapture_enabled());

        let config: CaptureConfig =
            serde_json::from_str(r#"{"autocapture": {"url_allowlist": ["app"]}}"#).unwrap();
        assert!(config.autocapture_enabled());
        assert_eq!(
            config.autocapture_rules().url_allowlist,
            Some(vec!["app".to_string()])
        );
    }

    #[test]
    fn defaults_enable_autocapture_and_rageclick() {
        let config = CaptureConfig::default();
        assert!(config.autocapture_enabled());
        assert!(config.rageclick);
        assert!(!config.capture_dead_clicks);
    }

    #[test]
    fn update_recompiles_rules() {
        let handle = CaptureConfigHandle::new(CaptureConfig::default());
        assert!(handle.compiled().url_allowed("https://anywhere"));
        let mut config = CaptureConfig::default();
        config.autocapture = AutocaptureToggle::Rules(AutocaptureConfig {
            url_allowlist: Some(vec![]),
            ..Default::default()
        });
        handle.update(config);
        assert!(!handle.compiled().url_allowed("https://anywhere"));
    }
}
