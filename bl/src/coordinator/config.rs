//! Coordinator configuration

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Coordinator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    /// Component name handed to the widget on open
    #[serde(default = "default_component")]
    pub component: String,

    /// How long the widget stays up after the last operation finishes
    #[serde(rename = "keep-open-ms", default = "default_keep_open_ms")]
    pub keep_open_ms: u64,

    /// Opaque widget options, passed through to `Widget::open`
    #[serde(rename = "widget-config", default, skip_serializing_if = "Option::is_none")]
    pub widget_config: Option<Value>,
}

fn default_component() -> String {
    debug!("default_component: called");
    "busy".to_string()
}

fn default_keep_open_ms() -> u64 {
    debug!("default_keep_open_ms: called");
    1000
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        debug!("IndicatorConfig::default: called");
        Self {
            component: default_component(),
            keep_open_ms: default_keep_open_ms(),
            widget_config: None,
        }
    }
}

impl IndicatorConfig {
    pub fn new(component: impl Into<String>) -> Self {
        let component = component.into();
        debug!(%component, "IndicatorConfig::new: called");
        Self {
            component,
            ..Default::default()
        }
    }

    pub fn with_keep_open_ms(mut self, keep_open_ms: u64) -> Self {
        self.keep_open_ms = keep_open_ms;
        self
    }

    pub fn with_widget_config(mut self, widget_config: Value) -> Self {
        self.widget_config = Some(widget_config);
        self
    }

    /// Get the debounce window as a Duration
    pub fn keep_open(&self) -> Duration {
        Duration::from_millis(self.keep_open_ms)
    }
}
