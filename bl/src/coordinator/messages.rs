//! Message types for the indicator coordinator

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::signal::Signal;

/// Whether the shared widget is currently shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Hidden,
    Showing,
}

/// Snapshot of the coordinator's counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorMetrics {
    pub signals_received: u64,
    pub starts: u64,
    pub stops: u64,
    /// Stops that arrived with nothing in flight
    pub ignored_stops: u64,
    pub opens: u64,
    pub dismissals: u64,
    pub in_flight: usize,
    pub visibility: Visibility,
}

/// Internal requests to the coordinator task
#[derive(Debug)]
pub enum IndicatorRequest {
    /// An operation started or stopped
    Signal(Signal),

    /// Get current metrics
    GetMetrics {
        reply_tx: oneshot::Sender<IndicatorMetrics>,
    },

    /// Dismiss the widget and stop processing
    Shutdown,
}
