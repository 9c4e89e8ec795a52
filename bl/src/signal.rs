//! Start/stop signals and the receivers that accept them

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// A single lifecycle event from an indicated operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// An operation began
    Start,
    /// An operation ended (success, failure, or cancellation)
    Stop,
}

impl Signal {
    pub fn is_start(self) -> bool {
        matches!(self, Signal::Start)
    }
}

impl From<bool> for Signal {
    fn from(started: bool) -> Self {
        debug!(started, "Signal::from: called");
        if started { Signal::Start } else { Signal::Stop }
    }
}

impl From<Signal> for bool {
    fn from(signal: Signal) -> Self {
        signal.is_start()
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Start => write!(f, "start"),
            Signal::Stop => write!(f, "stop"),
        }
    }
}

/// Anything that accepts start/stop signals
///
/// Implementations must not block: `next` is called from inside `poll` and
/// from `Drop`.
pub trait SignalSink {
    fn next(&self, signal: Signal);
}

impl<T: SignalSink + ?Sized> SignalSink for &T {
    fn next(&self, signal: Signal) {
        (**self).next(signal)
    }
}

impl<T: SignalSink + ?Sized> SignalSink for Arc<T> {
    fn next(&self, signal: Signal) {
        (**self).next(signal)
    }
}

impl SignalSink for mpsc::UnboundedSender<Signal> {
    fn next(&self, signal: Signal) {
        debug!(%signal, "UnboundedSender::next: called");
        // Receiver gone means nobody is watching anymore
        let _ = self.send(signal);
    }
}
