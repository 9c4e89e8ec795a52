//! IndicatorHandle - client interface for signalling the coordinator

use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use super::messages::{IndicatorMetrics, IndicatorRequest, Visibility};
use crate::error::IndicatorError;
use crate::indicate::IndicateGuard;
use crate::signal::{Signal, SignalSink};

/// Handle for operations to report start/stop to the coordinator
///
/// This handle is cheap to clone and can be passed to anything that runs
/// indicated work. Signalling never blocks and never fails; signals sent after
/// the coordinator has shut down are dropped.
#[derive(Debug, Clone)]
pub struct IndicatorHandle {
    /// Sender to the coordinator task
    tx: mpsc::UnboundedSender<IndicatorRequest>,

    /// Visibility published by the coordinator task
    visibility_rx: watch::Receiver<Visibility>,
}

impl IndicatorHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<IndicatorRequest>, visibility_rx: watch::Receiver<Visibility>) -> Self {
        Self { tx, visibility_rx }
    }

    /// Queue a start (`true`) or stop (`false`) signal
    pub fn next(&self, signal: impl Into<Signal>) {
        let signal = signal.into();
        if self.tx.send(IndicatorRequest::Signal(signal)).is_err() {
            debug!(%signal, "IndicatorHandle::next: coordinator gone, signal dropped");
        }
    }

    pub fn start(&self) {
        self.next(Signal::Start);
    }

    pub fn stop(&self) {
        self.next(Signal::Stop);
    }

    /// Signal start now and stop when the returned guard is dropped
    pub fn guard(&self) -> IndicateGuard<IndicatorHandle> {
        IndicateGuard::new(self.clone())
    }

    /// Current visibility as last published by the coordinator
    pub fn visibility(&self) -> Visibility {
        *self.visibility_rx.borrow()
    }

    /// Receiver that changes on every Hidden/Showing transition
    pub fn watch_visibility(&self) -> watch::Receiver<Visibility> {
        self.visibility_rx.clone()
    }

    /// Whether the coordinator task has stopped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Get current coordinator metrics
    ///
    /// The request is queued behind every signal sent before it, so the
    /// snapshot reflects all of them.
    pub async fn metrics(&self) -> Result<IndicatorMetrics, IndicatorError> {
        debug!("IndicatorHandle::metrics: called");
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(IndicatorRequest::GetMetrics { reply_tx })
            .map_err(|_| IndicatorError::Closed)?;

        reply_rx.await.map_err(|_| IndicatorError::Closed)
    }

    /// Request teardown: dismiss the widget and stop processing signals
    ///
    /// Safe to call more than once.
    pub fn shutdown(&self) {
        debug!("IndicatorHandle::shutdown: called");
        if self.tx.send(IndicatorRequest::Shutdown).is_err() {
            debug!("IndicatorHandle::shutdown: coordinator already stopped");
        }
    }
}

impl SignalSink for IndicatorHandle {
    fn next(&self, signal: Signal) {
        IndicatorHandle::next(self, signal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached() -> (IndicatorHandle, mpsc::UnboundedReceiver<IndicatorRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (_visibility_tx, visibility_rx) = watch::channel(Visibility::Hidden);
        (IndicatorHandle::new(tx, visibility_rx), rx)
    }

    #[test]
    fn test_next_accepts_bools() {
        let (handle, mut rx) = detached();
        handle.next(true);
        handle.next(false);
        handle.start();

        let received: Vec<Signal> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|req| match req {
                IndicatorRequest::Signal(signal) => signal,
                other => panic!("Wrong request: {:?}", other),
            })
            .collect();
        assert_eq!(received, vec![Signal::Start, Signal::Stop, Signal::Start]);
    }

    #[test]
    fn test_guard_sends_pair() {
        let (handle, mut rx) = detached();
        {
            let _guard = handle.guard();
        }
        assert!(matches!(rx.try_recv(), Ok(IndicatorRequest::Signal(Signal::Start))));
        assert!(matches!(rx.try_recv(), Ok(IndicatorRequest::Signal(Signal::Stop))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_coordinator() {
        let (handle, rx) = detached();
        drop(rx);

        assert!(handle.is_closed());
        // Neither of these may panic
        handle.next(true);
        handle.shutdown();
        handle.shutdown();

        let result = handle.metrics().await;
        assert!(matches!(result, Err(IndicatorError::Closed)));
    }

    #[test]
    fn test_visibility_defaults_to_hidden() {
        let (handle, _rx) = detached();
        assert_eq!(handle.visibility(), Visibility::Hidden);
    }
}
