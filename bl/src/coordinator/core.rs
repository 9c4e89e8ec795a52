//! Main coordinator task implementation

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use super::config::IndicatorConfig;
use super::handle::IndicatorHandle;
use super::messages::{IndicatorMetrics, IndicatorRequest, Visibility};
use crate::signal::Signal;
use crate::widget::{Widget, WidgetHandle};

/// In-flight count and the shown widget, owned by the coordinator task
struct IndicatorState {
    in_flight: usize,
    /// Some while Showing
    shown: Option<Box<dyn WidgetHandle>>,
    metrics: IndicatorMetrics,
}

impl IndicatorState {
    fn new() -> Self {
        Self {
            in_flight: 0,
            shown: None,
            metrics: IndicatorMetrics::default(),
        }
    }

    fn visibility(&self) -> Visibility {
        if self.shown.is_some() {
            Visibility::Showing
        } else {
            Visibility::Hidden
        }
    }

    fn record_start(&mut self) {
        self.metrics.signals_received += 1;
        self.metrics.starts += 1;
        self.in_flight += 1;
    }

    /// Returns false when the stop had nothing to balance
    fn record_stop(&mut self) -> bool {
        self.metrics.signals_received += 1;
        self.metrics.stops += 1;
        if self.in_flight > 0 {
            self.in_flight -= 1;
            true
        } else {
            self.metrics.ignored_stops += 1;
            false
        }
    }

    /// Open or dismiss the widget to match the count
    ///
    /// Returns the new visibility if it changed.
    fn reconcile(&mut self, widget: &dyn Widget, config: &IndicatorConfig) -> Option<Visibility> {
        match (self.in_flight > 0, self.shown.is_some()) {
            (true, false) => {
                debug!(in_flight = self.in_flight, component = %config.component, "Opening indicator");
                self.shown = Some(widget.open(&config.component, config.widget_config.as_ref()));
                self.metrics.opens += 1;
                Some(Visibility::Showing)
            }
            (false, true) => {
                debug!(component = %config.component, "Dismissing indicator");
                self.dismiss();
                Some(Visibility::Hidden)
            }
            _ => None,
        }
    }

    fn dismiss(&mut self) -> bool {
        match self.shown.take() {
            Some(handle) => {
                handle.dismiss();
                self.metrics.dismissals += 1;
                true
            }
            None => false,
        }
    }

    fn snapshot(&self) -> IndicatorMetrics {
        IndicatorMetrics {
            in_flight: self.in_flight,
            visibility: self.visibility(),
            ..self.metrics.clone()
        }
    }
}

/// The coordinator turns start/stop signals into one debounced widget
pub struct IndicatorCoordinator {
    config: IndicatorConfig,
    widget: Arc<dyn Widget>,
    tx: mpsc::UnboundedSender<IndicatorRequest>,
    rx: mpsc::UnboundedReceiver<IndicatorRequest>,
    visibility_tx: watch::Sender<Visibility>,
}

impl IndicatorCoordinator {
    /// Create a new coordinator with the given configuration and widget
    pub fn new(config: IndicatorConfig, widget: Arc<dyn Widget>) -> Self {
        debug!(component = %config.component, keep_open_ms = config.keep_open_ms, "IndicatorCoordinator::new: called");
        let (tx, rx) = mpsc::unbounded_channel();
        let (visibility_tx, _) = watch::channel(Visibility::Hidden);
        Self {
            config,
            widget,
            tx,
            rx,
            visibility_tx,
        }
    }

    /// Create a coordinator and spawn its task
    pub fn spawn(config: IndicatorConfig, widget: Arc<dyn Widget>) -> (IndicatorHandle, JoinHandle<()>) {
        let coordinator = Self::new(config, widget);
        let handle = coordinator.handle();
        let task = tokio::spawn(coordinator.run());
        (handle, task)
    }

    /// Get a handle for signalling this coordinator
    pub fn handle(&self) -> IndicatorHandle {
        IndicatorHandle::new(self.tx.clone(), self.visibility_tx.subscribe())
    }

    /// Run the coordinator task
    ///
    /// This consumes the coordinator and runs until shutdown is requested or
    /// every handle has been dropped. On exit the widget is dismissed if shown.
    pub async fn run(self) {
        let Self {
            config,
            widget,
            tx,
            mut rx,
            visibility_tx,
        } = self;
        // Only handles keep the queue open from here on
        drop(tx);

        let keep_open = config.keep_open();
        let mut state = IndicatorState::new();

        let debounce = sleep(keep_open);
        tokio::pin!(debounce);
        let mut hide_pending = false;

        info!(component = %config.component, keep_open_ms = config.keep_open_ms, "Indicator coordinator started");

        loop {
            tokio::select! {
                biased;

                // Elapsed window goes before anything still queued
                () = &mut debounce, if hide_pending => {
                    hide_pending = false;
                    debug!(in_flight = state.in_flight, "Keep-open window elapsed");
                    if let Some(visibility) = state.reconcile(widget.as_ref(), &config) {
                        visibility_tx.send_replace(visibility);
                    }
                }

                req = rx.recv() => {
                    let Some(req) = req else {
                        debug!("All indicator handles dropped");
                        break;
                    };

                    match req {
                        IndicatorRequest::Signal(Signal::Start) => {
                            state.record_start();
                            hide_pending = false;
                            debug!(in_flight = state.in_flight, "Start received");
                            if let Some(visibility) = state.reconcile(widget.as_ref(), &config) {
                                visibility_tx.send_replace(visibility);
                            }
                        }

                        IndicatorRequest::Signal(Signal::Stop) => {
                            if state.record_stop() {
                                debug!(in_flight = state.in_flight, "Stop received");
                            } else {
                                debug!("Stop received with nothing in flight, ignoring");
                            }
                            debounce.as_mut().reset(Instant::now() + keep_open);
                            hide_pending = true;
                        }

                        IndicatorRequest::GetMetrics { reply_tx } => {
                            let _ = reply_tx.send(state.snapshot());
                        }

                        IndicatorRequest::Shutdown => {
                            debug!("Shutdown requested");
                            break;
                        }
                    }
                }
            }
        }

        info!(in_flight = state.in_flight, "Indicator coordinator shutting down");
        rx.close();
        if state.dismiss() {
            visibility_tx.send_replace(Visibility::Hidden);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::RecordingWidget;
    use proptest::prelude::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn config(keep_open_ms: u64) -> IndicatorConfig {
        IndicatorConfig::new("test").with_keep_open_ms(keep_open_ms)
    }

    #[test]
    fn test_state_stop_never_underflows() {
        let mut state = IndicatorState::new();
        assert!(!state.record_stop());
        assert_eq!(state.in_flight, 0);
        assert_eq!(state.metrics.ignored_stops, 1);

        state.record_start();
        assert!(state.record_stop());
        assert!(!state.record_stop());
        assert_eq!(state.in_flight, 0);
        assert_eq!(state.metrics.ignored_stops, 2);
    }

    #[test]
    fn test_state_reconcile_is_idempotent() {
        let widget = RecordingWidget::new();
        let config = config(1000);
        let mut state = IndicatorState::new();

        assert_eq!(state.reconcile(&widget, &config), None);

        state.record_start();
        assert_eq!(state.reconcile(&widget, &config), Some(Visibility::Showing));
        state.record_start();
        assert_eq!(state.reconcile(&widget, &config), None);
        assert_eq!(widget.opens(), 1);

        state.record_stop();
        assert_eq!(state.reconcile(&widget, &config), None);
        state.record_stop();
        assert_eq!(state.reconcile(&widget, &config), Some(Visibility::Hidden));
        assert_eq!(state.reconcile(&widget, &config), None);
        assert_eq!(widget.dismissals(), 1);
    }

    #[test]
    fn test_state_passes_component_and_config() {
        let widget = RecordingWidget::new();
        let config = config(1000).with_widget_config(serde_json::json!({"label": "Saving"}));
        let mut state = IndicatorState::new();
        state.record_start();
        state.reconcile(&widget, &config);

        match &widget.events()[0] {
            crate::widget::WidgetEvent::Opened { component, config, .. } => {
                assert_eq!(component, "test");
                assert_eq!(config.as_ref().unwrap()["label"], "Saving");
            }
            other => panic!("Wrong event: {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_count_never_negative_and_widget_tracks_count(signals in prop::collection::vec(any::<bool>(), 0..200)) {
            let widget = RecordingWidget::new();
            let config = config(1000);
            let mut state = IndicatorState::new();
            let mut expected: usize = 0;

            for started in signals {
                if started {
                    state.record_start();
                    expected += 1;
                } else {
                    state.record_stop();
                    expected = expected.saturating_sub(1);
                }
                state.reconcile(&widget, &config);

                prop_assert_eq!(state.in_flight, expected);
                prop_assert_eq!(state.shown.is_some(), expected > 0);
                prop_assert_eq!(widget.is_visible(), expected > 0);
                prop_assert!(widget.opens() - widget.dismissals() <= 1);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_coordinator_opens_immediately() {
        let widget = RecordingWidget::new();
        let (handle, task) = IndicatorCoordinator::spawn(config(1000), Arc::new(widget.clone()));

        let started = Instant::now();
        handle.next(true);
        let metrics = handle.metrics().await.unwrap();

        assert_eq!(metrics.in_flight, 1);
        assert_eq!(metrics.visibility, Visibility::Showing);
        assert_eq!(handle.visibility(), Visibility::Showing);
        assert_eq!(widget.opens(), 1);
        assert_eq!(widget.events()[0].at(), started);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_coordinator_metrics() {
        let widget = RecordingWidget::new();
        let (handle, task) = IndicatorCoordinator::spawn(config(100), Arc::new(widget.clone()));

        handle.next(false);
        handle.next(true);
        handle.next(true);
        handle.next(false);
        handle.next(false);
        handle.next(false);
        tokio::time::sleep(Duration::from_millis(150)).await;

        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.signals_received, 6);
        assert_eq!(metrics.starts, 2);
        assert_eq!(metrics.stops, 4);
        assert_eq!(metrics.ignored_stops, 2);
        assert_eq!(metrics.opens, 1);
        assert_eq!(metrics.dismissals, 1);
        assert_eq!(metrics.in_flight, 0);
        assert_eq!(metrics.visibility, Visibility::Hidden);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_window_runs_before_queued_requests() {
        let widget = RecordingWidget::new();
        let coordinator = IndicatorCoordinator::new(config(100), Arc::new(widget.clone()));
        let tx = coordinator.tx.clone();
        let handle = coordinator.handle();
        let run = coordinator.run();
        tokio::pin!(run);

        handle.start();
        handle.stop();
        assert!(futures::poll!(&mut run).is_pending());
        assert!(widget.is_visible());

        // Window closes while the coordinator is not running
        tokio::time::advance(Duration::from_millis(150)).await;

        let mut replies = Vec::new();
        for _ in 0..5 {
            let (reply_tx, reply_rx) = oneshot::channel();
            tx.send(IndicatorRequest::GetMetrics { reply_tx }).unwrap();
            replies.push(reply_rx);
        }
        assert!(futures::poll!(&mut run).is_pending());

        for reply_rx in replies {
            let metrics = reply_rx.await.unwrap();
            assert_eq!(metrics.visibility, Visibility::Hidden);
            assert_eq!(metrics.dismissals, 1);
        }
        assert!(!widget.is_visible());

        handle.shutdown();
        drop(tx);
        run.await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_coordinator_exits_when_handles_dropped() {
        let widget = RecordingWidget::new();
        let (handle, task) = IndicatorCoordinator::spawn(config(1000), Arc::new(widget.clone()));

        handle.next(true);
        handle.metrics().await.unwrap();
        assert!(widget.is_visible());

        drop(handle);
        task.await.unwrap();
        assert!(!widget.is_visible());
        assert_eq!(widget.dismissals(), 1);
    }
}
