//! Visual indicator widgets
//!
//! The coordinator only needs two things from a widget: a way to show it, and a
//! handle that hides it again. Everything else (rendering, placement, styling)
//! belongs to the widget.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use colored::Colorize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Something that can be shown as the shared busy indicator
pub trait Widget: Send + Sync {
    /// Show the widget and return the handle that dismisses it
    fn open(&self, component: &str, config: Option<&Value>) -> Box<dyn WidgetHandle>;
}

/// A shown widget
pub trait WidgetHandle: Send {
    fn dismiss(self: Box<Self>);
}

// =============================================================================
// ConsoleWidget
// =============================================================================

/// Prints a line to stdout when shown and another when dismissed
#[derive(Debug, Default, Clone)]
pub struct ConsoleWidget;

impl ConsoleWidget {
    pub fn new() -> Self {
        Self
    }
}

impl Widget for ConsoleWidget {
    fn open(&self, component: &str, config: Option<&Value>) -> Box<dyn WidgetHandle> {
        debug!(%component, "ConsoleWidget::open: called");
        let label = config
            .and_then(|c| c.get("label"))
            .and_then(Value::as_str)
            .unwrap_or("working...");

        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{} {} {}", "●".yellow(), component.bold(), label.dimmed()) {
            warn!(error = %e, "ConsoleWidget::open: failed to write");
        }

        Box::new(ConsoleHandle {
            component: component.to_string(),
            opened_at: Instant::now(),
        })
    }
}

struct ConsoleHandle {
    component: String,
    opened_at: Instant,
}

impl WidgetHandle for ConsoleHandle {
    fn dismiss(self: Box<Self>) {
        let shown_for = self.opened_at.elapsed();
        debug!(component = %self.component, ?shown_for, "ConsoleHandle::dismiss: called");
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(
            stdout,
            "{} {} {}",
            "✓".green(),
            self.component.bold(),
            format!("done after {:.1}s", shown_for.as_secs_f64()).dimmed()
        ) {
            warn!(error = %e, "ConsoleHandle::dismiss: failed to write");
        }
    }
}

// =============================================================================
// RecordingWidget
// =============================================================================

/// What happened to a [`RecordingWidget`]
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    Opened {
        at: Instant,
        component: String,
        config: Option<Value>,
    },
    Dismissed {
        at: Instant,
    },
}

impl WidgetEvent {
    pub fn at(&self) -> Instant {
        match self {
            WidgetEvent::Opened { at, .. } | WidgetEvent::Dismissed { at } => *at,
        }
    }
}

/// Headless widget that records every open and dismiss
///
/// Clones share the same log, so keep one clone to inspect while the
/// coordinator owns the other.
#[derive(Debug, Default, Clone)]
pub struct RecordingWidget {
    events: Arc<Mutex<Vec<WidgetEvent>>>,
}

impl RecordingWidget {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<WidgetEvent>> {
        // A poisoned log is still a valid log
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn events(&self) -> Vec<WidgetEvent> {
        self.lock().clone()
    }

    pub fn opens(&self) -> usize {
        self.lock()
            .iter()
            .filter(|e| matches!(e, WidgetEvent::Opened { .. }))
            .count()
    }

    pub fn dismissals(&self) -> usize {
        self.lock()
            .iter()
            .filter(|e| matches!(e, WidgetEvent::Dismissed { .. }))
            .count()
    }

    /// More opens than dismissals
    pub fn is_visible(&self) -> bool {
        self.opens() > self.dismissals()
    }

    pub fn last_dismissed_at(&self) -> Option<Instant> {
        self.lock().iter().rev().find_map(|e| match e {
            WidgetEvent::Dismissed { at } => Some(*at),
            _ => None,
        })
    }
}

impl Widget for RecordingWidget {
    fn open(&self, component: &str, config: Option<&Value>) -> Box<dyn WidgetHandle> {
        self.lock().push(WidgetEvent::Opened {
            at: Instant::now(),
            component: component.to_string(),
            config: config.cloned(),
        });
        Box::new(RecordingHandle {
            events: self.events.clone(),
        })
    }
}

struct RecordingHandle {
    events: Arc<Mutex<Vec<WidgetEvent>>>,
}

impl WidgetHandle for RecordingHandle {
    fn dismiss(self: Box<Self>) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(WidgetEvent::Dismissed { at: Instant::now() });
    }
}
