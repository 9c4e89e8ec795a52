//! busylight - shared busy indicator coordinator
//!
//! Many independent async operations report "started" and "finished"; one
//! coordinator keeps a single indicator visible while at least one of them is
//! in flight. Short or back-to-back operations do not make the indicator
//! flicker: hiding waits for a keep-open window in which nothing new starts.
//!
//! # Architecture
//!
//! ```text
//!   operation ──indicate──┐
//!   operation ──indicate──┼──> IndicatorHandle ──queue──> IndicatorCoordinator ──> Widget
//!   handle.next(true) ────┘        (clone per task)        (count + debounce)     open/dismiss
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use busylight::{ConsoleWidget, IndicateExt, IndicatorConfig, IndicatorCoordinator};
//!
//! let (indicator, task) = IndicatorCoordinator::spawn(IndicatorConfig::new("saving"), Arc::new(ConsoleWidget));
//! let saved = save_document(&doc).indicate(Some(indicator.clone())).await?;
//! indicator.shutdown();
//! task.await?;
//! ```
//!
//! # Modules
//!
//! - [`signal`] - Start/stop signals and the `SignalSink` trait
//! - [`indicate`] - Future/stream wrapper and RAII guard that emit signals
//! - [`coordinator`] - The counting, debouncing actor and its handle
//! - [`widget`] - Widget trait plus console and recording widgets
//! - [`driver`] - Demo drivers used by the `bl` binary
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod driver;
pub mod error;
pub mod indicate;
pub mod signal;
pub mod widget;

// Re-export commonly used types
pub use config::{Config, DemoConfig, SimulateConfig};
pub use coordinator::{IndicatorConfig, IndicatorCoordinator, IndicatorHandle, IndicatorMetrics, Visibility};
pub use error::IndicatorError;
pub use indicate::{IndicateExt, IndicateGuard, IndicateStreamExt, Indicated, indicate};
pub use signal::{Signal, SignalSink};
pub use widget::{ConsoleWidget, RecordingWidget, Widget, WidgetEvent, WidgetHandle};
