//! Indicator coordinator
//!
//! The coordinator is the single owner of the in-flight count and the shown
//! widget. Every start/stop signal, from any task or thread, is queued to one
//! actor task that:
//! - **Counts up** on `Start` and shows the widget immediately
//! - **Counts down** on `Stop` (never below zero) and re-checks after `keep_open_ms`
//! - **Debounces** the hide: any signal inside the window restarts or cancels it

mod config;
mod core;
mod handle;
mod messages;

pub use config::IndicatorConfig;
pub use self::core::IndicatorCoordinator;
pub use handle::IndicatorHandle;
pub use messages::{IndicatorMetrics, IndicatorRequest, Visibility};
