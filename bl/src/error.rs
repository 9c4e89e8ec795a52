//! Coordinator error types

use thiserror::Error;

/// Errors from talking to an indicator coordinator
#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("Indicator coordinator has shut down")]
    Closed,
}
