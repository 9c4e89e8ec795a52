//! Demo drivers that exercise a coordinator
//!
//! - [`run_demo`] sends raw random start/stop signals on a fixed interval.
//! - [`simulate`] runs operations of random length through [`indicate`], some
//!   of which fail or get cancelled, to show that every exit path balances the
//!   count.
//!
//! [`indicate`]: crate::indicate::indicate

use std::future::Future;
use std::time::Duration;

use eyre::{Result, eyre};
use rand::Rng;
use serde::Serialize;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{DemoConfig, SimulateConfig};
use crate::coordinator::IndicatorHandle;
use crate::indicate::IndicateExt;
use crate::signal::Signal;

/// Clamp a configured probability into [0, 1]; NaN and infinities count as 0
fn rate(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// What the random signal driver sent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DemoSummary {
    pub ticks: u64,
    pub starts: u64,
    pub stops: u64,
}

/// Send a random signal every `interval-ms` until `stop` resolves or `duration` elapses
pub async fn run_demo<R, F>(
    handle: &IndicatorHandle,
    config: &DemoConfig,
    duration: Option<Duration>,
    rng: &mut R,
    stop: F,
) -> DemoSummary
where
    R: Rng,
    F: Future<Output = ()>,
{
    debug!(interval_ms = config.interval_ms, ?duration, "run_demo: called");
    let interval = Duration::from_millis(config.interval_ms.max(1));
    let probability = rate(config.start_probability);

    // First tick fires one interval from now, not immediately
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let deadline = async move {
        match duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    tokio::pin!(stop);

    let mut summary = DemoSummary::default();
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let signal = Signal::from(rng.random_bool(probability));
                summary.ticks += 1;
                match signal {
                    Signal::Start => summary.starts += 1,
                    Signal::Stop => summary.stops += 1,
                }
                debug!(tick = summary.ticks, %signal, "run_demo: sending signal");
                handle.next(signal);
            }
            () = &mut deadline => {
                info!(ticks = summary.ticks, "Demo duration elapsed");
                break;
            }
            () = &mut stop => {
                info!(ticks = summary.ticks, "Demo interrupted");
                break;
            }
        }
    }
    summary
}

/// How a simulated operation ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Succeed,
    Fail,
    /// Dropped halfway through by a timeout
    Cancel,
}

/// One simulated operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationPlan {
    pub id: usize,
    pub delay: Duration,
    pub duration: Duration,
    pub outcome: Outcome,
}

/// Build a random set of operations from the simulation settings
pub fn plan_operations<R: Rng>(config: &SimulateConfig, rng: &mut R) -> Vec<OperationPlan> {
    debug!(operations = config.operations, "plan_operations: called");
    let max_ms = config.max_duration_ms.max(1);
    let failure_rate = rate(config.failure_rate);
    let cancel_rate = rate(config.cancel_rate).min(1.0 - failure_rate);

    (0..config.operations)
        .map(|id| {
            let roll: f64 = rng.random();
            let outcome = if roll < failure_rate {
                Outcome::Fail
            } else if roll < failure_rate + cancel_rate {
                Outcome::Cancel
            } else {
                Outcome::Succeed
            };
            OperationPlan {
                id,
                delay: Duration::from_millis(rng.random_range(0..=max_ms)),
                duration: Duration::from_millis(rng.random_range(1..=max_ms)),
                outcome,
            }
        })
        .collect()
}

/// Tally of how simulated operations ended
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl SimulationReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.cancelled
    }
}

async fn operation(plan: OperationPlan) -> Result<usize> {
    tokio::time::sleep(plan.duration).await;
    match plan.outcome {
        Outcome::Fail => Err(eyre!("Operation {} failed", plan.id)),
        _ => Ok(plan.id),
    }
}

/// Run every planned operation wrapped with `indicate` and wait for all of them
pub async fn simulate(handle: &IndicatorHandle, plans: Vec<OperationPlan>) -> SimulationReport {
    debug!(operations = plans.len(), "simulate: called");
    let mut tasks = JoinSet::new();

    for plan in plans {
        let handle = handle.clone();
        tasks.spawn(async move {
            tokio::time::sleep(plan.delay).await;
            let outcome = plan.outcome;
            let cutoff = plan.duration / 2;
            let work = operation(plan).indicate(Some(handle));

            match outcome {
                Outcome::Cancel => match tokio::time::timeout(cutoff, work).await {
                    Ok(_) => Outcome::Succeed,
                    Err(_) => Outcome::Cancel,
                },
                _ => match work.await {
                    Ok(id) => {
                        debug!(id, "simulate: operation succeeded");
                        Outcome::Succeed
                    }
                    Err(e) => {
                        debug!(error = %e, "simulate: operation failed");
                        Outcome::Fail
                    }
                },
            }
        });
    }

    let mut report = SimulationReport::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Outcome::Succeed) => report.succeeded += 1,
            Ok(Outcome::Fail) => report.failed += 1,
            Ok(Outcome::Cancel) => report.cancelled += 1,
            Err(e) => {
                warn!(error = %e, "Simulated operation task failed");
                report.failed += 1;
            }
        }
    }

    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        cancelled = report.cancelled,
        "Simulation finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::{IndicatorConfig, IndicatorCoordinator, Visibility};
    use crate::widget::RecordingWidget;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Arc;

    #[test]
    fn test_plan_operations_respects_config() {
        let config = SimulateConfig {
            operations: 50,
            max_duration_ms: 200,
            failure_rate: 0.0,
            cancel_rate: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(7);
        let plans = plan_operations(&config, &mut rng);

        assert_eq!(plans.len(), 50);
        assert!(plans.iter().all(|p| p.outcome == Outcome::Succeed));
        assert!(plans.iter().all(|p| p.duration <= Duration::from_millis(200)));
        assert!(plans.iter().all(|p| p.duration >= Duration::from_millis(1)));
    }

    #[test]
    fn test_plan_operations_all_fail() {
        let config = SimulateConfig {
            operations: 10,
            failure_rate: 1.0,
            cancel_rate: 0.5,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let plans = plan_operations(&config, &mut rng);
        assert!(plans.iter().all(|p| p.outcome == Outcome::Fail));
    }

    #[test]
    fn test_rate_handles_non_finite() {
        assert_eq!(rate(0.25), 0.25);
        assert_eq!(rate(-1.0), 0.0);
        assert_eq!(rate(7.0), 1.0);
        assert_eq!(rate(f64::NAN), 0.0);
        assert_eq!(rate(f64::INFINITY), 0.0);
        assert_eq!(rate(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_plan_operations_nan_rates_succeed() {
        let config: SimulateConfig = serde_yaml::from_str("operations: 10\nfailure-rate: .nan\ncancel-rate: .nan\n").unwrap();
        assert!(config.failure_rate.is_nan());

        let mut rng = StdRng::seed_from_u64(1);
        let plans = plan_operations(&config, &mut rng);
        assert_eq!(plans.len(), 10);
        assert!(plans.iter().all(|p| p.outcome == Outcome::Succeed));
    }

    #[test]
    fn test_plan_operations_nan_failure_keeps_cancel_rate() {
        let config: SimulateConfig = serde_yaml::from_str("operations: 10\nfailure-rate: .nan\ncancel-rate: 1.0\n").unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let plans = plan_operations(&config, &mut rng);
        assert!(plans.iter().all(|p| p.outcome == Outcome::Cancel));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_demo_nan_probability_sends_stops() {
        let (handle, task) = IndicatorCoordinator::spawn(IndicatorConfig::default(), Arc::new(RecordingWidget::new()));
        let config: DemoConfig = serde_yaml::from_str("interval-ms: 100\nstart-probability: .nan\n").unwrap();
        assert!(config.start_probability.is_nan());
        let mut rng = StdRng::seed_from_u64(3);

        let summary = run_demo(
            &handle,
            &config,
            Some(Duration::from_millis(350)),
            &mut rng,
            std::future::pending(),
        )
        .await;

        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.stops, 3);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_balances_count() {
        let widget = RecordingWidget::new();
        let (handle, task) =
            IndicatorCoordinator::spawn(IndicatorConfig::default().with_keep_open_ms(100), Arc::new(widget.clone()));

        let plans = vec![
            OperationPlan {
                id: 0,
                delay: Duration::ZERO,
                duration: Duration::from_millis(50),
                outcome: Outcome::Succeed,
            },
            OperationPlan {
                id: 1,
                delay: Duration::from_millis(10),
                duration: Duration::from_millis(80),
                outcome: Outcome::Fail,
            },
            OperationPlan {
                id: 2,
                delay: Duration::from_millis(20),
                duration: Duration::from_millis(400),
                outcome: Outcome::Cancel,
            },
        ];

        let report = simulate(&handle, plans).await;
        assert_eq!(
            report,
            SimulationReport {
                succeeded: 1,
                failed: 1,
                cancelled: 1
            }
        );
        assert_eq!(report.total(), 3);

        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.starts, 3);
        assert_eq!(metrics.stops, 3);
        assert_eq!(metrics.in_flight, 0);
        assert_eq!(metrics.ignored_stops, 0);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(handle.visibility(), Visibility::Hidden);
        assert_eq!(widget.opens(), 1);
        assert_eq!(widget.dismissals(), 1);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_demo_stops_after_duration() {
        let widget = RecordingWidget::new();
        let (handle, task) = IndicatorCoordinator::spawn(IndicatorConfig::default(), Arc::new(widget.clone()));
        let config = DemoConfig {
            interval_ms: 100,
            start_probability: 1.0,
        };
        let mut rng = StdRng::seed_from_u64(3);

        let summary = run_demo(
            &handle,
            &config,
            Some(Duration::from_millis(550)),
            &mut rng,
            std::future::pending(),
        )
        .await;

        assert_eq!(summary.ticks, 5);
        assert_eq!(summary.starts, 5);
        assert_eq!(summary.stops, 0);

        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.in_flight, 5);
        assert_eq!(metrics.visibility, Visibility::Showing);

        handle.shutdown();
        task.await.unwrap();
        assert_eq!(widget.dismissals(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_demo_stops_on_signal() {
        let widget = RecordingWidget::new();
        let (handle, task) = IndicatorCoordinator::spawn(IndicatorConfig::default(), Arc::new(widget));
        let config = DemoConfig {
            interval_ms: 100,
            start_probability: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(3);

        let summary = run_demo(
            &handle,
            &config,
            None,
            &mut rng,
            tokio::time::sleep(Duration::from_millis(250)),
        )
        .await;

        assert_eq!(summary.ticks, 2);
        assert_eq!(summary.stops, 2);

        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.ignored_stops, 2);
        assert_eq!(metrics.opens, 0);

        handle.shutdown();
        task.await.unwrap();
    }
}
