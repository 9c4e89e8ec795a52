//! busylight - shared busy indicator demo
//!
//! CLI entry point for driving a console indicator from random signals or
//! simulated operations.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use busylight::cli::{Cli, Command, OutputFormat, get_log_path};
use busylight::config::Config;
use busylight::driver::{plan_operations, run_demo, simulate};
use busylight::{ConsoleWidget, IndicatorCoordinator, IndicatorMetrics};

fn parse_level(level_str: Option<&str>) -> tracing::Level {
    match level_str.map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    }
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level = parse_level(cli_log_level.or(config_log_level));

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn print_metrics(metrics: &IndicatorMetrics) {
    println!("{}", "Indicator".bold());
    println!("  Signals:       {}", metrics.signals_received);
    println!("  Starts/stops:  {}/{}", metrics.starts, metrics.stops);
    println!("  Ignored stops: {}", metrics.ignored_stops);
    println!("  Opens:         {}", metrics.opens);
    println!("  Dismissals:    {}", metrics.dismissals);
    println!("  In flight:     {}", metrics.in_flight);
}

async fn cmd_demo(
    mut config: Config,
    interval_ms: Option<u64>,
    keep_open_ms: Option<u64>,
    duration_secs: Option<u64>,
) -> Result<()> {
    debug!(?interval_ms, ?keep_open_ms, ?duration_secs, "cmd_demo: called");
    if let Some(interval_ms) = interval_ms {
        config.demo.interval_ms = interval_ms;
    }
    if let Some(keep_open_ms) = keep_open_ms {
        config.indicator.keep_open_ms = keep_open_ms;
    }

    let (handle, task) = IndicatorCoordinator::spawn(config.indicator.clone(), Arc::new(ConsoleWidget::new()));

    println!(
        "Sending a random signal every {}ms (Ctrl-C to stop)",
        config.demo.interval_ms.to_string().cyan()
    );

    let mut rng = rand::rng();
    let interrupted = async {
        // If the handler can't be installed the demo runs until its duration
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let summary = run_demo(
        &handle,
        &config.demo,
        duration_secs.map(Duration::from_secs),
        &mut rng,
        interrupted,
    )
    .await;

    let metrics = handle.metrics().await.context("Failed to read indicator metrics")?;
    handle.shutdown();
    task.await.context("Indicator coordinator task failed")?;

    println!();
    println!("Sent {} signals ({} start, {} stop)", summary.ticks, summary.starts, summary.stops);
    print_metrics(&metrics);
    Ok(())
}

async fn cmd_simulate(
    mut config: Config,
    operations: Option<usize>,
    max_duration_ms: Option<u64>,
    keep_open_ms: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    debug!(?operations, ?max_duration_ms, ?keep_open_ms, %format, "cmd_simulate: called");
    if let Some(operations) = operations {
        config.simulate.operations = operations;
    }
    if let Some(max_duration_ms) = max_duration_ms {
        config.simulate.max_duration_ms = max_duration_ms;
    }
    if let Some(keep_open_ms) = keep_open_ms {
        config.indicator.keep_open_ms = keep_open_ms;
    }

    let plans = {
        let mut rng = rand::rng();
        plan_operations(&config.simulate, &mut rng)
    };

    let (handle, task) = IndicatorCoordinator::spawn(config.indicator.clone(), Arc::new(ConsoleWidget::new()));
    let report = simulate(&handle, plans).await;

    // Let the keep-open window run out so the indicator hides on its own
    tokio::time::sleep(config.indicator.keep_open() + Duration::from_millis(50)).await;
    let metrics = handle.metrics().await.context("Failed to read indicator metrics")?;
    handle.shutdown();
    task.await.context("Indicator coordinator task failed")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "report": report,
                "metrics": metrics,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!();
            println!(
                "{} operations: {} succeeded, {} failed, {} cancelled",
                report.total(),
                report.succeeded.to_string().green(),
                report.failed.to_string().red(),
                report.cancelled.to_string().yellow()
            );
            print_metrics(&metrics);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Demo {
            interval_ms,
            keep_open_ms,
            duration_secs,
        } => cmd_demo(config, interval_ms, keep_open_ms, duration_secs).await,
        Command::Simulate {
            operations,
            max_duration_ms,
            keep_open_ms,
            format,
        } => cmd_simulate(config, operations, max_duration_ms, keep_open_ms, format).await,
    }
}
