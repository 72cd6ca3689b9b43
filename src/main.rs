// src/main.rs
// =============================================================================
// This is the entry point of the monitor.
//
// What happens here:
// 1. Load .env, set up logging, parse command-line arguments
// 2. Build the real collaborators (HTTP fetcher, webhook, report directory)
// 3. Either poll forever (watch) or run a single cycle (scan)
// 4. Exit with a proper code (0 = clean stop, 2 = startup error)
//
// Ctrl-C does not kill the process mid-delivery: it sets a flag that the
// monitor checks between targets and between cycles.
// =============================================================================

mod cli;
mod config;
mod detect;
mod error;
mod fetch;
mod monitor;
mod notify;
mod store;

#[cfg(test)]
mod testing;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, MonitorArgs};
use config::MonitorConfig;
use fetch::HttpFetcher;
use monitor::{CycleSummary, Monitor, Shutdown, TargetOutcome};
use notify::{HttpWebhook, NotificationDispatcher};
use store::FileReportSink;

/// Timeout for a single webhook POST.
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

type LiveMonitor = Monitor<HttpFetcher, HttpWebhook, FileReportSink>;

#[tokio::main]
async fn main() {
    // A missing .env file is fine; flags and real env vars still work
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "asset_sentinel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "monitor could not start");
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch(args) => handle_watch(args).await,
        Commands::Scan(args) => handle_scan(args).await,
    }
}

// Handles the 'watch' subcommand: poll until Ctrl-C
async fn handle_watch(args: MonitorArgs) -> Result<()> {
    let config = MonitorConfig::try_from(args).context("invalid arguments")?;
    let mut monitor = build_monitor(&config)?;
    let shutdown = listen_for_ctrl_c();

    monitor.run(&shutdown).await;
    Ok(())
}

// Handles the 'scan' subcommand: one pass, then print what happened
async fn handle_scan(args: MonitorArgs) -> Result<()> {
    let config = MonitorConfig::try_from(args).context("invalid arguments")?;
    let mut monitor = build_monitor(&config)?;
    let shutdown = listen_for_ctrl_c();

    let summary = monitor
        .run_cycle(&shutdown)
        .await
        .context("scan aborted")?;
    print_summary(&summary);
    Ok(())
}

fn build_monitor(config: &MonitorConfig) -> Result<LiveMonitor> {
    let fetcher = HttpFetcher::new(&config.fetch).context("failed to create HTTP client")?;

    let dispatcher = match &config.delivery.webhook_url {
        Some(url) => {
            let client = reqwest::Client::builder()
                .timeout(WEBHOOK_TIMEOUT)
                .build()
                .context("failed to create webhook client")?;
            tracing::info!(host = url.host_str().unwrap_or("?"), "webhook configured, alerts will be sent");
            NotificationDispatcher::new(HttpWebhook::new(client, url.clone()), config.delivery.clone())
        }
        None => {
            tracing::warn!("webhook URL not configured or is a placeholder, alerts will only be logged");
            NotificationDispatcher::disabled(config.delivery.clone())
        }
    };

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("failed to create output directory {}", config.output_dir.display()))?;

    let monitor = Monitor::new(config, fetcher, dispatcher, FileReportSink::new(&config.output_dir))
        .context("failed to load endpoint log")?;
    Ok(monitor)
}

// Spawns a task that flips the shutdown flag on Ctrl-C
fn listen_for_ctrl_c() -> Shutdown {
    let (trigger, shutdown) = monitor::shutdown_channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("stop requested, finishing the current step");
                trigger.trigger();
            }
            Err(e) => tracing::warn!(error = %e, "could not listen for Ctrl-C"),
        }
    });
    shutdown
}

// Prints the per-target results of a scan as a table
fn print_summary(summary: &CycleSummary) {
    println!("{:<60} {:<12} {:<40}", "URL", "STATUS", "ALERT");
    println!("{}", "=".repeat(112));

    for (url, outcome) in &summary.results {
        let url_display = if url.chars().count() > 57 {
            format!("{}...", url.chars().take(57).collect::<String>())
        } else {
            url.clone()
        };
        let (status, alert) = match outcome {
            TargetOutcome::FetchFailed { reason } => ("⚠️  FAILED", reason.clone()),
            TargetOutcome::Quiet { classification } => (*classification, "-".to_string()),
            TargetOutcome::Alerted {
                classification,
                delivery,
                ..
            } => (*classification, delivery.to_string()),
        };
        println!("{:<60} {:<12} {:<40}", url_display, status, alert);
    }

    println!();
    println!("📊 Summary:");
    println!("   🎯 Targets: {}", summary.results.len());
    println!("   🔔 Alerts: {}", summary.alerts());
    println!("   ❌ Undelivered: {}", summary.undelivered());
    println!("   ⚠️  Fetch failures: {}", summary.fetch_failures());
    if summary.interrupted {
        println!("   🛑 Interrupted before all targets were checked");
    }
}
