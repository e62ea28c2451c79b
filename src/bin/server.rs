//! The sitewatch daemon: the periodic trigger driving the check engine.

use std::sync::Arc;

use clap::Parser;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sitewatch::db::MonitorRepo;
use sitewatch::monitor::{
    HttpProber, MonitorSettings, RunContext, SystemClock, UptimeMonitorService,
};
use sitewatch::server::config::AppConfig;
use sitewatch::version::VERSION;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Run one check pass and exit, for cron-style external triggers.
    #[arg(long)]
    once: bool,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "sitewatch.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Manually check for --version before full parsing to keep the output simple.
    if std::env::args().any(|arg| arg == "--version") {
        println!("sitewatch version: {VERSION}");
        return Ok(());
    }

    let args = Args::parse();
    dotenv::dotenv().ok();

    let config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&config.log_dir);
    info!("Starting sitewatch, version: {}", VERSION);

    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(10);
    let db: DatabaseConnection = Database::connect(opt).await?;

    let service = UptimeMonitorService::new(
        Arc::new(MonitorRepo::new(db)),
        Arc::new(HttpProber::new()?),
        Arc::new(SystemClock),
        MonitorSettings {
            slow_threshold_ms: config.slow_threshold_ms,
            max_concurrent_probes: config.max_concurrent_probes,
        },
    );

    if args.once {
        run_once(&service, "cli").await;
        return Ok(());
    }

    info!(
        cadence_seconds = config.scheduler_interval_seconds,
        "Entering scheduler loop."
    );
    let mut ticker = interval(Duration::from_secs(config.scheduler_interval_seconds));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_once(&service, "scheduler").await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal, stopping scheduler.");
                break;
            }
        }
    }

    Ok(())
}

/// One pass over the due monitors. Run failures are logged, not fatal:
/// the next tick gets a fresh attempt.
async fn run_once(service: &UptimeMonitorService, triggered_by: &str) {
    let ctx = RunContext::new(triggered_by);
    match service.run_scheduled_checks(&ctx).await {
        Ok(summary) => {
            info!(
                total = summary.total,
                healthy = summary.healthy,
                unhealthy = summary.unhealthy,
                invalid = summary.invalid,
                "Check run finished."
            );
        }
        Err(e) => {
            error!(error = %e, "Check run failed.");
        }
    }
}
