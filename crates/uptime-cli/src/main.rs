mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinSet;
use tracing_subscriber::{fmt, EnvFilter};

use uptime_core::{
    Checker, HttpProber, MemoryStore, ProbeOutcome, Prober, Scheduler, Target, TargetStatus,
    TelegramNotifier,
};

/// Endpoint availability monitor: scheduled HTTP checks with Telegram alerts.
#[derive(Parser)]
#[command(name = "uptime-monitor", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the scheduler and the HTTP API server.
    Serve {
        /// Listen address (e.g. 0.0.0.0:8080). Overrides config file.
        #[arg(short, long)]
        listen: Option<SocketAddr>,

        /// Path to TOML config file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Sweep interval in minutes (1-59). Overrides config file and environment.
        #[arg(short, long)]
        interval: Option<u32>,
    },
    /// Probe URLs once and print the outcome (no scheduler, no API server).
    Check {
        /// URLs to probe.
        #[arg(required = true)]
        urls: Vec<String>,

        /// Per-probe timeout in milliseconds.
        #[arg(long, default_value_t = 10_000)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            listen,
            config,
            interval,
        } => {
            run_serve(listen, config, interval).await;
        }
        Commands::Check { urls, timeout } => {
            fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
                )
                .init();
            let all_up = run_check(urls, timeout).await;
            if !all_up {
                std::process::exit(1);
            }
        }
    }
}

async fn run_serve(
    listen_override: Option<SocketAddr>,
    config_path: Option<PathBuf>,
    interval_override: Option<u32>,
) {
    let loaded = match config_path {
        Some(ref path) => config::AppConfig::load(path),
        None => config::AppConfig::from_env(),
    };
    let mut app_config = match loaded {
        Ok(c) => {
            init_tracing(&c.server.log_format);
            if let Some(ref path) = config_path {
                tracing::info!(path = %path.display(), "Loaded config file");
            }
            c
        }
        Err(e) => {
            init_tracing("pretty");
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Some(minutes) = interval_override {
        app_config.monitor.check_interval_minutes = minutes;
        if let Err(e) = app_config.validate() {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }

    let listen = listen_override.unwrap_or(app_config.server.listen);
    let monitor_config = app_config.to_monitor_config();

    let store = MemoryStore::new();
    app_config.seed(&store);
    tracing::info!(
        targets = app_config.target.len(),
        groups = app_config.group.len(),
        "Seeded store from config"
    );

    let notifier = TelegramNotifier::from_config(
        Arc::new(store.clone()),
        app_config.telegram_defaults(),
        &monitor_config,
    );
    let checker = Checker::new(
        Arc::new(store.clone()),
        Arc::new(HttpProber::from_config(&monitor_config)),
        Arc::new(notifier),
    )
    .with_sweep_timeout(monitor_config.sweep_timeout);

    let scheduler = Arc::new(Scheduler::new(checker.clone()));
    if let Err(e) = scheduler.start(monitor_config.check_interval_minutes).await {
        tracing::error!(error = %e, "Failed to start scheduler");
        std::process::exit(1);
    }
    tracing::info!(
        interval_minutes = monitor_config.check_interval_minutes,
        "Target monitoring started"
    );

    let state = uptime_api::state::AppState::new(checker, Arc::clone(&scheduler));

    tracing::info!(%listen, "Starting uptime monitor API server");
    if let Err(e) =
        uptime_api::serve_with_state(listen, state, uptime_api::shutdown_signal()).await
    {
        tracing::error!(error = %e, "Server failed");
        scheduler.stop().await;
        std::process::exit(1);
    }

    scheduler.stop().await;
    tracing::info!("Shutdown complete");
}

/// Probes every URL concurrently and prints one line per result. Returns
/// whether all of them were up.
async fn run_check(urls: Vec<String>, timeout_ms: u64) -> bool {
    let timeout = Duration::from_millis(timeout_ms);
    let prober = Arc::new(HttpProber::new(timeout, timeout));

    println!(
        "{} {}",
        style("uptime-monitor").bold(),
        style(env!("CARGO_PKG_VERSION")).dim()
    );
    println!("  {} {}ms", style("timeout:").dim(), timeout_ms);
    println!();

    let spinner = ProgressBar::new_spinner();
    if let Ok(s) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(s);
    }
    spinner.set_message(format!("Checking {} URL(s)...", urls.len()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let mut tasks = JoinSet::new();
    for (idx, url) in urls.iter().enumerate() {
        let prober = Arc::clone(&prober);
        let target = Target::new(idx as i64 + 1, url.clone(), url.clone());
        tasks.spawn(async move { (idx, prober.probe(&target).await) });
    }

    let mut outcomes: Vec<Option<ProbeOutcome>> = vec![None; urls.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, outcome)) => outcomes[idx] = Some(outcome),
            Err(e) => tracing::error!(error = %e, "Probe task failed"),
        }
    }
    spinner.finish_and_clear();

    let mut all_up = true;
    for (url, outcome) in urls.iter().zip(outcomes) {
        let Some(outcome) = outcome else {
            all_up = false;
            println!("  {}  {}", style("FAIL").red().bold(), url);
            continue;
        };
        let latency = outcome
            .latency_ms
            .map(|ms| format!("{}ms", ms))
            .unwrap_or_else(|| "-".into());
        match outcome.status {
            TargetStatus::Up => println!(
                "  {}  {:<48} {}",
                style("UP  ").green().bold(),
                url,
                style(latency).dim()
            ),
            _ => {
                all_up = false;
                println!(
                    "  {}  {:<48} {}  {}",
                    style("DOWN").red().bold(),
                    url,
                    style(latency).dim(),
                    style(outcome.error_message().unwrap_or_default()).red()
                );
            }
        }
    }
    all_up
}

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_format {
        "json" => {
            fmt().with_env_filter(filter).json().init();
        }
        _ => {
            fmt().with_env_filter(filter).init();
        }
    }
}
