//! `moneyboard`: a live terminal dashboard for a shared expenses collection.
//!
//! Built on [ratatui](https://ratatui.rs) with state from
//! `moneyboard-core`'s [`Dashboard`](moneyboard_core::Dashboard). The
//! dashboard signs in (custom token or anonymous), subscribes to
//! `/artifacts/{appId}/public/data/expenses`, and the data bridge forwards
//! every published view into the TUI action loop.
//!
//! Logs are written to a file (default `/tmp/moneyboard.log`) to avoid
//! corrupting the terminal UI.
//!
//! Entry point: CLI argument parsing, tracing setup, panic hooks, and app launch.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use moneyboard_core::{Dashboard, FirebaseBackend};

use crate::app::App;

/// Terminal dashboard for a live shared-expenses collection.
#[derive(Parser, Debug)]
#[command(name = "moneyboard", version, about)]
struct Cli {
    /// Config profile to use (defaults to `default_profile`)
    #[arg(short = 'p', long, env = "MONEYBOARD_PROFILE")]
    profile: Option<String>,

    /// Application id scoping the expenses collection
    #[arg(short = 'a', long)]
    app_id: Option<String>,

    /// Log file path (defaults to /tmp/moneyboard.log)
    #[arg(long, default_value = "/tmp/moneyboard.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. Logging to stdout/stderr would corrupt the
/// TUI output. The returned guard must be held for the lifetime of the
/// application so logs are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "moneyboard={log_level},moneyboard_core={log_level},moneyboard_api={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("moneyboard.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Resolve the profile into a [`Dashboard`] over the Firebase backend.
fn build_dashboard(cli: &Cli) -> Result<Dashboard> {
    let (profile, mut config) = moneyboard_config::load_dashboard_config(cli.profile.as_deref())?;
    if let Some(ref app_id) = cli.app_id {
        config.application_id.clone_from(app_id);
    }

    info!(
        profile = %profile,
        app_id = %config.application_id,
        has_provider = config.provider.is_some(),
        has_token = config.auth_token().is_some(),
        "dashboard configured"
    );

    let backend = Arc::new(FirebaseBackend::from_config(&config));
    Ok(Dashboard::new(backend, config))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);
    info!("starting moneyboard");

    let dashboard = build_dashboard(&cli)?;
    let mut app = App::new(dashboard);
    app.run().await?;

    Ok(())
}
