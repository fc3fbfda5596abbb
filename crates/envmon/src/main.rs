//! envmon - environmental-monitoring administration CLI
//!
//! Main entry point for the envmon CLI.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use console::Style;
use envmon_client::{EnvmonClient, FileSessionStorage, SessionEvent, SessionStore};

mod commands;

use commands::{alerts, auth, readings, reports, resources};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// envmon - manage zones, stations, sensors, readings and alerts
#[derive(Parser)]
#[command(name = "envmon")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// API root URL (default: http://localhost:8000/api/)
    #[arg(long, global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session
    Login(auth::LoginArgs),

    /// Discard the stored session
    Logout,

    /// Show the local session state
    Status,

    /// Show the authenticated user
    Whoami,

    /// Zone management
    Zones(resources::ZonesArgs),

    /// Station management
    Stations(resources::StationsArgs),

    /// Sensor management
    Sensors(resources::SensorsArgs),

    /// Readings and sensor reports
    Readings(readings::ReadingsArgs),

    /// Alert management
    Alerts(alerts::AlertsArgs),

    /// Report management
    Reports(reports::ReportsArgs),

    /// User management
    Users(resources::UsersArgs),

    /// Role management
    Roles(resources::RolesArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing - console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "envmon=debug,envmon_client=debug,envmon_config=debug,info"
    } else {
        "envmon=warn,envmon_client=warn,envmon_config=warn"
    };

    let log_dir = envmon_config::xdg_data_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "envmon.log");
    let (non_blocking, log_guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "envmon=trace,envmon_client=trace,envmon_config=trace,info",
                )),
        )
        .init();

    let mut config = envmon_config::load_config().context("Failed to load configuration")?;
    if let Some(server) = cli.server {
        config.server.url = server;
    }

    let session_file = config.session_file();
    tracing::debug!("Using session file {}", session_file.display());
    let session = Arc::new(SessionStore::open(Arc::new(FileSessionStorage::with_path(
        session_file,
    ))));

    let client = EnvmonClient::builder()
        .base_url(config.server.url.clone())
        .timeout(config.timeout())
        .session(session)
        .build()
        .context("Failed to create API client")?;

    let mut events = client.subscribe();
    let ctx = commands::Context {
        client,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    // Dispatch to command handlers
    let result = match cli.command {
        Commands::Login(args) => auth::login(args, &ctx).await,
        Commands::Logout => auth::logout(&ctx),
        Commands::Status => auth::status(&ctx),
        Commands::Whoami => auth::whoami(&ctx).await,
        Commands::Zones(args) => resources::zones(args, &ctx).await,
        Commands::Stations(args) => resources::stations(args, &ctx).await,
        Commands::Sensors(args) => resources::sensors(args, &ctx).await,
        Commands::Readings(args) => readings::run(args, &ctx).await,
        Commands::Alerts(args) => alerts::run(args, &ctx).await,
        Commands::Reports(args) => reports::run(args, &ctx).await,
        Commands::Users(args) => resources::users(args, &ctx).await,
        Commands::Roles(args) => resources::roles(args, &ctx).await,
    };

    // A forced logout is reported once here instead of by each command.
    while let Ok(event) = events.try_recv() {
        if event == SessionEvent::Expired {
            let yellow = Style::new().yellow();
            eprintln!(
                "{} Your session has expired. Run `envmon login` to sign in again.",
                yellow.apply_to("!")
            );
            drop(log_guard);
            std::process::exit(2);
        }
    }

    drop(log_guard);
    result
}
