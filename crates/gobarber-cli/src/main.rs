//! GoBarber CLI - book barber appointments from the terminal.
//!
//! Each command restores the saved session first, then acts like the
//! matching screen of the mobile app: sign-in, sign-up, dashboard,
//! appointment booking and profile.

mod app;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gobarber_core::config::API_URL_ENV;
use gobarber_core::{ApiError, Config, SessionError};

use app::App;

// ============================================================================
// Constants
// ============================================================================

/// Directory for a daily rolling log file, in addition to stderr
const LOG_DIR_ENV: &str = "GOBARBER_LOG_DIR";

/// Log file name prefix inside `GOBARBER_LOG_DIR`
const LOG_FILE_PREFIX: &str = "gobarber.log";

#[derive(Debug, Parser)]
#[command(name = "gobarber", version, about = "Book GoBarber appointments from the terminal")]
struct Cli {
    /// API location, overrides the config file and GOBARBER_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and remember the session on this device
    Login {
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Forget the saved session
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Print the user record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Change name, email or password
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Prompt for the current and a new password
        #[arg(long)]
        change_password: bool,
    },
    /// Upload a JPEG avatar
    Avatar { path: PathBuf },
    /// List providers
    Providers,
    /// Show a provider's free hours for a day
    Availability {
        provider: String,
        /// Day to check (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Book an appointment
    Book {
        provider: String,
        /// Hour of the day (0-23)
        #[arg(long)]
        hour: u32,
        /// Day to book (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show where the session is stored and which screens apply
    Status,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

/// Print a user-facing message for a failed command
fn report(err: &anyhow::Error) {
    error!(error = ?err, "Command failed");

    if let Some(session_err) = err.downcast_ref::<SessionError>() {
        eprintln!("Error: {}", session_err.user_message());
    } else if let Some(api_err) = err.downcast_ref::<ApiError>() {
        eprintln!("Error: {}", api_err.user_message());
    } else {
        eprintln!("Error: {:#}", err);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing();
    info!("GoBarber CLI starting");

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            report(&e);
            return ExitCode::FAILURE;
        }
    };
    let config = config
        .with_api_url_override(std::env::var(API_URL_ENV).ok())
        .with_api_url_override(cli.api_url);

    let result = match App::start(config).await {
        Ok(mut app) => app.run(cli.command).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}
