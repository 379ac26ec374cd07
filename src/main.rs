use std::io::BufRead;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use vetagenda::auth::credential::CredentialManager;
use vetagenda::{AuthenticationService, Config, Database, SchedulingService};

/// Veterinary clinic agenda
#[derive(Debug, Parser)]
#[command(name = "vetagenda", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Subcommand to execute; without one the agenda starts up and reports
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a credential hash for a password (read from stdin when omitted)
    Hash {
        /// Plaintext password
        password: Option<String>,
    },
    /// Print the status of every room as JSON
    Status {
        /// RFC 3339 instant; defaults to now
        instant: Option<String>,
    },
}

fn load_config(path: &str) -> Config {
    match Config::load_with_env(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    }
}

/// Read one password line from stdin, without its line ending.
fn read_password() -> std::io::Result<String> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Print a freshly derived hash for seeding user rows.
fn print_hash(config: &Config, password: Option<&str>) -> std::process::ExitCode {
    let password = match password {
        Some(password) => password.to_string(),
        None => match read_password() {
            Ok(password) => password,
            Err(e) => {
                eprintln!("Failed to read password: {e}");
                return std::process::ExitCode::FAILURE;
            }
        },
    };

    let manager = CredentialManager::new(config.auth.allow_legacy_hashes);
    match manager.derive(&password, config.auth.pbkdf2_iterations) {
        Ok(hash) => {
            println!("{hash}");
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to derive hash: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}

/// Print the status of every room at `instant` (now by default) as JSON.
async fn print_status(config: &Config, instant: Option<&str>) -> std::process::ExitCode {
    let instant = match instant.map(DateTime::parse_from_rfc3339) {
        None => Utc::now(),
        Some(Ok(parsed)) => parsed.with_timezone(&Utc),
        Some(Err(e)) => {
            eprintln!("Invalid instant (expected RFC 3339): {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    let report = SchedulingService::new(db.clone())
        .availability_at(instant)
        .await;
    db.close().await;

    match report.map(|r| serde_json::to_string_pretty(&r)) {
        Ok(Ok(json)) => {
            println!("{json}");
            std::process::ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            eprintln!("Failed to encode report: {e}");
            std::process::ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Failed to resolve availability: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let config = load_config(&cli.config);

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        return std::process::ExitCode::FAILURE;
    }

    match &cli.command {
        Some(Command::Hash { password }) => return print_hash(&config, password.as_deref()),
        Some(Command::Status { instant }) => {
            return print_status(&config, instant.as_deref()).await
        }
        None => {}
    }

    // Initialize logging
    if let Err(e) = vetagenda::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        vetagenda::logging::init_console_only(&config.logging.level);
    }

    info!("vetagenda - veterinary clinic scheduling");

    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    let auth = AuthenticationService::new(db.clone(), config.auth.clone());
    match auth.purge_expired_tokens().await {
        Ok(count) => info!("Purged {count} expired recovery token(s)"),
        Err(e) => warn!("Failed to purge recovery tokens: {e}"),
    }

    let scheduling = SchedulingService::new(db.clone());
    match (auth.list_active_users().await, scheduling.list_rooms(false).await) {
        (Ok(users), Ok(rooms)) => {
            let active_rooms = rooms.iter().filter(|r| r.active).count();
            info!(
                "{} active user(s), {} room(s) ({} active)",
                users.len(),
                rooms.len(),
                active_rooms
            );
        }
        (Err(e), _) => warn!("Failed to list users: {e}"),
        (_, Err(e)) => warn!("Failed to list rooms: {e}"),
    }

    if !config.auth.allow_legacy_hashes {
        info!("Legacy SHA-256 credentials are disabled");
    }

    db.close().await;
    std::process::ExitCode::SUCCESS
}
