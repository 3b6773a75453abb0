use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{info, warn};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use balance_checker::client;
use balance_checker::ipc::{AccountServer, ServerConnection};
use balance_checker::storage::FileLedger;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::{ClientConfig, Config};

/// Where log lines go.
enum LogTarget {
    Stderr,
    File,
}

fn setup_logging(target: LogTarget, filter: &str) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter));

    match target {
        LogTarget::Stderr => {
            builder.target(env_logger::Target::Stderr).init();
            info!("Logging initialized to stderr");
        }
        LogTarget::File => {
            // Create log directory
            let log_dir = dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("balance-checker")
                .join("logs");

            fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

            let log_file = log_dir.join("balance-checker.log");
            let file = Box::new(
                fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&log_file)
                    .context("Failed to open log file")?,
            );

            builder.target(env_logger::Target::Pipe(file)).init();
            info!("Logging initialized, writing to: {}", log_file.display());
        }
    }
    Ok(())
}

/// Pick host and port for the client, falling back to configured defaults.
fn resolve_target(host: Option<&str>, port: Option<&str>, defaults: &ClientConfig) -> (String, u16) {
    let (Some(host), Some(port)) = (host, port) else {
        eprintln!(
            "{}",
            format!(
                "Arguments missing. Using default values ({} {})\nUsage example:\nbalance-checker connect <host> <port> - connect to <host> on <port>.",
                defaults.host, defaults.port
            )
            .yellow()
        );
        return (defaults.host.clone(), defaults.port);
    };

    match port.parse() {
        Ok(port) => (host.to_string(), port),
        Err(_) => {
            eprintln!("{}", "Wrong port number. Default port used".yellow());
            warn!("Unparsable port {:?}, using {}", port, defaults.port);
            (host.to_string(), defaults.port)
        }
    }
}

async fn handle_serve_command(port: Option<u16>, users_dir: Option<&PathBuf>, config: &Config) -> Result<()> {
    let port = port.unwrap_or(config.server.port);
    let users_dir = users_dir.unwrap_or(&config.storage.users_dir);

    let ledger = FileLedger::open(users_dir)
        .with_context(|| format!("Failed to open users directory {}", users_dir.display()))?;
    info!("Serving ledgers from {}", users_dir.display());

    let server = AccountServer::bind((config.server.bind_address.as_str(), port), Arc::new(ledger))
        .await
        .context("Failed to start server")?;
    println!("{} {}", "Listening on".green(), server.local_addr()?);

    server
        .serve_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    println!("{}", "Server stopped".cyan());
    Ok(())
}

async fn handle_connect_command(host: Option<&str>, port: Option<&str>, config: &Config) -> Result<()> {
    let (host, port) = resolve_target(host, port, &config.client);
    info!("Connecting to {}:{}", host, port);

    let conn = match ServerConnection::connect(&host, port).await {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            return Ok(());
        }
    };

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    client::run(conn, input, &mut out).await.context("Client session failed")?;
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        eprintln!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Serve { port, users_dir } => handle_serve_command(*port, users_dir.as_ref(), config).await,
        Commands::Connect { host, port } => handle_connect_command(host.as_deref(), port.as_deref(), config).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Server logs to the console, the interactive client to a file
    let target = match cli.command {
        Commands::Serve { .. } => LogTarget::Stderr,
        Commands::Connect { .. } => LogTarget::File,
    };
    let filter = if cli.is_verbose() { "debug" } else { config.log_filter() };
    setup_logging(target, filter).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_target_explicit() {
        let defaults = ClientConfig::default();
        assert_eq!(
            resolve_target(Some("bank.local"), Some("7000"), &defaults),
            ("bank.local".to_string(), 7000)
        );
    }

    #[test]
    fn test_resolve_target_missing_arguments() {
        let defaults = ClientConfig::default();
        assert_eq!(resolve_target(Some("bank.local"), None, &defaults), ("localhost".to_string(), 6969));
        assert_eq!(resolve_target(None, None, &defaults), ("localhost".to_string(), 6969));
    }

    #[test]
    fn test_resolve_target_bad_port_keeps_host() {
        let defaults = ClientConfig::default();
        assert_eq!(
            resolve_target(Some("bank.local"), Some("sixty"), &defaults),
            ("bank.local".to_string(), 6969)
        );
        assert_eq!(
            resolve_target(Some("bank.local"), Some("70000"), &defaults),
            ("bank.local".to_string(), 6969)
        );
    }
}
