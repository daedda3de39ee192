//! Fintrack CLI - Fio transaction ingestion server and runner

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fintrack_core::Config;

mod commands;
mod output;
mod server;

/// Fintrack - ingest Fio bank transactions into blob storage
#[derive(Parser)]
#[command(name = "fintrack", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP trigger (GET / and GET /health)
    Serve {
        /// Address to listen on (overrides HOST)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one ingestion for all configured accounts
    Run {
        /// First day of the period (YYYY-MM-DD)
        #[arg(long, requires = "end_date")]
        start_date: Option<String>,
        /// Last day of the period (YYYY-MM-DD)
        #[arg(long, requires = "start_date")]
        end_date: Option<String>,
        /// Fetch but keep payloads in memory instead of uploading
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Default filter; `debug` raises our crates to debug level
fn default_filter(debug: bool) -> String {
    let level = if debug { "debug" } else { "info" };
    format!("fintrack_core={level},fintrack={level},tower_http=info")
}

fn init_tracing(debug: bool) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(debug).into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let (config, warnings) = Config::load()?;
    init_tracing(config.debug);
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }
    let config = Arc::new(config);

    match cli.command {
        Commands::Serve { host, port } => {
            commands::serve::run(config, host, port).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run {
            start_date,
            end_date,
            dry_run,
            json,
        } => commands::run::run(config, start_date, end_date, dry_run, json).await,
        Commands::Config { json } => {
            commands::config::run(&config, &warnings, json)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
