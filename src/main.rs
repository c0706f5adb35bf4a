//! CAPEX Tracker - Main Server
//!
//! Project classification board, monthly effort timesheet and Slack finance
//! notifications.

use anyhow::{bail, Context, Result};
use capex_tracker::{connect_store, diagnostics, setup, Config};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "capex-tracker")]
#[command(about = "CAPEX/OPEX project tracker server")]
struct Cli {
    /// Path to config.yaml (environment variables override its values)
    #[arg(short, long, global = true, env = "CAPEX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides SERVER_PORT / config.yaml)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create the schema and load sample projects
    Setup {
        /// Print the schema DDL and exit
        #[arg(long)]
        print_sql: bool,

        /// Apply the DDL through the `exec_sql` RPC
        #[arg(long)]
        apply: bool,

        /// Upsert the sample projects
        #[arg(long)]
        seed: bool,
    },

    /// Check store connectivity and print a JSON report
    Diagnose,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,capex_tracker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server_port = port;
            }
            capex_tracker::start_server(config).await
        }
        Commands::Setup {
            print_sql,
            apply,
            seed,
        } => run_setup(&config, print_sql, apply, seed).await,
        Commands::Diagnose => run_diagnose(&config).await,
    }
}

async fn run_setup(config: &Config, print_sql: bool, apply: bool, seed: bool) -> Result<()> {
    if print_sql || !(apply || seed) {
        println!("{}", setup::SCHEMA_SQL);
        return Ok(());
    }

    let Some(store) = connect_store(config)? else {
        bail!("SUPABASE_URL and SUPABASE_ANON_KEY must be set to run setup");
    };

    if apply {
        setup::apply_schema(store.as_ref())
            .await
            .context("Failed to apply schema (is the exec_sql function installed?)")?;
    }
    if seed {
        let rows = setup::seed(store.as_ref())
            .await
            .context("Failed to seed sample projects")?;
        tracing::info!("Setup complete: {} sample projects", rows);
    }
    Ok(())
}

async fn run_diagnose(config: &Config) -> Result<()> {
    let store = connect_store(config)?;
    let report = diagnostics::run(config, store.as_deref()).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.ok() {
        bail!("Store diagnostics failed");
    }
    Ok(())
}
