use anyhow::Context;
use api_client::ShiftApiClient;
use clap::{Parser, Subcommand};
use configuration::Settings;

/// The main entry point for the Shiftboard scheduling backend.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let settings = configuration::load_settings().context("Failed to load settings")?;
    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = configuration::init_tracing(settings.log_dir.as_deref())?;

    // Execute the appropriate command
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => web_server::run_server(&settings).await,
        Commands::InitDb => handle_init_db(&settings).await,
        Commands::Check(args) => handle_check(args).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A REST backend for shift scheduling.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Defaults to `serve` when omitted.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server.
    Serve,
    /// Create the schema and seed the default roster and configuration, then exit.
    InitDb,
    /// Query the health endpoint of a running server.
    Check(CheckArgs),
}

#[derive(Parser)]
struct CheckArgs {
    /// Base URL of the server (e.g., "http://localhost:3001").
    #[arg(long, default_value = "http://localhost:3001")]
    url: String,
}

// ==============================================================================
// Command Handlers
// ==============================================================================

async fn handle_init_db(settings: &Settings) -> anyhow::Result<()> {
    let pool = database::connect(settings)?;
    database::initialize_database(&pool)
        .await
        .context("Database initialization failed")?;
    pool.close().await;
    println!("Database initialized.");
    Ok(())
}

async fn handle_check(args: CheckArgs) -> anyhow::Result<()> {
    let client = ShiftApiClient::new(&args.url)?;
    let health = client
        .health_check()
        .await
        .with_context(|| format!("Server at {} is not reachable", args.url))?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "status": health.status,
            "timestamp": health.timestamp,
            "database": health.database,
            "environment": health.environment,
        }))?
    );

    if !health.database_connected() {
        anyhow::bail!("Server is up but the database is not available");
    }
    Ok(())
}
