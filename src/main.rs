use anyhow::Context;
use clap::{Parser, Subcommand};
use parks_backoffice::config::Config;
use parks_backoffice::db::DatabaseManager;
use parks_backoffice::server::{self, AppState};
use parks_backoffice::{logging, metrics, storage};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "parks_backoffice")]
#[command(about = "Back-office API for municipal parks")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply pending database migrations and exit
    Migrate,
    /// Assign a park's area-less trees to areas by outline or code prefix
    LinkAreas {
        /// Park id
        #[arg(long)]
        park: i64,
    },
}

async fn open_database(config: &Config) -> anyhow::Result<DatabaseManager> {
    let db = DatabaseManager::open(&config.database.path).with_context(|| {
        format!(
            "Failed to open database at {}",
            config.database.path.display()
        )
    })?;
    db.run_migrations()
        .await
        .context("Failed to apply migrations")?;
    Ok(db)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    logging::init_logging(&config.logging);

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Err(e) = metrics::init() {
                warn!("Metrics disabled: {}", e);
            }
            let db = open_database(&config).await?;
            let state = AppState::new(db, config.codes);
            server::start_server(state, &config.server).await?;
        }
        Commands::Migrate => {
            open_database(&config).await?;
            info!("Database at {} is up to date", config.database.path.display());
        }
        Commands::LinkAreas { park } => {
            let db = open_database(&config).await?;
            let summary = db
                .call(move |conn| storage::trees::link_areas(conn, park))
                .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
