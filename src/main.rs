use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use project_board::config::AppConfig;

mod cmd;

#[derive(Parser)]
#[command(name = "project-board")]
#[command(version, about = "Project board backend: users, boards and ordered lists")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Dotenv file to read configuration from (defaults to ./.env when present)
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to serve on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Database path (overrides DATABASE_PATH)
        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Skip creating the admin account at startup
        #[arg(long)]
        no_seed: bool,

        /// Enable dev mode (permissive CORS, listen on all interfaces)
        #[arg(long)]
        dev: bool,
    },
    /// Create the database file and run migrations
    InitDb {
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Create the configured admin account if it does not exist
    SeedAdmin {
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    project_board::logging::init_logging(cli.verbose, cli.log_json)?;
    let mut config = AppConfig::load(cli.env_file.as_deref())?;

    match cli.command {
        Commands::Serve {
            port,
            db_path,
            no_seed,
            dev,
        } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(path) = db_path {
                config.database_path = path;
            }
            cmd::cmd_serve(config, !no_seed, dev).await?;
        }
        Commands::InitDb { db_path } => {
            cmd::cmd_init_db(&db_path.unwrap_or(config.database_path))?;
        }
        Commands::SeedAdmin { db_path } => {
            if let Some(path) = db_path {
                config.database_path = path;
            }
            cmd::cmd_seed_admin(&config).await?;
        }
    }

    Ok(())
}
