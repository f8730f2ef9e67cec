use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use carrier_client::api::backend::Backend;
use carrier_client::api::client::ApiClient;
use carrier_client::app::{self, AppConfig};
use carrier_client::utils::RUNTIME;
use carrier_client::{ClientError, Result};

#[derive(Parser)]
#[command(name = "carrier")]
#[command(about = "Terminal client for the Carrier messenger", long_about = None)]
struct Cli {
    /// Backend base URL, overriding the config file
    #[arg(long)]
    server: Option<String>,

    /// Path to the TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the session database
    #[arg(long)]
    session_db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend answers
    Ping,
    /// Forget the stored session
    Logout,
    /// Write the effective settings to the config file
    Init,
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(server) = cli.server {
        config.base_url = server;
    }
    if let Some(path) = cli.session_db {
        config.session_db = Some(path);
    }

    if let Some(Commands::Init) = cli.command {
        let path = cli
            .config
            .or_else(AppConfig::default_path)
            .ok_or_else(|| ClientError::Config("no config directory".into()))?;
        config.save(&path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let store = config.session_store()?;
    let backend: Arc<dyn Backend> = Arc::new(ApiClient::new(&config)?);

    match cli.command {
        Some(Commands::Ping) => {
            let reply = backend.ping().await?;
            println!("{} is up: {}", config.base_url, reply);
            Ok(())
        }
        Some(Commands::Logout) => {
            carrier_client::auth::logout(backend.as_ref(), &store)?;
            println!("Logged out.");
            Ok(())
        }
        Some(Commands::Init) | None => app::run(config, store, backend).await,
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match RUNTIME.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{:?}", err);
            eprintln!("carrier: {}", user_facing(&err));
            ExitCode::FAILURE
        }
    }
}

fn user_facing(err: &ClientError) -> String {
    match err {
        ClientError::Config(_) | ClientError::Storage(_) => err.to_string(),
        other => other.user_message(),
    }
}
