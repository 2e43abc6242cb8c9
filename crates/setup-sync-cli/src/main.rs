mod commands;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use setup_sync::{ModelCatalog, RemoteSource, SessionHandle, SetupConfig};
use setup_sync_remote::{HttpRemote, HttpRemoteConfig, SnapshotRemote};
use setup_sync_store::LocalStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AppConfig, RemoteConfig};

#[derive(Parser)]
#[command(name = "setup-sync")]
#[command(about = "Populate the local store from the server, one priority tier at a time")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the initial setup sync
    Run {
        /// Continue even if required server modules are not installed
        #[arg(long)]
        skip_module_check: bool,
        /// Account to set up (overrides the config file)
        #[arg(long)]
        account: Option<String>,
    },
    /// Show the last setup outcome and per-model freshness
    Status {
        /// Account to report on (overrides the config file)
        #[arg(long)]
        account: Option<String>,
    },
    /// List the server modules known locally and their state
    Modules,
    /// List the models synchronized in each tier
    Models,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,setup_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("could not determine cache directory")?;
    let dir = base.join("setup-sync");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create cache directory: {}", dir.display()))?;
    Ok(dir)
}

fn db_path() -> Result<PathBuf> {
    Ok(cache_dir()?.join("local.db"))
}

fn build_store(config: &AppConfig) -> Result<Arc<LocalStore>> {
    let path = db_path()?;
    let store = LocalStore::open(&path)
        .with_context(|| format!("failed to open local store: {}", path.display()))?
        .with_registry_model(&config.gate.registry_model);
    Ok(Arc::new(store))
}

fn build_remote(
    config: &AppConfig,
    session: Option<&SessionHandle>,
) -> Result<Arc<dyn RemoteSource>> {
    match &config.remote {
        RemoteConfig::Snapshot { path } => Ok(Arc::new(SnapshotRemote::new(path.clone()))),
        RemoteConfig::Http { url } => {
            let from_session = session.and_then(HttpRemoteConfig::from_session);
            let remote_config = match (url, from_session) {
                (Some(url), from_session) => HttpRemoteConfig {
                    base_url: url.clone(),
                    token: from_session.and_then(|c| c.token),
                },
                (None, Some(from_session)) => from_session,
                (None, None) => anyhow::bail!(
                    "http remote needs a url: set [remote] url or [session] server_url"
                ),
            };
            Ok(Arc::new(HttpRemote::new(remote_config)))
        }
    }
}

fn build_catalog(config: &AppConfig) -> Result<ModelCatalog> {
    config
        .catalog
        .build()
        .context("invalid [catalog] configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let app_config = config::load_config();

    match cli.command {
        Command::Run {
            skip_module_check,
            account,
        } => {
            let session = match app_config.session.session(account.as_deref()) {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::error!(error = %e, "unable to establish session");
                    None
                }
            };

            let store = build_store(&app_config)?;
            let remote = build_remote(&app_config, session.as_ref())?;
            let catalog = build_catalog(&app_config)?;

            let setup = SetupConfig {
                session,
                skip_dependency_check: skip_module_check,
            };
            commands::run::run(store, remote, catalog, setup).await
        }
        Command::Status { account } => {
            let store = build_store(&app_config)?;
            let catalog = build_catalog(&app_config)?;
            let account = account.unwrap_or_else(|| app_config.session.account.clone());
            commands::status::run(&store, &catalog, &account)
        }
        Command::Modules => {
            let store = build_store(&app_config)?;
            commands::modules::run(&store)
        }
        Command::Models => {
            let catalog = build_catalog(&app_config)?;
            commands::models::run(&catalog);
            Ok(())
        }
    }
}
