use clap::Parser;
use seabattle::{
    Registry, config,
    db::{self, repo::MemoryStore},
    net::http,
    state::registry::Repos,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "seabattle", version, about = "Two-player naval combat game server")]
struct Args {
    /// Read configuration from a TOML file instead of the environment
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep players and games in memory, even when a database is configured
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let args = Args::parse();
    let cfg = Arc::new(match &args.config {
        Some(path) => config::Config::load(path)?,
        None => config::Config::from_env()?,
    });

    let repos = match cfg.database_url.as_deref() {
        Some(url) if !args.memory => {
            let db = Arc::new(db::Db::new(url)?);
            db.init().await?;
            tracing::info!("database ready");
            Repos::postgres(db)
        }
        _ => {
            tracing::warn!("no database configured, players and games are kept in memory only");
            Repos::memory(Arc::new(MemoryStore::new()))
        }
    };

    let registry = Arc::new(Registry::new(repos, cfg.clone()));

    if let Err(e) = http::serve(&cfg.http_addr, registry).await {
        tracing::error!(error = %e, "http server failed");
        return Err(e.into());
    }

    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, prelude::*};

    color_eyre::install().map_err(|e| anyhow::anyhow!("{e}"))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,seabattle=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::uptime()),
        )
        .with(tracing_error::ErrorLayer::default())
        .init();

    Ok(())
}
