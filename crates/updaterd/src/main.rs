//! updaterd — the update notification daemon.
//!
//! Loads a release catalog once at startup and answers update checks
//! over HTTP. Clients poll with their version string and receive either
//! an XML manifest naming their next upgrade hop or an empty body.
//!
//! # Usage
//!
//! ```text
//! updaterd serve --config /etc/updaterd/updaterd.toml
//! updaterd check --catalog releases.toml --param 8x0x8x0x1448709225x1448709281xproduction
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use updater_core::{ClientDescriptor, ReleaseCatalog, ServerConfig};
use updater_rollout::{EnginePolicy, FixedClock, UpdateEngine};

#[derive(Parser)]
#[command(name = "updaterd", about = "Update notification daemon", version)]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Serve update checks over HTTP.
    Serve {
        /// Path to updaterd.toml. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides the config file).
        #[arg(long)]
        port: Option<u16>,

        /// Release catalog (overrides the config file).
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Resolve one client version string and print the response.
    Check {
        /// Release catalog to resolve against.
        #[arg(long)]
        catalog: PathBuf,

        /// Path to updaterd.toml for rollout tunables.
        #[arg(long)]
        config: Option<PathBuf>,

        /// The client's `version` parameter, e.g. `8x0x8x0x…xproduction`.
        #[arg(long)]
        param: String,

        /// Evaluate as of this RFC 3339 instant instead of now.
        #[arg(long)]
        now: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Serve {
            config,
            port,
            catalog,
        } => run_serve(config, port, catalog).await,
        Command::Check {
            catalog,
            config,
            param,
            now,
        } => run_check(catalog, config, &param, now.as_deref()),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,updaterd=debug,updater=debug"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ServerConfig> {
    match path {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(ServerConfig::default()),
    }
}

async fn run_serve(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    catalog_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    info!("update server starting");

    let mut config = load_config(config_path.as_ref())?;
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(path) = catalog_path {
        config.catalog.path = path;
    }

    let catalog = ReleaseCatalog::from_file(&config.catalog.path)
        .with_context(|| format!("loading catalog {}", config.catalog.path.display()))?;
    info!(
        path = ?config.catalog.path,
        channels = ?catalog.channels(),
        "release catalog loaded"
    );

    let policy = EnginePolicy::from(&config.rollout);
    info!(
        daily_freshness_days = policy.daily_freshness.num_days(),
        release_url_template = %policy.release_url_template,
        "rollout policy"
    );
    let engine = UpdateEngine::new(policy);

    let router = updater_api::build_router(Arc::new(catalog), engine);
    let ip: IpAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind))?;
    let addr = SocketAddr::from((ip, config.server.port));

    info!(%addr, "HTTP server starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("update server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

fn run_check(
    catalog_path: PathBuf,
    config_path: Option<PathBuf>,
    param: &str,
    now: Option<&str>,
) -> anyhow::Result<()> {
    let config = load_config(config_path.as_ref())?;
    let catalog = ReleaseCatalog::from_file(&catalog_path)
        .with_context(|| format!("loading catalog {}", catalog_path.display()))?;

    let mut engine = UpdateEngine::new(EnginePolicy::from(&config.rollout));
    if let Some(now) = now {
        let now: DateTime<Utc> = DateTime::parse_from_rfc3339(now)
            .with_context(|| format!("invalid --now {now}"))?
            .with_timezone(&Utc);
        engine = engine.with_clock(Arc::new(FixedClock(now)));
    }

    let descriptor = ClientDescriptor::from_version_param(param);
    let body = engine.decide(&descriptor, &catalog).render();
    if body.is_empty() {
        eprintln!("no update");
    } else {
        print!("{body}");
    }
    Ok(())
}
