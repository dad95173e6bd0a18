mod collectors;
mod config;
mod models;
mod report;
mod server;
mod util;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use collectors::remote::SshCollector;
use config::Config;
use server::AppState;
use util::slack::{Notifier, SlackClient};

#[derive(Parser, Debug)]
#[command(name = "dfdash", about = "remote disk-usage dashboard backend", version = "0.1")]
struct Cli {
    /// Listen address (overrides the config file)
    #[arg(short, long, env = "DFDASH_LISTEN")]
    listen: Option<String>,

    /// Directory for exported PNG/CSV artifacts (overrides the config file)
    #[arg(long, env = "DFDASH_EXPORT_DIR")]
    export_dir: Option<PathBuf>,

    /// Print config file path and current values, then exit
    #[arg(long)]
    config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.config {
        return run_print_config();
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "dfdash=info".parse().unwrap()),
        )
        .init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(serve(cli))
}

async fn serve(cli: Cli) -> Result<()> {
    let cfg = Config::load();
    let listen = cli.listen.unwrap_or_else(|| cfg.server.listen.clone());
    let export_dir = cli.export_dir.unwrap_or_else(|| cfg.export_dir());

    let notifier: Option<Arc<dyn Notifier>> = if cfg.slack_enabled() {
        Some(Arc::new(SlackClient::new(
            &cfg.slack.api_base,
            &cfg.slack.token,
            &cfg.slack.channel,
        )))
    } else {
        info!("slack uploads disabled (no token/channel in config)");
        None
    };

    let state = Arc::new(AppState {
        source: Arc::new(SshCollector),
        notifier,
        export_dir,
    });

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    info!(%listen, "dfdash listening");
    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}

fn run_print_config() -> Result<()> {
    let cfg = Config::load();
    let path = Config::config_path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "(unknown)".to_string());
    println!("Config: {}", path);
    println!("");
    println!("[server]");
    println!("  listen = {}", cfg.server.listen);
    println!("");
    println!("[export]");
    println!("  dir = {}", cfg.export_dir().display());
    println!("");
    println!("[slack]");
    println!("  api_base = {}", cfg.slack.api_base);
    let token = if cfg.slack.token.is_empty() { "(not set)" } else { "(configured)" };
    println!("  token    = {}", token);
    let channel = if cfg.slack.channel.is_empty() { "(not set)" } else { cfg.slack.channel.as_str() };
    println!("  channel  = {}", channel);
    Ok(())
}
