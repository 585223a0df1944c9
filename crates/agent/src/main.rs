use anyhow::Context;
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use keeper_agent::shutdown::Shutdown;
use keeper_agent::stages::Services;
use keeper_agent::terminal::Terminal;
use keeper_agent::{AgentConfig, App};
use keeper_client_sdk::{Codec, HttpVaultApi, KeyStore, TransferLimits};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AgentConfig::parse();

    // The screen belongs to the UI, so logs go to a file.
    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("failed to open log file {}", config.log_file.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_writer(Mutex::new(log))
        .with_ansi(false)
        .init();

    println!("keeper-agent {}", env!("CARGO_PKG_VERSION"));
    info!(version = env!("CARGO_PKG_VERSION"), server = %config.server, "Starting keeper agent");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;
    let result = runtime.block_on(run(config));
    // After a signal, a key read can still be blocked on stdin.
    runtime.shutdown_timeout(Duration::from_millis(100));

    info!("Keeper agent stopped");
    result
}

async fn run(config: AgentConfig) -> anyhow::Result<()> {
    let api = HttpVaultApi::new(config.http())?;
    info!(base_url = api.base_url(), "Gateway client ready");
    let services = Services {
        api: Arc::new(api),
        codec: Codec::new(KeyStore::new(&config.key_dir)),
        limits: TransferLimits::default(),
        download_dir: config.download_dir.clone(),
    };

    let mut shutdown = Shutdown::install().context("failed to install signal handlers")?;
    let mut app = App::new(services);
    let mut terminal = Terminal::enter().context("failed to set up terminal")?;
    while app.is_running() {
        terminal.draw(&app.render())?;
        tokio::select! {
            key = terminal.next_key() => {
                if let Some(key) = key? {
                    app.handle_key(key).await;
                }
            }
            signal = shutdown.recv() => {
                info!(signal, "Termination signal received, closing");
                break;
            }
        }
    }
    drop(terminal);
    Ok(())
}
