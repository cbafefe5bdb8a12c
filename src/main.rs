//! larkd - Lark IRC Daemon
//!
//! Binary entry point: argument handling, logging setup, and shutdown
//! signal wiring around [`larkd::Server`].

use anyhow::{Context as _, bail};
use tokio::signal;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use larkd::config::Config;
use larkd::server::Server;

const USAGE: &str = "usage: larkd <port> <password> [--config <path>]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(port_arg) = args.next() else {
        bail!(USAGE);
    };
    let Some(password) = args.next() else {
        bail!(USAGE);
    };
    let port: u16 = port_arg
        .parse()
        .with_context(|| format!("invalid port: {port_arg}"))?;
    if port == 0 {
        bail!("invalid port: 0");
    }

    let mut config = match (args.next(), args.next()) {
        (Some(flag), Some(path)) if flag == "--config" => {
            Config::load(&path).with_context(|| format!("failed to load config {path}"))?
        }
        (None, None) => Config::default(),
        _ => bail!(USAGE),
    };
    config.listen.address.set_port(port);

    let server = Server::bind(config, password).await?;
    info!(addr = %server.local_addr()?, version = env!("CARGO_PKG_VERSION"), "larkd listening");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    server.run(shutdown_rx).await;
    Ok(())
}
