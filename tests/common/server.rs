//! Test server management.
//!
//! Spawns larkd in-process on an ephemeral port; each test gets its own
//! isolated server and state.

use std::net::SocketAddr;

use larkd::{Config, Server};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// The shared password every test server uses.
pub const PASSWORD: &str = "secret";

/// A running test server.
pub struct TestServer {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Bind on 127.0.0.1:0 and run the control loop in a background task.
    pub async fn spawn() -> anyhow::Result<Self> {
        let mut config = Config::default();
        config.server.name = "test.server".to_string();
        config.listen.address = SocketAddr::from(([127, 0, 0, 1], 0));

        let server = Server::bind(config, PASSWORD).await?;
        let addr = server.local_addr()?;
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(server.run(shutdown_rx));

        Ok(Self {
            addr,
            shutdown,
            handle: Some(handle),
        })
    }

    /// The address clients should connect to.
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    /// Request shutdown and wait for the control loop to finish its
    /// current iteration and exit.
    #[allow(dead_code)]
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}
