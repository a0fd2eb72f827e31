//! Running the HTTP server.

use crate::board::Board;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::create_app;
use std::net::SocketAddr;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tracing::{info, warn};

/// Run a server from `config` until Ctrl-C is pressed.
pub async fn run_with_config_until_ctrl_c(config: Config) -> Result<()> {
    let board = Board::new(config.build_store()?);
    let server = Server::spawn(config.http.bind_addr, board).await?;
    tokio::signal::ctrl_c().await?;
    info!("shutdown");
    server.shutdown().await
}

/// A running board server.
#[derive(Debug)]
pub struct Server {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl Server {
    /// Bind to `bind_addr` and serve `board` in a background task.
    pub async fn spawn(bind_addr: SocketAddr, board: Board) -> Result<Self> {
        let listener = TcpListener::bind(bind_addr).await?;
        let addr = listener.local_addr()?;
        let (shutdown, signal) = oneshot::channel::<()>();
        let app = create_app(board);
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    signal.await.ok();
                })
                .await
        });
        info!("HTTP server listening on {addr}");
        Ok(Self {
            addr,
            shutdown,
            task,
        })
    }

    /// Address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn shutdown(self) -> Result<()> {
        // The receiver is gone only if the server already stopped.
        let _ = self.shutdown.send(());
        match self.task.await {
            Ok(res) => res.map_err(Error::from),
            Err(err) => {
                warn!(?err, "server task panicked");
                Err(Error::Server(err.to_string()))
            }
        }
    }
}
