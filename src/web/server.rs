//! HTTP server for the bridge.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::ServerConfig;

use super::handlers::AppState;
use super::router::create_router;

/// How long [`ServerHandle::stop`] waits for in-flight requests.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// HTTP server exposing the chat log and the send queue.
pub struct BridgeServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Origins granted cross-origin access.
    cors_origins: Vec<String>,
}

impl BridgeServer {
    /// Create a new server from configuration.
    pub fn new(config: &ServerConfig, app_state: Arc<AppState>) -> Self {
        Self {
            addr: config.bind_addr(),
            app_state,
            cors_origins: config.cors_origins.clone(),
        }
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Bind the listener and serve in the background.
    ///
    /// Must be called inside a tokio runtime. Returns once the socket is
    /// bound; this is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<ServerHandle, std::io::Error> {
        let router = create_router(self.app_state, &self.cors_origins);

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Bridge server listening on http://{}", local_addr);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_rx.map(|_| ()))
                .await;
            match result {
                Ok(()) => tracing::debug!("Server closed."),
                Err(e) => tracing::error!("Bridge server error: {}", e),
            }
        });

        Ok(ServerHandle {
            local_addr,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }
}

/// A running server.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Whether the serve task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop accepting connections and wait briefly for in-flight requests.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let Some(task) = self.task.take() else {
            return;
        };
        match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Server task failed: {}", e),
            Err(_) => tracing::warn!(
                "Server did not stop within {:?}; abandoning open connections",
                SHUTDOWN_GRACE
            ),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}
