pub mod api;

use crate::agent::RelayAgent;
use crate::config::settings::ServerConfig;
use crate::error::ConfigError;
use log::{ info, warn };
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct Server {
    config: ServerConfig,
    agent: Arc<RelayAgent>,
}

impl Server {
    pub fn new(config: ServerConfig, agent: Arc<RelayAgent>) -> Self {
        Self { config, agent }
    }

    /// Serves until Ctrl-C.
    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown_signal()).await
    }

    pub async fn bind(&self) -> Result<TcpListener, ConfigError> {
        let addr = self.config.addr();
        TcpListener::bind(&addr).await.map_err(|source| ConfigError::Bind { addr, source })
    }

    pub async fn serve<F>(
        &self,
        listener: TcpListener,
        shutdown: F
    ) -> Result<(), Box<dyn Error + Send + Sync>>
        where F: Future<Output = ()> + Send + 'static
    {
        let local_addr = listener.local_addr()?;
        if !self.agent.has_credential() {
            warn!("No OPENROUTER_API_KEY or OPENAI_API_KEY configured. POST /api/chat will fail.");
        }
        info!("Serving on http://{}  (GET /, GET /api/health, POST /api/chat)", local_addr);

        let app = api::build_router(self.agent.clone(), self.config.static_dir.clone());
        axum::serve(listener, app.into_make_service()).with_graceful_shutdown(shutdown).await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down..."),
        Err(e) => log::error!("Failed to listen for shutdown signal: {}", e),
    }
}
