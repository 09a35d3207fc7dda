use std::future::Future;

use tokio::net::TcpListener;

use arbor_indexer::ServerConfig;

use crate::error::ServerResult;
use crate::router::build_router;
use crate::state::AppState;

/// Query API server.
pub struct ArborServer {
    config: ServerConfig,
    state: AppState,
}

impl ArborServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn serve<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = build_router(self.state);
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!("arbor API listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}
