//! HTTP entrypoint with graceful shutdown.

use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api;
use crate::core::ServerState;

pub struct Server {
    state: ServerState,
}

impl Server {
    pub fn new(state: ServerState) -> Self {
        Self { state }
    }

    /// Serve until ctrl-c or hub shutdown.
    pub async fn run(self) -> anyhow::Result<()> {
        let shutdown_token = self.state.hub.shutdown_token().clone();
        let port = self.state.config.http_port;

        let app = api::router()
            .with_state(self.state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CorsLayer::permissive()),
            );

        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
        info!(port, "Order server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("Ctrl-C received, shutting down");
                    }
                    _ = shutdown_token.cancelled() => {
                        info!("Shutdown requested");
                    }
                }
            })
            .await?;

        Ok(())
    }
}
