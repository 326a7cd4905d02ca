//! API server lifecycle — binds the listener and serves the router until
//! shutdown. Pattern: bind → log the address → serve with graceful shutdown
//! on ctrl-c.

use std::net::SocketAddr;

use thiserror::Error;

use crate::api::router::api_router;
use crate::api::types::ApiContext;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Serve the API until ctrl-c.
pub async fn serve(ctx: ApiContext, addr: SocketAddr) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    let local_addr = listener.local_addr()?;
    tracing::info!(%local_addr, "API server listening");

    let app = api_router(ctx);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install ctrl-c handler");
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::analysis::PrescriptionAnalyzer;
    use crate::db::sqlite::open_memory_database;
    use crate::druginfo::MockDrugInfoClient;
    use crate::vision::MockVisionClient;

    fn test_ctx() -> ApiContext {
        let conn = open_memory_database().unwrap();
        let analyzer = PrescriptionAnalyzer::new(
            Arc::new(MockVisionClient::with_reply("{}")),
            Arc::new(MockDrugInfoClient::empty()),
        );
        ApiContext::new(conn, Arc::new(analyzer))
    }

    #[tokio::test]
    async fn server_binds_and_answers_health() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = api_router(test_ctx());

        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let body = reqwest::get(format!("http://{addr}/api/health"))
            .await
            .unwrap()
            .json::<serde_json::Value>()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");

        server.abort();
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        // Bind once, then try the same port again
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let result = serve(test_ctx(), addr).await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }
}
