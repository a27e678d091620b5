//! HTTP server lifecycle: bind, serve until the shutdown future
//! resolves, then drain in-flight requests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::router::api_router;
use crate::core_state::CoreState;

/// Serve the intake API on `addr` until `shutdown` resolves.
pub async fn serve<F>(core: Arc<CoreState>, addr: SocketAddr, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, "HTTP intake server started");

    axum::serve(listener, api_router(core))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("HTTP intake server stopped");
    Ok(())
}
