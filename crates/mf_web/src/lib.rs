use axum::{routing::get, Router};
use mf_core::{Result, ShutdownSignal};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub mod handlers;

/// Upper bound on waiting for in-flight requests once shutdown starts.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub fn create_app() -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
}

pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    Ok(TcpListener::bind(addr).await?)
}

/// Serve the API until `shutdown` fires, then stop accepting connections
/// and give in-flight requests at most [`DRAIN_TIMEOUT`] to finish.
pub async fn serve(listener: TcpListener, shutdown: ShutdownSignal) -> Result<()> {
    let addr = listener.local_addr()?;
    info!("Starting API server on {}", addr);

    let mut stop = shutdown.clone();
    let server = axum::serve(listener, create_app())
        .with_graceful_shutdown(async move { stop.cancelled().await })
        .into_future();

    let mut drain = shutdown;
    let deadline = async move {
        drain.cancelled().await;
        tokio::time::sleep(DRAIN_TIMEOUT).await;
    };

    tokio::select! {
        result = server => result?,
        _ = deadline => warn!(
            "API server did not drain within {}s, closing remaining connections",
            DRAIN_TIMEOUT.as_secs()
        ),
    }

    info!("API server on {} stopped", addr);
    Ok(())
}

pub mod prelude {
    pub use super::{bind, create_app, serve, DRAIN_TIMEOUT};
    pub use mf_core::{Error, Result};
}
