//! HTTP endpoint serving the latest published snapshot.
//!
//! `GET /metrics` reads the channel on every request; the server itself keeps
//! no state between requests.

pub mod config;
pub mod handlers;
pub mod router;

// Re-export commonly used items
pub use config::WebConfig;
pub use handlers::AppState;
pub use router::create_app;

use crate::error::{PulseError, Result};
use std::future::Future;
use std::net::SocketAddr;
use tracing::info;

/// Start the web server and run it until `shutdown` resolves.
pub async fn start_web_server<F>(config: WebConfig, channel: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_app(&config, channel.clone());

    // Parse the bind address
    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| PulseError::config_error(format!("Invalid bind address: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PulseError::web_server_error(format!("Failed to bind to address: {}", e)))?;

    info!("Serving snapshots from {}", channel.describe());
    info!("Metrics endpoint: http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| PulseError::web_server_error(format!("Server error: {}", e)))?;

    info!("Web server stopped");
    Ok(())
}
