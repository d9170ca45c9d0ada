//! consolepanel-server: HTTP orchestration server for ConsolePanel
//!
//! A stateless router over [`consolepanel_core::tools::ToolAdapter`]. Each
//! request is validated, mapped to exactly one tool invocation, and the
//! outcome translated into a response. Logical failures reported by a tool
//! (`ok: false`) are successful exchanges; only validation failures (400) and
//! tool faults (500) are errors.

pub mod errors;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use consolepanel_core::config::PanelConfig;
use consolepanel_core::events;
use consolepanel_core::process::ProcessRunner;
use consolepanel_core::tools::ToolAdapter;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub use errors::{ApiError, ServerError};
pub use routes::router;
pub use state::AppState;

/// Bind the configured address and serve until Ctrl-C.
pub async fn run_server(config: &PanelConfig) -> Result<(), ServerError> {
    let addr_str = format!("{}:{}", config.server.bind(), config.server.port());
    let addr: SocketAddr = addr_str
        .parse()
        .map_err(|_| ServerError::InvalidAddress {
            addr: addr_str.clone(),
        })?;

    let adapter = ToolAdapter::new(config.tools.clone());
    let missing = events::log_tool_probes(&adapter.probe());
    if missing > 0 {
        warn!(
            event = "server.startup.tools_missing",
            missing = missing,
            "Some routes will fail until the missing tools are installed"
        );
    }

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::BindFailed {
            addr: addr_str.clone(),
            source,
        })?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(event = "server.shutdown.signal_failed", error = %e);
        }
        signal_token.cancel();
    });

    serve(listener, AppState::new(adapter), shutdown).await
}

/// Serve on an already-bound listener until `shutdown` is cancelled.
pub async fn serve<R: ProcessRunner + 'static>(
    listener: TcpListener,
    state: AppState<R>,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let local = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_default();
    info!(event = "server.startup.listening", addr = local);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|source| ServerError::ServeFailed { source })?;

    info!(event = "server.shutdown.completed");
    Ok(())
}
