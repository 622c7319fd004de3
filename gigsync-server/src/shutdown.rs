//! Process stop handling. Live viewers are told to go away as soon as a stop is requested, so the
//! HTTP server's graceful stop is not left waiting on long-lived sockets.

use std::future::Future;

use actix_web::dev::ServerHandle;
use tokio_util::sync::CancellationToken;
use tracing::*;


/// Resolves on Ctrl-C, or on SIGTERM where there is one.
pub async fn stop_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(err) => {
                warn!(%err, "SIGTERM handler unavailable, stopping on Ctrl-C only");
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "Ctrl-C handler unavailable");
        futures::future::pending::<()>().await;
    }
}

/// Wait for `signal`, cancel `shutdown` (every live viewer holds a child of it), then stop the server.
pub async fn stop_on<F>(signal: F, server: ServerHandle, shutdown: CancellationToken)
    where F: Future<Output = ()>
{
    signal.await;

    info!("Stop requested, closing live viewers");

    shutdown.cancel();
    server.stop(true).await;
}
