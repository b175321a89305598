//! HTTP listener lifecycle: background serving and bounded graceful shutdown

use std::future::Future;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tokio::{net::TcpListener, sync::watch};

use crate::error::AppError;

/// How long cancelled connections get to flush their 503 before the
/// server task is dropped
const CANCEL_DRAIN: Duration = Duration::from_secs(1);

/// Serve `app` on `listener` until `shutdown` resolves.
///
/// The server runs on its own task. Once `shutdown` completes the listener
/// stops accepting connections and in-flight requests get `grace_period` to
/// finish. Handlers still running after that are cancelled (their futures,
/// database calls included, are dropped) and answer 503.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    grace_period: Duration,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let app = app.layer(middleware::from_fn_with_state(cancel_rx, cancel_on_shutdown));

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                // A dropped sender also counts as a stop request
                let _ = stop_rx.changed().await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            // Server ended without being asked to
            result??;
            return Ok(());
        }
        _ = shutdown => {
            tracing::info!("Shutdown requested, draining in-flight requests");
        }
    }

    let _ = stop_tx.send(true);

    if let Ok(result) = tokio::time::timeout(grace_period, &mut server).await {
        result??;
        tracing::info!("Server stopped");
        return Ok(());
    }

    tracing::warn!(
        "In-flight requests still running after {:?}, cancelling them",
        grace_period
    );
    let _ = cancel_tx.send(true);

    match tokio::time::timeout(CANCEL_DRAIN, &mut server).await {
        Ok(result) => {
            result??;
            tracing::info!("Server stopped");
        }
        Err(_) => {
            tracing::warn!("Connections still open after cancellation, dropping server task");
            server.abort();
        }
    }

    Ok(())
}

/// Run the request unless the cancel flag flips first
async fn cancel_on_shutdown(
    State(mut cancel): State<watch::Receiver<bool>>,
    request: Request,
    next: Next,
) -> Response {
    let cancelled = async move {
        let sender_gone = cancel.wait_for(|cancelled| *cancelled).await.is_err();
        if sender_gone {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        response = next.run(request) => response,
        _ = cancelled => {
            AppError::Unavailable("Server is shutting down".to_string()).into_response()
        }
    }
}

/// Resolve on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
