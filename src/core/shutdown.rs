use tokio::signal;
use tokio::sync::watch;

/// Resolves on Ctrl+C or SIGTERM and flips `stop` so background tasks
/// (the countdown driver) wind down with the server.
pub(crate) async fn shutdown_signal(stop: watch::Sender<bool>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
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

    if stop.send(true).is_err() {
        tracing::debug!("No background tasks listening for shutdown");
    }
    tracing::info!("shutdown signal received");
}
