use tokio::signal;

/// Resolves on Ctrl+C or SIGTERM. In-flight requests, including results-file writes, finish first.
pub(crate) async fn shutdown_signal() {
    let received = tokio::select! {
        () = ctrl_c() => "ctrl_c",
        () = terminate() => "sigterm",
    };

    tracing::info!(signal = received, "Shutdown signal received; draining connections");
}

async fn ctrl_c() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
