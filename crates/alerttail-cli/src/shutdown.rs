use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Create a `CancellationToken` and spawn a task that cancels it on the
/// first SIGINT, SIGTERM, SIGHUP or SIGQUIT (Ctrl+C only off unix).
///
/// # Errors
///
/// Returns an error if a signal handler cannot be installed.
pub fn create_shutdown_token() -> anyhow::Result<CancellationToken> {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let signals = ShutdownSignals::install()?;

    tokio::spawn(async move {
        let name = signals.recv().await;
        tracing::info!(signal = name, "Shutdown requested, draining");
        token_clone.cancel();
    });

    Ok(token)
}

#[cfg(unix)]
struct ShutdownSignals {
    interrupt: signal::unix::Signal,
    terminate: signal::unix::Signal,
    hangup: signal::unix::Signal,
    quit: signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> anyhow::Result<Self> {
        use signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?,
            terminate: signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?,
            hangup: signal(SignalKind::hangup()).context("failed to install SIGHUP handler")?,
            quit: signal(SignalKind::quit()).context("failed to install SIGQUIT handler")?,
        })
    }

    /// Wait for the first signal; returns its name.
    async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
            _ = self.hangup.recv() => "SIGHUP",
            _ = self.quit.recv() => "SIGQUIT",
        }
    }
}

#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> anyhow::Result<Self> {
        Ok(Self)
    }

    async fn recv(self) -> &'static str {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Ctrl+C handler failed: {e}");
            std::future::pending::<()>().await;
        }
        "Ctrl+C"
    }
}
