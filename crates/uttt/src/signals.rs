//! Shutdown triggers for the server process.

use std::fmt;

/// What asked the process to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Ctrl+C or SIGINT
    Interrupt,
    /// SIGTERM, as sent by process supervisors
    Terminate,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt if cfg!(unix) => f.write_str("SIGINT"),
            Self::Interrupt => f.write_str("Ctrl+C"),
            Self::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Resolves with the first shutdown request the process receives.
///
/// Installing the terminate handler can fail on unix, in which case the
/// error is returned before any signal is awaited.
pub async fn shutdown_signal() -> anyhow::Result<ShutdownReason> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            interrupted = tokio::signal::ctrl_c() => {
                interrupted?;
                Ok(ShutdownReason::Interrupt)
            }
            _ = terminate.recv() => Ok(ShutdownReason::Terminate),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(ShutdownReason::Interrupt)
    }
}
