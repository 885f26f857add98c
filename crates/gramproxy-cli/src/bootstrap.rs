//! CLI bootstrap - the composition root.
//!
//! This is the ONLY place where the proxy is wired together:
//! - Configuration (flags, `.env`, environment)
//! - Logging
//! - Grammar provider and event sink (via gramproxy-core)
//! - Listener and server (via gramproxy-server)

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use gramproxy_core::{InterceptEventSink, ProxyConfig, TracingEventSink};
use gramproxy_server::{AppState, serve};

use crate::error::CliError;
use crate::parser::Cli;

/// Initialize logging to stderr.
///
/// `RUST_LOG` is honored unless `verbose` forces debug output.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Outcome of looking for a `.env` file.
#[derive(Debug)]
pub enum EnvFile {
    Loaded(PathBuf),
    Missing,
    Failed(dotenvy::Error),
}

impl EnvFile {
    fn from_result(result: dotenvy::Result<PathBuf>) -> Self {
        match result {
            Ok(path) => Self::Loaded(path),
            Err(e) if e.not_found() => Self::Missing,
            Err(e) => Self::Failed(e),
        }
    }

    /// Log the outcome. Only useful once [`init_tracing`] has run.
    pub fn log(&self) {
        match self {
            Self::Loaded(path) => debug!(path = %path.display(), "Loaded environment file"),
            Self::Missing => {}
            Self::Failed(e) => warn!("Failed to load .env file: {e}"),
        }
    }
}

/// Load a `.env` file from the working directory, if there is one.
///
/// Call before [`init_tracing`] so a `RUST_LOG` set in the file applies.
#[must_use]
pub fn load_env_file() -> EnvFile {
    EnvFile::from_result(dotenvy::dotenv())
}

/// Resolve configuration, bind, and serve until Ctrl-C or SIGTERM.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let config = Arc::new(ProxyConfig::from_env(cli.overrides())?);

    info!("Starting gramproxy");
    info!("  Target Base URL: {}", config.upstream_base_url);
    info!("  Listening on: {}", config.listen_addr());
    info!("  Grammar file: {}", config.grammar_path.display());

    let events: Arc<dyn InterceptEventSink> = Arc::new(TracingEventSink::new());
    let state = AppState::from_config(Arc::clone(&config), events)
        .map_err(|e| CliError::Server(e.to_string()))?;

    // Bind first so a bad address fails before anything else runs
    let address = config.listen_addr();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| CliError::Bind { address, source })?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown_signal(cancel.clone()));

    serve(listener, state, cancel)
        .await
        .map_err(|e| CliError::Server(e.to_string()))
}

/// Trigger `cancel` on Ctrl-C, or SIGTERM on Unix.
async fn cancel_on_shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
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
                warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
    cancel.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_env_file_outcomes() {
        let missing = dotenvy::Error::Io(io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(EnvFile::from_result(Err(missing)), EnvFile::Missing));

        let unreadable = dotenvy::Error::Io(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(EnvFile::from_result(Err(unreadable)), EnvFile::Failed(_)));

        let bad_line = dotenvy::Error::LineParse("=oops".to_string(), 0);
        assert!(matches!(EnvFile::from_result(Err(bad_line)), EnvFile::Failed(_)));

        let loaded = EnvFile::from_result(Ok(PathBuf::from("/srv/.env")));
        assert!(matches!(loaded, EnvFile::Loaded(ref path) if path == &PathBuf::from("/srv/.env")));
    }
}
