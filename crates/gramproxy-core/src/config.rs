//! Proxy configuration.
//!
//! Built once at startup and shared read-only. Every setting resolves in the
//! same order: explicit override (CLI flag), then environment, then default.
//! Empty environment values count as unset.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::services::{GRAMMAR_PATH_ENV, resolve_grammar_path};

/// Default upstream OpenAI-compatible base URL.
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "http://ollama:11434/v1";

/// Default listen host.
pub const DEFAULT_LISTEN_HOST: &str = "0.0.0.0";

/// Default listen port.
pub const DEFAULT_LISTEN_PORT: u16 = 8000;

/// Default cap on buffered POST bodies (32 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Default whole-request deadline for upstream calls, in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 600;

/// Default connect timeout for upstream calls, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Environment variable names.
pub mod env {
    pub const UPSTREAM_BASE_URL: &str = "TARGET_BASE_URL";
    pub const LISTEN_HOST: &str = "TOOL_CALL_ADAPTER_HOST";
    pub const LISTEN_PORT: &str = "TOOL_CALL_ADAPTER_PORT";
    pub const GRAMMAR_PATH: &str = super::GRAMMAR_PATH_ENV;
    pub const MAX_BODY_BYTES: &str = "GRAMPROXY_MAX_BODY_BYTES";
    pub const UPSTREAM_TIMEOUT_SECS: &str = "GRAMPROXY_UPSTREAM_TIMEOUT_SECS";
    pub const CONNECT_TIMEOUT_SECS: &str = "GRAMPROXY_CONNECT_TIMEOUT_SECS";
}

/// Configuration errors. Always fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A setting could not be parsed.
    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Values supplied explicitly (typically from CLI flags).
///
/// `None` means "not given"; the environment or default applies.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub upstream_base_url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub grammar_path: Option<PathBuf>,
    pub max_body_bytes: Option<usize>,
    pub upstream_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
}

/// Immutable proxy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Base URL every request is forwarded to. Parsed per request.
    pub upstream_base_url: String,
    /// Host to bind to (e.g., "127.0.0.1" or "0.0.0.0").
    pub host: String,
    /// Port to bind to (0 for auto-assign).
    pub port: u16,
    /// Grammar file, read on every injection.
    pub grammar_path: PathBuf,
    /// Largest POST body that will be buffered.
    pub max_body_bytes: usize,
    /// Whole-request deadline for upstream calls; `None` disables it.
    pub upstream_timeout: Option<Duration>,
    /// Connect timeout for upstream calls.
    pub connect_timeout: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            upstream_base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            host: DEFAULT_LISTEN_HOST.to_string(),
            port: DEFAULT_LISTEN_PORT,
            grammar_path: resolve_grammar_path(None, None),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            upstream_timeout: Some(Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS)),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl ProxyConfig {
    /// Resolve configuration from overrides and the process environment.
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from overrides and an environment lookup.
    pub fn resolve<F>(overrides: ConfigOverrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let upstream_base_url = overrides
            .upstream_base_url
            .or_else(|| lookup(env::UPSTREAM_BASE_URL))
            .unwrap_or_else(|| DEFAULT_UPSTREAM_BASE_URL.to_string());

        let host = overrides
            .host
            .or_else(|| lookup(env::LISTEN_HOST))
            .unwrap_or_else(|| DEFAULT_LISTEN_HOST.to_string());

        let port = match overrides.port {
            Some(port) => port,
            None => parse_env(env::LISTEN_PORT, lookup(env::LISTEN_PORT))?
                .unwrap_or(DEFAULT_LISTEN_PORT),
        };

        let grammar_path = resolve_grammar_path(
            overrides.grammar_path.as_deref(),
            lookup(env::GRAMMAR_PATH).as_deref(),
        );

        let max_body_bytes = match overrides.max_body_bytes {
            Some(bytes) => bytes,
            None => parse_env(env::MAX_BODY_BYTES, lookup(env::MAX_BODY_BYTES))?
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
        };

        let upstream_timeout_secs = match overrides.upstream_timeout_secs {
            Some(secs) => secs,
            None => parse_env(
                env::UPSTREAM_TIMEOUT_SECS,
                lookup(env::UPSTREAM_TIMEOUT_SECS),
            )?
            .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        };

        let connect_timeout_secs = match overrides.connect_timeout_secs {
            Some(secs) => secs,
            None => parse_env(env::CONNECT_TIMEOUT_SECS, lookup(env::CONNECT_TIMEOUT_SECS))?
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self {
            upstream_base_url,
            host,
            port,
            grammar_path,
            max_body_bytes,
            // 0 disables the deadline
            upstream_timeout: (upstream_timeout_secs > 0)
                .then(|| Duration::from_secs(upstream_timeout_secs)),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        })
    }

    /// The `host:port` string to bind to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T>(key: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}
