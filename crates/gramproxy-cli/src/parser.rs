//! Command-line arguments.
//!
//! Every flag is optional; unset flags fall back to the environment and
//! then to built-in defaults (see `gramproxy_core::config`).

use std::path::PathBuf;

use clap::Parser;
use gramproxy_core::ConfigOverrides;

/// Reverse proxy that forces a GBNF grammar onto chat completion requests.
#[derive(Debug, Parser)]
#[command(name = "gramproxy")]
#[command(about = "Inject a tool-call grammar into OpenAI-compatible chat completion requests")]
#[command(version)]
pub struct Cli {
    /// Path to grammar file (.gbnf) [env: GRAMMAR_FILE_PATH]
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Upstream OpenAI-compatible base URL [env: TARGET_BASE_URL]
    #[arg(long, value_name = "URL")]
    pub upstream: Option<String>,

    /// Host to listen on [env: TOOL_CALL_ADAPTER_HOST]
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on [env: TOOL_CALL_ADAPTER_PORT]
    #[arg(long)]
    pub port: Option<u16>,

    /// Largest POST body to buffer, in bytes [env: GRAMPROXY_MAX_BODY_BYTES]
    #[arg(long, value_name = "BYTES")]
    pub max_body_bytes: Option<usize>,

    /// Upstream request deadline in seconds, 0 to disable [env: GRAMPROXY_UPSTREAM_TIMEOUT_SECS]
    #[arg(long, value_name = "SECS")]
    pub upstream_timeout_secs: Option<u64>,

    /// Upstream connect timeout in seconds [env: GRAMPROXY_CONNECT_TIMEOUT_SECS]
    #[arg(long, value_name = "SECS")]
    pub connect_timeout_secs: Option<u64>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// The explicitly supplied settings.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            upstream_base_url: self.upstream.clone(),
            host: self.host.clone(),
            port: self.port,
            grammar_path: self.config.clone(),
            max_body_bytes: self.max_body_bytes,
            upstream_timeout_secs: self.upstream_timeout_secs,
            connect_timeout_secs: self.connect_timeout_secs,
        }
    }
}
