//! Axum adapter for gramproxy.
//!
//! Receives every request, injects `options.grammar` into chat completion
//! POST bodies that lack it, and forwards everything to a single upstream.
#![deny(unsafe_code)]

pub mod error;
pub mod forward;
pub mod intercept;
pub mod server;
pub mod upstream;

pub use error::{ErrorResponse, ProxyError};
pub use server::{AppState, build_client, create_router, serve};
pub use upstream::UpstreamTarget;
