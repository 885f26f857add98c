//! Command-line front end for gramproxy.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

pub mod bootstrap;
pub mod error;
pub mod parser;

pub use bootstrap::{EnvFile, init_tracing, load_env_file, run};
pub use error::CliError;
pub use parser::Cli;
