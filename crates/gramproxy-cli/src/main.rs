//! CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use gramproxy_cli::{Cli, init_tracing, load_env_file, run};

#[tokio::main]
async fn main() -> ExitCode {
    let env_file = load_env_file();
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    env_file.log();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
