//! buildpack-notify entry point
//!
//! Parses configuration from the environment and command line, runs one
//! notification pass, and reports fatal errors with context and suggestions.

use buildpack_notify::cli::Cli;
use buildpack_notify::core::user_friendly_error;
use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Err(e) = cli.execute().await {
        user_friendly_error(e).display();
        std::process::exit(1);
    }
}
