// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Civica - a terminal client for the civic legal-answer service.
//!
//! This is the binary entry point for the Civica chat client.

mod shell;

use clap::{Parser, Subcommand};

/// Civica - ask civic legal questions, watch every answer get graded.
#[derive(Parser, Debug)]
#[command(name = "civica", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch the interactive chat shell (the default).
    Shell,
    /// Print the effective configuration and exit.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match civica_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            civica_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    // Log level comes from config; RUST_LOG still wins when set.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log.level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => println!("{rendered}"),
            Err(error) => {
                eprintln!("civica: failed to render config: {error}");
                std::process::exit(1);
            }
        },
        Some(Commands::Shell) | None => {
            if let Err(error) = shell::run_shell(config).await {
                eprintln!("civica: {error}");
                std::process::exit(1);
            }
        }
    }
}
