mod chat;
mod claude;
mod cli;
mod config;
mod curriculum;
mod mentor;
mod relay;
mod review;
mod server;
mod session;
mod ui;
mod uploads;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt::init();
    }

    let cli = Cli::parse();

    let result = run(cli).await;

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Some(Command::Check) => Ok(cli::check()),
        Some(Command::Init) => {
            cli::init()?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Config) => {
            cli::config_cmd()?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Chat) => {
            let config = config::Config::load()?;
            chat::run(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Serve) | None => {
            let config = config::Config::load()?;
            server::run(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
