//! Command-line interface.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{Config, config_path};
use crate::mentor::MentorRegistry;
use crate::ui::{StatusLine, status};

#[derive(Parser)]
#[command(name = "dm")]
#[command(about = "DataMentor AI - persona-based mentor chat with guided challenges")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the relay server (default)
    Serve,
    /// Chat with a mentor from the terminal
    Chat,
    /// Verify config, credentials, and the upload directory
    Check,
    /// Write a starter config file
    Init,
    /// Open config in editor
    Config,
}

/// Verify the local installation is usable.
#[must_use]
pub fn check() -> ExitCode {
    println!();

    let config = match Config::load() {
        Ok(config) => {
            StatusLine::ok(format!("Config loaded from {}", config_path().display())).print();
            config
        }
        Err(e) => {
            StatusLine::error(format!("{e}")).print();
            println!("  Run `dm init` to create a starter config.");
            println!();
            return ExitCode::FAILURE;
        }
    };

    let mut failed = false;

    if config.claude.api_key.is_empty() {
        StatusLine::error("No Claude API key (set claude.api_key or ANTHROPIC_API_KEY)").print();
        failed = true;
    } else {
        StatusLine::ok("Claude API key present").print();
    }

    match MentorRegistry::from_config(&config.mentors) {
        Ok(registry) => {
            StatusLine::ok(format!(
                "{} mentors configured (default: {})",
                registry.all().len(),
                registry.default_id()
            ))
            .print();
        }
        Err(e) => {
            StatusLine::error(format!("Mentor config invalid: {e}")).print();
            failed = true;
        }
    }

    match std::fs::create_dir_all(&config.server.upload_dir) {
        Ok(()) => {
            StatusLine::ok(format!(
                "Upload directory writable: {}",
                config.server.upload_dir.display()
            ))
            .print();
        }
        Err(e) => {
            StatusLine::error(format!("Upload directory unusable: {e}")).print();
            failed = true;
        }
    }

    println!();
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Write a starter config with defaults and an empty API key.
pub fn init() -> Result<()> {
    let path = config_path();
    if path.exists() {
        status::print_error(
            "Config already exists",
            Some(&format!("Edit it with `dm config` ({})", path.display())),
        );
        return Ok(());
    }

    let config: Config =
        toml::from_str("[claude]").context("Failed to build default config")?;
    config.save()?;

    StatusLine::ok(format!("Wrote {}", path.display())).print();
    println!("  Add your Claude API key, then run `dm check`.");
    Ok(())
}

/// Open the config file in `$EDITOR`.
pub fn config_cmd() -> Result<()> {
    let path = config_path();

    if !path.exists() {
        status::print_error("No config file found", Some("Run `dm init` to create one."));
        return Ok(());
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "nano".to_string());

    std::process::Command::new(editor)
        .arg(&path)
        .status()
        .context("Failed to launch editor")?;

    Ok(())
}
