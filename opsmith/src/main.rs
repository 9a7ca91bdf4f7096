//! CLI entry point: wires the real collaborators together and maps the
//! session result to a process exit code.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use opsmith::core::catalog::use_cases;
use opsmith::core::types::SessionEnd;
use opsmith::exit_codes;
use opsmith::io::command::ShellRunner;
use opsmith::io::config::{AssistantConfig, default_config_path, load_config};
use opsmith::io::engine::ProcessEngine;
use opsmith::io::facts;
use opsmith::io::terminal::{Console, TermConsole};
use opsmith::logging;
use opsmith::session::{SessionContext, run_session};

#[derive(Parser)]
#[command(
    name = "opsmith",
    version,
    about = "AI-assisted ops CLI: natural-language requests to confirmed shell commands"
)]
struct Cli {}

fn main() {
    logging::init();
    let _cli = Cli::parse();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_codes::FATAL);
        }
    }
}

fn run() -> Result<i32> {
    let mut console = TermConsole::new();

    // A missing config file falls back to defaults; a broken one is a setup
    // failure and exits non-zero before any session starts.
    let config = match default_config_path() {
        Some(path) => load_config(&path).context("load configuration")?,
        None => AssistantConfig::default(),
    };

    let facts = facts::collect();
    let facts_json = facts.to_compact_json();
    if facts_json == "{}" {
        console.warning("system facts unavailable; proceeding without them");
    } else if let Some(name) = &facts.os.name {
        console.notice(&format!("Detected OS: {name} ({})", facts.os.arch));
    }

    let Some(use_case) = console.select_use_case(&use_cases())? else {
        console.notice("No use case selected. Exiting.");
        return Ok(exit_codes::OK);
    };
    console.notice(&format!("\nYou selected: {}", use_case.label()));

    let engine = ProcessEngine::new(
        config.engine.command.clone(),
        Duration::from_secs(config.engine_timeout_secs),
        config.output_limit_bytes,
    );
    let runner = ShellRunner::new(
        Duration::from_secs(config.command_timeout_secs),
        config.output_limit_bytes,
    );
    let ctx = SessionContext {
        product: use_case.product.to_string(),
        operation: use_case.operation.to_string(),
        facts_json,
    };

    match run_session(&ctx, &engine, &runner, &mut console)? {
        SessionEnd::UserExit => {
            console.notice("\nExiting.");
            Ok(exit_codes::OK)
        }
        SessionEnd::EngineUnavailable => Ok(exit_codes::FATAL),
    }
}
