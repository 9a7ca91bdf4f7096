//! Interactive terminal front-end.
//!
//! Prompts and status notices go to stderr so the primary output stream
//! stays clean; substantive content (engine replies, proposed commands,
//! command output) goes to stdout. Colors follow the usual traffic-light
//! convention via `owo-colors`.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use crate::core::catalog::UseCase;
use crate::core::message::CLARIFY_LIMIT_CHARS;
use crate::core::types::CommandOutcome;

/// User-facing surface consumed by the session controller.
///
/// Implemented by [`TermConsole`] for real terminals and by the scripted
/// console in `test_support` for state-machine tests.
pub trait Console {
    /// Render a full engine reply.
    fn show_reply(&mut self, reply: &str);
    /// Render the command extracted from the first block.
    fn show_command(&mut self, command: &str);
    /// Render captured stdout/stderr after an execution.
    fn show_outcome(&mut self, outcome: &CommandOutcome);
    /// Ask for explicit confirmation before running a command. Default is
    /// decline; EOF declines.
    fn confirm_execution(&mut self) -> Result<bool>;
    /// Clarify sub-flow prompt. Returns trimmed free text; empty means the
    /// user wants to stop.
    fn clarify(&mut self) -> Result<String>;
    fn success(&mut self, text: &str);
    fn notice(&mut self, text: &str);
    fn warning(&mut self, text: &str);
    fn error(&mut self, text: &str);
}

/// Result of parsing one line of menu input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    Exit,
    Pick(usize),
    Invalid,
}

fn clarify_prompt() -> String {
    format!("How can I help further? (max {CLARIFY_LIMIT_CHARS} chars, press Enter to exit): ")
}

fn parse_menu_choice(input: &str, count: usize) -> MenuChoice {
    match input.trim() {
        "0" => MenuChoice::Exit,
        other => match other.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => MenuChoice::Pick(n - 1),
            _ => MenuChoice::Invalid,
        },
    }
}

/// Console backed by the real terminal.
#[derive(Default)]
pub struct TermConsole;

impl TermConsole {
    pub fn new() -> Self {
        Self
    }

    /// Present the use-case menu and return the selection, or `None` when the
    /// user chooses to exit (entering `0`, or EOF on stdin).
    pub fn select_use_case(&mut self, cases: &[UseCase]) -> Result<Option<UseCase>> {
        eprintln!("\nPlease select a use case:");
        for (i, case) in cases.iter().enumerate() {
            eprintln!("  {}. {}", i + 1, case.label());
        }
        eprintln!("  0. Exit");

        loop {
            eprint!("Enter your choice: ");
            io::stderr().flush().context("flush stderr")?;
            let Some(line) = read_line()? else {
                return Ok(None);
            };
            match parse_menu_choice(&line, cases.len()) {
                MenuChoice::Exit => return Ok(None),
                MenuChoice::Pick(i) => return Ok(Some(cases[i].clone())),
                MenuChoice::Invalid => self.warning("Invalid choice, please try again."),
            }
        }
    }
}

impl Console for TermConsole {
    fn show_reply(&mut self, reply: &str) {
        println!("\n--- Engine Reply ---");
        println!("{}", reply.trim());
        println!("--------------------\n");
    }

    fn show_command(&mut self, command: &str) {
        println!("The engine proposed the following command:");
        println!("{}", command.yellow());
    }

    fn show_outcome(&mut self, outcome: &CommandOutcome) {
        if !outcome.stdout.is_empty() {
            println!("\n--- stdout ---\n{}\n--------------", outcome.stdout);
        }
        if !outcome.stderr.is_empty() {
            println!("\n--- stderr ---\n{}\n--------------", outcome.stderr);
        }
    }

    fn confirm_execution(&mut self) -> Result<bool> {
        eprint!("\nDo you want to execute this command? [y/N]: ");
        io::stderr().flush().context("flush stderr")?;
        let answer = read_line()?.unwrap_or_default();
        Ok(matches!(
            answer.trim().to_lowercase().as_str(),
            "y" | "yes"
        ))
    }

    fn clarify(&mut self) -> Result<String> {
        eprint!("{}", clarify_prompt());
        io::stderr().flush().context("flush stderr")?;
        Ok(read_line()?.unwrap_or_default().trim().to_string())
    }

    fn success(&mut self, text: &str) {
        eprintln!("{}", text.green());
    }

    fn notice(&mut self, text: &str) {
        eprintln!("{text}");
    }

    fn warning(&mut self, text: &str) {
        eprintln!("{}", format!("Warning: {text}").yellow());
    }

    fn error(&mut self, text: &str) {
        eprintln!("{}", format!("Error: {text}").red());
    }
}

/// Read one line from stdin. `None` on EOF.
fn read_line() -> Result<Option<String>> {
    let mut line = String::new();
    let n = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read stdin")?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clarify_prompt_names_the_actual_limit() {
        assert!(clarify_prompt().contains(&CLARIFY_LIMIT_CHARS.to_string()));
    }

    #[test]
    fn menu_choice_zero_exits() {
        assert_eq!(parse_menu_choice("0", 3), MenuChoice::Exit);
        assert_eq!(parse_menu_choice(" 0 ", 3), MenuChoice::Exit);
    }

    #[test]
    fn menu_choice_in_range_picks_zero_based_index() {
        assert_eq!(parse_menu_choice("1", 3), MenuChoice::Pick(0));
        assert_eq!(parse_menu_choice("3", 3), MenuChoice::Pick(2));
    }

    #[test]
    fn menu_choice_out_of_range_or_garbage_is_invalid() {
        assert_eq!(parse_menu_choice("4", 3), MenuChoice::Invalid);
        assert_eq!(parse_menu_choice("-1", 3), MenuChoice::Invalid);
        assert_eq!(parse_menu_choice("install", 3), MenuChoice::Invalid);
        assert_eq!(parse_menu_choice("", 3), MenuChoice::Invalid);
    }
}
