//! Scripted doubles for session-controller tests.
//!
//! Each double implements the same trait as its real counterpart and replays
//! predetermined responses while recording what the controller asked of it.

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::Result;

use crate::core::types::{CommandOutcome, EngineRequest, EngineResponse};
use crate::io::command::CommandRunner;
use crate::io::engine::Engine;
use crate::io::terminal::Console;

/// Engine that replays scripted responses and records every request.
pub struct ScriptedEngine {
    responses: RefCell<VecDeque<EngineResponse>>,
    pub requests: RefCell<Vec<EngineRequest>>,
}

impl ScriptedEngine {
    pub fn new(responses: Vec<EngineResponse>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn replies(replies: &[&str]) -> Self {
        Self::new(
            replies
                .iter()
                .map(|r| EngineResponse::Reply(r.to_string()))
                .collect(),
        )
    }
}

impl Engine for ScriptedEngine {
    fn call(&self, request: &EngineRequest) -> EngineResponse {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .expect("scripted engine exhausted")
    }
}

/// Runner that replays scripted outcomes and records executed commands.
pub struct ScriptedRunner {
    outcomes: RefCell<VecDeque<CommandOutcome>>,
    pub executed: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new(outcomes: Vec<CommandOutcome>) -> Self {
        Self {
            outcomes: RefCell::new(outcomes.into()),
            executed: RefCell::new(Vec::new()),
        }
    }

    /// Runner for tests where no execution must happen.
    pub fn unused() -> Self {
        Self::new(Vec::new())
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command_text: &str) -> CommandOutcome {
        self.executed.borrow_mut().push(command_text.to_string());
        self.outcomes
            .borrow_mut()
            .pop_front()
            .expect("scripted runner exhausted")
    }
}

/// Console that replays confirmations/clarify inputs and records output.
#[derive(Default)]
pub struct ScriptedConsole {
    pub confirmations: VecDeque<bool>,
    pub clarify_inputs: VecDeque<String>,
    pub shown_replies: Vec<String>,
    pub shown_commands: Vec<String>,
    pub shown_outcomes: Vec<CommandOutcome>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub notices: Vec<String>,
}

impl ScriptedConsole {
    pub fn new(confirmations: Vec<bool>, clarify_inputs: Vec<&str>) -> Self {
        Self {
            confirmations: confirmations.into(),
            clarify_inputs: clarify_inputs
                .into_iter()
                .map(str::to_string)
                .collect(),
            ..Self::default()
        }
    }
}

impl Console for ScriptedConsole {
    fn show_reply(&mut self, reply: &str) {
        self.shown_replies.push(reply.to_string());
    }

    fn show_command(&mut self, command: &str) {
        self.shown_commands.push(command.to_string());
    }

    fn show_outcome(&mut self, outcome: &CommandOutcome) {
        self.shown_outcomes.push(outcome.clone());
    }

    fn confirm_execution(&mut self) -> Result<bool> {
        Ok(self
            .confirmations
            .pop_front()
            .expect("scripted console: no confirmation queued"))
    }

    fn clarify(&mut self) -> Result<String> {
        Ok(self
            .clarify_inputs
            .pop_front()
            .expect("scripted console: no clarify input queued"))
    }

    fn success(&mut self, text: &str) {
        self.notices.push(text.to_string());
    }

    fn notice(&mut self, text: &str) {
        self.notices.push(text.to_string());
    }

    fn warning(&mut self, text: &str) {
        self.warnings.push(text.to_string());
    }

    fn error(&mut self, text: &str) {
        self.errors.push(text.to_string());
    }
}

/// Outcome helper for scripted runs.
pub fn outcome(exit_code: i32, stdout: &str, stderr: &str) -> CommandOutcome {
    CommandOutcome {
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        exit_code,
        timed_out: false,
    }
}
