//! The session controller: the state machine driving the
//! request/execute/observe loop.
//!
//! Each iteration calls the engine, parses the reply for a fenced command
//! block, asks the user to confirm, and derives the next `(mode, message)`
//! pair from what happened. The only fatal condition is an unavailable
//! engine; everything else folds back into the conversation.

use anyhow::Result;
use tracing::{debug, info};

use crate::core::blocks::{command_text, extract_blocks};
use crate::core::message::Transition;
use crate::core::types::{EngineRequest, EngineResponse, Mode, SessionEnd};
use crate::io::command::CommandRunner;
use crate::io::engine::Engine;
use crate::io::terminal::Console;

/// Fixed per-run context: what the user selected plus the facts snapshot.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub product: String,
    pub operation: String,
    pub facts_json: String,
}

/// Live conversation state. Exactly one exists per run; it is owned here and
/// mutated only at the end of each loop iteration.
struct Session {
    mode: Mode,
    pending_message: Option<String>,
    terminated: bool,
}

/// What one iteration decided about the next.
enum StepNext {
    /// The user elected to stop.
    Exit,
    /// Continue with the derived mode and outbound message.
    Continue(Transition),
}

/// Drive the conversation loop until the user exits or the engine becomes
/// unavailable.
pub fn run_session<E: Engine, R: CommandRunner, C: Console>(
    ctx: &SessionContext,
    engine: &E,
    runner: &R,
    console: &mut C,
) -> Result<SessionEnd> {
    let mut session = Session {
        mode: Mode::Execute,
        pending_message: None,
        terminated: false,
    };

    while !session.terminated {
        console.notice(&format!(
            "\n[{} mode] Calling engine...",
            session.mode.as_str()
        ));
        let request = EngineRequest {
            product: ctx.product.clone(),
            operation: ctx.operation.clone(),
            mode: session.mode,
            message: session.pending_message.clone(),
            facts_json: ctx.facts_json.clone(),
        };

        let reply = match engine.call(&request) {
            EngineResponse::Reply(reply) => reply,
            EngineResponse::Unavailable { reason } => {
                console.error(&format!(
                    "failed to get a response from the engine ({reason}); cannot continue"
                ));
                return Ok(SessionEnd::EngineUnavailable);
            }
        };

        let blocks = extract_blocks(&reply);
        debug!(blocks = blocks.len(), "parsed engine reply");
        console.show_reply(&reply);
        if blocks.len() > 1 {
            // First-block-only is kept for compatibility; the rest of the
            // reply is still rendered above so no step is hidden.
            console.warning(&format!(
                "{} command blocks found; only the first will be offered",
                blocks.len()
            ));
        }

        let next = match blocks.first() {
            Some(block) => propose_and_run(block, runner, console)?,
            None => clarify(console)?,
        };

        match next {
            StepNext::Exit => session.terminated = true,
            StepNext::Continue(transition) => {
                session.mode = transition.mode;
                session.pending_message = Some(transition.message);
            }
        }
    }

    info!("session ended by user");
    Ok(SessionEnd::UserExit)
}

/// Confirm and execute the first block's command, deriving the next state
/// from the outcome. Unextractable or declined commands fall through to the
/// clarify sub-flow.
fn propose_and_run<R: CommandRunner, C: Console>(
    block: &str,
    runner: &R,
    console: &mut C,
) -> Result<StepNext> {
    let command = command_text(block);
    if command.is_empty() {
        console.warning("could not extract command text from the code block");
        return clarify(console);
    }

    console.show_command(&command);
    if !console.confirm_execution()? {
        console.notice("Command execution skipped.");
        return clarify(console);
    }

    console.notice("Executing command...");
    let outcome = runner.run(&command);
    console.show_outcome(&outcome);
    if outcome.success() {
        console.success("Command executed successfully.");
    } else if outcome.timed_out {
        console.warning("command timed out before completing");
    } else {
        console.error(&format!("Command failed (Exit Code: {}).", outcome.exit_code));
    }

    Ok(StepNext::Continue(Transition::after_run(&command, &outcome)))
}

/// Ask the user for free text. Empty input terminates the loop; anything
/// else becomes the next chat-mode message.
fn clarify<C: Console>(console: &mut C) -> Result<StepNext> {
    let input = console.clarify()?;
    if input.is_empty() {
        return Ok(StepNext::Exit);
    }
    Ok(StepNext::Continue(Transition::from_clarify(&input)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedConsole, ScriptedEngine, ScriptedRunner, outcome};

    fn ctx() -> SessionContext {
        SessionContext {
            product: "curl".to_string(),
            operation: "Install".to_string(),
            facts_json: "{}".to_string(),
        }
    }

    #[test]
    fn successful_command_feeds_execute_mode_report_back() {
        // Scenario B: `echo hi` exits 0 -> next request is Execute mode and
        // carries both the command and its stdout.
        let engine = ScriptedEngine::replies(&[
            "Run this:\n```bash\necho hi\n```",
            "All done, nothing further.",
        ]);
        let runner = ScriptedRunner::new(vec![outcome(0, "hi", "")]);
        let mut console = ScriptedConsole::new(vec![true], vec![""]);

        let end = run_session(&ctx(), &engine, &runner, &mut console).expect("session");

        assert_eq!(end, SessionEnd::UserExit);
        assert_eq!(runner.executed.borrow().join(";"), "echo hi");
        let requests = engine.requests.borrow();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].mode, Mode::Execute);
        assert!(requests[0].message.is_none());
        assert_eq!(requests[1].mode, Mode::Execute);
        let report = requests[1].message.as_deref().expect("report");
        assert!(report.contains("echo hi"));
        assert!(report.contains("hi"));
    }

    #[test]
    fn failing_command_switches_to_fix_mode_with_exit_code() {
        // Scenario C: `false` exits 1 -> Fix mode, report names the exit code.
        let engine = ScriptedEngine::replies(&[
            "Try:\n```bash\nfalse\n```",
            "Hm, try something else.",
        ]);
        let runner = ScriptedRunner::new(vec![outcome(1, "", "")]);
        let mut console = ScriptedConsole::new(vec![true], vec![""]);

        run_session(&ctx(), &engine, &runner, &mut console).expect("session");

        let requests = engine.requests.borrow();
        assert_eq!(requests[1].mode, Mode::Fix);
        let report = requests[1].message.as_deref().expect("report");
        assert!(report.contains("Exit Code: 1"));
        assert!(report.contains("false"));
    }

    #[test]
    fn empty_clarify_input_terminates_cleanly() {
        // Scenario D: no fenced block, user presses enter -> loop exits.
        let engine = ScriptedEngine::replies(&["No command needed here."]);
        let runner = ScriptedRunner::unused();
        let mut console = ScriptedConsole::new(Vec::new(), vec![""]);

        let end = run_session(&ctx(), &engine, &runner, &mut console).expect("session");

        assert_eq!(end, SessionEnd::UserExit);
        assert!(runner.executed.borrow().is_empty());
        assert_eq!(engine.requests.borrow().len(), 1);
    }

    #[test]
    fn unavailable_engine_is_fatal_after_one_error() {
        // Scenario E: transport failure ends the session with no prompts.
        let engine = ScriptedEngine::new(vec![EngineResponse::Unavailable {
            reason: "connection refused".to_string(),
        }]);
        let runner = ScriptedRunner::unused();
        let mut console = ScriptedConsole::new(Vec::new(), Vec::new());

        let end = run_session(&ctx(), &engine, &runner, &mut console).expect("session");

        assert_eq!(end, SessionEnd::EngineUnavailable);
        assert_eq!(console.errors.len(), 1);
        assert!(console.errors[0].contains("connection refused"));
        assert!(console.shown_replies.is_empty());
    }

    #[test]
    fn declined_command_falls_through_to_chat_mode() {
        let engine = ScriptedEngine::replies(&[
            "Run:\n```\nrm -rf /tmp/scratch\n```",
            "Understood.",
        ]);
        let runner = ScriptedRunner::unused();
        let mut console = ScriptedConsole::new(vec![false], vec!["do it more carefully", ""]);

        run_session(&ctx(), &engine, &runner, &mut console).expect("session");

        assert!(runner.executed.borrow().is_empty());
        let requests = engine.requests.borrow();
        assert_eq!(requests[1].mode, Mode::Chat);
        assert_eq!(requests[1].message.as_deref(), Some("do it more carefully"));
    }

    #[test]
    fn non_empty_clarify_becomes_chat_message() {
        let engine = ScriptedEngine::replies(&["Just words, no blocks.", "Okay."]);
        let runner = ScriptedRunner::unused();
        let mut console = ScriptedConsole::new(Vec::new(), vec!["install curl", ""]);

        run_session(&ctx(), &engine, &runner, &mut console).expect("session");

        let requests = engine.requests.borrow();
        assert_eq!(requests[1].mode, Mode::Chat);
        assert_eq!(requests[1].message.as_deref(), Some("install curl"));
    }

    #[test]
    fn unextractable_block_warns_and_clarifies() {
        let engine = ScriptedEngine::replies(&["Here:\n```\n\n```"]);
        let runner = ScriptedRunner::unused();
        let mut console = ScriptedConsole::new(Vec::new(), vec![""]);

        let end = run_session(&ctx(), &engine, &runner, &mut console).expect("session");

        assert_eq!(end, SessionEnd::UserExit);
        assert!(runner.executed.borrow().is_empty());
        assert!(
            console
                .warnings
                .iter()
                .any(|w| w.contains("could not extract"))
        );
    }

    #[test]
    fn only_the_first_of_several_blocks_is_executed() {
        let engine = ScriptedEngine::replies(&[
            "Step 1:\n```\necho one\n```\nStep 2:\n```\necho two\n```",
            "Done.",
        ]);
        let runner = ScriptedRunner::new(vec![outcome(0, "one", "")]);
        let mut console = ScriptedConsole::new(vec![true], vec![""]);

        run_session(&ctx(), &engine, &runner, &mut console).expect("session");

        assert_eq!(runner.executed.borrow().join(";"), "echo one");
        assert!(console.warnings.iter().any(|w| w.contains("only the first")));
    }

    #[test]
    fn timed_out_command_feeds_fix_mode() {
        let timed = crate::core::types::CommandOutcome {
            stdout: String::new(),
            stderr: "[killed after 300s timeout]".to_string(),
            exit_code: -1,
            timed_out: true,
        };
        let engine = ScriptedEngine::replies(&[
            "Run:\n```\nsleep 100000\n```",
            "That took too long.",
        ]);
        let runner = ScriptedRunner::new(vec![timed]);
        let mut console = ScriptedConsole::new(vec![true], vec![""]);

        run_session(&ctx(), &engine, &runner, &mut console).expect("session");

        let requests = engine.requests.borrow();
        assert_eq!(requests[1].mode, Mode::Fix);
        assert!(requests[1].message.as_deref().unwrap().contains("timed out"));
    }
}
