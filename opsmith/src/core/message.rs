//! Outbound message construction and mode derivation.
//!
//! Everything here is pure: the session controller feeds in the previous
//! iteration's outcome and gets back the next `(mode, message)` pair plus the
//! rendered payload for the engine. The engine parses the payload as natural
//! language, so this is plain text with an embedded fenced JSON block for
//! facts, not a schema-validated format.

use std::sync::LazyLock;

use minijinja::{Environment, context};

use crate::core::types::{CommandOutcome, EngineRequest, Mode};

const PAYLOAD_TEMPLATE: &str = include_str!("templates/payload.md");
const SUCCESS_TEMPLATE: &str = include_str!("templates/success_report.md");
const FAILURE_TEMPLATE: &str = include_str!("templates/failure_report.md");

/// User-authored clarify input is capped at this many characters.
pub const CLARIFY_LIMIT_CHARS: usize = 256;

static TEMPLATES: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.add_template("payload", PAYLOAD_TEMPLATE)
        .expect("payload template should be valid");
    env.add_template("success", SUCCESS_TEMPLATE)
        .expect("success template should be valid");
    env.add_template("failure", FAILURE_TEMPLATE)
        .expect("failure template should be valid");
    env
});

/// Render the outbound payload for one engine call.
///
/// Non-trivial facts are prepended as a fenced JSON block; the message (if
/// any) follows after a separator. When both are absent a fixed placeholder
/// keeps the input non-empty.
pub fn render_payload(request: &EngineRequest) -> String {
    let facts = request.facts_json.trim();
    let facts = (!facts.is_empty() && facts != "{}").then_some(facts);
    let rendered = TEMPLATES
        .get_template("payload")
        .expect("payload template registered")
        .render(context! {
            product => request.product,
            operation => request.operation,
            mode => request.mode.as_str(),
            facts => facts,
            message => request.message.as_deref().map(str::trim).filter(|m| !m.is_empty()),
        })
        .expect("payload template should render");
    rendered.trim_end().to_string()
}

/// Next mode and outbound message, derived from one iteration's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub mode: Mode,
    pub message: String,
}

impl Transition {
    /// Derive the next state after executing `command`.
    ///
    /// Exit code 0 yields `Execute` with a success report; anything else
    /// (non-zero exit, launch failure, timeout) yields `Fix` with a failure
    /// report asking for corrections.
    pub fn after_run(command: &str, outcome: &CommandOutcome) -> Self {
        let stdout = marker_or(&outcome.stdout, "[No stdout]");
        let stderr = marker_or(&outcome.stderr, "[No stderr]");
        if outcome.success() {
            let message = TEMPLATES
                .get_template("success")
                .expect("success template registered")
                .render(context! { command, stdout, stderr })
                .expect("success template should render");
            Transition {
                mode: Mode::Execute,
                message,
            }
        } else {
            let message = TEMPLATES
                .get_template("failure")
                .expect("failure template registered")
                .render(context! {
                    command,
                    stdout,
                    stderr,
                    exit_code => outcome.exit_code,
                    timed_out => outcome.timed_out,
                })
                .expect("failure template should render");
            Transition {
                mode: Mode::Fix,
                message,
            }
        }
    }

    /// Derive the next state from a non-empty clarify response.
    pub fn from_clarify(input: &str) -> Self {
        Transition {
            mode: Mode::Chat,
            message: cap_clarify(input),
        }
    }
}

/// Enforce the clarify length limit, counting characters rather than bytes so
/// the cut never lands inside a code point.
pub fn cap_clarify(input: &str) -> String {
    input.chars().take(CLARIFY_LIMIT_CHARS).collect()
}

fn marker_or<'a>(text: &'a str, marker: &'a str) -> &'a str {
    if text.trim().is_empty() { marker } else { text }
}
