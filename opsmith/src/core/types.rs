//! Shared deterministic types for session core logic.
//!
//! These types define the contracts between the session controller and its
//! collaborators. They carry no I/O and stay stable across iterations.

/// Framing label attached to the next outbound engine request.
///
/// Modes are not independent states with bespoke transition tables: each is a
/// projection of the previous iteration's outcome (succeeded / failed / no
/// command ran) for the engine's benefit. Serialization into the payload goes
/// through [`Mode::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Ask for the next command toward the goal.
    Execute,
    /// The last command failed; ask for corrections.
    Fix,
    /// Free-text conversation, no prior command outcome.
    Chat,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Execute => "execute",
            Mode::Fix => "fix",
            Mode::Chat => "chat",
        }
    }
}

/// Captured result of running one shell command.
///
/// Produced once per execution and consumed immediately to build the next
/// engine request; never persisted beyond one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub timed_out: bool,
}

impl CommandOutcome {
    /// True when the command ran to completion with exit code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// Immutable request value sent to the reasoning engine, built fresh each
/// iteration from the live session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRequest {
    pub product: String,
    pub operation: String,
    pub mode: Mode,
    /// Report or user message from the previous iteration, if any.
    pub message: Option<String>,
    /// Compact JSON snapshot of host facts ("{}" when collection failed).
    pub facts_json: String,
}

/// Engine reply, or an explicit unavailable marker.
///
/// `Unavailable` is distinct from `Reply(String::new())`: the former means the
/// transport failed, the latter means the engine answered with empty content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineResponse {
    Reply(String),
    Unavailable { reason: String },
}

/// Why the session loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user chose to stop (empty clarify input or menu exit).
    UserExit,
    /// The engine transport failed; the one non-recoverable condition.
    EngineUnavailable,
}
