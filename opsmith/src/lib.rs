//! Interactive AI-assisted ops CLI.
//!
//! Turns natural-language operational requests into shell commands, executes
//! them with explicit user confirmation, and feeds the results back to a
//! reasoning engine until the goal is reached or the user stops. The
//! architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (block parsing, message
//!   construction, mode derivation). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting collaborators (processes, engine transport,
//!   host facts, terminal, config). Each replaceable behind a trait.
//!
//! [`session`] coordinates core logic with I/O to implement the conversation
//! loop; [`main`](../opsmith) wires the real collaborators together.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
