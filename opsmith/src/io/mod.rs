//! Side-effecting collaborators: processes, the engine transport, host
//! facts, terminal interaction, and configuration. Each is replaceable
//! behind a trait or a narrow function boundary.

pub mod command;
pub mod config;
pub mod engine;
pub mod facts;
pub mod process;
pub mod terminal;
