//! Stable process exit codes.

/// Normal or user-initiated termination (menu exit, empty clarify input).
pub const OK: i32 = 0;
/// Unrecoverable failure: engine unavailable or setup error (bad config).
pub const FATAL: i32 = 1;
