//! Reasoning engine client.
//!
//! The [`Engine`] trait is the transport seam: the session controller only
//! ever sees one synchronous `call`, and test doubles implement the same
//! trait without spawning anything. The real transport spawns a configured
//! engine command, writes the rendered payload to its stdin, and reads the
//! reply from its stdout.

use std::process::Command;
use std::time::Duration;

use tracing::{debug, warn};

use crate::core::message::render_payload;
use crate::core::types::{EngineRequest, EngineResponse};
use crate::io::process::run_with_deadline;

/// Abstraction over the remote reasoning engine.
///
/// Implementations must never let a transport failure escape: every failure
/// converts to [`EngineResponse::Unavailable`]. No retries, no backoff; one
/// `Unavailable` is terminal for the current iteration.
pub trait Engine {
    fn call(&self, request: &EngineRequest) -> EngineResponse;
}

/// Engine backed by a subprocess (payload on stdin, reply on stdout).
pub struct ProcessEngine {
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl ProcessEngine {
    pub fn new(command: Vec<String>, timeout: Duration, output_limit_bytes: usize) -> Self {
        Self {
            command,
            timeout,
            output_limit_bytes,
        }
    }
}

impl Engine for ProcessEngine {
    fn call(&self, request: &EngineRequest) -> EngineResponse {
        let Some((program, args)) = self.command.split_first() else {
            return unavailable("engine command is empty");
        };
        let payload = render_payload(request);
        debug!(%program, mode = request.mode.as_str(), "calling engine");

        let mut cmd = Command::new(program);
        cmd.args(args);
        let captured = match run_with_deadline(
            cmd,
            Some(payload.as_bytes()),
            self.timeout,
            self.output_limit_bytes,
        ) {
            Ok(captured) => captured,
            Err(err) => return unavailable(&format!("engine call failed: {err:#}")),
        };

        if captured.timed_out {
            return unavailable(&format!(
                "engine call timed out after {}s",
                self.timeout.as_secs()
            ));
        }
        if !captured.status.success() {
            let stderr = String::from_utf8_lossy(&captured.stderr);
            return unavailable(&format!(
                "engine exited with status {:?}: {}",
                captured.status.code(),
                stderr.trim()
            ));
        }

        EngineResponse::Reply(String::from_utf8_lossy(&captured.stdout).to_string())
    }
}

fn unavailable(reason: &str) -> EngineResponse {
    warn!(reason, "engine unavailable");
    EngineResponse::Unavailable {
        reason: reason.to_string(),
    }
}
