//! The command runner: executes one engine-suggested command string.
//!
//! Command text is tokenized with shell-word semantics (quotes and escapes
//! honored) and executed as a literal argv. No shell is ever involved: pipes,
//! globs, redirection, and variable expansion are not interpreted, so
//! engine-suggested text cannot smuggle shell metacharacters past the user's
//! confirmation. Do not "fix" this by delegating to `sh -c`.

use std::process::Command;
use std::time::Duration;

use tracing::{debug, warn};

use crate::core::types::CommandOutcome;
use crate::io::process::run_with_deadline;

/// Abstraction over command execution, injected into the session controller.
///
/// Infallible by contract: launch failures are encoded in the outcome's
/// conventional exit codes rather than surfaced as errors.
pub trait CommandRunner {
    fn run(&self, command_text: &str) -> CommandOutcome;
}

/// Real runner: spawns the tokenized argv as a child process.
pub struct ShellRunner {
    timeout: Duration,
    output_limit_bytes: usize,
}

impl ShellRunner {
    pub fn new(timeout: Duration, output_limit_bytes: usize) -> Self {
        Self {
            timeout,
            output_limit_bytes,
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command_text: &str) -> CommandOutcome {
        if command_text.trim().is_empty() {
            return failure(-1, "empty command");
        }

        let argv = match shell_words::split(command_text) {
            Ok(argv) => argv,
            Err(err) => return failure(-1, &format!("invalid command syntax: {err}")),
        };
        let Some((program, args)) = argv.split_first() else {
            return failure(-1, "empty command");
        };

        debug!(%program, args = args.len(), "running command");
        let mut cmd = Command::new(program);
        cmd.args(args);

        let captured = match run_with_deadline(cmd, None, self.timeout, self.output_limit_bytes) {
            Ok(captured) => captured,
            Err(err) => {
                let outcome = match err.downcast_ref::<std::io::Error>().map(|e| e.kind()) {
                    Some(std::io::ErrorKind::NotFound) => failure(
                        127,
                        &format!("command not found: '{program}'. Is it installed and in PATH?"),
                    ),
                    Some(std::io::ErrorKind::PermissionDenied) => {
                        failure(126, &format!("permission denied running '{program}'"))
                    }
                    _ => failure(-1, &format!("failed to run command: {err:#}")),
                };
                warn!(exit_code = outcome.exit_code, "command launch failed");
                return outcome;
            }
        };

        let mut stderr = String::from_utf8_lossy(&captured.stderr)
            .trim_end()
            .to_string();
        if captured.dropped_bytes > 0 {
            push_note(
                &mut stderr,
                &format!("[output truncated: {} bytes dropped]", captured.dropped_bytes),
            );
        }
        if captured.timed_out {
            push_note(
                &mut stderr,
                &format!("[killed after {}s timeout]", self.timeout.as_secs()),
            );
        }

        CommandOutcome {
            stdout: String::from_utf8_lossy(&captured.stdout)
                .trim_end()
                .to_string(),
            stderr,
            // Killed by signal (including our own timeout kill) has no code.
            exit_code: captured.status.code().unwrap_or(-1),
            timed_out: captured.timed_out,
        }
    }
}

fn failure(exit_code: i32, stderr: &str) -> CommandOutcome {
    CommandOutcome {
        stdout: String::new(),
        stderr: stderr.to_string(),
        exit_code,
        timed_out: false,
    }
}

fn push_note(stderr: &mut String, note: &str) {
    if !stderr.is_empty() {
        stderr.push('\n');
    }
    stderr.push_str(note);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> ShellRunner {
        ShellRunner::new(Duration::from_secs(5), 64 * 1024)
    }

    #[test]
    fn empty_and_whitespace_commands_fail_without_spawning() {
        for text in ["", "   ", "\n\t"] {
            let outcome = runner().run(text);
            assert_eq!(outcome.exit_code, -1);
            assert_eq!(outcome.stderr, "empty command");
            assert_eq!(outcome.stdout, "");
        }
    }

    #[test]
    fn zero_exit_passes_through_with_trimmed_stdout() {
        let outcome = runner().run("echo hi");
        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.stdout, "hi");
        assert!(!outcome.timed_out);
    }

    #[test]
    fn nonzero_exit_passes_through_unchanged() {
        let outcome = runner().run("false");
        assert_eq!(outcome.exit_code, 1);
    }

    #[test]
    fn missing_executable_maps_to_127() {
        let outcome = runner().run("definitely-not-a-real-binary-770a1");
        assert_eq!(outcome.exit_code, 127);
        assert!(outcome.stderr.contains("command not found"));
    }

    #[test]
    fn unbalanced_quote_maps_to_minus_one() {
        let outcome = runner().run("echo 'unterminated");
        assert_eq!(outcome.exit_code, -1);
        assert!(outcome.stderr.contains("invalid command syntax"));
    }

    #[test]
    fn quotes_are_honored_but_metacharacters_are_literal() {
        let outcome = runner().run("echo 'a b' *");
        assert_eq!(outcome.exit_code, 0);
        // Literal argv: the glob is not expanded by any shell.
        assert_eq!(outcome.stdout, "a b *");
    }

    #[test]
    fn timeout_kills_and_marks_outcome() {
        let slow = ShellRunner::new(Duration::from_millis(100), 1024);
        let outcome = slow.run("sleep 5");
        assert!(outcome.timed_out);
        assert_ne!(outcome.exit_code, 0);
        assert!(outcome.stderr.contains("timeout"));
    }
}
