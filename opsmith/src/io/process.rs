//! Child-process execution with a deadline and bounded output capture.
//!
//! Both the command runner and the subprocess engine transport go through
//! here: spawn, feed optional stdin, drain stdout/stderr on reader threads
//! (so a chatty child can never deadlock on a full pipe), and kill the child
//! if the deadline expires.

use std::io::{Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Captured output of one child process.
#[derive(Debug)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Bytes discarded from either stream once the capture limit was hit.
    pub dropped_bytes: usize,
    /// The deadline expired and the child was killed.
    pub timed_out: bool,
}

/// Spawn `cmd`, optionally write `stdin`, and wait up to `deadline`.
///
/// At most `limit_bytes` of each stream is kept in memory; the rest is
/// drained and counted in `dropped_bytes`. Spawn failures propagate with
/// their original `io::Error` in the chain so callers can map the kind.
#[instrument(skip_all, fields(deadline_secs = deadline.as_secs(), limit_bytes))]
pub fn run_with_deadline(
    mut cmd: Command,
    stdin: Option<&[u8]>,
    deadline: Duration,
    limit_bytes: usize,
) -> Result<Captured> {
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = cmd.spawn().context("spawn child process")?;

    // The stdin write must not block the deadline: a payload larger than the
    // OS pipe buffer would otherwise stall here for as long as a non-reading
    // child lives. Write on a thread; dropping the pipe there delivers EOF.
    let writer = match stdin {
        Some(input) => {
            let mut pipe = child
                .stdin
                .take()
                .ok_or_else(|| anyhow!("stdin was not piped"))?;
            let buf = input.to_vec();
            Some(thread::spawn(move || pipe.write_all(&buf)))
        }
        None => None,
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;
    let stdout_reader = thread::spawn(move || drain_limited(stdout, limit_bytes));
    let stderr_reader = thread::spawn(move || drain_limited(stderr, limit_bytes));

    let mut timed_out = false;
    let status = match child.wait_timeout(deadline).context("wait for child")? {
        Some(status) => status,
        None => {
            warn!(deadline_secs = deadline.as_secs(), "child timed out, killing");
            timed_out = true;
            child.kill().context("kill child")?;
            child.wait().context("wait after kill")?
        }
    };

    // Killing (or normal exit of) the child unblocks the writer, so this
    // join cannot stall. A write failure against a child we just killed is
    // expected; otherwise it is a real transport error.
    if let Some(handle) = writer {
        let write_result = handle
            .join()
            .map_err(|_| anyhow!("stdin writer thread panicked"))?;
        if let Err(err) = write_result {
            if !timed_out {
                return Err(err).context("write stdin");
            }
            debug!(%err, "stdin write failed after timeout kill");
        }
    }

    let (stdout, stdout_dropped) = join_reader(stdout_reader).context("join stdout reader")?;
    let (stderr, stderr_dropped) = join_reader(stderr_reader).context("join stderr reader")?;
    let dropped_bytes = stdout_dropped + stderr_dropped;
    if dropped_bytes > 0 {
        warn!(dropped_bytes, "child output exceeded capture limit");
    }

    debug!(exit_code = ?status.code(), timed_out, "child finished");
    Ok(Captured {
        status,
        stdout,
        stderr,
        dropped_bytes,
        timed_out,
    })
}

fn join_reader(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    handle
        .join()
        .unwrap_or_else(|_| Err(anyhow!("reader thread panicked")))
}

/// Read a stream to EOF, keeping at most `limit` bytes and counting the rest.
fn drain_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut kept = Vec::new();
    let mut dropped = 0usize;
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).context("read child output")?;
        if n == 0 {
            break;
        }
        let room = limit.saturating_sub(kept.len());
        let take = n.min(room);
        kept.extend_from_slice(&chunk[..take]);
        dropped += n - take;
    }
    Ok((kept, dropped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_and_exit_status() {
        let mut cmd = Command::new("echo");
        cmd.arg("hello");
        let captured =
            run_with_deadline(cmd, None, Duration::from_secs(5), 64 * 1024).expect("run echo");
        assert!(captured.status.success());
        assert_eq!(String::from_utf8_lossy(&captured.stdout).trim(), "hello");
        assert!(!captured.timed_out);
    }

    #[test]
    fn feeds_stdin_to_child() {
        let cmd = Command::new("cat");
        let captured = run_with_deadline(cmd, Some(b"ping"), Duration::from_secs(5), 64 * 1024)
            .expect("run cat");
        assert_eq!(captured.stdout, b"ping");
    }

    #[test]
    fn kills_child_on_deadline() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let captured = run_with_deadline(cmd, None, Duration::from_millis(100), 1024)
            .expect("run sleep");
        assert!(captured.timed_out);
        assert!(!captured.status.success());
    }

    #[test]
    fn output_beyond_limit_is_dropped_not_buffered() {
        let mut cmd = Command::new("head");
        cmd.arg("-c").arg("10000").arg("/dev/zero");
        let captured =
            run_with_deadline(cmd, None, Duration::from_secs(5), 1000).expect("run head");
        assert_eq!(captured.stdout.len(), 1000);
        assert_eq!(captured.dropped_bytes, 9000);
    }

    #[test]
    fn deadline_covers_stdin_larger_than_the_pipe_buffer() {
        // A non-reading child must not stall the call on the stdin write.
        let mut cmd = Command::new("sleep");
        cmd.arg("10");
        let big = vec![b'x'; 200_000];
        let start = std::time::Instant::now();
        let captured = run_with_deadline(cmd, Some(&big), Duration::from_secs(1), 1024)
            .expect("run sleep with big stdin");
        assert!(captured.timed_out);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn spawn_failure_keeps_io_error_in_chain() {
        let cmd = Command::new("definitely-not-a-real-binary-770a1");
        let err = run_with_deadline(cmd, None, Duration::from_secs(1), 1024).unwrap_err();
        let io_err = err
            .downcast_ref::<std::io::Error>()
            .expect("io error in chain");
        assert_eq!(io_err.kind(), std::io::ErrorKind::NotFound);
    }
}
