// src/exec/process.rs

//! Real process backend on top of `tokio::process`.
//!
//! On Unix the child's stdout and stderr share a single pipe, so the merged
//! stream preserves the order in which the child wrote to either. The child
//! is placed in its own process group; termination signals go to the whole
//! group so helpers like `script` take the tool down with them. Stdin is
//! `/dev/null`: a background group touching the caller's terminal would be
//! stopped with SIGTTOU.

use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::exec::backend::{HandleFuture, ProcessBackend, ProcessHandle, SpawnedProcess};
use crate::exec::command::ResolvedCommand;
use crate::types::EXIT_INTERNAL_ERROR;

/// Chunks buffered between the pipe reader and the drain loop.
const OUTPUT_CHANNEL_CAPACITY: usize = 256;

/// Backend that launches real OS processes.
#[derive(Debug, Clone, Default)]
pub struct RealProcessBackend;

impl ProcessBackend for RealProcessBackend {
    fn spawn(&self, cmd: &ResolvedCommand, cwd: &Path) -> io::Result<SpawnedProcess> {
        let (tx, rx) = mpsc::channel::<String>(OUTPUT_CHANNEL_CAPACITY);

        let mut command = Command::new(cmd.program());
        command
            .args(cmd.args())
            .current_dir(cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        #[cfg(unix)]
        command.process_group(0);

        let (child, readers) = spawn_merged(command, tx)?;
        let pid = child.id();
        debug!(pid, program = %cmd.program(), "child spawned");

        Ok(SpawnedProcess {
            handle: Box::new(OsProcess {
                child,
                pid,
                readers,
            }),
            output: rx,
        })
    }
}

#[cfg(unix)]
fn spawn_merged(
    mut command: Command,
    tx: mpsc::Sender<String>,
) -> io::Result<(Child, Vec<JoinHandle<()>>)> {
    use std::os::fd::OwnedFd;
    use tokio::net::unix::pipe;

    let (pipe_reader, pipe_writer) = std::io::pipe()?;
    command.stdout(pipe_writer.try_clone()?).stderr(pipe_writer);

    let child = command.spawn()?;
    // Our copies of the write end live in `command`; close them so the
    // reader sees EOF once the child side is gone.
    drop(command);

    let receiver = pipe::Receiver::from_owned_fd(OwnedFd::from(pipe_reader))?;
    let reader = tokio::spawn(forward_lines(receiver, tx));

    Ok((child, vec![reader]))
}

#[cfg(not(unix))]
fn spawn_merged(
    mut command: Command,
    tx: mpsc::Sender<String>,
) -> io::Result<(Child, Vec<JoinHandle<()>>)> {
    command.stdout(Stdio::piped()).stderr(Stdio::piped());

    let mut child = command.spawn()?;
    drop(command);

    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(tokio::spawn(forward_lines(stdout, tx.clone())));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(tokio::spawn(forward_lines(stderr, tx)));
    }

    Ok((child, readers))
}

/// Forward `reader` line by line into `tx` until end-of-stream.
///
/// Bytes are decoded lossily; each chunk keeps its trailing newline so the
/// concatenation of chunks reproduces the stream.
async fn forward_lines<R>(reader: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(1024);

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let chunk = String::from_utf8_lossy(&buf).into_owned();
                if tx.send(chunk).await.is_err() {
                    debug!("output receiver dropped; stopping reader");
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "error reading child output; closing stream");
                break;
            }
        }
    }

    debug!("child output reached end of stream");
}

/// Handle over a real child process.
struct OsProcess {
    child: Child,
    /// Captured at spawn; `Child::id` returns `None` once reaped.
    pid: Option<u32>,
    readers: Vec<JoinHandle<()>>,
}

impl Drop for OsProcess {
    fn drop(&mut self) {
        for reader in &self.readers {
            reader.abort();
        }
        // `kill_on_drop(true)` takes care of a still-running child.
    }
}

impl ProcessHandle for OsProcess {
    fn id(&self) -> Option<u32> {
        self.pid
    }

    fn try_wait(&mut self) -> io::Result<Option<i32>> {
        Ok(self.child.try_wait()?.map(exit_code))
    }

    fn wait(&mut self) -> HandleFuture<'_, i32> {
        Box::pin(async move { self.child.wait().await.map(exit_code) })
    }

    fn terminate(&mut self) -> io::Result<()> {
        #[cfg(unix)]
        let sent = signal_group(self.pid, nix::sys::signal::Signal::SIGTERM);

        // No graceful signal off Unix.
        #[cfg(not(unix))]
        let sent = self.child.start_kill();

        sent
    }

    fn kill(&mut self) -> HandleFuture<'_, ()> {
        Box::pin(async move {
            #[cfg(unix)]
            signal_group(self.pid, nix::sys::signal::Signal::SIGKILL)?;

            #[cfg(not(unix))]
            if self.child.try_wait()?.is_none() {
                self.child.start_kill()?;
            }

            self.child.wait().await?;
            Ok(())
        })
    }
}

/// Send `signal` to the process group led by `pid`. A group that is already
/// gone is not an error.
#[cfg(unix)]
fn signal_group(pid: Option<u32>, signal: nix::sys::signal::Signal) -> io::Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    let Some(pid) = pid else {
        return Ok(());
    };
    let raw = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("pid {pid} out of range")))?;

    match killpg(Pid::from_raw(raw), signal) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(io::Error::from(errno)),
    }
}

/// Exit code of a finished child; death by signal maps to `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }

    EXIT_INTERNAL_ERROR
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> ResolvedCommand {
        ResolvedCommand::direct(vec!["sh".into(), "-c".into(), script.into()]).unwrap()
    }

    async fn collect(mut rx: mpsc::Receiver<String>) -> String {
        let mut out = String::new();
        while let Some(chunk) = rx.recv().await {
            out.push_str(&chunk);
        }
        out
    }

    #[tokio::test]
    async fn merges_stdout_and_stderr_in_write_order() {
        let tmp = tempfile::tempdir().unwrap();
        let spawned = RealProcessBackend
            .spawn(&sh("echo one; echo two 1>&2; echo three"), tmp.path())
            .unwrap();
        let SpawnedProcess { mut handle, output } = spawned;

        let text = collect(output).await;
        assert_eq!(text, "one\ntwo\nthree\n");
        assert_eq!(handle.wait().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn runs_in_requested_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let expected = std::fs::canonicalize(tmp.path()).unwrap();
        let SpawnedProcess { mut handle, output } =
            RealProcessBackend.spawn(&sh("pwd -P"), tmp.path()).unwrap();

        let text = collect(output).await;
        assert_eq!(text.trim_end(), expected.to_string_lossy());
        handle.wait().await.unwrap();
    }

    #[tokio::test]
    async fn trailing_partial_line_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let SpawnedProcess { mut handle, output } = RealProcessBackend
            .spawn(&sh("printf 'a\\nno-newline'"), tmp.path())
            .unwrap();

        assert_eq!(collect(output).await, "a\nno-newline");
        handle.wait().await.unwrap();
    }

    #[tokio::test]
    async fn stdin_is_detached_from_the_caller() {
        let tmp = tempfile::tempdir().unwrap();
        let SpawnedProcess { mut handle, output } = RealProcessBackend
            .spawn(
                &sh("if read line; then echo got; else echo eof; fi; test -t 0 || echo no-tty"),
                tmp.path(),
            )
            .unwrap();

        assert_eq!(collect(output).await, "eof\nno-tty\n");
        assert_eq!(handle.wait().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn signal_death_maps_to_128_plus_signal() {
        let tmp = tempfile::tempdir().unwrap();
        let SpawnedProcess { mut handle, output: _output } =
            RealProcessBackend.spawn(&sh("kill -9 $$"), tmp.path()).unwrap();

        assert_eq!(handle.wait().await.unwrap(), 137);
    }

    #[tokio::test]
    async fn missing_program_fails_to_spawn() {
        let tmp = tempfile::tempdir().unwrap();
        let cmd = ResolvedCommand::direct(vec!["/nonexistent/kimi-run-test-bin".into()]).unwrap();
        let err = RealProcessBackend.spawn(&cmd, tmp.path()).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
