//! A `ProcessBackend` whose children are scripted in memory.
//!
//! Each spawn replays a [`FakeScript`]: timed output chunks followed by an
//! exit behaviour. The backend records every spawn and every signal it is
//! asked to deliver, so tests can assert on both without touching real
//! processes.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use kimi_run::exec::backend::HandleFuture;
use kimi_run::exec::{ProcessBackend, ProcessHandle, ResolvedCommand, SpawnedProcess};

const SIGTERM_CODE: i32 = 128 + 15;
const SIGKILL_CODE: i32 = 128 + 9;
const FAKE_PID: u32 = 4242;

/// What the scripted child does after its output is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeExit {
    /// Close the stream and exit with this code.
    Code(i32),
    /// Keep running until signalled. When `ignores_term` is set only a
    /// forced kill stops it.
    Hang { ignores_term: bool },
}

#[derive(Debug, Clone)]
pub struct FakeScript {
    chunks: Vec<(Duration, String)>,
    exit: FakeExit,
    /// Output that keeps arriving after exit, like a backgrounded grandchild
    /// still holding the pipe.
    after_exit: Option<(Duration, String)>,
}

impl FakeScript {
    pub fn exits_with(code: i32) -> Self {
        Self {
            chunks: Vec::new(),
            exit: FakeExit::Code(code),
            after_exit: None,
        }
    }

    pub fn hangs() -> Self {
        Self {
            chunks: Vec::new(),
            exit: FakeExit::Hang {
                ignores_term: false,
            },
            after_exit: None,
        }
    }

    pub fn ignores_term() -> Self {
        Self {
            chunks: Vec::new(),
            exit: FakeExit::Hang { ignores_term: true },
            after_exit: None,
        }
    }

    /// Emit `chunk` immediately after the previous one.
    pub fn chunk(self, chunk: &str) -> Self {
        self.chunk_after(Duration::ZERO, chunk)
    }

    /// Emit `chunk` after `delay`.
    pub fn chunk_after(mut self, delay: Duration, chunk: &str) -> Self {
        self.chunks.push((delay, chunk.to_string()));
        self
    }

    /// After a `Code` exit, keep emitting `chunk` every `every` without ever
    /// closing the stream.
    pub fn keeps_writing_after_exit(mut self, every: Duration, chunk: &str) -> Self {
        self.after_exit = Some((every, chunk.to_string()));
        self
    }
}

/// Signal delivered to a fake child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    Term,
    Kill,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRecord {
    pub argv: Vec<String>,
    pub cwd: PathBuf,
}

#[derive(Debug, Default)]
struct BackendState {
    spawns: Vec<SpawnRecord>,
    signals: Vec<SignalEvent>,
}

/// Scripted backend. Cloning shares the recorded state.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    script: FakeScript,
    spawn_error: Option<io::ErrorKind>,
    state: Arc<Mutex<BackendState>>,
}

impl FakeBackend {
    pub fn new(script: FakeScript) -> Self {
        Self {
            script,
            spawn_error: None,
            state: Arc::new(Mutex::new(BackendState::default())),
        }
    }

    /// Backend whose every spawn fails with `kind`.
    pub fn failing(kind: io::ErrorKind) -> Self {
        Self {
            spawn_error: Some(kind),
            ..Self::new(FakeScript::exits_with(0))
        }
    }

    /// Spawn attempts, including failed ones.
    pub fn spawns(&self) -> Vec<SpawnRecord> {
        self.state.lock().unwrap().spawns.clone()
    }

    pub fn signals(&self) -> Vec<SignalEvent> {
        self.state.lock().unwrap().signals.clone()
    }
}

impl ProcessBackend for FakeBackend {
    fn spawn(&self, cmd: &ResolvedCommand, cwd: &Path) -> io::Result<SpawnedProcess> {
        self.state.lock().unwrap().spawns.push(SpawnRecord {
            argv: cmd.argv().to_vec(),
            cwd: cwd.to_path_buf(),
        });

        if let Some(kind) = self.spawn_error {
            return Err(io::Error::new(kind, "scripted spawn failure"));
        }

        let (tx, rx) = mpsc::channel(64);
        let (exit_tx, exit_rx) = watch::channel(None);
        let exit_tx = Arc::new(exit_tx);

        let script = self.script.clone();
        let ignores_term = matches!(script.exit, FakeExit::Hang { ignores_term: true });
        let feeder_exit = Arc::clone(&exit_tx);
        let feeder = tokio::spawn(async move {
            for (delay, chunk) in script.chunks {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if tx.send(chunk).await.is_err() {
                    return;
                }
            }
            match script.exit {
                FakeExit::Code(code) => match script.after_exit {
                    None => {
                        drop(tx);
                        feeder_exit.send_replace(Some(code));
                    }
                    Some((every, chunk)) => {
                        feeder_exit.send_replace(Some(code));
                        loop {
                            tokio::time::sleep(every).await;
                            if tx.send(chunk.clone()).await.is_err() {
                                return;
                            }
                        }
                    }
                },
                FakeExit::Hang { .. } => {
                    let _open = tx;
                    std::future::pending::<()>().await;
                }
            }
        });

        Ok(SpawnedProcess {
            handle: Box::new(FakeHandle {
                state: Arc::clone(&self.state),
                exit_tx,
                exit_rx,
                feeder,
                ignores_term,
            }),
            output: rx,
        })
    }
}

struct FakeHandle {
    state: Arc<Mutex<BackendState>>,
    exit_tx: Arc<watch::Sender<Option<i32>>>,
    exit_rx: watch::Receiver<Option<i32>>,
    feeder: JoinHandle<()>,
    ignores_term: bool,
}

impl FakeHandle {
    fn record(&self, signal: SignalEvent) {
        self.state.lock().unwrap().signals.push(signal);
    }

    /// Stop the child with `code` unless it already exited.
    fn stop(&self, code: i32) {
        self.feeder.abort();
        self.exit_tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(code);
                true
            } else {
                false
            }
        });
    }
}

impl ProcessHandle for FakeHandle {
    fn id(&self) -> Option<u32> {
        Some(FAKE_PID)
    }

    fn try_wait(&mut self) -> io::Result<Option<i32>> {
        Ok(*self.exit_rx.borrow())
    }

    fn wait(&mut self) -> HandleFuture<'_, i32> {
        Box::pin(async move {
            let code = *self
                .exit_rx
                .wait_for(Option::is_some)
                .await
                .map_err(|e| io::Error::other(e.to_string()))?;
            Ok(code.unwrap_or(SIGKILL_CODE))
        })
    }

    fn terminate(&mut self) -> io::Result<()> {
        self.record(SignalEvent::Term);
        if !self.ignores_term {
            self.stop(SIGTERM_CODE);
        }
        Ok(())
    }

    fn kill(&mut self) -> HandleFuture<'_, ()> {
        self.record(SignalEvent::Kill);
        self.stop(SIGKILL_CODE);
        Box::pin(async { Ok(()) })
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.feeder.abort();
    }
}
