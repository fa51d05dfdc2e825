//! Scripted launcher and recording subscriber for unit tests.
//!
//! [`MockLauncher`] hands every launched process to the test as a
//! [`MockProcess`]. The test feeds output, closes it and completes the
//! process. A kill completes it with `-9` on a later scheduler turn, the way a
//! real SIGKILL is only observed asynchronously.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWriteExt, DuplexStream, ReadBuf};
use tokio::sync::{mpsc, watch};

use crate::core::DEFAULT_TAG;
use crate::error::{KillError, ProcessError};
use crate::events::{BusReceiver, Event};
use crate::manifest::Env;
use crate::process::{Instance, Launch, Output};
use crate::subscribers::{Subscribe, format_body};

const PIPE_CAPACITY: usize = 64 * 1024;
const FLOOD_LINE: &[u8] = b"flood\n";

pub(crate) struct MockLauncher {
    next_pid: AtomicU32,
    fail: bool,
    flood_exit: Option<i32>,
    procs: Option<mpsc::UnboundedSender<MockProcess>>,
}

impl MockLauncher {
    pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<MockProcess>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let launcher = Self {
            next_pid: AtomicU32::new(1),
            fail: false,
            flood_exit: None,
            procs: Some(tx),
        };
        (Arc::new(launcher), rx)
    }

    /// A launcher whose every launch fails like a missing program.
    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self {
            next_pid: AtomicU32::new(1),
            fail: true,
            flood_exit: None,
            procs: None,
        })
    }

    /// A launcher whose processes have already exited with `code` but whose
    /// output never runs dry.
    pub(crate) fn flooding(code: i32) -> Arc<Self> {
        Arc::new(Self {
            next_pid: AtomicU32::new(1),
            fail: false,
            flood_exit: Some(code),
            procs: None,
        })
    }
}

impl Launch for MockLauncher {
    fn launch(&self, argv: &[String], env: Option<&Env>) -> Result<Box<dyn Instance>, ProcessError> {
        let program = argv.first().ok_or(ProcessError::EmptyCommand)?;
        if self.fail {
            return Err(ProcessError::Spawn {
                program: program.clone(),
                source: io::Error::from(io::ErrorKind::NotFound),
            });
        }

        let pid = self.next_pid.fetch_add(1, Ordering::Relaxed);
        let (reader, writer) = tokio::io::duplex(PIPE_CAPACITY);
        let output: Output = match self.flood_exit {
            Some(_) => Box::pin(Flood),
            None => Box::pin(reader),
        };
        let (exit_tx, exit_rx) = watch::channel(self.flood_exit);
        let exit_tx = Arc::new(exit_tx);
        let kills = Arc::new(AtomicUsize::new(0));

        let control = MockProcess {
            pid,
            argv: argv.to_vec(),
            env: env.cloned(),
            writer: Some(writer),
            exit: Arc::clone(&exit_tx),
            kills: Arc::clone(&kills),
        };
        if let Some(procs) = &self.procs {
            let _ = procs.send(control);
        }

        Ok(Box::new(MockInstance {
            pid,
            output: Some(output),
            exit_rx,
            exit_tx,
            kills,
        }))
    }
}

/// Test-side controls of one launched process.
pub(crate) struct MockProcess {
    pub(crate) pid: u32,
    pub(crate) argv: Vec<String>,
    pub(crate) env: Option<Env>,
    writer: Option<DuplexStream>,
    exit: Arc<watch::Sender<Option<i32>>>,
    kills: Arc<AtomicUsize>,
}

impl MockProcess {
    pub(crate) async fn feed(&mut self, bytes: &[u8]) {
        let writer = self.writer.as_mut().expect("output already closed");
        writer.write_all(bytes).await.expect("reader alive");
    }

    pub(crate) fn close_output(&mut self) {
        self.writer = None;
    }

    /// Exits with `code` unless the process already exited.
    pub(crate) fn complete(&self, code: i32) {
        complete(&self.exit, code);
    }

    /// Number of delivered kills.
    pub(crate) fn kills(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

fn complete(exit: &watch::Sender<Option<i32>>, code: i32) {
    exit.send_if_modified(|status| {
        if status.is_some() {
            return false;
        }
        *status = Some(code);
        true
    });
}

/// Output that always has whole lines ready and never ends.
struct Flood;

impl AsyncRead for Flood {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        while buf.remaining() >= FLOOD_LINE.len() {
            buf.put_slice(FLOOD_LINE);
        }
        Poll::Ready(Ok(()))
    }
}

struct MockInstance {
    pid: u32,
    output: Option<Output>,
    exit_rx: watch::Receiver<Option<i32>>,
    exit_tx: Arc<watch::Sender<Option<i32>>>,
    kills: Arc<AtomicUsize>,
}

#[async_trait]
impl Instance for MockInstance {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn take_output(&mut self) -> Option<Output> {
        self.output.take()
    }

    async fn wait(&mut self) -> Result<i32, ProcessError> {
        let pid = self.pid;
        let status = self
            .exit_rx
            .wait_for(Option::is_some)
            .await
            .map(|status| *status)
            .map_err(|e| ProcessError::Wait { pid, source: io::Error::other(e) })?;
        Ok(status.unwrap_or(-1))
    }

    fn kill(&mut self) -> Result<(), KillError> {
        if self.exit_tx.borrow().is_some() {
            return Err(KillError::AlreadyExited);
        }
        self.kills.fetch_add(1, Ordering::SeqCst);
        let exit = Arc::clone(&self.exit_tx);
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            complete(&exit, -9);
        });
        Ok(())
    }
}

/// Streams every event as `[source] text`.
pub(crate) struct Recorder {
    tx: mpsc::UnboundedSender<String>,
}

impl Recorder {
    pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        let _ = self.tx.send(format_body(event, DEFAULT_TAG));
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

/// Next bus event rendered as `[source] text`.
pub(crate) async fn next_line(rx: &mut BusReceiver) -> String {
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("bus closed");
    format_body(&event, DEFAULT_TAG)
}

/// Next recorded line.
pub(crate) async fn next_recorded(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a line")
        .expect("recorder closed")
}
