//! # Run a single instance from spawn to exit.
//!
//! [`run_once`] launches one process and multiplexes three sources until the
//! process has exited:
//!
//! ```text
//!                 ┌─────────────────────────────┐
//! shutdown ──────►│                             │──► Killed     (once, if delivered)
//! output line ───►│  select! { biased; ... }    │──► Output/Eof (re-armed until EOF)
//! exit status ───►│                             │──► Completed  (terminal)
//!                 └─────────────────────────────┘
//! ```
//!
//! ## Rules
//! - Always publishes `Spawned` first and `Completed` last.
//! - Sources ready in the same wake-up are taken as shutdown → output → exit,
//!   so buffered output is never reported after the terminal line.
//! - The exit is checked after every output line. Output that keeps coming
//!   (e.g. from a background grandchild holding the pipe) never hides an exit.
//! - Once the exit is seen, only output that is already readable is drained,
//!   at most [`DRAIN_LIMIT`] bytes.
//! - The shutdown branch fires at most once; the output branch stops after EOF.
//! - A kill that finds the process already gone publishes nothing.
//! - The shutdown token is only observed, never cancelled.

use std::future;
use std::io;
use std::sync::Arc;

use futures::FutureExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    error::{KillError, ProcessError},
    events::{Bus, Event, EventKind},
    manifest::Env,
    process::Launch,
};

/// Upper bound on the output drained after the exit was observed.
///
/// Matches the default pipe capacity on Linux, which is all a process can have
/// left behind when it exits.
const DRAIN_LIMIT: usize = 64 * 1024;

/// Drives one process instance named `name` until it exits and returns its exit code.
///
/// `env` is passed verbatim to the launcher (`None` inherits).
/// Fails only if the process cannot be started or waited for; in that case no
/// `Completed` event is published.
pub async fn run_once(
    name: &str,
    argv: &[String],
    env: Option<&Env>,
    shutdown: &CancellationToken,
    launcher: &dyn Launch,
    bus: &Bus,
) -> Result<i32, ProcessError> {
    let mut instance = launcher.launch(argv, env)?;
    let pid = instance.pid();
    let name: Arc<str> = Arc::from(name);
    let event = |kind: EventKind| Event::now(kind).with_instance(Arc::clone(&name)).with_pid(pid);
    let publish = |read: io::Result<Option<String>>| -> bool {
        match read {
            Ok(Some(line)) => {
                bus.publish(event(EventKind::Output).with_line(line));
                true
            }
            Ok(None) => {
                bus.publish(event(EventKind::Eof));
                false
            }
            Err(e) => {
                warn!(instance = %name, pid, error = %e, "output read failed; treating as EOF");
                bus.publish(event(EventKind::Eof));
                false
            }
        }
    };

    bus.publish(event(EventKind::Spawned));

    let mut output = instance.take_output().map(BufReader::new);
    let mut buf = Vec::new();
    let mut kill_pending = true;

    let code = loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled(), if kill_pending => {
                kill_pending = false;
                match instance.kill() {
                    Ok(()) => bus.publish(event(EventKind::Killed)),
                    Err(KillError::AlreadyExited) => {}
                    Err(e) => warn!(instance = %name, pid, error = %e, "kill failed"),
                }
            }

            read = next_line(&mut output, &mut buf), if output.is_some() => {
                if !publish(read) {
                    output = None;
                } else if let Some(status) = task::unconstrained(instance.wait()).now_or_never() {
                    break status?;
                }
            }

            status = instance.wait() => break status?,
        }
    };

    let mut drained = 0;
    while output.is_some() && drained < DRAIN_LIMIT {
        let Some(read) = task::unconstrained(next_line(&mut output, &mut buf)).now_or_never() else {
            break;
        };
        if let Ok(Some(line)) = &read {
            drained += line.len() + 1;
        }
        if !publish(read) {
            output = None;
        }
    }

    bus.publish(event(EventKind::Completed).with_exit_code(code));
    Ok(code)
}

/// Reads the next line, without its terminator. `Ok(None)` is end of stream.
///
/// Pending forever when there is no reader. Partial reads stay in `buf`, so a
/// cancelled call loses nothing.
async fn next_line<R>(reader: &mut Option<R>, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let Some(reader) = reader.as_mut() else {
        return future::pending().await;
    };
    let n = reader.read_until(b'\n', buf).await?;
    if n == 0 && buf.is_empty() {
        return Ok(None);
    }

    let mut bytes = std::mem::take(buf);
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::{MockLauncher, next_line as recv_line};

    fn argv() -> Vec<String> {
        vec!["./server".to_string()]
    }

    fn start(
        launcher: Arc<MockLauncher>,
        token: CancellationToken,
        bus: Bus,
    ) -> tokio::task::JoinHandle<Result<i32, ProcessError>> {
        tokio::spawn(async move {
            run_once("web.0", &argv(), None, &token, &*launcher, &bus).await
        })
    }

    #[tokio::test]
    async fn output_eof_then_completed() {
        let (launcher, mut procs) = MockLauncher::new();
        let (bus, mut rx) = Bus::channel();
        let run = start(launcher, CancellationToken::new(), bus);

        let mut proc = procs.recv().await.unwrap();
        assert_eq!(recv_line(&mut rx).await, "[procvisor] web.0(1) spawned.");

        proc.feed(b"a\nb\n").await;
        proc.close_output();
        assert_eq!(recv_line(&mut rx).await, "[web.0] a");
        assert_eq!(recv_line(&mut rx).await, "[web.0] b");
        assert_eq!(recv_line(&mut rx).await, "[procvisor] EOF from web.0(1).");

        proc.complete(3);
        assert_eq!(
            recv_line(&mut rx).await,
            "[procvisor] web.0(1) completed with exit status 3."
        );
        assert_eq!(run.await.unwrap().unwrap(), 3);
        assert!(rx.recv().await.is_none());
        assert_eq!(proc.kills(), 0);
    }

    #[tokio::test]
    async fn partial_crlf_and_invalid_lines() {
        let (launcher, mut procs) = MockLauncher::new();
        let (bus, mut rx) = Bus::channel();
        let run = start(launcher, CancellationToken::new(), bus);

        let mut proc = procs.recv().await.unwrap();
        recv_line(&mut rx).await;

        proc.feed(b"dos\r\n").await;
        proc.feed(b"bad \xff byte\n").await;
        proc.feed(b"no newline").await;
        proc.close_output();
        assert_eq!(recv_line(&mut rx).await, "[web.0] dos");
        assert_eq!(recv_line(&mut rx).await, "[web.0] bad \u{fffd} byte");
        assert_eq!(recv_line(&mut rx).await, "[web.0] no newline");
        assert_eq!(recv_line(&mut rx).await, "[procvisor] EOF from web.0(1).");

        proc.complete(0);
        recv_line(&mut rx).await;
        run.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn shutdown_kills_live_instance() {
        let (launcher, mut procs) = MockLauncher::new();
        let (bus, mut rx) = Bus::channel();
        let token = CancellationToken::new();
        let run = start(launcher, token.clone(), bus);

        let proc = procs.recv().await.unwrap();
        assert_eq!(recv_line(&mut rx).await, "[procvisor] web.0(1) spawned.");

        token.cancel();
        assert_eq!(recv_line(&mut rx).await, "[procvisor] web.0(1) killed.");
        assert_eq!(
            recv_line(&mut rx).await,
            "[procvisor] web.0(1) completed with exit status -9."
        );
        assert_eq!(run.await.unwrap().unwrap(), -9);
        assert_eq!(proc.kills(), 1);
    }

    #[tokio::test]
    async fn shutdown_set_before_spawn_kills_at_once() {
        let (launcher, mut procs) = MockLauncher::new();
        let (bus, mut rx) = Bus::channel();
        let token = CancellationToken::new();
        token.cancel();
        let run = start(launcher, token, bus);

        let proc = procs.recv().await.unwrap();
        assert_eq!(recv_line(&mut rx).await, "[procvisor] web.0(1) spawned.");
        assert_eq!(recv_line(&mut rx).await, "[procvisor] web.0(1) killed.");
        assert_eq!(
            recv_line(&mut rx).await,
            "[procvisor] web.0(1) completed with exit status -9."
        );
        assert_eq!(run.await.unwrap().unwrap(), -9);
        assert_eq!(proc.kills(), 1);
    }

    #[tokio::test]
    async fn exit_racing_shutdown_completes_once() {
        let (launcher, mut procs) = MockLauncher::new();
        let (bus, mut rx) = Bus::channel();
        let token = CancellationToken::new();
        let run = start(launcher, token.clone(), bus);

        let proc = procs.recv().await.unwrap();
        recv_line(&mut rx).await;

        // Both become ready before the supervisor wakes up again.
        proc.complete(0);
        token.cancel();

        assert_eq!(
            recv_line(&mut rx).await,
            "[procvisor] web.0(1) completed with exit status 0."
        );
        assert_eq!(run.await.unwrap().unwrap(), 0);
        assert!(rx.recv().await.is_none());
        assert_eq!(proc.kills(), 0);
    }

    #[tokio::test]
    async fn completed_before_shutdown_is_not_killed() {
        let (launcher, mut procs) = MockLauncher::new();
        let (bus, mut rx) = Bus::channel();
        let token = CancellationToken::new();
        let run = start(launcher, token.clone(), bus);

        let proc = procs.recv().await.unwrap();
        recv_line(&mut rx).await;
        proc.complete(1);
        assert_eq!(
            recv_line(&mut rx).await,
            "[procvisor] web.0(1) completed with exit status 1."
        );
        assert_eq!(run.await.unwrap().unwrap(), 1);

        token.cancel();
        assert!(rx.recv().await.is_none());
        assert_eq!(proc.kills(), 0);
    }

    #[tokio::test]
    async fn exit_is_seen_while_output_never_pauses() {
        let launcher = MockLauncher::flooding(7);
        let (bus, mut rx) = Bus::channel();
        let token = CancellationToken::new();

        let code = tokio::time::timeout(
            Duration::from_secs(5),
            run_once("web.0", &argv(), None, &token, &*launcher, &bus),
        )
        .await
        .expect("exit noticed")
        .unwrap();
        assert_eq!(code, 7);
        drop(bus);

        let mut events = Vec::new();
        while let Some(ev) = rx.recv().await {
            events.push(ev);
        }
        let outputs = events.iter().filter(|e| e.kind == EventKind::Output).count();
        assert!(outputs >= 1);
        assert!(outputs <= DRAIN_LIMIT, "{outputs} lines drained");
        assert!(events.iter().all(|e| e.kind != EventKind::Eof));
        let last = events.last().unwrap();
        assert_eq!(last.kind, EventKind::Completed);
        assert_eq!(last.exit_code, Some(7));
    }

    #[tokio::test]
    async fn launch_failure_publishes_nothing() {
        let launcher = MockLauncher::failing();
        let (bus, mut rx) = Bus::channel();
        let run = start(launcher, CancellationToken::new(), bus);

        let err = run.await.unwrap().unwrap_err();
        assert_eq!(err.as_label(), "process_spawn_failed");
        assert!(rx.recv().await.is_none());
    }
}
