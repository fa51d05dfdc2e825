//! # Combined log stream writer.
//!
//! [`LogWriter`] renders every event as one line of the combined log stream
//! and writes it to an async sink (stdout by default). Each line is written
//! whole and flushed before the next one.
//!
//! ## Output format
//! ```text
//! 2024-05-01T12:00:00.000123 [procvisor] web.0(4242) spawned.
//! 2024-05-01T12:00:00.004711 [web.0] listening on :5000
//! 2024-05-01T12:00:09.100000 [procvisor] web.0(4242) killed.
//! 2024-05-01T12:00:09.100950 [procvisor] EOF from web.0(4242).
//! 2024-05-01T12:00:09.101002 [procvisor] web.0(4242) completed with exit status -9.
//! ```
//!
//! Timestamps are naive local time, or UTC with a `+00:00` offset when
//! [`Config::utc`](crate::Config::utc) is set.

use std::io;
use std::pin::Pin;
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::core::Config;
use crate::events::Event;
use crate::subscribers::Subscribe;

/// Renders `at` as ISO-8601 with microseconds.
pub fn format_timestamp(at: SystemTime, utc: bool) -> String {
    if utc {
        DateTime::<Utc>::from(at)
            .format("%Y-%m-%dT%H:%M:%S%.6f+00:00")
            .to_string()
    } else {
        DateTime::<Local>::from(at)
            .naive_local()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string()
    }
}

/// Renders the `[<source>] <text>` part of a line (no timestamp).
pub fn format_body(ev: &Event, tag: &str) -> String {
    format!("[{}] {}", ev.source(tag), ev.text())
}

type Sink = Pin<Box<dyn AsyncWrite + Send>>;

/// Line-oriented writer of the combined log stream.
pub struct LogWriter {
    sink: Mutex<Sink>,
    tag: String,
    utc: bool,
}

impl LogWriter {
    /// Creates a writer over an arbitrary sink.
    pub fn new(sink: impl AsyncWrite + Send + 'static, cfg: &Config) -> Self {
        let sink: Sink = Box::pin(sink);
        Self {
            sink: Mutex::new(sink),
            tag: cfg.tag().to_string(),
            utc: cfg.utc,
        }
    }

    /// Creates a writer over the process' standard output.
    pub fn stdout(cfg: &Config) -> Self {
        Self::new(tokio::io::stdout(), cfg)
    }

    /// Renders one full line, without the trailing newline.
    pub fn render(&self, ev: &Event) -> String {
        format!("{} {}", format_timestamp(ev.at, self.utc), format_body(ev, &self.tag))
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, ev: &Event) {
        let mut line = self.render(ev);
        line.push('\n');
        let mut sink = self.sink.lock().await;
        if let Err(e) = write_line(&mut sink, &line).await {
            tracing::warn!(error = %e, "cannot write log line");
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}

async fn write_line(sink: &mut Sink, line: &str) -> io::Result<()> {
    sink.write_all(line.as_bytes()).await?;
    sink.flush().await
}
