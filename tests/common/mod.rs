#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use procvisor::{DEFAULT_TAG, Event, Subscribe, format_body};
use tokio::sync::mpsc;

/// Forwards every event, rendered as `[source] text`, to the test.
pub struct Lines {
    tx: mpsc::UnboundedSender<String>,
}

impl Lines {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl Subscribe for Lines {
    async fn on_event(&self, event: &Event) {
        let _ = self.tx.send(format_body(event, DEFAULT_TAG));
    }

    fn name(&self) -> &'static str {
        "lines"
    }
}

pub async fn next(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out waiting for a line")
        .expect("stream closed")
}

/// Reads lines until one satisfies `pred`, returning everything read.
pub async fn until(
    rx: &mut mpsc::UnboundedReceiver<String>,
    mut pred: impl FnMut(&str) -> bool,
) -> Vec<String> {
    let mut seen = Vec::new();
    loop {
        let line = next(rx).await;
        let done = pred(&line);
        seen.push(line);
        if done {
            return seen;
        }
    }
}

pub fn sh(script: &str) -> Vec<String> {
    vec!["/bin/sh".into(), "-c".into(), script.into()]
}
