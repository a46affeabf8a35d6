//! Shared fakes for watch engine integration tests.

#![allow(dead_code)]

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use alerttail_engine::AlertSource;
use alerttail_types::{Alert, SourceError};
use async_trait::async_trait;
use tokio::io::AsyncWrite;

/// Replays canned responses in order, then answers with no alerts.
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<Vec<Result<Vec<Alert>, SourceError>>>,
    filters: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Result<Vec<Alert>, SourceError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            filters: Mutex::new(Vec::new()),
        })
    }

    pub fn filters(&self) -> Vec<String> {
        self.filters.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.filters.lock().unwrap().len()
    }
}

#[async_trait]
impl AlertSource for ScriptedSource {
    async fn list(&self, filter: &str) -> Result<Vec<Alert>, SourceError> {
        self.filters.lock().unwrap().push(filter.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(Vec::new())
        } else {
            responses.remove(0)
        }
    }
}

/// Sleeps before answering; records call count and peak concurrency.
pub struct SlowSource {
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl SlowSource {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AlertSource for SlowSource {
    async fn list(&self, _filter: &str) -> Result<Vec<Alert>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }
}

/// In-memory output that can be inspected while the watcher owns a clone.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    /// Ids of the compact records written so far.
    pub fn ids(&self) -> Vec<String> {
        self.contents()
            .lines()
            .map(|line| {
                serde_json::from_str::<Alert>(line)
                    .unwrap()
                    .id
                    .unwrap_or_default()
            })
            .collect()
    }
}

impl AsyncWrite for SharedBuffer {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Output whose every write fails.
pub struct FailingWriter;

impl AsyncWrite for FailingWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "output closed",
        )))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

pub fn alerts(ids: &[&str]) -> Vec<Alert> {
    ids.iter().map(|id| Alert::with_id(*id)).collect()
}
