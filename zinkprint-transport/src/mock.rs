//! Scriptable in-memory transport for tests
//!
//! Replies are queued ahead of time; every write is recorded with a
//! timestamp so tests can assert on packet contents and chunk pacing.
//! The handle shares state with the transport, so scripts stay usable
//! after the transport has been moved into a session.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::Transport;

/// A scripted read outcome
pub enum Reply {
    /// Deliver these bytes; delivering fewer bytes than the reader
    /// wants ends in a timeout, modeling a short packet
    Frame(Vec<u8>),
    /// Simulate no response within the read window
    Timeout,
    /// Simulate the peer dropping the connection
    Hangup,
}

/// One recorded write
#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub data: Vec<u8>,
    pub at: Instant,
}

#[derive(Default)]
struct Inner {
    replies: VecDeque<Reply>,
    writes: Vec<RecordedWrite>,
    connected: bool,
    fail_open: bool,
    open_count: usize,
}

/// In-memory transport that follows a prepared script
pub struct MockTransport {
    inner: Arc<Mutex<Inner>>,
}

/// Shared view of a [`MockTransport`]'s state
#[derive(Clone)]
pub struct MockHandle {
    inner: Arc<Mutex<Inner>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Handle for scripting replies and inspecting writes
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHandle {
    /// Queue a frame to deliver on the next read
    pub fn push_frame(&self, data: impl Into<Vec<u8>>) {
        self.inner.lock().replies.push_back(Reply::Frame(data.into()));
    }

    /// Queue a read timeout
    pub fn push_timeout(&self) {
        self.inner.lock().replies.push_back(Reply::Timeout);
    }

    /// Queue a connection drop
    pub fn push_hangup(&self) {
        self.inner.lock().replies.push_back(Reply::Hangup);
    }

    /// Make the next `open` calls fail as unreachable
    pub fn fail_open(&self, fail: bool) {
        self.inner.lock().fail_open = fail;
    }

    /// Everything written so far
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.inner.lock().writes.clone()
    }

    /// How many times `open` succeeded
    pub fn open_count(&self) -> usize {
        self.inner.lock().open_count
    }

    /// Replies not yet consumed
    pub fn pending_replies(&self) -> usize {
        self.inner.lock().replies.len()
    }

    /// Forget recorded writes
    pub fn clear_writes(&self) {
        self.inner.lock().writes.clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&mut self) -> Result<()> {
        let mut inner = self.inner.lock();

        if inner.connected {
            return Err(Error::AlreadyConnected);
        }
        if inner.fail_open {
            return Err(Error::Unreachable {
                address: "mock".into(),
            });
        }

        inner.connected = true;
        inner.open_count += 1;
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();

        if !inner.connected {
            return Err(Error::NotConnected);
        }

        inner.writes.push(RecordedWrite {
            data: data.to_vec(),
            at: Instant::now(),
        });
        Ok(())
    }

    async fn read_exact(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<()> {
        let mut inner = self.inner.lock();

        if !inner.connected {
            return Err(Error::NotConnected);
        }

        match inner.replies.pop_front() {
            Some(Reply::Frame(data)) => {
                if data.len() < buf.len() {
                    // Short delivery: the reader would starve waiting
                    // for the remainder
                    return Err(Error::Timeout);
                }
                buf.copy_from_slice(&data[..buf.len()]);
                Ok(())
            }
            Some(Reply::Timeout) | None => Err(Error::Timeout),
            Some(Reply::Hangup) => {
                inner.connected = false;
                Err(Error::Closed)
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.lock().connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }

    fn peer(&self) -> String {
        "mock".to_string()
    }
}
