//! Transport layer for Zink mini photo printers
//!
//! Provides the byte-stream contract the protocol sessions consume and
//! two implementations: a Bluetooth RFCOMM transport for real devices
//! and a scriptable mock for tests.
//!
//! The transport is a stream, not message-oriented; packet framing is
//! enforced by the codec layer, which reads exactly 34 bytes per
//! response.

pub mod error;
pub mod mock;
pub mod rfcomm;

pub use error::{Error, Result};
pub use mock::{MockHandle, MockTransport, Reply};
pub use rfcomm::RfcommTransport;

use std::time::Duration;

use async_trait::async_trait;

/// Byte-stream contract consumed by the protocol sessions
///
/// Implementations must deliver bytes exactly once and in order, and
/// surface failures instead of silently dropping data. A transport is
/// exclusively owned by one session at a time.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish the byte stream
    ///
    /// # Errors
    ///
    /// `Unreachable` when the peer cannot be reached within the
    /// connection budget; `NotPaired` when the platform surfaces that
    /// distinction.
    async fn open(&mut self) -> Result<()>;

    /// Write all bytes
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read exactly `buf.len()` bytes, aggregating partial reads
    ///
    /// # Errors
    ///
    /// `Timeout` when no progress is made for `timeout`.
    async fn read_exact(&mut self, buf: &mut [u8], timeout: Duration) -> Result<()>;

    /// Close the stream; safe to call when already closed
    async fn close(&mut self) -> Result<()>;

    /// Best-effort liveness indicator
    fn is_connected(&self) -> bool;

    /// Peer description for logging
    fn peer(&self) -> String;
}
