//! Protocol constants shared by both printer families

use std::time::Duration;

/// Framed packet size for both families
pub const PACKET_SIZE: usize = 34;

/// SPP service UUID advertised by both families
pub const SPP_UUID: &str = "00001101-0000-1000-8000-00805F9B34FB";

/// RFCOMM channel used by both families
pub const RFCOMM_CHANNEL: u8 = 1;

/// Battery floor for starting a print (percent)
pub const MIN_BATTERY_PERCENT: u8 = 30;

/// Per-command response timeout
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection establishment budget
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between image data chunks
pub const INTER_CHUNK_DELAY: Duration = Duration::from_millis(20);

/// Settle time after Kodak session initialization
pub const POST_INIT_DELAY: Duration = Duration::from_millis(500);

/// Settle time between the Kodak PrintReady ACK and the first chunk
pub const POST_PRINT_READY_DELAY: Duration = Duration::from_millis(100);

/// Backoff before reopening the transport after a transient failure
pub const RECONNECT_DELAY: Duration = Duration::from_secs(6);

/// Budget for the Canon transfer-complete message after the last chunk
pub const TRANSFER_TIMEOUT: Duration = Duration::from_secs(60);

/// Idle window before a session is asked to disconnect
pub const AUTO_DISCONNECT: Duration = Duration::from_secs(30);

/// Suggested wait before retrying after a Busy refusal
pub const BUSY_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Kodak image data chunk size
pub const KODAK_CHUNK_SIZE: usize = 4096;

/// Canon image data chunk size
///
/// The StartSession response carries a device MTU, but the transfer
/// always uses this fixed size.
pub const CANON_CHUNK_SIZE: usize = 990;

/// Kodak images may not exceed 2 MiB
pub const KODAK_MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;
