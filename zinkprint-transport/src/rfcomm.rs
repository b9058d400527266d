//! Bluetooth RFCOMM transport
//!
//! Talks to a paired printer through a bound RFCOMM device node
//! (`/dev/rfcommN`). The node is located via `/proc/net/rfcomm`; when
//! none exists yet, the transport binds one with `rfcomm bind`. The
//! TTY is switched to raw mode so XON/XOFF bytes inside image data
//! pass through unmangled, with polled reads (`VMIN=0`, `VTIME=1`) so
//! read timeouts stay responsive.
//!
//! Pairing itself is out of scope; the device must already be paired
//! with the host.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::Transport;

/// Default connection establishment budget
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Bluetooth RFCOMM transport for Zink printers
pub struct RfcommTransport {
    address: String,
    channel: u8,
    device_path: Option<PathBuf>,
    file: Option<File>,
    connect_timeout: Duration,
}

impl RfcommTransport {
    /// Create a transport for a paired device
    ///
    /// `address` is the six-octet colon-separated Bluetooth address;
    /// `channel` is the RFCOMM channel (1 for both supported families).
    pub fn new(address: impl Into<String>, channel: u8) -> Self {
        Self {
            address: address.into(),
            channel,
            device_path: None,
            file: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Set the connection establishment budget
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Resolve the device node bound to our address, binding one if needed
    async fn resolve_device(&mut self) -> Result<PathBuf> {
        if let Some(path) = &self.device_path {
            if path.exists() {
                return Ok(path.clone());
            }
            self.device_path = None;
        }

        if let Some(path) = find_bound_device(&self.address) {
            debug!("Found bound RFCOMM device {}", path.display());
            self.device_path = Some(path.clone());
            return Ok(path);
        }

        self.check_paired().await?;

        let path = self.bind_device().await?;
        self.device_path = Some(path.clone());
        Ok(path)
    }

    /// Verify the device is paired, when the platform can tell us
    async fn check_paired(&self) -> Result<()> {
        let output = match tokio::process::Command::new("bluetoothctl")
            .arg("info")
            .arg(&self.address)
            .output()
            .await
        {
            Ok(output) => output,
            // Without bluetoothctl we cannot surface the distinction
            Err(_) => return Ok(()),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() || stdout.contains("not available") {
            return Err(Error::Unreachable {
                address: self.address.clone(),
            });
        }
        if !stdout.contains("Paired: yes") {
            return Err(Error::NotPaired {
                address: self.address.clone(),
            });
        }

        Ok(())
    }

    /// Bind a free rfcomm index to our address and wait for the node
    async fn bind_device(&self) -> Result<PathBuf> {
        let deadline = Instant::now() + self.connect_timeout;

        for index in 0..10u8 {
            let output = tokio::process::Command::new("rfcomm")
                .arg("bind")
                .arg(index.to_string())
                .arg(&self.address)
                .arg(self.channel.to_string())
                .output()
                .await
                .map_err(|e| {
                    warn!("Failed to run rfcomm bind: {e}");
                    Error::Unreachable {
                        address: self.address.clone(),
                    }
                })?;

            if !output.status.success() {
                continue;
            }

            let path = PathBuf::from(format!("/dev/rfcomm{index}"));
            while Instant::now() < deadline {
                if path.exists() {
                    debug!("Bound {} to {}", path.display(), self.address);
                    return Ok(path);
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }

        Err(Error::Unreachable {
            address: self.address.clone(),
        })
    }
}

#[async_trait]
impl Transport for RfcommTransport {
    async fn open(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        if !is_valid_address(&self.address) {
            return Err(Error::InvalidAddress(self.address.clone()));
        }

        let path = self.resolve_device().await?;

        debug!("Opening {}...", path.display());

        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::Unreachable {
                    address: self.address.clone(),
                },
                _ => Error::Io(e),
            })?;

        configure_tty_raw(&file)?;

        debug!("Connected to {}", self.peer());

        self.file = Some(File::from_std(file));
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let file = self.file.as_mut().ok_or(Error::NotConnected)?;

        trace!(
            "Sending {} bytes: {:02X?}",
            data.len(),
            &data[..data.len().min(16)]
        );

        file.write_all(data).await?;
        file.flush().await?;

        Ok(())
    }

    async fn read_exact(&mut self, buf: &mut [u8], timeout: Duration) -> Result<()> {
        let file = self.file.as_mut().ok_or(Error::NotConnected)?;

        let mut filled = 0;
        let mut deadline = Instant::now() + timeout;

        while filled < buf.len() {
            let n = tokio::time::timeout_at(deadline, file.read(&mut buf[filled..]))
                .await
                .map_err(|_| Error::Timeout)?
                .map_err(Error::Io)?;

            if n == 0 {
                // VTIME poll expired without data; keep waiting
                if Instant::now() >= deadline {
                    return Err(Error::Timeout);
                }
                continue;
            }

            filled += n;
            // Progress resets the no-progress window
            deadline = Instant::now() + timeout;
        }

        trace!("Received {} bytes: {:02X?}", filled, &buf[..filled.min(16)]);

        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            debug!("Disconnecting from {}...", self.peer());
            let _ = file.shutdown().await;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.file.is_some()
    }

    fn peer(&self) -> String {
        format!("{} (channel {})", self.address, self.channel)
    }
}

impl Drop for RfcommTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("RFCOMM transport dropped while still connected");
        }
    }
}

/// Validate a Bluetooth address (XX:XX:XX:XX:XX:XX)
pub fn is_valid_address(address: &str) -> bool {
    let parts: Vec<&str> = address.split(':').collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Find an existing RFCOMM device node bound to `address`
#[cfg(unix)]
fn find_bound_device(address: &str) -> Option<PathBuf> {
    let table = std::fs::read_to_string("/proc/net/rfcomm").ok()?;
    let name = device_from_table(&table, address)?;
    let path = PathBuf::from(format!("/dev/{name}"));
    path.exists().then_some(path)
}

#[cfg(not(unix))]
fn find_bound_device(_address: &str) -> Option<PathBuf> {
    None
}

/// Parse `/proc/net/rfcomm` contents
///
/// Lines look like `rfcomm0: AA:BB:CC:DD:EE:FF channel 1 clean`.
fn device_from_table(table: &str, address: &str) -> Option<String> {
    let wanted = address.to_uppercase();

    for line in table.lines() {
        if line.to_uppercase().contains(&wanted) {
            if let Some(name) = line.split(':').next() {
                return Some(name.trim().to_string());
            }
        }
    }

    None
}

/// Switch the RFCOMM TTY to raw mode
///
/// Disables XON/XOFF flow control (0x11/0x13 appear inside JPEG data),
/// echo, canonical mode and all input/output translation, and sets
/// `VMIN=0`/`VTIME=1` so reads poll in 100 ms slices.
#[cfg(unix)]
fn configure_tty_raw(file: &std::fs::File) -> Result<()> {
    use std::io;
    use std::mem::MaybeUninit;
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();

    let mut termios = MaybeUninit::uninit();
    if unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) } != 0 {
        return Err(Error::Io(io::Error::last_os_error()));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    termios.c_cc[libc::VMIN] = 0;
    termios.c_cc[libc::VTIME] = 1;

    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) } != 0 {
        return Err(Error::Io(io::Error::last_os_error()));
    }

    Ok(())
}

#[cfg(not(unix))]
fn configure_tty_raw(_file: &std::fs::File) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        assert!(is_valid_address("A4:62:DF:A9:72:D4"));
        assert!(is_valid_address("aa:bb:cc:dd:ee:ff"));
        assert!(is_valid_address("00:00:00:00:00:00"));
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(!is_valid_address("A4:62:DF:A9:72"));
        assert!(!is_valid_address("A4:62:DF:A9:72:D4:FF"));
        assert!(!is_valid_address("A4-62-DF-A9-72-D4"));
        assert!(!is_valid_address("GG:HH:II:JJ:KK:LL"));
        assert!(!is_valid_address(""));
    }

    #[test]
    fn test_device_from_table() {
        let table = "rfcomm0: 11:22:33:44:55:66 channel 1 clean\n\
                     rfcomm1: A4:62:DF:A9:72:D4 channel 1 connected\n";

        assert_eq!(
            device_from_table(table, "A4:62:DF:A9:72:D4"),
            Some("rfcomm1".to_string())
        );
        assert_eq!(
            device_from_table(table, "a4:62:df:a9:72:d4"),
            Some("rfcomm1".to_string())
        );
        assert_eq!(device_from_table(table, "FF:FF:FF:FF:FF:FF"), None);
        assert_eq!(device_from_table("", "A4:62:DF:A9:72:D4"), None);
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_address() {
        let mut transport = RfcommTransport::new("not-an-address", 1);
        let result = transport.open().await;
        assert!(matches!(result, Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn test_not_connected_initially() {
        let transport = RfcommTransport::new("A4:62:DF:A9:72:D4", 1);
        assert!(!transport.is_connected());
        assert_eq!(transport.peer(), "A4:62:DF:A9:72:D4 (channel 1)");
    }
}
