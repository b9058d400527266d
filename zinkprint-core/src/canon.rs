//! Canon Ivy 2 packet codec
//!
//! # Frame Structure
//!
//! ```text
//! ┌─────────────┬─────────────┬──────────┬─────────────┬──────────┬─────────────┐
//! │ start code  │   flags1    │  flags2  │   opcode    │ modifier │   payload   │
//! │  bytes 0-1  │  bytes 2-3  │  byte 4  │  bytes 5-6  │  byte 7  │ bytes 8-33  │
//! │ 0x430F (BE) │  i16 (BE)   │   i8     │  u16 (BE)   │ 0=r 1=w  │             │
//! └─────────────┴─────────────┴──────────┴─────────────┴──────────┴─────────────┘
//! ```
//!
//! Every frame is exactly 34 bytes. `flags1`/`flags2` are `-1`/`-1`
//! only for session initialization, otherwise `1`/`32`. Responses echo
//! the opcode in bytes 5-6 and carry the error code in byte 7; an
//! opcode mismatch is a fatal protocol error.

use std::fmt;

use crate::bits;
use crate::constants::PACKET_SIZE;
use crate::error::{Error, Result};

/// Start code on every Ivy 2 frame (big-endian bytes 0-1)
pub const START_CODE: u16 = 0x430F;

/// Ivy 2 command codes (bytes 5-6, big-endian)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    StartSession = 0x0000,
    GetStatus = 0x0101,
    SettingAccessory = 0x0103,
    PrintReady = 0x0301,
    Reboot = 0xFFFF,
}

impl Opcode {
    pub fn name(self) -> &'static str {
        match self {
            Self::StartSession => "START_SESSION",
            Self::GetStatus => "GET_STATUS",
            Self::SettingAccessory => "SETTING_ACCESSORY",
            Self::PrintReady => "PRINT_READY",
            Self::Reboot => "REBOOT",
        }
    }
}

impl From<Opcode> for u16 {
    fn from(opcode: Opcode) -> u16 {
        opcode as u16
    }
}

impl TryFrom<u16> for Opcode {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0x0000 => Ok(Self::StartSession),
            0x0101 => Ok(Self::GetStatus),
            0x0103 => Ok(Self::SettingAccessory),
            0x0301 => Ok(Self::PrintReady),
            0xFFFF => Ok(Self::Reboot),
            _ => Err(Error::UnknownOpcode(value)),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:04X})", self.name(), *self as u16)
    }
}

/// Canon Ivy 2 protocol commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Session handshake; the response carries battery and MTU
    StartSession,
    GetStatus,
    /// Read accessory settings (auto-power-off, firmware, print count)
    GetSettings,
    /// Write the auto-power-off timeout; the device accepts 3, 5 or 10
    SetAutoPowerOff { minutes: u8 },
    /// Announce an image transfer of `image_size` bytes
    ///
    /// `alternate` selects transfer mode 2; its semantics are not
    /// established and the driver always uses mode 1.
    PrintReady { image_size: u32, alternate: bool },
    Reboot,
}

impl Command {
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::StartSession => Opcode::StartSession,
            Self::GetStatus => Opcode::GetStatus,
            Self::GetSettings | Self::SetAutoPowerOff { .. } => Opcode::SettingAccessory,
            Self::PrintReady { .. } => Opcode::PrintReady,
            Self::Reboot => Opcode::Reboot,
        }
    }

    fn is_session_init(&self) -> bool {
        matches!(self, Self::StartSession)
    }

    /// Modifier byte: 0 for reads, 1 for writes
    fn is_write(&self) -> bool {
        matches!(self, Self::SetAutoPowerOff { .. } | Self::Reboot)
    }

    /// Encode the command into a 34-byte frame
    ///
    /// # Examples
    ///
    /// ```
    /// use zinkprint_core::canon::Command;
    ///
    /// let frame = Command::StartSession.encode();
    /// assert_eq!(&frame[..8], &[0x43, 0x0F, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00]);
    /// ```
    pub fn encode(&self) -> [u8; PACKET_SIZE] {
        let mut buf = [0u8; PACKET_SIZE];

        let (flags1, flags2): (i16, i8) = if self.is_session_init() {
            (-1, -1)
        } else {
            (1, 32)
        };

        buf[..2].copy_from_slice(&START_CODE.to_be_bytes());
        buf[2..4].copy_from_slice(&flags1.to_be_bytes());
        buf[4] = flags2 as u8;
        buf[5..7].copy_from_slice(&u16::from(self.opcode()).to_be_bytes());
        buf[7] = u8::from(self.is_write());

        match *self {
            Self::SetAutoPowerOff { minutes } => {
                buf[8] = minutes;
            }
            Self::PrintReady {
                image_size,
                alternate,
            } => {
                buf[8..12].copy_from_slice(&image_size.to_be_bytes());
                buf[12] = 1;
                buf[13] = if alternate { 2 } else { 1 };
            }
            Self::Reboot => {
                buf[8] = 1;
            }
            _ => {}
        }

        buf
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode().name())
    }
}

/// Battery and MTU carried in a `StartSession` response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInfo {
    pub battery_percent: u8,
    /// Device-declared MTU; informational, the chunker uses a fixed size
    pub mtu: u16,
}

/// Decoded `GetStatus` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub error_code: u8,
    pub battery_percent: u8,
    pub usb_powered: bool,
    pub cover_open: bool,
    pub no_paper: bool,
    pub wrong_smart_sheet: bool,
}

/// Decoded `SettingAccessory` (read) payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsReport {
    pub auto_power_off_minutes: u8,
    pub firmware_version: String,
    pub tmd_version: u8,
    pub prints_completed: u16,
    pub color_id: u8,
}

/// Parsed 34-byte Ivy 2 response
#[derive(Clone, PartialEq, Eq)]
pub struct Response {
    raw: [u8; PACKET_SIZE],
}

impl Response {
    /// Parse a response frame
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is shorter than 34 bytes or the
    /// start code is missing.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < PACKET_SIZE {
            return Err(Error::PacketTooShort {
                expected: PACKET_SIZE,
                actual: data.len(),
            });
        }

        let start = u16::from_be_bytes([data[0], data[1]]);
        if start != START_CODE {
            return Err(Error::BadStartCode { got: start });
        }

        let mut raw = [0u8; PACKET_SIZE];
        raw.copy_from_slice(&data[..PACKET_SIZE]);
        Ok(Self { raw })
    }

    /// Opcode echo from bytes 5-6
    pub fn ack(&self) -> u16 {
        u16::from_be_bytes([self.raw[5], self.raw[6]])
    }

    /// Error code from byte 7; zero means success
    pub fn error_code(&self) -> u8 {
        self.raw[7]
    }

    /// Verify the response acknowledges `opcode`
    ///
    /// # Errors
    ///
    /// Returns `AckMismatch` when the echo differs; the session treats
    /// this as fatal.
    pub fn expect_ack(&self, opcode: Opcode) -> Result<()> {
        let got = self.ack();
        if got != u16::from(opcode) {
            return Err(Error::AckMismatch {
                expected: opcode.into(),
                got,
            });
        }
        Ok(())
    }

    /// Command-specific payload (bytes 8-33)
    pub fn payload(&self) -> &[u8] {
        &self.raw[8..]
    }

    /// Battery and MTU from a `StartSession` response
    pub fn session_info(&self) -> SessionInfo {
        let word = u16::from_be_bytes([self.raw[9], self.raw[10]]);
        SessionInfo {
            battery_percent: bits::battery_percent(word),
            mtu: u16::from_be_bytes([self.raw[11], self.raw[12]]),
        }
    }

    /// Decoded `GetStatus` payload
    pub fn status_report(&self) -> StatusReport {
        let word = u16::from_be_bytes([self.raw[8], self.raw[9]]);
        let queue_flags = u16::from_be_bytes([self.raw[12], self.raw[13]]);

        StatusReport {
            error_code: self.error_code(),
            battery_percent: bits::battery_percent(word),
            usb_powered: (word >> 7) & 1 == 1,
            cover_open: queue_flags & 0x01 != 0,
            no_paper: queue_flags & 0x02 != 0,
            wrong_smart_sheet: queue_flags & 0x10 != 0,
        }
    }

    /// Decoded `SettingAccessory` (read) payload
    pub fn settings_report(&self) -> SettingsReport {
        SettingsReport {
            auto_power_off_minutes: self.raw[8],
            firmware_version: format!("{}.{}.{}", self.raw[9], self.raw[10], self.raw[11]),
            tmd_version: self.raw[13],
            prints_completed: u16::from_be_bytes([self.raw[14], self.raw[15]]),
            color_id: self.raw[16],
        }
    }

    /// Raw frame bytes
    pub fn as_bytes(&self) -> &[u8; PACKET_SIZE] {
        &self.raw
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("ack", &format!("0x{:04X}", self.ack()))
            .field("error_code", &self.error_code())
            .finish()
    }
}
