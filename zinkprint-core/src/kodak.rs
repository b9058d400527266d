//! Kodak Step packet codec
//!
//! # Frame Structure
//!
//! ```text
//! ┌──────────────┬────────┬────────┬─────────┬──────────┬──────────────┐
//! │ 1B 2A 43 41  │ flags1 │ device │ command │ sub-type │   payload    │
//! │  bytes 0-3   │ byte 4 │ byte 5 │ byte 6  │  byte 7  │  bytes 8-33  │
//! └──────────────┴────────┴────────┴─────────┴──────────┴──────────────┘
//! ```
//!
//! Every frame is exactly 34 bytes; unused bytes are zero. Requests
//! and responses share the structure. Responses carry a status code in
//! byte 8 and command-specific data after it.
//!
//! # Examples
//!
//! ```
//! use zinkprint_core::kodak::{Command, DeviceKind, Response};
//!
//! let request = Command::GetAccessoryInfo { kind: DeviceKind::Standard };
//! let frame = request.encode();
//! assert_eq!(frame.len(), 34);
//!
//! // A response parses back through the same framing
//! let response = Response::parse(&frame).unwrap();
//! assert_eq!(response.command(), 0x01);
//! ```

use std::fmt;

use crate::constants::PACKET_SIZE;
use crate::error::{Error, Result};

/// Magic header `ESC * C A` present on every Kodak frame
pub const HEADER: [u8; 4] = [0x1B, 0x2A, 0x43, 0x41];

/// Hardware revision selector carried in byte 5
///
/// Step and Step Touch are `Standard`; Step Slim and Step Touch Snap 2
/// require the `Slim` flag or the handshake is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceKind {
    #[default]
    Standard,
    Slim,
}

impl DeviceKind {
    /// Wire value for byte 5
    pub fn flag(self) -> u8 {
        match self {
            Self::Standard => 0x00,
            Self::Slim => 0x02,
        }
    }
}

/// Kodak Step protocol commands
///
/// `StartOfSendAck`, `EndOfReceivedAck` and `ErrorMessageAck` are part
/// of the wire vocabulary but are not exchanged during the happy-path
/// print flow; they are kept for protocol completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Handshake; also the authoritative battery query (byte 12 of the response)
    GetAccessoryInfo { kind: DeviceKind },
    /// Charging status query; byte 8 of the response is 1 while on power
    GetBatteryLevel,
    /// Paper status query
    GetPageType,
    /// Lifetime print counter query
    GetPrintCount,
    /// Auto-power-off timeout query
    GetAutoPowerOff,
    /// Announce an image transfer of `image_size` bytes
    PrintReady { image_size: u32, copies: u8 },
    StartOfSendAck,
    EndOfReceivedAck,
    ErrorMessageAck { code: u8 },
}

impl Command {
    /// Encode the command into a 34-byte frame
    ///
    /// # Examples
    ///
    /// ```
    /// use zinkprint_core::kodak::Command;
    ///
    /// let frame = Command::GetPageType.encode();
    /// assert_eq!(&frame[..4], &[0x1B, 0x2A, 0x43, 0x41]);
    /// assert_eq!(frame[6], 0x0D);
    /// ```
    pub fn encode(&self) -> [u8; PACKET_SIZE] {
        let mut buf = [0u8; PACKET_SIZE];
        buf[..4].copy_from_slice(&HEADER);

        match *self {
            Self::GetAccessoryInfo { kind } => {
                buf[5] = kind.flag();
                buf[6] = 0x01;
            }
            Self::GetBatteryLevel => {
                buf[6] = 0x0E;
            }
            Self::GetPageType => {
                buf[6] = 0x0D;
            }
            Self::GetPrintCount => {
                // Shares command byte 0x00 with PrintReady; byte 7 selects the query
                buf[7] = 0x01;
            }
            Self::GetAutoPowerOff => {
                buf[6] = 0x10;
            }
            Self::PrintReady { image_size, copies } => {
                debug_assert!(image_size <= 0x00FF_FFFF);
                buf[8] = (image_size >> 16) as u8;
                buf[9] = (image_size >> 8) as u8;
                buf[10] = image_size as u8;
                buf[11] = copies;
            }
            Self::StartOfSendAck => {
                buf[6] = 0x01;
                buf[8] = 0x02;
            }
            Self::EndOfReceivedAck => {
                buf[6] = 0x01;
                buf[7] = 0x01;
                buf[8] = 0x02;
            }
            Self::ErrorMessageAck { code } => {
                buf[6] = 0x01;
                buf[8] = code;
            }
        }

        buf
    }

    /// Command name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetAccessoryInfo { .. } => "GET_ACCESSORY_INFO",
            Self::GetBatteryLevel => "GET_BATTERY_LEVEL",
            Self::GetPageType => "GET_PAGE_TYPE",
            Self::GetPrintCount => "GET_PRINT_COUNT",
            Self::GetAutoPowerOff => "GET_AUTO_POWER_OFF",
            Self::PrintReady { .. } => "PRINT_READY",
            Self::StartOfSendAck => "START_OF_SEND_ACK",
            Self::EndOfReceivedAck => "END_OF_RECEIVED_ACK",
            Self::ErrorMessageAck { .. } => "ERROR_MESSAGE_ACK",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Device condition reported in byte 8 of every response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StatusCode {
    Ok = 0x00,
    PaperJam = 0x01,
    NoPaper = 0x02,
    CoverOpen = 0x03,
    PaperMismatch = 0x04,
    LowBattery = 0x05,
    Overheating = 0x06,
    Cooling = 0x07,
    Misfeed = 0x08,
    Busy = 0x09,
}

impl StatusCode {
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// Human-readable description
    pub fn message(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::PaperJam => "paper jam",
            Self::NoPaper => "out of paper",
            Self::CoverOpen => "cover open",
            Self::PaperMismatch => "wrong paper type",
            Self::LowBattery => "battery too low",
            Self::Overheating => "overheating",
            Self::Cooling => "cooling down",
            Self::Misfeed => "paper misfeed",
            Self::Busy => "printer busy",
        }
    }
}

impl From<StatusCode> for u8 {
    fn from(code: StatusCode) -> u8 {
        code as u8
    }
}

impl TryFrom<u8> for StatusCode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(Self::Ok),
            0x01 => Ok(Self::PaperJam),
            0x02 => Ok(Self::NoPaper),
            0x03 => Ok(Self::CoverOpen),
            0x04 => Ok(Self::PaperMismatch),
            0x05 => Ok(Self::LowBattery),
            0x06 => Ok(Self::Overheating),
            0x07 => Ok(Self::Cooling),
            0x08 => Ok(Self::Misfeed),
            0x09 => Ok(Self::Busy),
            _ => Err(Error::UnknownStatus(value)),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Parsed 34-byte Kodak response
///
/// Accessors are command-specific; callers pick the ones matching the
/// request they sent.
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
    /// magic header is missing.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < PACKET_SIZE {
            return Err(Error::PacketTooShort {
                expected: PACKET_SIZE,
                actual: data.len(),
            });
        }

        if data[..4] != HEADER {
            return Err(Error::BadHeader {
                got: [data[0], data[1], data[2], data[3]],
            });
        }

        let mut raw = [0u8; PACKET_SIZE];
        raw.copy_from_slice(&data[..PACKET_SIZE]);
        Ok(Self { raw })
    }

    /// Command byte echoed by the device
    pub fn command(&self) -> u8 {
        self.raw[6]
    }

    /// Sub-type byte echoed by the device
    pub fn sub_type(&self) -> u8 {
        self.raw[7]
    }

    /// Decoded status code from byte 8
    pub fn status(&self) -> Result<StatusCode> {
        StatusCode::try_from(self.raw[8])
    }

    /// Raw status byte
    pub fn raw_status(&self) -> u8 {
        self.raw[8]
    }

    /// Battery percentage from a `GetAccessoryInfo` response (byte 12)
    pub fn battery_percent(&self) -> u8 {
        self.raw[12]
    }

    /// Printer MAC address from a `GetAccessoryInfo` response (bytes 15-20)
    pub fn mac_address(&self) -> String {
        let m = &self.raw[15..21];
        format!(
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }

    /// Charging flag from a `GetBatteryLevel` response
    ///
    /// Byte 8 is 1 while the device is on external power. It is not a
    /// battery percentage; that comes from `GetAccessoryInfo`.
    pub fn is_charging(&self) -> bool {
        self.raw[8] == 1
    }

    /// Lifetime print count from a `GetPrintCount` response (big-endian, bytes 8-9)
    pub fn print_count(&self) -> u16 {
        u16::from_be_bytes([self.raw[8], self.raw[9]])
    }

    /// Auto-power-off timeout in minutes from a `GetAutoPowerOff` response
    pub fn auto_power_off_minutes(&self) -> u8 {
        self.raw[8]
    }

    /// Raw frame bytes
    pub fn as_bytes(&self) -> &[u8; PACKET_SIZE] {
        &self.raw
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("command", &format!("0x{:02X}", self.command()))
            .field("sub_type", &format!("0x{:02X}", self.sub_type()))
            .field("status", &format!("0x{:02X}", self.raw_status()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn response_with(fill: impl FnOnce(&mut [u8; PACKET_SIZE])) -> [u8; PACKET_SIZE] {
        let mut raw = [0u8; PACKET_SIZE];
        raw[..4].copy_from_slice(&HEADER);
        fill(&mut raw);
        raw
    }

    #[test]
    fn test_all_commands_framed() {
        let commands = [
            Command::GetAccessoryInfo {
                kind: DeviceKind::Standard,
            },
            Command::GetAccessoryInfo {
                kind: DeviceKind::Slim,
            },
            Command::GetBatteryLevel,
            Command::GetPageType,
            Command::GetPrintCount,
            Command::GetAutoPowerOff,
            Command::PrintReady {
                image_size: 123_456,
                copies: 2,
            },
            Command::StartOfSendAck,
            Command::EndOfReceivedAck,
            Command::ErrorMessageAck { code: 0x03 },
        ];

        for cmd in commands {
            let frame = cmd.encode();
            assert_eq!(frame.len(), PACKET_SIZE, "{cmd}");
            assert_eq!(&frame[..4], &HEADER, "{cmd}");
            // Everything past the documented fields stays zero
            assert!(frame[12..].iter().all(|&b| b == 0), "{cmd}");
        }
    }

    #[test]
    fn test_print_ready_exact_bytes() {
        let frame = Command::PrintReady {
            image_size: 50_000,
            copies: 1,
        }
        .encode();

        let expected_head = [
            0x1B, 0x2A, 0x43, 0x41, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC3, 0x50, 0x01, 0x00, 0x00,
            0x00, 0x00,
        ];
        assert_eq!(&frame[..16], &expected_head);
        assert!(frame[16..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_print_ready_size_round_trip() {
        for size in [0u32, 1, 0xFF, 0x100, 0xFFFF, 0x12_3456, 0xFF_FFFF] {
            let frame = Command::PrintReady {
                image_size: size,
                copies: 3,
            }
            .encode();
            let decoded =
                ((frame[8] as u32) << 16) | ((frame[9] as u32) << 8) | frame[10] as u32;
            assert_eq!(decoded, size);
            assert_eq!(frame[11], 3);
        }
    }

    #[test]
    fn test_accessory_info_device_flag() {
        let standard = Command::GetAccessoryInfo {
            kind: DeviceKind::Standard,
        }
        .encode();
        assert_eq!(standard[5], 0x00);
        assert_eq!(standard[6], 0x01);

        let slim = Command::GetAccessoryInfo {
            kind: DeviceKind::Slim,
        }
        .encode();
        assert_eq!(slim[5], 0x02);
        assert_eq!(slim[6], 0x01);
    }

    #[test]
    fn test_get_print_count_frame() {
        // Shares command byte 0x00 with PrintReady, selected by byte 7
        let frame = Command::GetPrintCount.encode();
        assert_eq!(frame[6], 0x00);
        assert_eq!(frame[7], 0x01);
        assert!(frame[8..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_ack_frames() {
        let start = Command::StartOfSendAck.encode();
        assert_eq!((start[6], start[7], start[8]), (0x01, 0x00, 0x02));

        let end = Command::EndOfReceivedAck.encode();
        assert_eq!((end[6], end[7], end[8]), (0x01, 0x01, 0x02));

        let err = Command::ErrorMessageAck { code: 0x08 }.encode();
        assert_eq!((err[6], err[7], err[8]), (0x01, 0x00, 0x08));
    }

    #[test]
    fn test_parse_accessory_info_response() {
        let raw = response_with(|r| {
            r[8] = 0x00;
            r[12] = 87;
            r[15..21].copy_from_slice(&[0xA4, 0x62, 0xDF, 0xA9, 0x72, 0xD4]);
        });

        let response = Response::parse(&raw).unwrap();
        assert_eq!(response.status().unwrap(), StatusCode::Ok);
        assert_eq!(response.battery_percent(), 87);
        assert_eq!(response.mac_address(), "A4:62:DF:A9:72:D4");
    }

    #[test]
    fn test_parse_rejects_bad_header() {
        let mut raw = [0u8; PACKET_SIZE];
        raw[..4].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

        let result = Response::parse(&raw);
        assert!(matches!(result, Err(Error::BadHeader { .. })));
    }

    #[test]
    fn test_parse_rejects_short_packet() {
        let result = Response::parse(&[0x1B, 0x2A, 0x43]);
        assert!(matches!(
            result,
            Err(Error::PacketTooShort {
                expected: PACKET_SIZE,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_status_code_mapping() {
        for (raw, code) in [
            (0x00, StatusCode::Ok),
            (0x01, StatusCode::PaperJam),
            (0x02, StatusCode::NoPaper),
            (0x03, StatusCode::CoverOpen),
            (0x04, StatusCode::PaperMismatch),
            (0x05, StatusCode::LowBattery),
            (0x06, StatusCode::Overheating),
            (0x07, StatusCode::Cooling),
            (0x08, StatusCode::Misfeed),
            (0x09, StatusCode::Busy),
        ] {
            assert_eq!(StatusCode::try_from(raw).unwrap(), code);
            assert_eq!(u8::from(code), raw);
        }

        assert!(matches!(
            StatusCode::try_from(0x42),
            Err(Error::UnknownStatus(0x42))
        ));
    }

    #[test]
    fn test_charging_status() {
        let charging = response_with(|r| r[8] = 1);
        assert!(Response::parse(&charging).unwrap().is_charging());

        let idle = response_with(|_| {});
        assert!(!Response::parse(&idle).unwrap().is_charging());
    }

    #[test]
    fn test_print_count_big_endian() {
        let raw = response_with(|r| {
            r[8] = 0x01;
            r[9] = 0x2C;
        });
        assert_eq!(Response::parse(&raw).unwrap().print_count(), 300);
    }

    #[test]
    fn test_auto_power_off_minutes() {
        let raw = response_with(|r| r[8] = 10);
        assert_eq!(
            Response::parse(&raw).unwrap().auto_power_off_minutes(),
            10
        );
    }
}
