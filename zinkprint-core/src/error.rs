//! Error types for zinkprint-core

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Codec-level protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Packet is too short to be valid
    #[error("Packet too short: expected {expected} bytes, got {actual} bytes")]
    PacketTooShort { expected: usize, actual: usize },

    /// Kodak magic header is missing
    #[error("Invalid packet header: {got:02X?}")]
    BadHeader { got: [u8; 4] },

    /// Canon start code is missing
    #[error("Invalid start code: 0x{got:04X}")]
    BadStartCode { got: u16 },

    /// Response echoed a different command than the one sent
    #[error("ACK mismatch: expected 0x{expected:04X}, got 0x{got:04X}")]
    AckMismatch { expected: u16, got: u16 },

    /// Unknown Canon command code
    #[error("Unknown opcode: 0x{0:04X}")]
    UnknownOpcode(u16),

    /// Unknown Kodak device status code
    #[error("Unknown device status code: 0x{0:02X}")]
    UnknownStatus(u8),
}
