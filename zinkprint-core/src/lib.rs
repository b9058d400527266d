//! # zinkprint-core
//!
//! Core protocol implementation for Zink mini photo printers.
//!
//! This crate provides the low-level protocol primitives shared by the
//! Kodak Step family and the Canon Ivy 2:
//! - 34-byte packet builders and parsers for both wire dialects
//! - The reversed 6-bit battery decoding used by the Ivy 2
//! - Session lifecycle states
//! - Protocol constants (chunk sizes, delays, timeouts)
//!
//! No I/O happens here; frames are built into and parsed out of
//! stack-allocated buffers.

pub mod bits;
pub mod canon;
pub mod constants;
pub mod error;
pub mod kodak;
pub mod session;

pub use constants::{PACKET_SIZE, RFCOMM_CHANNEL, SPP_UUID};
pub use error::{Error, Result};
pub use session::SessionState;
