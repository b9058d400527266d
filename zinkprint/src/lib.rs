//! # zinkprint
//!
//! Driver for Zink mini photo printers over Bluetooth Classic SPP
//! (RFCOMM). Supports two families with distinct wire protocols:
//!
//! - **Kodak Step** (Step, Step Touch, Step Slim, Step Touch Snap 2)
//! - **Canon Ivy 2**
//!
//! Both speak 34-byte framed packets on RFCOMM channel 1; the byte
//! layouts, delays and state transitions were reverse-engineered from
//! device behavior and live in [`zinkprint_core`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use zinkprint::{Printer, PrinterConfig, PrinterFamily};
//!
//! #[tokio::main]
//! async fn main() -> zinkprint::Result<()> {
//!     let config = PrinterConfig::new("A4:62:DF:A9:72:D4", PrinterFamily::CanonIvy2);
//!     let mut printer = Printer::new(config);
//!
//!     printer.open().await?;
//!     println!("{}", printer.info());
//!
//!     let photo = std::fs::read("photo.jpg").expect("readable file");
//!     printer.print(&photo, 1).await?;
//!
//!     printer.close().await?;
//!     Ok(())
//! }
//! ```

pub mod canon;
pub mod error;
mod idle;
pub mod image;
pub mod kodak;
pub mod printer;

pub use canon::{CanonSession, CanonSettings};
pub use error::{Error, Result};
pub use kodak::{KodakSession, KodakSettings};
pub use printer::{Printer, PrinterSettings};

// Re-export the types callers need to configure and observe a printer
pub use zinkprint_core::SessionState;
pub use zinkprint_transport::{MockTransport, RfcommTransport, Transport};
pub use zinkprint_types::{
    DeviceCondition, PrintOptions, PrinterCapabilities, PrinterConfig, PrinterFamily, PrinterInfo,
    PrinterStatus,
};
