//! # zinkprint-types
//!
//! Shared data types for the zinkprint printer driver: normalized
//! status, static printer descriptors, and configuration. Pure data,
//! no I/O.

pub mod config;
pub mod info;
pub mod status;

pub use config::{PrintOptions, PrinterConfig};
pub use info::{PrinterCapabilities, PrinterFamily, PrinterInfo};
pub use status::{DeviceCondition, PrinterStatus};
