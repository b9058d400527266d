//! Printer façade
//!
//! Uniform operations over the supported families. The façade owns a
//! family-specific session and dispatches `open`/`status`/`print` to
//! it; family-specific extensions (reboot, auto-power-off) are
//! advertised through `info().capabilities` and rejected on devices
//! that lack them.

use tracing::debug;

use zinkprint_core::constants::CONNECT_TIMEOUT;
use zinkprint_transport::{RfcommTransport, Transport};
use zinkprint_types::{
    PrintOptions, PrinterCapabilities, PrinterConfig, PrinterFamily, PrinterInfo, PrinterStatus,
};

use crate::canon::{CanonSession, CanonSettings};
use crate::error::{Error, Result};
use crate::image;
use crate::kodak::{KodakSession, KodakSettings};

const KODAK_FORMATS: &[&str] = &["JPEG"];
const CANON_FORMATS: &[&str] = &["JPEG", "PNG", "BMP", "GIF"];

/// Family-specific settings snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrinterSettings {
    Kodak(KodakSettings),
    Canon(CanonSettings),
}

enum Driver {
    Kodak(KodakSession),
    Canon(CanonSession),
}

/// A Zink mini photo printer
///
/// # Examples
///
/// ```no_run
/// use zinkprint::{Printer, PrinterConfig, PrinterFamily};
///
/// #[tokio::main]
/// async fn main() -> zinkprint::Result<()> {
///     let config = PrinterConfig::new("A4:62:DF:A9:72:D4", PrinterFamily::KodakStep);
///     let mut printer = Printer::new(config);
///
///     printer.open().await?;
///
///     let status = printer.status().await?;
///     if status.is_ready {
///         let jpeg = std::fs::read("photo.jpg").expect("readable file");
///         printer.print(&jpeg, 1).await?;
///     }
///
///     printer.close().await?;
///     Ok(())
/// }
/// ```
pub struct Printer {
    driver: Driver,
    info: PrinterInfo,
}

impl Printer {
    /// Create a printer over the native RFCOMM transport
    pub fn new(config: PrinterConfig) -> Self {
        let transport = RfcommTransport::new(config.address.clone(), config.channel)
            .with_connect_timeout(CONNECT_TIMEOUT);
        Self::with_transport(config, Box::new(transport))
    }

    /// Create a printer over a caller-provided transport
    pub fn with_transport(config: PrinterConfig, transport: Box<dyn Transport>) -> Self {
        let info = descriptor(&config);
        let driver = match config.family {
            PrinterFamily::KodakStep => Driver::Kodak(KodakSession::new(transport, &config)),
            PrinterFamily::CanonIvy2 => Driver::Canon(CanonSession::new(transport, &config)),
        };

        Self { driver, info }
    }

    /// Static descriptor: family, model name, print geometry, formats
    /// and capabilities
    pub fn info(&self) -> &PrinterInfo {
        &self.info
    }

    /// Connect and run the family handshake
    pub async fn open(&mut self) -> Result<()> {
        match &mut self.driver {
            Driver::Kodak(session) => {
                session.connect().await?;
                session.initialize().await
            }
            Driver::Canon(session) => {
                session.connect().await?;
                session.start_session().await
            }
        }
    }

    /// Release the transport; safe to call repeatedly
    pub async fn close(&mut self) -> Result<()> {
        match &mut self.driver {
            Driver::Kodak(session) => session.close().await,
            Driver::Canon(session) => session.close().await,
        }
    }

    /// Query normalized printer status
    pub async fn status(&mut self) -> Result<PrinterStatus> {
        match &mut self.driver {
            Driver::Kodak(session) => session.status().await,
            Driver::Canon(session) => session.status().await,
        }
    }

    /// Print an image with default options
    pub async fn print(&mut self, image: &[u8], copies: u8) -> Result<()> {
        let options = PrintOptions {
            copies,
            ..PrintOptions::default()
        };
        self.print_with_options(image, &options).await
    }

    /// Print an image
    ///
    /// Kodak devices take the JPEG verbatim after validation; Canon
    /// input goes through the geometric pipeline first, honoring
    /// `auto_crop` and `quality`.
    pub async fn print_with_options(&mut self, image: &[u8], options: &PrintOptions) -> Result<()> {
        if options.copies == 0 {
            return Err(Error::InvalidArgument("copies must be at least 1".into()));
        }

        match &mut self.driver {
            Driver::Kodak(session) => session.print(image, options.copies).await,
            Driver::Canon(session) => {
                if options.copies != 1 {
                    return Err(Error::InvalidArgument(
                        "the Ivy 2 prints one copy per job".into(),
                    ));
                }
                if options.quality == 0 || options.quality > 100 {
                    return Err(Error::InvalidArgument(
                        "JPEG quality must be between 1 and 100".into(),
                    ));
                }

                let prepared = image::prepare_canon(image, options.auto_crop, options.quality)?;
                debug!(
                    source = image.len(),
                    prepared = prepared.len(),
                    "Image prepared for transfer"
                );
                session.print(&prepared).await
            }
        }
    }

    /// Read device settings
    pub async fn settings(&mut self) -> Result<PrinterSettings> {
        match &mut self.driver {
            Driver::Kodak(session) => Ok(PrinterSettings::Kodak(session.settings().await?)),
            Driver::Canon(session) => Ok(PrinterSettings::Canon(session.settings().await?)),
        }
    }

    /// Set the auto-power-off timeout (Canon only; 3, 5 or 10 minutes)
    pub async fn set_auto_power_off(&mut self, minutes: u8) -> Result<()> {
        match &mut self.driver {
            Driver::Canon(session) => session.set_auto_power_off(minutes).await,
            Driver::Kodak(_) => Err(Error::NotSupported("set_auto_power_off")),
        }
    }

    /// Reboot the printer (Canon only)
    pub async fn reboot(&mut self) -> Result<()> {
        match &mut self.driver {
            Driver::Canon(session) => session.reboot().await,
            Driver::Kodak(_) => Err(Error::NotSupported("reboot")),
        }
    }
}

fn descriptor(config: &PrinterConfig) -> PrinterInfo {
    match config.family {
        PrinterFamily::KodakStep => PrinterInfo {
            family: PrinterFamily::KodakStep,
            name: if config.is_slim {
                "Kodak Step Slim"
            } else {
                "Kodak Step"
            },
            print_width: 640,
            print_height: 1616,
            supported_formats: KODAK_FORMATS,
            capabilities: PrinterCapabilities {
                can_get_status: true,
                can_get_battery: true,
                can_configure_settings: true,
                can_reboot: false,
                supports_multiple_copies: true,
                min_battery_for_print: config.min_battery,
            },
        },
        PrinterFamily::CanonIvy2 => PrinterInfo {
            family: PrinterFamily::CanonIvy2,
            name: "Canon Ivy 2",
            print_width: 640,
            print_height: 1616,
            supported_formats: CANON_FORMATS,
            capabilities: PrinterCapabilities {
                can_get_status: true,
                can_get_battery: true,
                can_configure_settings: true,
                can_reboot: true,
                supports_multiple_copies: false,
                min_battery_for_print: config.min_battery,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zinkprint_core::kodak::HEADER;
    use zinkprint_core::constants::PACKET_SIZE;
    use zinkprint_transport::MockTransport;

    fn kodak_printer() -> (Printer, zinkprint_transport::MockHandle) {
        let transport = MockTransport::new();
        let handle = transport.handle();
        let config = PrinterConfig::new("A4:62:DF:A9:72:D4", PrinterFamily::KodakStep);
        (Printer::with_transport(config, Box::new(transport)), handle)
    }

    fn canon_printer() -> (Printer, zinkprint_transport::MockHandle) {
        let transport = MockTransport::new();
        let handle = transport.handle();
        let config = PrinterConfig::new("70:70:70:70:70:70", PrinterFamily::CanonIvy2);
        (Printer::with_transport(config, Box::new(transport)), handle)
    }

    fn accessory_frame(battery: u8) -> Vec<u8> {
        let mut raw = [0u8; PACKET_SIZE];
        raw[..4].copy_from_slice(&HEADER);
        raw[12] = battery;
        raw.to_vec()
    }

    #[test]
    fn test_kodak_descriptor() {
        let (printer, _) = kodak_printer();
        let info = printer.info();

        assert_eq!(info.family, PrinterFamily::KodakStep);
        assert_eq!(info.name, "Kodak Step");
        assert_eq!((info.print_width, info.print_height), (640, 1616));
        assert!(!info.capabilities.can_reboot);
        assert!(info.capabilities.supports_multiple_copies);
        assert_eq!(info.capabilities.min_battery_for_print, 30);
    }

    #[test]
    fn test_slim_descriptor() {
        let config =
            PrinterConfig::new("A4:62:DF:A9:72:D4", PrinterFamily::KodakStep).slim();
        let printer = Printer::with_transport(config, Box::new(MockTransport::new()));

        assert_eq!(printer.info().name, "Kodak Step Slim");
    }

    #[test]
    fn test_canon_descriptor() {
        let (printer, _) = canon_printer();
        let info = printer.info();

        assert_eq!(info.family, PrinterFamily::CanonIvy2);
        assert!(info.capabilities.can_reboot);
        assert!(!info.capabilities.supports_multiple_copies);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_runs_kodak_handshake() {
        let (mut printer, handle) = kodak_printer();
        handle.push_frame(accessory_frame(90));

        printer.open().await.unwrap();

        let writes = handle.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].data[6], 0x01);
    }

    #[tokio::test]
    async fn test_reboot_unsupported_on_kodak() {
        let (mut printer, _) = kodak_printer();
        let result = printer.reboot().await;
        assert!(matches!(result, Err(Error::NotSupported("reboot"))));
    }

    #[tokio::test]
    async fn test_auto_power_off_unsupported_on_kodak() {
        let (mut printer, _) = kodak_printer();
        let result = printer.set_auto_power_off(5).await;
        assert!(matches!(
            result,
            Err(Error::NotSupported("set_auto_power_off"))
        ));
    }

    #[tokio::test]
    async fn test_print_rejects_zero_copies() {
        let (mut printer, _) = kodak_printer();
        let result = printer.print(&[0xFF, 0xD8, 0xFF, 0xD9], 0).await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_canon_rejects_multiple_copies() {
        let (mut printer, _) = canon_printer();
        let result = printer.print(&[0u8; 16], 2).await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_is_idempotent() {
        let (mut printer, handle) = kodak_printer();
        handle.push_frame(accessory_frame(90));

        printer.open().await.unwrap();
        printer.close().await.unwrap();
        printer.close().await.unwrap();
    }
}
