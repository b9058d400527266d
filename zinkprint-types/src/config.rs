//! Printer configuration

use std::time::Duration;

use zinkprint_core::constants;

use crate::PrinterFamily;

/// Configuration recognized at printer construction
///
/// Defaults follow the reverse-engineered protocol timings; override
/// them only for instrumented tests or unusual transports.
#[derive(Debug, Clone)]
pub struct PrinterConfig {
    /// Bluetooth address, six colon-separated hex octets
    pub address: String,

    /// RFCOMM channel; both families use 1
    pub channel: u8,

    pub family: PrinterFamily,

    /// Step Slim / Snap 2 hardware (Kodak only)
    pub is_slim: bool,

    /// Battery floor for starting a print
    pub min_battery: u8,

    /// Per-command response timeout
    pub command_timeout: Duration,

    /// Pause between image data chunks
    pub chunk_delay: Duration,

    /// Idle window before auto-disconnect; zero disables the timer
    pub auto_disconnect: Duration,
}

impl PrinterConfig {
    pub fn new(address: impl Into<String>, family: PrinterFamily) -> Self {
        Self {
            address: address.into(),
            channel: constants::RFCOMM_CHANNEL,
            family,
            is_slim: false,
            min_battery: constants::MIN_BATTERY_PERCENT,
            command_timeout: constants::COMMAND_TIMEOUT,
            chunk_delay: constants::INTER_CHUNK_DELAY,
            auto_disconnect: constants::AUTO_DISCONNECT,
        }
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    /// Mark the device as a Step Slim or Snap 2
    pub fn slim(mut self) -> Self {
        self.is_slim = true;
        self
    }

    pub fn with_min_battery(mut self, percent: u8) -> Self {
        self.min_battery = percent;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    pub fn with_auto_disconnect(mut self, idle: Duration) -> Self {
        self.auto_disconnect = idle;
        self
    }
}

/// Per-print options
#[derive(Debug, Clone, Copy)]
pub struct PrintOptions {
    /// Number of copies; the Canon Ivy 2 accepts only 1
    pub copies: u8,

    /// Crop to fill the frame instead of letterboxing (Canon pipeline)
    pub auto_crop: bool,

    /// JPEG quality for the Canon pipeline, 1-100
    pub quality: u8,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            copies: 1,
            auto_crop: true,
            quality: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PrinterConfig::new("A4:62:DF:A9:72:D4", PrinterFamily::KodakStep);

        assert_eq!(config.channel, 1);
        assert!(!config.is_slim);
        assert_eq!(config.min_battery, 30);
        assert_eq!(config.command_timeout, Duration::from_secs(5));
        assert_eq!(config.chunk_delay, Duration::from_millis(20));
        assert_eq!(config.auto_disconnect, Duration::from_secs(30));
    }

    #[test]
    fn test_builders() {
        let config = PrinterConfig::new("A4:62:DF:A9:72:D4", PrinterFamily::KodakStep)
            .slim()
            .with_min_battery(50)
            .with_chunk_delay(Duration::from_millis(5));

        assert!(config.is_slim);
        assert_eq!(config.min_battery, 50);
        assert_eq!(config.chunk_delay, Duration::from_millis(5));
    }

    #[test]
    fn test_print_options_defaults() {
        let options = PrintOptions::default();
        assert_eq!(options.copies, 1);
        assert!(options.auto_crop);
        assert_eq!(options.quality, 100);
    }
}
