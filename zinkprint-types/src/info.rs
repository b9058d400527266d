//! Static printer descriptors

use std::fmt;

/// Supported printer families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrinterFamily {
    /// Kodak Step, Step Touch, Step Slim, Step Touch Snap 2
    KodakStep,
    /// Canon Ivy 2
    CanonIvy2,
}

impl fmt::Display for PrinterFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::KodakStep => "Kodak Step",
            Self::CanonIvy2 => "Canon Ivy 2",
        };
        f.write_str(name)
    }
}

/// Optional capabilities advertised by a printer
///
/// Callers check these before invoking family-specific operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterCapabilities {
    pub can_get_status: bool,
    pub can_get_battery: bool,
    pub can_configure_settings: bool,
    pub can_reboot: bool,
    pub supports_multiple_copies: bool,
    /// Minimum battery percentage required to start a print
    pub min_battery_for_print: u8,
}

/// Static printer information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterInfo {
    pub family: PrinterFamily,

    /// Human-readable model name
    pub name: &'static str,

    /// Print width in pixels
    pub print_width: u32,

    /// Print height in pixels
    pub print_height: u32,

    /// Accepted input image formats
    pub supported_formats: &'static [&'static str],

    pub capabilities: PrinterCapabilities,
}

impl fmt::Display for PrinterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}x{})",
            self.name, self.print_width, self.print_height
        )
    }
}
