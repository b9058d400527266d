//! Unified error taxonomy
//!
//! One vocabulary for both printer families: connection-layer failures
//! wrap the transport error, codec violations wrap the protocol error,
//! and device-reported mechanical or thermal states get their own
//! variants.

use zinkprint_core::SessionState;
use zinkprint_types::DeviceCondition;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection-layer failure
    #[error("Transport error: {0}")]
    Transport(#[from] zinkprint_transport::Error),

    /// Bad magic, wrong ACK echo, or short packet; fatal for the session
    #[error("Protocol error: {0}")]
    Protocol(#[from] zinkprint_core::Error),

    /// Operation called out of order
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    #[error("Battery at {percent}%, need {required}%")]
    BatteryTooLow { percent: u8, required: u8 },

    #[error("Printer cover is open")]
    CoverOpen,

    #[error("No paper in printer")]
    NoPaper,

    #[error("Paper jam detected")]
    PaperJam,

    #[error("Wrong paper type loaded")]
    PaperMismatch,

    #[error("Paper misfeed detected")]
    Misfeed,

    #[error("Printer overheating")]
    Overheating,

    #[error("Printer cooling down")]
    Cooling,

    /// Device refused the request; retrying after ten seconds usually works
    #[error("Printer busy")]
    Busy,

    /// Calibration sheet missing or invalid (Canon)
    #[error("Wrong smart sheet inserted")]
    WrongSmartSheet,

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Operation not supported: {0}")]
    NotSupported(&'static str),
}

impl Error {
    /// Transient transport failures eligible for the
    /// reconnect-and-retry-once recovery
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Transport(zinkprint_transport::Error::Timeout)
                | Self::Transport(zinkprint_transport::Error::Io(_))
        )
    }

    /// Map a device-reported condition into the taxonomy
    ///
    /// `battery_percent` and `required` fill in the low-battery
    /// variant, since the device reports the condition without a level.
    pub fn from_condition(condition: DeviceCondition, battery_percent: u8, required: u8) -> Self {
        match condition {
            DeviceCondition::PaperJam => Self::PaperJam,
            DeviceCondition::NoPaper => Self::NoPaper,
            DeviceCondition::CoverOpen => Self::CoverOpen,
            DeviceCondition::PaperMismatch => Self::PaperMismatch,
            DeviceCondition::LowBattery => Self::BatteryTooLow {
                percent: battery_percent,
                required,
            },
            DeviceCondition::Overheating => Self::Overheating,
            DeviceCondition::Cooling => Self::Cooling,
            DeviceCondition::Misfeed => Self::Misfeed,
            DeviceCondition::Busy => Self::Busy,
            DeviceCondition::WrongSmartSheet => Self::WrongSmartSheet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(Error::Transport(zinkprint_transport::Error::Timeout).is_recoverable());
        assert!(Error::Transport(zinkprint_transport::Error::Io(
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe")
        ))
        .is_recoverable());

        assert!(!Error::Transport(zinkprint_transport::Error::NotConnected).is_recoverable());
        assert!(!Error::Busy.is_recoverable());
        assert!(!Error::CoverOpen.is_recoverable());
        assert!(!Error::Protocol(zinkprint_core::Error::UnknownStatus(0x42)).is_recoverable());
    }

    #[test]
    fn test_condition_mapping() {
        assert!(matches!(
            Error::from_condition(DeviceCondition::PaperJam, 80, 30),
            Error::PaperJam
        ));
        assert!(matches!(
            Error::from_condition(DeviceCondition::LowBattery, 12, 30),
            Error::BatteryTooLow {
                percent: 12,
                required: 30
            }
        ));
        assert!(matches!(
            Error::from_condition(DeviceCondition::WrongSmartSheet, 80, 30),
            Error::WrongSmartSheet
        ));
    }
}
