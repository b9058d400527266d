//! Normalized printer status

use std::fmt;

use zinkprint_core::kodak::StatusCode;

/// Device-reported condition, normalized across families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCondition {
    PaperJam,
    NoPaper,
    CoverOpen,
    PaperMismatch,
    LowBattery,
    Overheating,
    Cooling,
    Misfeed,
    /// Device refused the request; retrying after ten seconds usually works
    Busy,
    /// Calibration sheet missing or invalid (Canon)
    WrongSmartSheet,
}

impl DeviceCondition {
    /// Human-readable description
    pub fn message(self) -> &'static str {
        match self {
            Self::PaperJam => "paper jam",
            Self::NoPaper => "out of paper",
            Self::CoverOpen => "cover open",
            Self::PaperMismatch => "wrong paper type",
            Self::LowBattery => "battery too low",
            Self::Overheating => "overheating",
            Self::Cooling => "cooling down",
            Self::Misfeed => "paper misfeed",
            Self::Busy => "printer busy",
            Self::WrongSmartSheet => "wrong smart sheet",
        }
    }
}

impl fmt::Display for DeviceCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl TryFrom<StatusCode> for DeviceCondition {
    type Error = ();

    /// Kodak status codes map one-to-one; `Ok` has no condition
    fn try_from(code: StatusCode) -> Result<Self, ()> {
        match code {
            StatusCode::Ok => Err(()),
            StatusCode::PaperJam => Ok(Self::PaperJam),
            StatusCode::NoPaper => Ok(Self::NoPaper),
            StatusCode::CoverOpen => Ok(Self::CoverOpen),
            StatusCode::PaperMismatch => Ok(Self::PaperMismatch),
            StatusCode::LowBattery => Ok(Self::LowBattery),
            StatusCode::Overheating => Ok(Self::Overheating),
            StatusCode::Cooling => Ok(Self::Cooling),
            StatusCode::Misfeed => Ok(Self::Misfeed),
            StatusCode::Busy => Ok(Self::Busy),
        }
    }
}

/// Normalized printer status surfaced to callers
///
/// The optional flags are populated only when the device family
/// reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterStatus {
    /// Battery charge, 0-100
    pub battery_percent: u8,

    /// True iff no blocking condition and the battery is at or above
    /// the configured minimum
    pub is_ready: bool,

    /// Blocking condition, if any
    pub condition: Option<DeviceCondition>,

    pub cover_open: Option<bool>,
    pub no_paper: Option<bool>,
    pub charging: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kodak_codes_map_one_to_one() {
        let pairs = [
            (StatusCode::PaperJam, DeviceCondition::PaperJam),
            (StatusCode::NoPaper, DeviceCondition::NoPaper),
            (StatusCode::CoverOpen, DeviceCondition::CoverOpen),
            (StatusCode::PaperMismatch, DeviceCondition::PaperMismatch),
            (StatusCode::LowBattery, DeviceCondition::LowBattery),
            (StatusCode::Overheating, DeviceCondition::Overheating),
            (StatusCode::Cooling, DeviceCondition::Cooling),
            (StatusCode::Misfeed, DeviceCondition::Misfeed),
            (StatusCode::Busy, DeviceCondition::Busy),
        ];

        for (code, condition) in pairs {
            assert_eq!(DeviceCondition::try_from(code), Ok(condition));
        }

        assert_eq!(DeviceCondition::try_from(StatusCode::Ok), Err(()));
    }
}
