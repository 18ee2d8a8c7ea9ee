//! Machine faults
//!
//! Every fault forces the machine into `Error`; each maps onto one coded
//! error line of the operator protocol.

use labeler_protocol::ErrorCode;

/// Faults raised by the sequences and the command loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// Received line matched no command
    UnknownCommand,
    /// Axis hit a travel limit while seeking the probe
    LimitSwitch,
    /// Homing move ran out without contact
    SoftwareLimit,
    /// Vacuum dropped while the arm carried a label
    VacuumLost,
    /// Arm did not reach its endstop within the window
    SwingBlocked,
    /// No label confirmed after every pickup attempt
    FeederEmpty,
    /// Stepper driver did not answer on its UART
    DriverLink,
    /// Configuration replacement rejected
    InvalidConfig,
}

impl Fault {
    /// Error line code for this fault
    pub fn code(self) -> ErrorCode {
        match self {
            Fault::UnknownCommand => ErrorCode::UnknownCommand,
            Fault::LimitSwitch => ErrorCode::LimitSwitch,
            Fault::SoftwareLimit => ErrorCode::SoftwareLimit,
            Fault::VacuumLost => ErrorCode::VacuumLost,
            Fault::SwingBlocked => ErrorCode::SwingBlocked,
            Fault::FeederEmpty => ErrorCode::FeederEmpty,
            Fault::DriverLink => ErrorCode::DriverLink,
            Fault::InvalidConfig => ErrorCode::InvalidConfig,
        }
    }
}

impl From<Fault> for ErrorCode {
    fn from(fault: Fault) -> Self {
        fault.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let faults = [
            Fault::UnknownCommand,
            Fault::LimitSwitch,
            Fault::SoftwareLimit,
            Fault::VacuumLost,
            Fault::SwingBlocked,
            Fault::FeederEmpty,
            Fault::DriverLink,
            Fault::InvalidConfig,
        ];
        for (i, fault) in faults.iter().enumerate() {
            assert_eq!(fault.code().code(), i as u8);
        }
    }
}
