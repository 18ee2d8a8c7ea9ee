//! Status and error lines emitted by the controller
//!
//! The exact text of every line is part of the host contract:
//!
//! ```text
//! STATE<00>: ERROR | send 'RESET' to continue
//! STATE<01>: IDLE
//! ERROR<05>: No labels in the feeder
//! READY
//! ```

use core::fmt::Write;

use crate::line::Line;

/// Prefix of state announcements
const STATE_PREFIX: &str = "STATE<";
/// Prefix of error reports
const ERROR_PREFIX: &str = "ERROR<";
/// Label placement finished
const READY: &str = "READY";

/// State announced on a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StateCode {
    Error,
    Idle,
    Reset,
    NextLabel,
    FirstLabel,
}

impl StateCode {
    const ALL: [StateCode; 5] = [
        StateCode::Error,
        StateCode::Idle,
        StateCode::Reset,
        StateCode::NextLabel,
        StateCode::FirstLabel,
    ];

    /// Two-digit code on the wire
    pub fn code(self) -> u8 {
        match self {
            StateCode::Error => 0,
            StateCode::Idle => 1,
            StateCode::Reset => 2,
            StateCode::NextLabel => 3,
            StateCode::FirstLabel => 4,
        }
    }

    /// Text following the code
    pub fn text(self) -> &'static str {
        match self {
            StateCode::Error => "ERROR | send 'RESET' to continue",
            StateCode::Idle => "IDLE",
            StateCode::Reset => "RESET",
            StateCode::NextLabel => "NEXT_LABEL",
            StateCode::FirstLabel => "FIRST_LABEL",
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }
}

/// Fault reported on an error line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorCode {
    /// Line did not match any command
    UnknownCommand,
    /// Hard travel limit hit while homing
    LimitSwitch,
    /// Homing move ran out without contact
    SoftwareLimit,
    /// Vacuum dropped while the arm carried a label
    VacuumLost,
    /// Arm did not reach its endstop in time
    SwingBlocked,
    /// No label picked up after every attempt
    FeederEmpty,
    /// Stepper driver did not answer on its UART
    DriverLink,
    /// Configuration replacement rejected
    InvalidConfig,
}

impl ErrorCode {
    const ALL: [ErrorCode; 8] = [
        ErrorCode::UnknownCommand,
        ErrorCode::LimitSwitch,
        ErrorCode::SoftwareLimit,
        ErrorCode::VacuumLost,
        ErrorCode::SwingBlocked,
        ErrorCode::FeederEmpty,
        ErrorCode::DriverLink,
        ErrorCode::InvalidConfig,
    ];

    /// Two-digit code on the wire
    pub fn code(self) -> u8 {
        match self {
            ErrorCode::UnknownCommand => 0,
            ErrorCode::LimitSwitch => 1,
            ErrorCode::SoftwareLimit => 2,
            ErrorCode::VacuumLost => 3,
            ErrorCode::SwingBlocked => 4,
            ErrorCode::FeederEmpty => 5,
            ErrorCode::DriverLink => 6,
            ErrorCode::InvalidConfig => 7,
        }
    }

    /// Human-readable text following the code
    pub fn text(self) -> &'static str {
        match self {
            ErrorCode::UnknownCommand => "Unknown command",
            ErrorCode::LimitSwitch => "Limit switch was triggered",
            ErrorCode::SoftwareLimit => "Stepper motor software limit",
            ErrorCode::VacuumLost => "Low Vacuum during swing movement",
            ErrorCode::SwingBlocked => "Swing Blocked",
            ErrorCode::FeederEmpty => "No labels in the feeder",
            ErrorCode::DriverLink => "No communication with stepper motor",
            ErrorCode::InvalidConfig => "Invalid configuration",
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.code() == code)
    }
}

/// One line of controller output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusLine {
    State(StateCode),
    Error(ErrorCode),
    Ready,
}

impl StatusLine {
    /// Render the line without its terminator
    pub fn render(self) -> Line {
        let mut line = Line::new();
        // Longest line is 43 bytes, well inside the buffer
        let _ = match self {
            StatusLine::State(s) => write!(line, "{}{:02}>: {}", STATE_PREFIX, s.code(), s.text()),
            StatusLine::Error(e) => write!(line, "{}{:02}>: {}", ERROR_PREFIX, e.code(), e.text()),
            StatusLine::Ready => line.push_str(READY).map_err(|_| core::fmt::Error),
        };
        line
    }

    /// Parse a rendered line
    ///
    /// Only the prefix and code are significant; the trailing text is
    /// informational and not checked.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line == READY {
            return Some(StatusLine::Ready);
        }
        if let Some(rest) = line.strip_prefix(STATE_PREFIX) {
            return parse_code(rest).and_then(StateCode::from_code).map(StatusLine::State);
        }
        if let Some(rest) = line.strip_prefix(ERROR_PREFIX) {
            return parse_code(rest).and_then(ErrorCode::from_code).map(StatusLine::Error);
        }
        None
    }

    /// Check if this line reports a fault
    pub fn is_error(&self) -> bool {
        matches!(self, StatusLine::Error(_) | StatusLine::State(StateCode::Error))
    }
}

/// Parse `nn>: ...` into `nn`
fn parse_code(rest: &str) -> Option<u8> {
    let (digits, tail) = rest.split_once('>')?;
    if digits.len() != 2 || !tail.starts_with(':') {
        return None;
    }
    digits.parse().ok()
}
