//! State machine definition
//!
//! All valve, axis and arm behavior is a function of the current state
//! and an event.

use labeler_protocol::StateCode;

use super::events::Event;

/// Machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MachineState {
    /// Bring every actuator to its reference position
    Reset,
    /// Fault latched; outputs safe, waiting for a reset token
    #[default]
    Error,
    /// Probe the datum and clamp, without picking a label
    FirstLabel,
    /// Pick a label, carry it over, then run the first-label actions
    NextLabel,
    /// Waiting for a command
    Idle,
}

impl MachineState {
    /// Code announced on the status line
    pub fn status_code(self) -> StateCode {
        match self {
            MachineState::Reset => StateCode::Reset,
            MachineState::Error => StateCode::Error,
            MachineState::FirstLabel => StateCode::FirstLabel,
            MachineState::NextLabel => StateCode::NextLabel,
            MachineState::Idle => StateCode::Idle,
        }
    }

    /// Check if this state waits for operator input
    pub fn awaits_command(&self) -> bool {
        matches!(self, MachineState::Idle | MachineState::Error)
    }

    /// Check if this state runs an action sequence
    pub fn is_sequence(&self) -> bool {
        !self.awaits_command()
    }

    /// Process an event and return the next state
    ///
    /// This is the core state transition logic.
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use MachineState::*;

        match (self, event) {
            // Any fault latches Error
            (_, Faulted(_)) => Error,

            // Idle transitions
            (Idle, ResetRequested) => Reset,
            (Idle, LabelRequested { first_cycle: true }) => FirstLabel,
            (Idle, LabelRequested { first_cycle: false }) => NextLabel,
            (Idle, ConfigExchanged) => Idle,

            // Sequences end in Idle
            (Reset | FirstLabel | NextLabel, SequenceComplete) => Idle,

            // Error only leaves through Reset
            (Error, ResetRequested) => Reset,

            // Default: stay in current state
            _ => self,
        }
    }
}
