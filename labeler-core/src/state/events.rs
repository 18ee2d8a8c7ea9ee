//! Events that trigger state transitions

use crate::fault::Fault;

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Operator commands
    /// Reset token received
    ResetRequested,
    /// Next-label token received; carries the first-cycle flag
    LabelRequested { first_cycle: bool },
    /// Configuration exchange finished (replaced or kept)
    ConfigExchanged,

    // Sequence results
    /// Entry actions of the current state all succeeded
    SequenceComplete,
    /// A fault was raised
    Faulted(Fault),
}

impl Event {
    /// Check if this event comes from an operator command
    pub fn is_command(&self) -> bool {
        matches!(
            self,
            Event::ResetRequested | Event::LabelRequested { .. } | Event::ConfigExchanged
        )
    }
}
