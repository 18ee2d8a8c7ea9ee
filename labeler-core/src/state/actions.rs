//! Entry action lists
//!
//! Each sequence state runs a fixed list of primitive actions. `NextLabel`
//! is the pickup followed by the whole `FirstLabel` list, so the two are
//! spelled out as one list rather than a fall-through between handlers.

use super::machine::MachineState;
use crate::motion::HomingTarget;
use crate::swing::SwingSide;

/// One primitive step of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    RetractClamp,
    DeployClamp,
    RetractProbe,
    DeployProbe,
    VacuumOff,
    /// Swing without the vacuum interlock
    Swing(SwingSide),
    Home(HomingTarget),
    /// Vacuum pickup and transfer to the deposit side
    PickLabel,
    /// Emit `READY` and count the placement
    Ready,
}

/// Safe-output actions run on entry to `Error`
pub const ERROR_ACTIONS: &[Action] = &[
    Action::RetractClamp,
    Action::RetractProbe,
    Action::VacuumOff,
];

pub const RESET_ACTIONS: &[Action] = &[
    Action::RetractClamp,
    Action::RetractProbe,
    Action::VacuumOff,
    Action::Swing(SwingSide::Right),
    Action::Home(HomingTarget::LowerLimit),
];

pub const FIRST_LABEL_ACTIONS: &[Action] = &[
    Action::DeployProbe,
    Action::Home(HomingTarget::Probe),
    Action::DeployClamp,
    Action::RetractProbe,
    Action::Ready,
];

pub const NEXT_LABEL_ACTIONS: &[Action] = &[
    Action::RetractClamp,
    Action::PickLabel,
    Action::DeployProbe,
    Action::Home(HomingTarget::Probe),
    Action::DeployClamp,
    Action::RetractProbe,
    Action::Ready,
];

/// Entry actions for `state`
pub fn actions_for(state: MachineState) -> &'static [Action] {
    match state {
        MachineState::Reset => RESET_ACTIONS,
        MachineState::Error => ERROR_ACTIONS,
        MachineState::FirstLabel => FIRST_LABEL_ACTIONS,
        MachineState::NextLabel => NEXT_LABEL_ACTIONS,
        MachineState::Idle => &[],
    }
}
