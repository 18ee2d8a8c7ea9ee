//! Operational state machine
//!
//! Defines the authoritative runtime behavior of the machine.
//! The state machine is explicit, finite, and deterministic.

pub mod actions;
pub mod events;
pub mod machine;

pub use actions::Action;
pub use events::Event;
pub use machine::MachineState;
