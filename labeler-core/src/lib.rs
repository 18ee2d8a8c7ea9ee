//! Board-agnostic core logic for the label applicator firmware
//!
//! This crate contains all machine logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware capability traits (machine I/O, axis stepper, swing motor, console)
//! - Operational state machine and its entry action lists
//! - Pneumatics, swing, homing and pickup sequences
//! - The controller that ties them to the operator console
//! - Machine configuration and the console configuration exchange

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod controller;
pub mod fault;
pub mod motion;
pub mod pickup;
pub mod pins;
pub mod pneumatic;
pub mod poll;
pub mod state;
pub mod swing;
pub mod traits;

#[cfg(test)]
mod sim;

pub use controller::{Context, Controller, StepOutcome};
pub use fault::Fault;
