//! Linear axis motion
//!
//! Homing against the probe or a travel limit, and the small relative
//! moves used to re-seat a label.

pub mod homing;

pub use homing::{read_endstops, Axis, EndstopReading, HomingTarget};
