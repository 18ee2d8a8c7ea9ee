//! Motor driver implementations
//!
//! - L293D: H-bridge for the swing arm's DC gear motor

pub mod l293d;

pub use l293d::{L293d, L293dConfig};
