//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in labeler-core for the machine's driver chips:
//!
//! - Swing motor (L293D H-bridge)
//! - Axis stepper driver configuration (TMC2209 over UART)

#![no_std]
#![deny(unsafe_code)]

pub mod motor;
pub mod stepper;
