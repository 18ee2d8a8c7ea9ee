//! RP2040-specific HAL for the label applicator firmware
//!
//! This crate provides RP2040 implementations of the shared
//! `labeler-hal` traits, plus the axis stepper:
//!
//! - GPIO, ADC and PWM adapters over embassy-rp
//! - Millisecond clock and blocking delay over embassy-time
//! - UART adapters with a receive timeout
//! - PIO-based counted step generation (implements `labeler_core::traits::AxisStepper`)
//! - Flash storage driver (implements `labeler_hal::FlashStorage`)

#![no_std]

pub mod adc;
pub mod flash;
pub mod gpio;
pub mod pwm;
pub mod stepper;
pub mod time;
pub mod uart;

// Re-export shared traits from labeler-hal for convenience
pub use labeler_hal::{FlashStorage as FlashStorageTrait, StorageKey};
