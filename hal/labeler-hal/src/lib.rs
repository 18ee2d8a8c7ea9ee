//! Labeler Hardware Abstraction Layer
//!
//! This crate defines hardware abstraction traits that can be implemented
//! by chip-specific HALs. The machine logic in `labeler-core` only sees
//! these traits, so the same control code runs on the RP2040 board and
//! against the simulated machine used by the host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (labeler-firmware)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  labeler-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ labeler-hal-  │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`adc::AnalogInput`] - Single-channel analog sampling
//! - [`pwm::PwmOutput`] - Duty-cycle output
//! - [`time::Clock`], [`time::Delay`] - Millisecond time base
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial communication
//! - [`flash::FlashStorage`] - Persistent storage

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod flash;
pub mod gpio;
pub mod pwm;
pub mod time;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use adc::AnalogInput;
pub use flash::{FlashStorage, StorageKey};
pub use gpio::{InputPin, OutputPin};
pub use pwm::PwmOutput;
pub use time::{Clock, Delay};
pub use uart::{UartRx, UartTx};
