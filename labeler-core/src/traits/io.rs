//! Machine I/O capability set
//!
//! Everything the sequences need from the hardware apart from the axis
//! stepper and the swing motor: valve outputs, digital sensors, the vacuum
//! reading and a millisecond time base.

/// Pneumatic valve outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Valve {
    /// Suction cup on the swing arm
    Vacuum,
    /// Datum probe cylinder
    Probe,
    /// First clamp stage
    ClampSmall,
    /// Second clamp stage
    ClampBig,
}

/// Digital sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sensor {
    /// Arm at the deposit side
    SwingRight,
    /// Arm at the pickup side
    SwingLeft,
    /// Upper axis travel limit
    AxisUpper,
    /// Lower axis travel limit
    AxisLower,
    /// Datum probe contact
    Probe,
}

/// Hardware capability set
///
/// `is_triggered` already accounts for the sensor's wiring polarity.
/// `vacuum_level` grows with suction: a held label reads high.
pub trait MachineIo {
    /// Open (`true`) or close a valve
    fn set_valve(&mut self, valve: Valve, open: bool);

    /// Check if a sensor is triggered
    fn is_triggered(&mut self, sensor: Sensor) -> bool;

    /// Sample the vacuum sensor
    fn vacuum_level(&mut self) -> u16;

    /// Monotonic milliseconds
    fn now_ms(&mut self) -> u64;

    /// Block for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}
