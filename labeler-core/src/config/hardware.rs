//! Sensor wiring polarity
//!
//! Which pin level means "triggered" differs per input on the reference
//! board: the axis limit switches are normally-closed and read high when
//! tripped, while the probe and the swing endstops pull low.

use labeler_hal::gpio::ActiveLevel;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Active level for every digital sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorLevels {
    pub swing_right: ActiveLevel,
    pub swing_left: ActiveLevel,
    pub axis_upper: ActiveLevel,
    pub axis_lower: ActiveLevel,
    pub probe: ActiveLevel,
}

impl Default for SensorLevels {
    fn default() -> Self {
        Self {
            swing_right: ActiveLevel::Low,
            swing_left: ActiveLevel::Low,
            axis_upper: ActiveLevel::High,
            axis_lower: ActiveLevel::High,
            probe: ActiveLevel::Low,
        }
    }
}
