//! Axis stepper trait
//!
//! The axis driver only knows relative step counts. Steps are signed:
//! negative moves the carriage up (away from the work), positive moves it
//! down.

/// Rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Clockwise rotation
    Clockwise,
    /// Counter-clockwise rotation
    CounterClockwise,
}

/// Relative-move stepper axis
pub trait AxisStepper {
    /// Energize (`true`) or release the motor
    fn enable(&mut self, enabled: bool);

    /// Set the step rate for following moves
    ///
    /// `ramp` is the acceleration ramp length passed through to the step
    /// generator.
    fn set_speed(&mut self, steps_per_s: u32, ramp: u16);

    /// Start a relative move of `steps` (sign gives direction)
    ///
    /// Replaces any move in progress.
    fn move_steps(&mut self, steps: i32);

    /// Steps left in the current move
    fn steps_remaining(&mut self) -> u32;

    /// Check if a move is in progress
    fn is_moving(&mut self) -> bool {
        self.steps_remaining() > 0
    }

    /// Stop immediately, dropping the rest of the move
    fn stop(&mut self);

    /// Absolute step counter since power-up
    fn position(&mut self) -> i32;
}
