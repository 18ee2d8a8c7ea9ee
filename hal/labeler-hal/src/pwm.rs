//! PWM output abstraction

/// Single PWM channel
///
/// Duty is given in percent so drivers stay independent of the counter
/// resolution of the underlying slice.
pub trait PwmOutput {
    /// Set the duty cycle (0-100, larger values clamp to 100)
    fn set_duty_percent(&mut self, percent: u8);

    /// Current duty cycle in percent
    fn duty_percent(&self) -> u8;
}
