//! L293D H-bridge driver for the swing motor
//!
//! Two direction inputs and a PWM enable. Stopping drops the enable and
//! both inputs, so the motor coasts against its endstop.
//!
//! ```ignore
//! let mut motor = L293d::new(in_a, in_b, enable_pwm, L293dConfig::default());
//! motor.run(Direction::Clockwise, 50);
//! motor.stop();
//! ```

use labeler_core::traits::{Direction, SwingMotor};
use labeler_hal::gpio::OutputPin;
use labeler_hal::pwm::PwmOutput;

/// H-bridge configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct L293dConfig {
    /// Minimum duty cycle percentage (below this the motor won't start)
    pub min_duty: u8,
    /// Swap the inputs when the motor is wired the other way round
    pub reversed: bool,
}

impl Default for L293dConfig {
    fn default() -> Self {
        Self {
            min_duty: 20,
            reversed: false,
        }
    }
}

pub struct L293d<O, P> {
    in_a: O,
    in_b: O,
    enable: P,
    config: L293dConfig,
}

impl<O: OutputPin, P: PwmOutput> L293d<O, P> {
    /// Create the driver with the bridge off
    pub fn new(in_a: O, in_b: O, enable: P, config: L293dConfig) -> Self {
        let mut motor = Self {
            in_a,
            in_b,
            enable,
            config,
        };
        motor.release();
        motor
    }

    fn duty(&self, percent: u8) -> u8 {
        percent.clamp(self.config.min_duty.min(100), 100)
    }

    fn release(&mut self) {
        self.enable.set_duty_percent(0);
        self.in_a.set_low();
        self.in_b.set_low();
    }
}

impl<O: OutputPin, P: PwmOutput> SwingMotor for L293d<O, P> {
    fn run(&mut self, dir: Direction, percent: u8) {
        if percent == 0 {
            self.release();
            return;
        }
        // Never switch the inputs with the bridge enabled
        self.enable.set_duty_percent(0);

        let forward = (dir == Direction::Clockwise) != self.config.reversed;
        self.in_a.set_state(forward);
        self.in_b.set_state(!forward);
        self.enable.set_duty_percent(self.duty(percent));
    }

    fn stop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Pin(bool);

    impl OutputPin for Pin {
        fn set_high(&mut self) {
            self.0 = true;
        }
        fn set_low(&mut self) {
            self.0 = false;
        }
        fn is_set_high(&self) -> bool {
            self.0
        }
    }

    #[derive(Default)]
    struct Pwm(u8);

    impl PwmOutput for Pwm {
        fn set_duty_percent(&mut self, percent: u8) {
            self.0 = percent.min(100);
        }
        fn duty_percent(&self) -> u8 {
            self.0
        }
    }

    fn motor(config: L293dConfig) -> L293d<Pin, Pwm> {
        L293d::new(Pin(true), Pin(true), Pwm(100), config)
    }

    #[test]
    fn test_starts_released() {
        let m = motor(L293dConfig::default());
        assert!(!m.in_a.is_set_high());
        assert!(!m.in_b.is_set_high());
        assert_eq!(m.enable.duty_percent(), 0);
    }

    #[test]
    fn test_run_directions() {
        let mut m = motor(L293dConfig::default());
        m.run(Direction::Clockwise, 50);
        assert!(m.in_a.is_set_high());
        assert!(!m.in_b.is_set_high());
        assert_eq!(m.enable.duty_percent(), 50);

        m.run(Direction::CounterClockwise, 50);
        assert!(!m.in_a.is_set_high());
        assert!(m.in_b.is_set_high());
    }

    #[test]
    fn test_reversed_wiring() {
        let mut m = motor(L293dConfig {
            reversed: true,
            ..Default::default()
        });
        m.run(Direction::Clockwise, 50);
        assert!(!m.in_a.is_set_high());
        assert!(m.in_b.is_set_high());
    }

    #[test]
    fn test_duty_limits() {
        let mut m = motor(L293dConfig::default());
        m.run(Direction::Clockwise, 5);
        assert_eq!(m.enable.duty_percent(), 20);
        m.run(Direction::Clockwise, 150);
        assert_eq!(m.enable.duty_percent(), 100);
        m.run(Direction::Clockwise, 0);
        assert_eq!(m.enable.duty_percent(), 0);
        assert!(!m.in_a.is_set_high());
        assert!(!m.in_b.is_set_high());
    }

    #[test]
    fn test_stop() {
        let mut m = motor(L293dConfig::default());
        m.run(Direction::CounterClockwise, 80);
        m.stop();
        assert_eq!(m.enable.duty_percent(), 0);
        assert!(!m.in_a.is_set_high());
        assert!(!m.in_b.is_set_high());
    }
}
