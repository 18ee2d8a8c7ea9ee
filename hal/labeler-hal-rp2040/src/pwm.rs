//! PWM adapter
//!
//! Wraps any embedded-hal duty-cycle output, such as one channel of a
//! split embassy-rp `Pwm` slice.

use embedded_hal::pwm::SetDutyCycle;
use labeler_hal::pwm::PwmOutput;

pub struct RpPwm<P> {
    channel: P,
    duty: u8,
}

impl<P: SetDutyCycle> RpPwm<P> {
    /// Wrap `channel` and force it off
    pub fn new(mut channel: P) -> Self {
        let _ = channel.set_duty_cycle_fully_off();
        Self { channel, duty: 0 }
    }
}

impl<P: SetDutyCycle> PwmOutput for RpPwm<P> {
    fn set_duty_percent(&mut self, percent: u8) {
        let percent = percent.min(100);
        if self.channel.set_duty_cycle_percent(percent).is_ok() {
            self.duty = percent;
        }
    }

    fn duty_percent(&self) -> u8 {
        self.duty
    }
}
