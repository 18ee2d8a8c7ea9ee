//! ADC adapter
//!
//! One converter shared by nothing else, so the channel and the
//! converter travel together.

use embassy_rp::adc::{Adc, Blocking, Channel, Error};
use labeler_hal::adc::AnalogInput;

/// Single ADC channel sampled in blocking mode (12-bit counts)
pub struct RpAnalog<'d> {
    adc: Adc<'d, Blocking>,
    channel: Channel<'d>,
}

impl<'d> RpAnalog<'d> {
    pub fn new(adc: Adc<'d, Blocking>, channel: Channel<'d>) -> Self {
        Self { adc, channel }
    }
}

impl AnalogInput for RpAnalog<'_> {
    type Error = Error;

    fn read(&mut self) -> Result<u16, Error> {
        self.adc.blocking_read(&mut self.channel)
    }
}
