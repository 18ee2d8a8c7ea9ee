//! Pin bank
//!
//! Binds board pins to the machine capability set. Valve outputs are
//! active-high; each digital sensor is resolved through its configured
//! [`ActiveLevel`](labeler_hal::gpio::ActiveLevel).

use labeler_hal::adc::AnalogInput;
use labeler_hal::gpio::{InputPin, OutputPin};
use labeler_hal::time::{Clock, Delay};

use crate::config::SensorLevels;
use crate::traits::{MachineIo, Sensor, Valve};

/// Valve solenoid outputs
pub struct ValvePins<O> {
    pub vacuum: O,
    pub probe: O,
    pub clamp_small: O,
    pub clamp_big: O,
}

impl<O: OutputPin> ValvePins<O> {
    fn pin(&mut self, valve: Valve) -> &mut O {
        match valve {
            Valve::Vacuum => &mut self.vacuum,
            Valve::Probe => &mut self.probe,
            Valve::ClampSmall => &mut self.clamp_small,
            Valve::ClampBig => &mut self.clamp_big,
        }
    }

    /// Close every valve
    pub fn close_all(&mut self) {
        self.vacuum.set_low();
        self.probe.set_low();
        self.clamp_small.set_low();
        self.clamp_big.set_low();
    }
}

/// Endstop and probe inputs
pub struct SensorPins<I> {
    pub swing_right: I,
    pub swing_left: I,
    pub axis_upper: I,
    pub axis_lower: I,
    pub probe: I,
}

/// Board pins behind [`MachineIo`]
pub struct PinBank<O, I, A, T> {
    valves: ValvePins<O>,
    sensors: SensorPins<I>,
    levels: SensorLevels,
    vacuum: A,
    time: T,
}

impl<O, I, A, T> PinBank<O, I, A, T>
where
    O: OutputPin,
    I: InputPin,
    A: AnalogInput,
    T: Clock + Delay,
{
    /// Bind the pins; every valve starts closed
    pub fn new(
        mut valves: ValvePins<O>,
        sensors: SensorPins<I>,
        levels: SensorLevels,
        vacuum: A,
        time: T,
    ) -> Self {
        valves.close_all();
        Self {
            valves,
            sensors,
            levels,
            vacuum,
            time,
        }
    }

    /// Check if a valve output is currently open
    pub fn is_open(&self, valve: Valve) -> bool {
        match valve {
            Valve::Vacuum => self.valves.vacuum.is_set_high(),
            Valve::Probe => self.valves.probe.is_set_high(),
            Valve::ClampSmall => self.valves.clamp_small.is_set_high(),
            Valve::ClampBig => self.valves.clamp_big.is_set_high(),
        }
    }
}

impl<O, I, A, T> MachineIo for PinBank<O, I, A, T>
where
    O: OutputPin,
    I: InputPin,
    A: AnalogInput,
    T: Clock + Delay,
{
    fn set_valve(&mut self, valve: Valve, open: bool) {
        self.valves.pin(valve).set_state(open);
    }

    fn is_triggered(&mut self, sensor: Sensor) -> bool {
        let (pin, level) = match sensor {
            Sensor::SwingRight => (&self.sensors.swing_right, self.levels.swing_right),
            Sensor::SwingLeft => (&self.sensors.swing_left, self.levels.swing_left),
            Sensor::AxisUpper => (&self.sensors.axis_upper, self.levels.axis_upper),
            Sensor::AxisLower => (&self.sensors.axis_lower, self.levels.axis_lower),
            Sensor::Probe => (&self.sensors.probe, self.levels.probe),
        };
        level.is_active(pin.is_high())
    }

    fn vacuum_level(&mut self) -> u16 {
        // A failed conversion reads as "no label held"
        self.vacuum.read().unwrap_or_else(|_| {
            warn!("vacuum sensor read failed");
            0
        })
    }

    fn now_ms(&mut self) -> u64 {
        self.time.now_ms()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.time.delay_ms(ms);
    }
}
