//! Simulated machine for host tests
//!
//! One shared [`World`] behind the I/O, stepper, motor handles. Time is
//! virtual: every sensor read and clock read costs one millisecond and a
//! delay costs its length, so bounded waits always make progress. Axis and
//! arm positions are derived from elapsed virtual time.

use std::cell::{RefCell, RefMut};
use std::collections::VecDeque;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use labeler_protocol::{Line, LineError, LineParser};

use crate::swing::SwingSide;
use crate::traits::{AxisStepper, Console, Direction, MachineIo, Sensor, SwingMotor, Valve};

/// Recorded actuator activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    Valve(Valve, bool),
    SwingRun(Direction, u8),
    SwingStop,
    Move(i32),
    AxisStop,
    Delay(u32),
}

#[derive(Debug, Clone, Copy)]
struct AxisMove {
    start_ms: u64,
    start_pos: i32,
    steps: i32,
    rate: u32,
}

impl AxisMove {
    fn done(&self, now: u64) -> u32 {
        let elapsed = now.saturating_sub(self.start_ms);
        let done = elapsed * u64::from(self.rate) / 1000;
        done.min(u64::from(self.steps.unsigned_abs())) as u32
    }

    fn position(&self, now: u64) -> i32 {
        self.start_pos + self.steps.signum() * self.done(now) as i32
    }
}

pub struct World {
    pub now: u64,

    /// Raw position at or past which the upper limit reads triggered
    pub upper_limit_at: i32,
    /// Raw position at or past which the lower limit reads triggered
    pub lower_limit_at: i32,
    /// Raw position where the deployed probe makes contact
    pub probe_at: Option<i32>,
    axis_pos: i32,
    axis_move: Option<AxisMove>,
    axis_rate: u32,

    /// Milliseconds the arm needs from one endstop to the other
    pub arm_travel: u64,
    arm_pos: u64,
    pub arm_running: bool,
    arm_dir: Direction,
    arm_updated: u64,
    pub arm_blocked: bool,

    valves: [bool; 4],
    /// Bounces needed before the cup seals; `None` means an empty feeder
    pub hold_after_hops: Option<u32>,
    pub hops: u32,
    grabbed: bool,
    /// Label falls off halfway through the swing
    pub drop_in_transit: bool,
    pub held_level: u16,
    pub idle_level: u16,

    events: Vec<SimEvent>,
}

fn valve_index(valve: Valve) -> usize {
    match valve {
        Valve::Vacuum => 0,
        Valve::Probe => 1,
        Valve::ClampSmall => 2,
        Valve::ClampBig => 3,
    }
}

impl World {
    fn new() -> Self {
        Self {
            now: 0,
            upper_limit_at: -15_000,
            lower_limit_at: 2_000,
            probe_at: Some(-8_000),
            axis_pos: 0,
            axis_move: None,
            axis_rate: 0,
            arm_travel: 400,
            arm_pos: 0,
            arm_running: false,
            arm_dir: Direction::Clockwise,
            arm_updated: 0,
            arm_blocked: false,
            valves: [false; 4],
            hold_after_hops: Some(0),
            hops: 0,
            grabbed: false,
            drop_in_transit: false,
            held_level: 800,
            idle_level: 40,
            events: Vec::new(),
        }
    }

    pub fn feeder_empty(&mut self) {
        self.hold_after_hops = None;
    }

    pub fn axis_position(&self) -> i32 {
        match self.axis_move {
            Some(m) => m.position(self.now),
            None => self.axis_pos,
        }
    }

    pub fn axis_moving(&self) -> bool {
        self.axis_move
            .map(|m| m.done(self.now) < m.steps.unsigned_abs())
            .unwrap_or(false)
    }

    /// Teleport the carriage
    pub fn set_axis(&mut self, pos: i32) {
        self.axis_move = None;
        self.axis_pos = pos;
    }

    fn freeze_axis(&mut self) {
        self.axis_pos = self.axis_position();
        self.axis_move = None;
    }

    fn sync_arm(&mut self) {
        let dt = self.now.saturating_sub(self.arm_updated);
        self.arm_updated = self.now;
        if !self.arm_running || self.arm_blocked {
            return;
        }
        self.arm_pos = match self.arm_dir {
            Direction::Clockwise => (self.arm_pos + dt).min(self.arm_travel),
            Direction::CounterClockwise => self.arm_pos.saturating_sub(dt),
        };
        if self.grabbed && self.drop_in_transit && self.arm_pos > self.arm_travel / 2 {
            self.grabbed = false;
        }
    }

    fn tick(&mut self) {
        self.now += 1;
        self.sync_arm();
    }

    fn triggered(&self, sensor: Sensor) -> bool {
        let pos = self.axis_position();
        match sensor {
            Sensor::SwingLeft => self.arm_pos == 0,
            Sensor::SwingRight => self.arm_pos == self.arm_travel,
            Sensor::AxisUpper => pos <= self.upper_limit_at,
            Sensor::AxisLower => pos >= self.lower_limit_at,
            Sensor::Probe => {
                self.valves[valve_index(Valve::Probe)] && self.probe_at.is_some_and(|p| pos <= p)
            }
        }
    }

    fn vacuum(&mut self) -> u16 {
        if self.valves[valve_index(Valve::Vacuum)] {
            let seals = self.hold_after_hops.is_some_and(|n| self.hops >= n);
            if !self.grabbed && self.arm_pos == 0 && seals {
                self.grabbed = true;
            }
        } else {
            self.grabbed = false;
        }
        if self.grabbed {
            self.held_level
        } else {
            self.idle_level
        }
    }
}

/// Handle factory for one simulated machine
pub struct Sim {
    world: Rc<RefCell<World>>,
}

impl Sim {
    pub fn new() -> Self {
        Self {
            world: Rc::new(RefCell::new(World::new())),
        }
    }

    pub fn world(&self) -> RefMut<'_, World> {
        self.world.borrow_mut()
    }

    pub fn io(&self) -> SimIo {
        SimIo {
            world: self.world.clone(),
        }
    }

    pub fn stepper(&self) -> SimStepper {
        SimStepper {
            world: self.world.clone(),
        }
    }

    pub fn motor(&self) -> SimMotor {
        SimMotor {
            world: self.world.clone(),
        }
    }

    pub fn now(&self) -> u64 {
        self.world.borrow().now
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.world.borrow().events.clone()
    }

    pub fn valve_events(&self) -> Vec<SimEvent> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, SimEvent::Valve(..)))
            .collect()
    }

    pub fn valve(&self, valve: Valve) -> bool {
        self.world.borrow().valves[valve_index(valve)]
    }

    pub fn arm_at(&self, side: SwingSide) -> bool {
        let mut world = self.world.borrow_mut();
        world.sync_arm();
        match side {
            SwingSide::Left => world.arm_pos == 0,
            SwingSide::Right => world.arm_pos == world.arm_travel,
        }
    }
}

pub struct SimIo {
    world: Rc<RefCell<World>>,
}

impl MachineIo for SimIo {
    fn set_valve(&mut self, valve: Valve, open: bool) {
        let mut w = self.world.borrow_mut();
        w.events.push(SimEvent::Valve(valve, open));
        w.valves[valve_index(valve)] = open;
    }

    fn is_triggered(&mut self, sensor: Sensor) -> bool {
        let mut w = self.world.borrow_mut();
        w.tick();
        w.triggered(sensor)
    }

    fn vacuum_level(&mut self) -> u16 {
        let mut w = self.world.borrow_mut();
        w.tick();
        w.vacuum()
    }

    fn now_ms(&mut self) -> u64 {
        let mut w = self.world.borrow_mut();
        w.tick();
        w.now
    }

    fn delay_ms(&mut self, ms: u32) {
        let mut w = self.world.borrow_mut();
        w.events.push(SimEvent::Delay(ms));
        w.now += u64::from(ms);
        w.sync_arm();
    }
}

pub struct SimStepper {
    world: Rc<RefCell<World>>,
}

impl AxisStepper for SimStepper {
    fn enable(&mut self, _enabled: bool) {}

    fn set_speed(&mut self, steps_per_s: u32, _ramp: u16) {
        self.world.borrow_mut().axis_rate = steps_per_s;
    }

    fn move_steps(&mut self, steps: i32) {
        let mut w = self.world.borrow_mut();
        w.freeze_axis();
        w.events.push(SimEvent::Move(steps));
        if steps < 0 && w.valves[valve_index(Valve::Vacuum)] {
            w.hops += 1;
        }
        w.axis_move = Some(AxisMove {
            start_ms: w.now,
            start_pos: w.axis_pos,
            steps,
            rate: w.axis_rate,
        });
    }

    fn steps_remaining(&mut self) -> u32 {
        let w = self.world.borrow();
        w.axis_move
            .map(|m| m.steps.unsigned_abs() - m.done(w.now))
            .unwrap_or(0)
    }

    fn stop(&mut self) {
        let mut w = self.world.borrow_mut();
        w.freeze_axis();
        w.events.push(SimEvent::AxisStop);
    }

    fn position(&mut self) -> i32 {
        self.world.borrow().axis_position()
    }
}

pub struct SimMotor {
    world: Rc<RefCell<World>>,
}

impl SwingMotor for SimMotor {
    fn run(&mut self, dir: Direction, percent: u8) {
        let mut w = self.world.borrow_mut();
        w.sync_arm();
        w.events.push(SimEvent::SwingRun(dir, percent));
        w.arm_dir = dir;
        w.arm_running = percent > 0;
    }

    fn stop(&mut self) {
        let mut w = self.world.borrow_mut();
        w.sync_arm();
        w.events.push(SimEvent::SwingStop);
        w.arm_running = false;
    }
}

/// Scripted console
#[derive(Default)]
pub struct SimConsole {
    pub input: VecDeque<String>,
    pub output: Vec<String>,
}

impl SimConsole {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            input: lines.iter().map(|l| l.to_string()).collect(),
            output: Vec::new(),
        }
    }

    pub fn push(&mut self, line: &str) {
        self.input.push_back(line.to_string());
    }
}

impl Console for SimConsole {
    fn read_line(&mut self) -> Option<Result<Line, LineError>> {
        // Through the real assembler so over-long lines fail the same way
        let mut parser = LineParser::new();
        let text = self.input.pop_front()?;
        let mut bytes = text.into_bytes();
        bytes.push(b'\n');
        let (_, result) = parser.feed_bytes(&bytes);
        result.transpose()
    }

    fn write_line(&mut self, line: &str) {
        self.output.push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_moves_with_time() {
        let sim = Sim::new();
        let mut io = sim.io();
        let mut stepper = sim.stepper();
        stepper.set_speed(1000, 0);
        stepper.move_steps(100);
        io.delay_ms(50);
        assert_eq!(stepper.position(), 50);
        assert_eq!(stepper.steps_remaining(), 50);
        io.delay_ms(100);
        assert_eq!(stepper.position(), 100);
        assert!(!stepper.is_moving());
    }

    #[test]
    fn test_stop_freezes_axis() {
        let sim = Sim::new();
        let mut io = sim.io();
        let mut stepper = sim.stepper();
        stepper.set_speed(1000, 0);
        stepper.move_steps(-100);
        io.delay_ms(30);
        stepper.stop();
        io.delay_ms(100);
        assert_eq!(stepper.position(), -30);
    }

    #[test]
    fn test_arm_travel() {
        let sim = Sim::new();
        let mut io = sim.io();
        let mut motor = sim.motor();
        assert!(io.is_triggered(Sensor::SwingLeft));
        motor.run(Direction::Clockwise, 50);
        io.delay_ms(1000);
        assert!(io.is_triggered(Sensor::SwingRight));
        assert!(!io.is_triggered(Sensor::SwingLeft));
    }
}
