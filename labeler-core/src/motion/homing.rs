//! Axis homing controller
//!
//! Homing runs as one blocking call:
//!
//! ```text
//! Seeking -> Contacted -> Backoff -> Zeroed
//!         -> LimitFault
//!         -> SoftwareLimitFault
//! ```
//!
//! The seek is a single bounded move of `steps_per_mm * max_travel` steps,
//! so the axis can never be driven further than that without seeing the
//! target or a hard limit. A fault leaves the zero where it was.

use crate::config::MachineConfig;
use crate::fault::Fault;
use crate::poll::{move_window_ms, poll_until, Check, PollOutcome};
use crate::traits::{AxisStepper, MachineIo, Sensor};

/// Reference used by a homing run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingTarget {
    /// Datum probe (probe must be deployed)
    Probe,
    /// Upper travel limit switch
    UpperLimit,
    /// Lower travel limit switch
    LowerLimit,
}

impl HomingTarget {
    /// Sensor that ends the seek
    pub fn sensor(self) -> Sensor {
        match self {
            HomingTarget::Probe => Sensor::Probe,
            HomingTarget::UpperLimit => Sensor::AxisUpper,
            HomingTarget::LowerLimit => Sensor::AxisLower,
        }
    }

    /// Sign of the seek move: -1 up, +1 down
    pub fn seek_sign(self) -> i32 {
        match self {
            HomingTarget::Probe | HomingTarget::UpperLimit => -1,
            HomingTarget::LowerLimit => 1,
        }
    }

    /// Check if a hard limit aborts seeking this target
    pub fn limits_fault(self) -> bool {
        matches!(self, HomingTarget::Probe)
    }
}

/// Sensor state as seen while homing toward a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EndstopReading {
    Clear,
    TargetSensorTriggered,
    HardLimitTriggered,
}

/// Read the target sensor, then both travel limits
pub fn read_endstops<IO: MachineIo + ?Sized>(io: &mut IO, target: HomingTarget) -> EndstopReading {
    if io.is_triggered(target.sensor()) {
        EndstopReading::TargetSensorTriggered
    } else if io.is_triggered(Sensor::AxisUpper) || io.is_triggered(Sensor::AxisLower) {
        EndstopReading::HardLimitTriggered
    } else {
        EndstopReading::Clear
    }
}

/// Stepper axis with a software zero
pub struct Axis<S> {
    stepper: S,
    /// Raw stepper position that reads as zero
    origin: i32,
}

impl<S: AxisStepper> Axis<S> {
    pub fn new(stepper: S) -> Self {
        Self { stepper, origin: 0 }
    }

    /// Position in steps relative to the software zero
    pub fn position(&mut self) -> i32 {
        self.stepper.position().wrapping_sub(self.origin)
    }

    /// Access the underlying stepper
    pub fn stepper(&mut self) -> &mut S {
        &mut self.stepper
    }

    /// Home toward `target`, back off and re-zero
    pub fn home<IO: MachineIo + ?Sized>(
        &mut self,
        io: &mut IO,
        config: &MachineConfig,
        target: HomingTarget,
    ) -> Result<(), Fault> {
        let sign = target.seek_sign();
        let rate = config.homing_rate();
        self.stepper.enable(true);
        self.stepper.set_speed(rate, config.acceleration);

        match read_endstops(io, target) {
            EndstopReading::TargetSensorTriggered => {
                debug!("homing {}: already in contact", target);
            }
            EndstopReading::HardLimitTriggered if target.limits_fault() => {
                warn!("homing {}: limit switch already triggered", target);
                return Err(Fault::LimitSwitch);
            }
            _ => self.seek(io, config, target)?,
        }

        // Back off away from the switch, then make that the new zero
        let backoff = config.mm_to_steps(config.backoff);
        self.run_move(io, -sign * backoff, rate)?;
        self.origin = self.stepper.position();
        io.delay_ms(config.homing_settle);

        info!("homed to {}", target);
        Ok(())
    }

    fn seek<IO: MachineIo + ?Sized>(
        &mut self,
        io: &mut IO,
        config: &MachineConfig,
        target: HomingTarget,
    ) -> Result<(), Fault> {
        let travel = config.travel_steps();
        let window = move_window_ms(travel.unsigned_abs(), config.homing_rate());
        let stepper = &mut self.stepper;
        let mut fault = Fault::SoftwareLimit;

        stepper.move_steps(target.seek_sign() * travel);
        let outcome = poll_until(io, window, |io| match read_endstops(io, target) {
            EndstopReading::TargetSensorTriggered => Check::Satisfied,
            EndstopReading::HardLimitTriggered if target.limits_fault() => {
                fault = Fault::LimitSwitch;
                Check::Abort
            }
            _ if !stepper.is_moving() => Check::Abort,
            _ => Check::Pending,
        });
        stepper.stop();

        match outcome {
            PollOutcome::Satisfied => Ok(()),
            PollOutcome::Aborted | PollOutcome::TimedOut => {
                warn!("homing {} failed: {}", target, fault);
                Err(fault)
            }
        }
    }

    /// Run a relative move to completion
    fn run_move<IO: MachineIo + ?Sized>(
        &mut self,
        io: &mut IO,
        steps: i32,
        rate: u32,
    ) -> Result<(), Fault> {
        if steps == 0 {
            return Ok(());
        }
        let window = move_window_ms(steps.unsigned_abs(), rate);
        let stepper = &mut self.stepper;
        stepper.move_steps(steps);
        let outcome = poll_until(io, window, |_| {
            if stepper.is_moving() {
                Check::Pending
            } else {
                Check::Satisfied
            }
        });
        if outcome.is_satisfied() {
            Ok(())
        } else {
            stepper.stop();
            warn!("axis move of {} steps did not finish", steps);
            Err(Fault::SoftwareLimit)
        }
    }

    /// Lift the axis `hop` mm and lower it back
    ///
    /// Used to re-seat the suction cup on the label stack. The zero is not
    /// touched; the axis ends where it started.
    pub fn bounce<IO: MachineIo + ?Sized>(
        &mut self,
        io: &mut IO,
        config: &MachineConfig,
    ) -> Result<(), Fault> {
        let steps = config.mm_to_steps(config.hop);
        let rate = config.move_rate();
        self.stepper.enable(true);
        self.stepper.set_speed(rate, config.acceleration);

        self.run_move(io, -steps, rate)?;
        io.delay_ms(config.homing_settle);
        self.run_move(io, steps, rate)?;
        io.delay_ms(config.homing_settle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pneumatic::deploy_probe;
    use crate::sim::{Sim, SimEvent};

    fn axis(sim: &Sim) -> Axis<crate::sim::SimStepper> {
        Axis::new(sim.stepper())
    }

    #[test]
    fn test_target_directions() {
        assert_eq!(HomingTarget::Probe.seek_sign(), -1);
        assert_eq!(HomingTarget::UpperLimit.seek_sign(), -1);
        assert_eq!(HomingTarget::LowerLimit.seek_sign(), 1);
        assert!(HomingTarget::Probe.limits_fault());
        assert!(!HomingTarget::LowerLimit.limits_fault());
    }

    #[test]
    fn test_read_endstops() {
        let sim = Sim::new();
        let mut io = sim.io();
        assert_eq!(read_endstops(&mut io, HomingTarget::Probe), EndstopReading::Clear);

        let lower = sim.world().lower_limit_at;
        sim.world().set_axis(lower);
        assert_eq!(
            read_endstops(&mut io, HomingTarget::LowerLimit),
            EndstopReading::TargetSensorTriggered
        );
        assert_eq!(
            read_endstops(&mut io, HomingTarget::Probe),
            EndstopReading::HardLimitTriggered
        );
    }

    #[test]
    fn test_home_to_lower_limit_rezeros() {
        let sim = Sim::new();
        let mut io = sim.io();
        let mut axis = axis(&sim);
        let config = MachineConfig::default();

        assert_eq!(axis.home(&mut io, &config, HomingTarget::LowerLimit), Ok(()));
        assert_eq!(axis.position(), 0);

        // Zero sits one back-off distance above the switch
        let raw = sim.world().axis_position();
        let lower = sim.world().lower_limit_at;
        let expected = lower - config.mm_to_steps(config.backoff);
        assert!((raw - expected).abs() <= 2, "raw {} expected {}", raw, expected);
        assert!(!sim.world().axis_moving());
    }

    #[test]
    fn test_home_to_probe() {
        let sim = Sim::new();
        let mut io = sim.io();
        let mut axis = axis(&sim);
        let config = MachineConfig::default();

        deploy_probe(&mut io, &config);
        assert_eq!(axis.home(&mut io, &config, HomingTarget::Probe), Ok(()));
        assert_eq!(axis.position(), 0);
        let probe_at = sim.world().probe_at.unwrap();
        let raw = sim.world().axis_position();
        // Stopped at contact, backed off downward
        assert!(raw > probe_at);
        assert!(raw - probe_at <= config.mm_to_steps(config.backoff) + 2);
    }

    #[test]
    fn test_home_already_in_contact_does_not_seek() {
        let sim = Sim::new();
        let mut io = sim.io();
        let mut axis = axis(&sim);
        let config = MachineConfig::default();

        let lower = sim.world().lower_limit_at;
        sim.world().set_axis(lower);
        assert_eq!(axis.home(&mut io, &config, HomingTarget::LowerLimit), Ok(()));

        // Only the back-off move was issued
        let moves: Vec<_> = sim
            .events()
            .into_iter()
            .filter(|e| matches!(e, SimEvent::Move(_)))
            .collect();
        assert_eq!(moves, vec![SimEvent::Move(-config.mm_to_steps(config.backoff))]);
        assert_eq!(axis.position(), 0);
    }

    #[test]
    fn test_probe_missing_hits_limit() {
        let sim = Sim::new();
        sim.world().probe_at = None;
        let mut io = sim.io();
        let mut axis = axis(&sim);
        let config = MachineConfig::default();

        axis.home(&mut io, &config, HomingTarget::LowerLimit).unwrap();
        let before = axis.position();
        deploy_probe(&mut io, &config);
        assert_eq!(axis.home(&mut io, &config, HomingTarget::Probe), Err(Fault::LimitSwitch));
        // Zero unchanged: raw position moved but origin did not
        assert_ne!(axis.position(), before);
        assert!(!sim.world().axis_moving());
    }

    #[test]
    fn test_limit_already_triggered_faults_without_motion() {
        let sim = Sim::new();
        sim.world().probe_at = None;
        let mut io = sim.io();
        let mut axis = axis(&sim);
        let config = MachineConfig::default();

        let upper = sim.world().upper_limit_at;
        sim.world().set_axis(upper);
        deploy_probe(&mut io, &config);
        assert_eq!(axis.home(&mut io, &config, HomingTarget::Probe), Err(Fault::LimitSwitch));
        assert!(sim.events().iter().all(|e| !matches!(e, SimEvent::Move(_))));
    }

    #[test]
    fn test_exhausted_travel_is_software_limit() {
        let sim = Sim::new();
        // Switch out of reach of one full travel
        sim.world().lower_limit_at = 1_000_000;
        let mut io = sim.io();
        let mut axis = axis(&sim);
        let config = MachineConfig::default();

        let before = axis.position();
        assert_eq!(
            axis.home(&mut io, &config, HomingTarget::LowerLimit),
            Err(Fault::SoftwareLimit)
        );
        // Never commanded beyond the travel bound
        assert_eq!(sim.world().axis_position(), config.travel_steps());
        assert_eq!(axis.position(), before + config.travel_steps());
    }

    #[test]
    fn test_lower_limit_homing_ignores_upper_limit() {
        let sim = Sim::new();
        let mut io = sim.io();
        let mut axis = axis(&sim);
        let config = MachineConfig::default();

        // Start parked on the upper switch
        let upper = sim.world().upper_limit_at;
        sim.world().set_axis(upper);
        assert_eq!(axis.home(&mut io, &config, HomingTarget::LowerLimit), Ok(()));
    }

    #[test]
    fn test_bounce_returns_to_start() {
        let sim = Sim::new();
        let mut io = sim.io();
        let mut axis = axis(&sim);
        let config = MachineConfig::default();

        axis.home(&mut io, &config, HomingTarget::LowerLimit).unwrap();
        let start = sim.now();
        assert_eq!(axis.bounce(&mut io, &config), Ok(()));
        assert_eq!(axis.position(), 0);
        assert!(sim.now() - start >= 2 * u64::from(config.homing_settle));

        let hop = config.mm_to_steps(config.hop);
        let moves: Vec<_> = sim
            .events()
            .into_iter()
            .filter(|e| matches!(e, SimEvent::Move(_)))
            .collect();
        assert_eq!(&moves[moves.len() - 2..], &[SimEvent::Move(-hop), SimEvent::Move(hop)]);
    }
}
