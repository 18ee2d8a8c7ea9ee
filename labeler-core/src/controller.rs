//! Machine controller
//!
//! Owns the hardware capabilities, the active configuration and the state
//! machine. Each call to [`Controller::step`] runs the handler for the
//! current state once: a sequence state runs its whole action list, a
//! waiting state reads at most one command (or, in `Error`, reads until
//! a reset token or the console runs dry).

use labeler_protocol::{Command, StateCode, StatusLine};

use crate::config::{exchange, ConfigError, MachineConfig};
use crate::fault::Fault;
use crate::motion::Axis;
use crate::pickup::pick_label;
use crate::pneumatic;
use crate::state::actions::{actions_for, ERROR_ACTIONS};
use crate::state::{Action, Event, MachineState};
use crate::swing::rotate;
use crate::traits::{AxisStepper, Console, MachineIo, SwingMotor};

/// Runtime bookkeeping outside the state itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Context {
    pub state: MachineState,
    /// Next label request skips the pickup
    pub first_cycle: bool,
    /// Labels placed since the last reset
    pub picks: u32,
    pub last_fault: Option<Fault>,
    /// `Error` entry actions already ran for the current latch
    outputs_safe: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            state: MachineState::default(),
            first_cycle: true,
            picks: 0,
            last_fault: None,
            outputs_safe: false,
        }
    }
}

/// Result of one controller step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepOutcome {
    Continue,
    /// A configuration exchange replaced the active parameters
    ConfigReplaced,
}

pub struct Controller<IO, S, M, C>
where
    S: AxisStepper,
{
    io: IO,
    axis: Axis<S>,
    motor: M,
    console: C,
    config: MachineConfig,
    ctx: Context,
}

impl<IO, S, M, C> Controller<IO, S, M, C>
where
    IO: MachineIo,
    S: AxisStepper,
    M: SwingMotor,
    C: Console,
{
    /// Create a controller in the power-up `Error` state
    ///
    /// No hardware is touched until the first [`step`](Self::step).
    pub fn new(io: IO, stepper: S, motor: M, console: C, config: MachineConfig) -> Self {
        Self {
            io,
            axis: Axis::new(stepper),
            motor,
            console,
            config,
            ctx: Context::default(),
        }
    }

    pub fn state(&self) -> MachineState {
        self.ctx.state
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn console(&mut self) -> &mut C {
        &mut self.console
    }

    pub fn io(&mut self) -> &mut IO {
        &mut self.io
    }

    pub fn axis(&mut self) -> &mut Axis<S> {
        &mut self.axis
    }

    /// Swap in a new configuration after validating it
    ///
    /// Only allowed while waiting for a command; the active parameters are
    /// untouched on error.
    pub fn replace_config(&mut self, config: MachineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        info!("configuration replaced");
        Ok(())
    }

    /// Emit the error line for `fault` without changing state
    ///
    /// Used for faults detected outside the sequences, such as the driver
    /// link check at startup.
    pub fn report(&mut self, fault: Fault) {
        error!("fault: {}", fault);
        self.ctx.last_fault = Some(fault);
        self.console.send(StatusLine::Error(fault.code()));
    }

    /// Run the handler for the current state once
    pub fn step(&mut self) -> StepOutcome {
        match self.ctx.state {
            MachineState::Idle => self.idle(),
            MachineState::Error => {
                self.wait_for_reset();
                StepOutcome::Continue
            }
            state => {
                self.run_sequence(state);
                StepOutcome::Continue
            }
        }
    }

    fn apply(&mut self, event: Event) {
        let prev = self.ctx.state;
        let next = prev.transition(event);
        if next != prev {
            debug!("state {} -> {}", prev, next);
        }
        if next == MachineState::Error && prev != MachineState::Error {
            self.ctx.outputs_safe = false;
        }
        self.ctx.state = next;
    }

    fn fail(&mut self, fault: Fault) {
        self.report(fault);
        self.apply(Event::Faulted(fault));
    }

    fn idle(&mut self) -> StepOutcome {
        self.console.send(StatusLine::State(StateCode::Idle));
        let line = match self.console.read_line() {
            None => return StepOutcome::Continue,
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                warn!("unreadable command line: {}", e);
                self.fail(Fault::UnknownCommand);
                return StepOutcome::Continue;
            }
        };

        match Command::parse(&line) {
            Command::Reset => self.apply(Event::ResetRequested),
            Command::NextLabel => self.apply(Event::LabelRequested {
                first_cycle: self.ctx.first_cycle,
            }),
            Command::Config => return self.exchange_config(),
            Command::Unknown => {
                warn!("unknown command");
                self.fail(Fault::UnknownCommand);
            }
        }
        StepOutcome::Continue
    }

    fn exchange_config(&mut self) -> StepOutcome {
        match exchange::run(&mut self.console, &self.config) {
            Ok(Some(config)) => match self.replace_config(config) {
                Ok(()) => {
                    self.apply(Event::ConfigExchanged);
                    StepOutcome::ConfigReplaced
                }
                Err(e) => {
                    warn!("config rejected: {}", e);
                    self.fail(Fault::InvalidConfig);
                    StepOutcome::Continue
                }
            },
            Ok(None) => {
                debug!("config exchange abandoned");
                self.apply(Event::ConfigExchanged);
                StepOutcome::Continue
            }
            Err(e) => {
                warn!("config rejected: {}", e);
                self.fail(Fault::InvalidConfig);
                StepOutcome::Continue
            }
        }
    }

    fn wait_for_reset(&mut self) {
        if !self.ctx.outputs_safe {
            let config = self.config;
            for &action in ERROR_ACTIONS {
                self.set_valves(action, &config);
            }
            self.ctx.first_cycle = true;
            self.ctx.outputs_safe = true;
        }

        loop {
            self.console.send(StatusLine::State(StateCode::Error));
            let Some(line) = self.console.read_line() else {
                return;
            };
            if line.is_ok_and(|line| Command::parse(&line) == Command::Reset) {
                self.apply(Event::ResetRequested);
                return;
            }
        }
    }

    fn run_sequence(&mut self, state: MachineState) {
        self.console.send(StatusLine::State(state.status_code()));

        // Parameters stay fixed for the whole sequence
        let config = self.config;
        let result = actions_for(state)
            .iter()
            .try_for_each(|&action| self.perform(action, &config));

        match result {
            Ok(()) => {
                if state == MachineState::Reset {
                    self.ctx.first_cycle = true;
                    self.ctx.picks = 0;
                }
                self.apply(Event::SequenceComplete);
            }
            Err(fault) => self.fail(fault),
        }
    }

    /// Run a valve action; motion and reporting actions are skipped
    fn set_valves(&mut self, action: Action, config: &MachineConfig) {
        match action {
            Action::RetractClamp => pneumatic::retract_clamp(&mut self.io, config),
            Action::DeployClamp => pneumatic::deploy_clamp(&mut self.io, config),
            Action::RetractProbe => pneumatic::retract_probe(&mut self.io, config),
            Action::DeployProbe => pneumatic::deploy_probe(&mut self.io, config),
            Action::VacuumOff => pneumatic::vacuum_off(&mut self.io, config),
            Action::Swing(_) | Action::Home(_) | Action::PickLabel | Action::Ready => {}
        }
    }

    fn perform(&mut self, action: Action, config: &MachineConfig) -> Result<(), Fault> {
        match action {
            Action::RetractClamp
            | Action::DeployClamp
            | Action::RetractProbe
            | Action::DeployProbe
            | Action::VacuumOff => self.set_valves(action, config),
            Action::Swing(side) => rotate(&mut self.io, &mut self.motor, config, side, false)?,
            Action::Home(target) => self.axis.home(&mut self.io, config, target)?,
            Action::PickLabel => {
                let attempt = pick_label(&mut self.io, &mut self.motor, &mut self.axis, config)?;
                debug!("picked on attempt {}", attempt);
            }
            Action::Ready => {
                self.console.send(StatusLine::Ready);
                self.ctx.first_cycle = false;
                self.ctx.picks = self.ctx.picks.wrapping_add(1);
                info!("label placed ({} since reset)", self.ctx.picks);
            }
        }
        Ok(())
    }
}
