//! Hardware abstraction traits
//!
//! These traits define the interface between the machine sequences and
//! hardware-specific implementations.

pub mod console;
pub mod io;
pub mod motor;
pub mod stepper;

pub use console::Console;
pub use io::{MachineIo, Sensor, Valve};
pub use motor::SwingMotor;
pub use stepper::{AxisStepper, Direction};
