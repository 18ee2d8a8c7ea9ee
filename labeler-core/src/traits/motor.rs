//! Swing motor trait

use super::Direction;

/// DC gear motor driving the swing arm
///
/// Clockwise turns the arm toward the deposit (right) side.
pub trait SwingMotor {
    /// Run in `dir` at `percent` duty (0-100)
    fn run(&mut self, dir: Direction, percent: u8);

    /// Stop the motor
    fn stop(&mut self);
}
