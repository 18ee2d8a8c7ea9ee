//! Operator console

use labeler_protocol::{Line, LineError, StatusLine};

/// Line-oriented operator console
pub trait Console {
    /// Wait for the next line
    ///
    /// Returns `None` when no line can be delivered (input closed or a
    /// receive fault); the controller treats that as "no command". A line
    /// that arrived but could not be assembled comes back as `Some(Err(_))`.
    fn read_line(&mut self) -> Option<Result<Line, LineError>>;

    /// Send one line (terminator added by the implementation)
    fn write_line(&mut self, line: &str);

    /// Send a status or error line
    fn send(&mut self, status: StatusLine) {
        self.write_line(&status.render());
    }
}
