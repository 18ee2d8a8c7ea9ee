//! Configuration exchange lines
//!
//! Parameters travel as `name=value` with an unsigned decimal value.

use core::fmt::Write;

use crate::line::Line;

/// Terminates a parameter listing or an accepted update
pub const CONFIG_END: &str = "END";
/// Abandons an update, keeping the active configuration
pub const CONFIG_ABORT: &str = "ABORT";

/// One line of a configuration exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLine<'a> {
    /// Assign `value` to the parameter `name`
    Set { name: &'a str, value: u32 },
    End,
    Abort,
}

impl<'a> ConfigLine<'a> {
    /// Parse one received line
    ///
    /// Returns `None` for anything that is not a well-formed exchange line.
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        match line {
            CONFIG_END => Some(ConfigLine::End),
            CONFIG_ABORT => Some(ConfigLine::Abort),
            _ => {
                let (name, value) = line.split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                let value = value.trim().parse().ok()?;
                Some(ConfigLine::Set { name, value })
            }
        }
    }

    /// Render the line without its terminator
    pub fn render(&self) -> Line {
        let mut line = Line::new();
        let _ = match self {
            ConfigLine::Set { name, value } => write!(line, "{}={}", name, value),
            ConfigLine::End => line.push_str(CONFIG_END).map_err(|_| core::fmt::Error),
            ConfigLine::Abort => line.push_str(CONFIG_ABORT).map_err(|_| core::fmt::Error),
        };
        line
    }
}
