//! Operator command tokens

/// Reset token
pub const TOKEN_RESET: &str = "RESET";
/// Short form of the reset token
pub const TOKEN_RESET_SHORT: &str = "***";
/// Next-label token
pub const TOKEN_NEXT_LABEL: &str = "NEXT_LABEL";
/// Short form of the next-label token
pub const TOKEN_NEXT_LABEL_SHORT: &str = "+++";
/// Configuration exchange token
pub const TOKEN_CONFIG: &str = "CONFIG";

/// A command received from the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Bring the machine to its reference position
    Reset,
    /// Place the next label
    NextLabel,
    /// Start a configuration exchange
    Config,
    /// Anything else, including an empty line
    Unknown,
}

impl Command {
    /// Parse a received line
    ///
    /// Surrounding whitespace is ignored. Matching is exact and
    /// case-sensitive.
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            TOKEN_RESET | TOKEN_RESET_SHORT => Command::Reset,
            TOKEN_NEXT_LABEL | TOKEN_NEXT_LABEL_SHORT => Command::NextLabel,
            TOKEN_CONFIG => Command::Config,
            _ => Command::Unknown,
        }
    }

    /// Canonical token for this command
    pub fn token(self) -> Option<&'static str> {
        match self {
            Command::Reset => Some(TOKEN_RESET),
            Command::NextLabel => Some(TOKEN_NEXT_LABEL),
            Command::Config => Some(TOKEN_CONFIG),
            Command::Unknown => None,
        }
    }
}
