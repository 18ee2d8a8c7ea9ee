//! Console configuration exchange
//!
//! Started by the `CONFIG` command. The controller lists the active
//! parameters, then reads `name=value` updates into a draft until the
//! host ends the exchange:
//!
//! ```text
//! > CONFIG
//! < steps_per_mm=160
//! < ...
//! < END
//! > hop=3
//! > END           (or ABORT)
//! ```
//!
//! The draft is only returned after it validated as a whole, so the
//! active configuration is either fully replaced or untouched.

use labeler_protocol::ConfigLine;

use super::machine::{ConfigError, MachineConfig, Param};
use crate::traits::Console;

/// Write every parameter of `config` followed by `END`
pub fn list<C: Console + ?Sized>(console: &mut C, config: &MachineConfig) {
    for param in Param::ALL {
        let line = ConfigLine::Set {
            name: param.name(),
            value: config.get(param),
        };
        console.write_line(&line.render());
    }
    console.write_line(&ConfigLine::End.render());
}

/// Run one exchange against `current`
///
/// Returns `Ok(None)` when the host aborts or input ends, and the
/// validated replacement on `END`.
pub fn run<C: Console + ?Sized>(
    console: &mut C,
    current: &MachineConfig,
) -> Result<Option<MachineConfig>, ConfigError> {
    list(console, current);

    let mut draft = *current;
    while let Some(line) = console.read_line() {
        let line = line.map_err(|_| ConfigError::Malformed)?;
        match ConfigLine::parse(&line) {
            Some(ConfigLine::Set { name, value }) => draft.set_by_name(name, value)?,
            Some(ConfigLine::End) => {
                draft.validate()?;
                return Ok(Some(draft));
            }
            Some(ConfigLine::Abort) => return Ok(None),
            None => return Err(ConfigError::Malformed),
        }
    }
    Ok(None)
}
