//! Analog input abstraction

/// Single analog channel
///
/// Readings are raw converter counts. Scaling into a physical unit is
/// left to the caller since the vacuum sensor only ever gets compared
/// against a configured threshold.
pub trait AnalogInput {
    /// Error type for conversions
    type Error;

    /// Take one blocking sample
    fn read(&mut self) -> Result<u16, Self::Error>;
}
