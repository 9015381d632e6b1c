use serde_repr::Serialize_repr;

/// Defines the level of severity for the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize_repr)]
#[repr(u8)]
pub enum SeverityLevel {
    /// Verbose
    Verbose = 0,
    /// Information
    Information = 1,
    /// Warning
    Warning = 2,
    /// Error
    Error = 3,
    /// Critical
    Critical = 4,
}
