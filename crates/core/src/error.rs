//! Error types for the TDM simulator.
//!
//! Every failure is synchronous and recoverable. A rejected command leaves
//! the previously valid simulation state untouched, so callers can simply
//! report the error and carry on.

use thiserror::Error;

/// Top-level error type for all operations in the simulator.
///
/// Each variant corresponds to a failure domain:
/// - Config: setup parameters the user can correct
/// - State: a command that is not valid at the current position
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Invalid setup parameters (device count, unit data, cycle time, speed)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Operation not valid for the current stepper state
    #[error("state error: {0}")]
    State(#[from] StateError),
}

impl Error {
    /// True if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// True if this is a state error.
    pub fn is_state(&self) -> bool {
        matches!(self, Error::State(_))
    }
}

/// Setup errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Device count outside the supported range
    #[error("device count {count} outside supported range [{min}, {max}]")]
    DeviceCount { count: usize, min: usize, max: usize },

    /// More unit sequences than devices were given
    #[error("{sequences} unit sequences given for {devices} devices")]
    SequenceCount { devices: usize, sequences: usize },

    /// A device was configured without any units
    #[error("device {label} has no units")]
    EmptyUnits { label: char },

    /// Two devices share the same label
    #[error("duplicate device label {label}")]
    DuplicateLabel { label: char },

    /// Total cycle time must be a positive, finite number of seconds
    #[error("cycle time must be positive, got {value}")]
    NonPositiveCycleTime { value: f64 },

    /// Timing requested for an empty device set
    #[error("no devices configured")]
    NoDevices,

    /// Efficiency is undefined for a schedule with zero rounds
    #[error("schedule has no rounds")]
    NoRounds,

    /// Presentation speed must be a positive, finite number of milliseconds
    #[error("speed must be positive, got {value}")]
    InvalidSpeed { value: f64 },
}

/// Stepper state errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Step requested before the stepper was initialized
    #[error("simulation not initialized")]
    NotInitialized,

    /// Forward step requested at the final round
    #[error("simulation complete: cursor already at {cursor}")]
    AtEnd { cursor: usize },

    /// Backward step requested at the first round
    #[error("already at start")]
    AtStart,

    /// A step was requested while the previous one is still being presented
    #[error("a transition is still in flight")]
    TransitionInFlight,

    /// Finish requested with nothing in flight
    #[error("no transition in flight")]
    NoTransitionInFlight,

    /// Stepper initialized with a schedule that has no rounds
    #[error("schedule is empty")]
    EmptySchedule,
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_conversions() {
        let err: Error = ConfigError::NoDevices.into();
        assert!(err.is_config());
        assert!(!err.is_state());

        let err: Error = StateError::AtStart.into();
        assert!(err.is_state());
    }

    #[test]
    fn test_messages() {
        let err: Error = ConfigError::DeviceCount { count: 1, min: 2, max: 8 }.into();
        assert_eq!(
            err.to_string(),
            "configuration error: device count 1 outside supported range [2, 8]"
        );

        let err: Error = StateError::AtEnd { cursor: 3 }.into();
        assert_eq!(err.to_string(), "state error: simulation complete: cursor already at 3");
    }
}
