//! Error types for kinetic effects
//!
//! Configuration problems are reported when an effect is constructed, never
//! mid-animation. Callbacks firing against a torn-down effect are not an
//! error variant: subscriptions detach on teardown so they cannot happen.

use thiserror::Error;

/// Invalid effect configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Grid transitions need at least one cell per side
    #[error("grid size must be at least 1, got {0}")]
    InvalidGridSize(usize),

    /// A step sequence was configured without steps
    #[error("step sequence is empty")]
    EmptySteps,

    /// A duration that drives a timeline was zero, negative or not finite
    #[error("{field} must be a positive duration, got {value}ms")]
    NonPositiveDuration { field: &'static str, value: f32 },

    /// A delay or stagger was negative or not finite
    #[error("{field} must not be negative, got {value}ms")]
    NegativeDelay { field: &'static str, value: f32 },

    /// Intersection thresholds are visible fractions
    #[error("intersection threshold must lie in [0, 1], got {0}")]
    InvalidThreshold(f32),

    /// The wizard was asked to start outside its steps
    #[error("initial step {step} is outside 1..={count}")]
    InitialStepOutOfRange { step: usize, count: usize },

    /// A visual parameter was NaN or infinite
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },

    /// A sequence option (e.g. typewriter texts) had no entries
    #[error("{0} must contain at least one entry")]
    EmptySequence(&'static str),
}

/// A state-machine transition that was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// The sequence reached its terminal state
    #[error("sequence already completed")]
    Completed,

    /// Direct step selection is turned off
    #[error("step indicators are disabled")]
    IndicatorsDisabled,

    /// Requested step does not exist
    #[error("step {step} is outside 1..={count}")]
    OutOfRange { step: usize, count: usize },
}

/// Result type for effect construction
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Validate a duration that must be strictly positive
pub fn positive_duration(field: &'static str, value: f32) -> Result<f32> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NonPositiveDuration { field, value })
    }
}

/// Validate a delay that may be zero but not negative
pub fn non_negative_delay(field: &'static str, value: f32) -> Result<f32> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NegativeDelay { field, value })
    }
}

/// Validate a parameter that only needs to be a real number
pub fn finite(field: &'static str, value: f32) -> Result<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_duration() {
        assert_eq!(positive_duration("duration", 250.0), Ok(250.0));
        assert!(matches!(
            positive_duration("duration", 0.0),
            Err(ConfigError::NonPositiveDuration { field: "duration", .. })
        ));
        assert!(positive_duration("duration", -5.0).is_err());
        assert!(positive_duration("duration", f32::NAN).is_err());
    }

    #[test]
    fn test_non_negative_delay() {
        assert_eq!(non_negative_delay("stagger", 0.0), Ok(0.0));
        assert!(non_negative_delay("stagger", -1.0).is_err());
        assert!(non_negative_delay("stagger", f32::INFINITY).is_err());
    }

    #[test]
    fn test_finite() {
        assert_eq!(finite("rotation", -2.5), Ok(-2.5));
        let err = finite("base opacity", f32::NAN).unwrap_err();
        assert!(matches!(err, ConfigError::NonFinite { field: "base opacity", .. }));
        assert_eq!(err.to_string(), "base opacity must be finite, got NaN");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ConfigError::InvalidGridSize(0).to_string(),
            "grid size must be at least 1, got 0"
        );
        assert_eq!(
            TransitionError::OutOfRange { step: 4, count: 3 }.to_string(),
            "step 4 is outside 1..=3"
        );
    }
}
