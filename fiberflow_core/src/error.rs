//! Error types for carrier simulation setup.
//!
//! The per-frame step never fails. Everything here is raised while building
//! a driver or loading parameters.

use thiserror::Error;

/// Errors that can occur while configuring a simulation.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A driver was asked to own zero carriers
    #[error("Carrier count must be greater than zero")]
    EmptyPopulation,

    /// A tunable parameter is outside its valid range
    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Parameter file could not be parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Reading or writing a file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FlowError {
    /// Creates an invalid parameter error.
    pub fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter { name, value, reason }
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message() {
        let err = FlowError::invalid("scatter_speed", -1.0, "must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid parameter scatter_speed = -1: must be positive"
        );
    }

    #[test]
    fn test_json_error_maps_to_config() {
        let parse: Result<u32, _> = serde_json::from_str("not json");
        let err: FlowError = parse.unwrap_err().into();
        assert!(matches!(err, FlowError::Config(_)));
    }
}
