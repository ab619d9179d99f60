//! Error types for safety_q.

use thiserror::Error;

/// Errors raised by an [`Environment`](crate::env::Environment) implementation.
///
/// The learner never inspects or retries these; they are carried unchanged as
/// the source of [`Error::Environment`].
pub type EnvError = Box<dyn std::error::Error + Send + Sync>;

/// A specialized `Result` type for training and playback.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring, training or replaying.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration or API usage, detected before any episode runs.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A warm-start value table does not match the discretization.
    #[error("Value table shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// `buckets ++ [num_actions]`
        expected: Vec<usize>,
        /// Shape of the supplied table
        found: Vec<usize>,
    },

    /// The environment failed during `reset` or `step`.
    #[error("Environment error: {0}")]
    Environment(#[source] EnvError),

    /// A checkpoint could not be written or read back.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML encode error
    #[error("TOML encode error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let errors = vec![
            (
                Error::Config("start_episode without q_values".into()),
                "Invalid configuration: start_episode without q_values",
            ),
            (
                Error::ShapeMismatch {
                    expected: vec![3, 4, 2],
                    found: vec![3, 5, 2],
                },
                "Value table shape mismatch: expected [3, 4, 2], found [3, 5, 2]",
            ),
            (
                Error::Persistence("disk full".into()),
                "Persistence error: disk full",
            ),
        ];

        for (error, expected) in errors {
            assert_eq!(format!("{}", error), expected);
        }
    }

    #[test]
    fn test_environment_error_keeps_source() {
        let inner: EnvError = "simulator diverged".into();
        let error = Error::Environment(inner);
        assert_eq!(format!("{}", error), "Environment error: simulator diverged");

        let source = error.source().expect("source is preserved");
        assert_eq!(source.to_string(), "simulator diverged");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("{invalid}");
        let error: Error = json_result.unwrap_err().into();
        assert!(matches!(error, Error::Serialization(_)));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: Error = io.into();
        assert!(matches!(error, Error::Io(_)));
    }
}
