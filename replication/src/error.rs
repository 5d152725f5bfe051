//! Error types for replication operations.

use std::fmt;

/// Result type for replication operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced by sync instances.
///
/// Per-tick work never returns these; they come back from message handlers
/// and explicit API calls after being logged.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Wire decode error.
    Decode(wire::DecodeError),

    /// Wire encode error.
    Encode(wire::EncodeError),

    /// Invalid configuration.
    Config(ConfigError),

    /// No object is attached to the sync instance.
    MissingTarget,

    /// The operation is only valid on the authoritative side.
    NotAuthoritative { operation: &'static str },

    /// The instance is disabled.
    Disabled,
}

/// A configuration value outside its valid range.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Value must be finite and strictly positive.
    NotPositive { field: &'static str, value: f32 },

    /// Value must be finite and zero or greater.
    Negative { field: &'static str, value: f32 },

    /// Lerp speeds are fractions in `(0, 1]`.
    LerpSpeedOutOfRange { field: &'static str, value: f32 },

    /// `send_rate * time_smoothing` asks for more history than allowed.
    WindowTooLarge { samples: f32, max: usize },
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(err) => write!(f, "decode error: {err}"),
            Self::Encode(err) => write!(f, "encode error: {err}"),
            Self::Config(err) => write!(f, "config error: {err}"),
            Self::MissingTarget => write!(f, "no target attached"),
            Self::NotAuthoritative { operation } => {
                write!(f, "{operation} requires the authoritative side")
            }
            Self::Disabled => write!(f, "sync is disabled"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPositive { field, value } => {
                write!(f, "{field} must be positive, got {value}")
            }
            Self::Negative { field, value } => {
                write!(f, "{field} must not be negative, got {value}")
            }
            Self::LerpSpeedOutOfRange { field, value } => {
                write!(f, "{field} must be in (0, 1], got {value}")
            }
            Self::WindowTooLarge { samples, max } => {
                write!(f, "history window of {samples} states exceeds {max}")
            }
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<wire::DecodeError> for SyncError {
    fn from(err: wire::DecodeError) -> Self {
        Self::Decode(err)
    }
}

impl From<wire::EncodeError> for SyncError {
    fn from(err: wire::EncodeError) -> Self {
        Self::Encode(err)
    }
}

impl From<ConfigError> for SyncError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}
