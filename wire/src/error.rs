//! Error types for wire format operations.

use std::fmt;

use bitstream::BitError;

use crate::layout::FieldKind;

/// Result type for wire decoding.
pub type WireResult<T> = Result<T, DecodeError>;

/// Errors that can occur while decoding a packet.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// Packet is too small to contain the fixed prefix.
    PacketTooSmall { actual: usize, required: usize },

    /// Packet exceeds the configured size limit.
    PacketTooLarge { actual: usize, limit: usize },

    /// Reserved bits set in the origin flag byte.
    InvalidOriginFlags { flags: u8 },

    /// Header announces a field the layout does not sync.
    UnexpectedField { field: FieldKind },

    /// Bytes left over after the last announced field.
    TrailingBytes { count: usize },

    /// Packet ended in the middle of a field.
    Truncated(BitError),
}

/// Errors that can occur while encoding a packet.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EncodeError {
    /// State carries a field the layout does not sync.
    FieldNotSynced { field: FieldKind },

    /// State carries an origin but the layout has no origin rebasing.
    OriginWithoutRebasing,

    /// State carries a movement mode but the layout is not a character.
    MovementModeWithoutCharacter,

    /// Encoded packet exceeds the configured size limit.
    PacketTooLarge { actual: usize, limit: usize },

    /// Underlying writer failure.
    Bitstream(BitError),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PacketTooSmall { actual, required } => {
                write!(
                    f,
                    "packet too small: {actual} bytes, need at least {required}"
                )
            }
            Self::PacketTooLarge { actual, limit } => {
                write!(f, "packet too large: {actual} bytes exceeds limit {limit}")
            }
            Self::InvalidOriginFlags { flags } => {
                write!(f, "invalid origin flags: 0x{flags:02X}")
            }
            Self::UnexpectedField { field } => {
                write!(f, "packet contains {field} but the layout does not sync it")
            }
            Self::TrailingBytes { count } => {
                write!(f, "{count} trailing bytes after last field")
            }
            Self::Truncated(err) => write!(f, "truncated packet: {err}"),
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldNotSynced { field } => {
                write!(f, "cannot encode {field}: not synced by the layout")
            }
            Self::OriginWithoutRebasing => {
                write!(f, "cannot encode origin: origin rebasing is disabled")
            }
            Self::MovementModeWithoutCharacter => {
                write!(f, "cannot encode movement mode: layout is not a character")
            }
            Self::PacketTooLarge { actual, limit } => {
                write!(f, "packet too large: {actual} bytes exceeds limit {limit}")
            }
            Self::Bitstream(err) => write!(f, "bitstream error: {err}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Truncated(err) => Some(err),
            _ => None,
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bitstream(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BitError> for DecodeError {
    fn from(err: BitError) -> Self {
        Self::Truncated(err)
    }
}

impl From<BitError> for EncodeError {
    fn from(err: BitError) -> Self {
        Self::Bitstream(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_display_too_small() {
        let err = DecodeError::PacketTooSmall {
            actual: 2,
            required: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("too small"));
        assert!(msg.contains('5'));
    }

    #[test]
    fn decode_error_display_unexpected_field() {
        let err = DecodeError::UnexpectedField {
            field: FieldKind::AngularVelocity,
        };
        assert!(err.to_string().contains("angular velocity"));
    }

    #[test]
    fn decode_error_display_origin_flags() {
        let err = DecodeError::InvalidOriginFlags { flags: 0xF0 };
        assert!(err.to_string().contains("F0"));
    }

    #[test]
    fn truncated_has_source() {
        let err = DecodeError::from(BitError::UnexpectedEof {
            requested: 32,
            available: 8,
        });
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn encode_error_display() {
        let err = EncodeError::FieldNotSynced {
            field: FieldKind::Scale,
        };
        assert!(err.to_string().contains("scale"));
        let err = EncodeError::PacketTooLarge {
            actual: 80,
            limit: 64,
        };
        assert!(err.to_string().contains("80"));
    }
}
