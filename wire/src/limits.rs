//! Configurable limits for bounded decoding.

/// Wire-level limits for packet encoding and decoding.
///
/// A well-formed transform packet is at most a few dozen bytes; anything
/// larger is rejected before parsing starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum packet size in bytes.
    pub max_packet_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            // Generous headroom over the largest layout (79 bytes).
            max_packet_bytes: 256,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_packet_bytes: 96,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_packet_bytes: usize::MAX,
        }
    }
}
