//! Header flag bytes.

/// Field-presence and rest flags carried in the first byte of every packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SyncFlags(u8);

impl SyncFlags {
    /// Position axes follow.
    pub const POSITION: u8 = 1 << 0;
    /// Rotation axes follow.
    pub const ROTATION: u8 = 1 << 1;
    /// Scale axes follow.
    pub const SCALE: u8 = 1 << 2;
    /// Velocity axes follow.
    pub const VELOCITY: u8 = 1 << 3;
    /// Angular velocity axes follow.
    pub const ANGULAR_VELOCITY: u8 = 1 << 4;
    /// Sender considers position at rest.
    pub const AT_POSITIONAL_REST: u8 = 1 << 5;
    /// Sender considers rotation at rest.
    pub const AT_ROTATIONAL_REST: u8 = 1 << 6;
    /// Movement mode byte follows (character layouts only).
    pub const MOVEMENT_MODE: u8 = 1 << 7;

    /// Creates flags from a raw byte. Every bit pattern is meaningful.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw flag byte.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Returns flags with `bit` set or cleared.
    #[must_use]
    pub const fn with(self, bit: u8, on: bool) -> Self {
        if on {
            Self(self.0 | bit)
        } else {
            Self(self.0 & !bit)
        }
    }

    #[must_use]
    pub const fn contains(self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    #[must_use]
    pub const fn has_position(self) -> bool {
        self.contains(Self::POSITION)
    }

    #[must_use]
    pub const fn has_rotation(self) -> bool {
        self.contains(Self::ROTATION)
    }

    #[must_use]
    pub const fn has_scale(self) -> bool {
        self.contains(Self::SCALE)
    }

    #[must_use]
    pub const fn has_velocity(self) -> bool {
        self.contains(Self::VELOCITY)
    }

    #[must_use]
    pub const fn has_angular_velocity(self) -> bool {
        self.contains(Self::ANGULAR_VELOCITY)
    }

    #[must_use]
    pub const fn at_positional_rest(self) -> bool {
        self.contains(Self::AT_POSITIONAL_REST)
    }

    #[must_use]
    pub const fn at_rotational_rest(self) -> bool {
        self.contains(Self::AT_ROTATIONAL_REST)
    }

    #[must_use]
    pub const fn has_movement_mode(self) -> bool {
        self.contains(Self::MOVEMENT_MODE)
    }
}

/// Flags carried in the optional second byte when origin rebasing is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OriginFlags(u8);

impl OriginFlags {
    /// An origin (3 x i32) follows the timestamp.
    pub const ORIGIN_INCLUDED: u8 = 1 << 0;

    /// Reserved bits mask (must be zero).
    const RESERVED_MASK: u8 = !Self::ORIGIN_INCLUDED;

    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Flags announcing whether an origin is included.
    #[must_use]
    pub const fn origin(included: bool) -> Self {
        if included {
            Self(Self::ORIGIN_INCLUDED)
        } else {
            Self(0)
        }
    }

    #[must_use]
    pub const fn has_origin(self) -> bool {
        self.0 & Self::ORIGIN_INCLUDED != 0
    }

    /// Returns `true` if no reserved bits are set.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 & Self::RESERVED_MASK == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_positions_are_fixed() {
        assert_eq!(SyncFlags::POSITION, 0x01);
        assert_eq!(SyncFlags::ROTATION, 0x02);
        assert_eq!(SyncFlags::SCALE, 0x04);
        assert_eq!(SyncFlags::VELOCITY, 0x08);
        assert_eq!(SyncFlags::ANGULAR_VELOCITY, 0x10);
        assert_eq!(SyncFlags::AT_POSITIONAL_REST, 0x20);
        assert_eq!(SyncFlags::AT_ROTATIONAL_REST, 0x40);
        assert_eq!(SyncFlags::MOVEMENT_MODE, 0x80);
        assert_eq!(OriginFlags::ORIGIN_INCLUDED, 0x01);
    }

    #[test]
    fn default_is_empty() {
        let flags = SyncFlags::default();
        assert_eq!(flags.raw(), 0);
        assert!(!flags.has_position());
        assert!(!flags.has_movement_mode());
    }

    #[test]
    fn with_sets_and_clears() {
        let flags = SyncFlags::default()
            .with(SyncFlags::POSITION, true)
            .with(SyncFlags::AT_ROTATIONAL_REST, true)
            .with(SyncFlags::SCALE, false);
        assert!(flags.has_position());
        assert!(flags.at_rotational_rest());
        assert!(!flags.has_scale());
        assert_eq!(flags.with(SyncFlags::POSITION, false).raw(), 0x40);
    }

    #[test]
    fn raw_roundtrip_every_byte() {
        for raw in 0..=u8::MAX {
            let flags = SyncFlags::from_raw(raw);
            assert_eq!(flags.raw(), raw);
            let rebuilt = SyncFlags::default()
                .with(SyncFlags::POSITION, flags.has_position())
                .with(SyncFlags::ROTATION, flags.has_rotation())
                .with(SyncFlags::SCALE, flags.has_scale())
                .with(SyncFlags::VELOCITY, flags.has_velocity())
                .with(SyncFlags::ANGULAR_VELOCITY, flags.has_angular_velocity())
                .with(SyncFlags::AT_POSITIONAL_REST, flags.at_positional_rest())
                .with(SyncFlags::AT_ROTATIONAL_REST, flags.at_rotational_rest())
                .with(SyncFlags::MOVEMENT_MODE, flags.has_movement_mode());
            assert_eq!(rebuilt, flags);
        }
    }

    #[test]
    fn origin_flags_validity() {
        assert!(OriginFlags::origin(true).is_valid());
        assert!(OriginFlags::origin(true).has_origin());
        assert!(!OriginFlags::origin(false).has_origin());
        assert!(!OriginFlags::from_raw(0x02).is_valid());
    }
}
