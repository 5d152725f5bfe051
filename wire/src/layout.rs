//! Axis masks and per-field layouts both ends must agree on.

use glam::Vec3;

/// Bytes per axis at full precision.
pub const FULL_AXIS_BYTES: usize = 4;

/// Bytes per axis when half-float compressed.
pub const HALF_AXIS_BYTES: usize = 2;

/// Compressed positions are divided by this before packing.
pub const POSITION_COMPRESSION_SCALE: f32 = 100.0;

/// Which axes of a vector field are synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SyncMode {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "xyz"))]
    Xyz,
    #[cfg_attr(feature = "serde", serde(rename = "xy"))]
    Xy,
    #[cfg_attr(feature = "serde", serde(rename = "xz"))]
    Xz,
    #[cfg_attr(feature = "serde", serde(rename = "yz"))]
    Yz,
    #[cfg_attr(feature = "serde", serde(rename = "x"))]
    X,
    #[cfg_attr(feature = "serde", serde(rename = "y"))]
    Y,
    #[cfg_attr(feature = "serde", serde(rename = "z"))]
    Z,
    #[cfg_attr(feature = "serde", serde(rename = "none"))]
    None,
}

impl SyncMode {
    #[must_use]
    pub const fn syncs_x(self) -> bool {
        matches!(self, Self::Xyz | Self::Xy | Self::Xz | Self::X)
    }

    #[must_use]
    pub const fn syncs_y(self) -> bool {
        matches!(self, Self::Xyz | Self::Xy | Self::Yz | Self::Y)
    }

    #[must_use]
    pub const fn syncs_z(self) -> bool {
        matches!(self, Self::Xyz | Self::Xz | Self::Yz | Self::Z)
    }

    /// Returns `true` if at least one axis is synchronized.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Number of synchronized axes (0-3).
    #[must_use]
    pub const fn axis_count(self) -> usize {
        self.syncs_x() as usize + self.syncs_y() as usize + self.syncs_z() as usize
    }

    /// Per-axis mask, 1.0 for synced axes and 0.0 otherwise.
    #[must_use]
    pub fn mask(self) -> Vec3 {
        Vec3::new(
            f32::from(u8::from(self.syncs_x())),
            f32::from(u8::from(self.syncs_y())),
            f32::from(u8::from(self.syncs_z())),
        )
    }

    /// Takes synced axes from `incoming` and the rest from `current`.
    #[must_use]
    pub fn merge(self, current: Vec3, incoming: Vec3) -> Vec3 {
        Vec3::new(
            if self.syncs_x() { incoming.x } else { current.x },
            if self.syncs_y() { incoming.y } else { current.y },
            if self.syncs_z() { incoming.z } else { current.z },
        )
    }
}

/// How one vector field is laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldLayout {
    pub mode: SyncMode,
    /// Half-float axes instead of full `f32`.
    pub compressed: bool,
}

impl FieldLayout {
    #[must_use]
    pub const fn new(mode: SyncMode, compressed: bool) -> Self {
        Self { mode, compressed }
    }

    /// A disabled field.
    #[must_use]
    pub const fn disabled() -> Self {
        Self::new(SyncMode::None, false)
    }

    #[must_use]
    pub const fn axis_bytes(self) -> usize {
        if self.compressed {
            HALF_AXIS_BYTES
        } else {
            FULL_AXIS_BYTES
        }
    }

    /// Encoded size when the field is present.
    #[must_use]
    pub const fn byte_len(self) -> usize {
        self.mode.axis_count() * self.axis_bytes()
    }
}

/// Identifies a vector field in errors and layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Position,
    Rotation,
    Scale,
    Velocity,
    AngularVelocity,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Position => "position",
            Self::Rotation => "rotation",
            Self::Scale => "scale",
            Self::Velocity => "velocity",
            Self::AngularVelocity => "angular velocity",
        };
        write!(f, "{name}")
    }
}

/// The full wire layout of a sync instance.
///
/// Sender and receivers must be configured with the same layout; the packet
/// itself only says which fields are present, not how they are packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WireLayout {
    pub position: FieldLayout,
    pub rotation: FieldLayout,
    pub scale: FieldLayout,
    pub velocity: FieldLayout,
    pub angular_velocity: FieldLayout,
    /// Second header byte and optional origin are present.
    pub origin_rebasing: bool,
    /// Movement mode byte may be present.
    pub character: bool,
}

impl Default for WireLayout {
    fn default() -> Self {
        Self {
            position: FieldLayout::new(SyncMode::Xyz, false),
            rotation: FieldLayout::new(SyncMode::Xyz, false),
            scale: FieldLayout::new(SyncMode::Xyz, false),
            velocity: FieldLayout::new(SyncMode::Xyz, false),
            angular_velocity: FieldLayout::new(SyncMode::Xyz, false),
            origin_rebasing: false,
            character: false,
        }
    }
}

impl WireLayout {
    #[must_use]
    pub const fn field(&self, kind: FieldKind) -> FieldLayout {
        match kind {
            FieldKind::Position => self.position,
            FieldKind::Rotation => self.rotation,
            FieldKind::Scale => self.scale,
            FieldKind::Velocity => self.velocity,
            FieldKind::AngularVelocity => self.angular_velocity,
        }
    }

    /// Size of the fixed prefix: header byte, optional origin byte, timestamp.
    #[must_use]
    pub const fn prefix_len(&self) -> usize {
        let origin_byte = if self.origin_rebasing { 1 } else { 0 };
        1 + origin_byte + 4
    }

    /// Largest packet this layout can produce.
    #[must_use]
    pub const fn max_packet_len(&self) -> usize {
        let mut len = self.prefix_len();
        if self.origin_rebasing {
            len += 12;
        }
        if self.character {
            len += 1;
        }
        len + self.position.byte_len()
            + self.rotation.byte_len()
            + self.scale.byte_len()
            + self.velocity.byte_len()
            + self.angular_velocity.byte_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_counts() {
        assert_eq!(SyncMode::Xyz.axis_count(), 3);
        assert_eq!(SyncMode::Xz.axis_count(), 2);
        assert_eq!(SyncMode::Y.axis_count(), 1);
        assert_eq!(SyncMode::None.axis_count(), 0);
        assert!(!SyncMode::None.is_enabled());
    }

    #[test]
    fn axis_membership() {
        assert!(SyncMode::Xz.syncs_x() && !SyncMode::Xz.syncs_y() && SyncMode::Xz.syncs_z());
        assert!(!SyncMode::Yz.syncs_x() && SyncMode::Yz.syncs_y());
        assert_eq!(SyncMode::Xy.mask(), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn merge_keeps_unsynced_axes() {
        let merged = SyncMode::Xz.merge(Vec3::new(1.0, 2.0, 3.0), Vec3::new(7.0, 8.0, 9.0));
        assert_eq!(merged, Vec3::new(7.0, 2.0, 9.0));
        let all = SyncMode::Xyz.merge(Vec3::ZERO, Vec3::ONE);
        assert_eq!(all, Vec3::ONE);
    }

    #[test]
    fn field_byte_len() {
        assert_eq!(FieldLayout::new(SyncMode::Xyz, false).byte_len(), 12);
        assert_eq!(FieldLayout::new(SyncMode::Xyz, true).byte_len(), 6);
        assert_eq!(FieldLayout::new(SyncMode::X, true).byte_len(), 2);
        assert_eq!(FieldLayout::disabled().byte_len(), 0);
    }

    #[test]
    fn max_packet_len_default() {
        let layout = WireLayout::default();
        assert_eq!(layout.prefix_len(), 5);
        assert_eq!(layout.max_packet_len(), 5 + 5 * 12);
    }

    #[test]
    fn max_packet_len_with_extras() {
        let layout = WireLayout {
            origin_rebasing: true,
            character: true,
            velocity: FieldLayout::disabled(),
            angular_velocity: FieldLayout::disabled(),
            ..WireLayout::default()
        };
        assert_eq!(layout.max_packet_len(), 6 + 12 + 1 + 36);
    }
}
