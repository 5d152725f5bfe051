//! Transform packet encoding and decoding.
//!
//! Layout, all multi-byte values little-endian:
//!
//! ```text
//! u8        sync flags
//! u8        origin flags          (origin rebasing layouts only)
//! f32       owner timestamp
//! 3 x i32   origin                (origin flag set)
//! u8        movement mode         (flag set, character layouts only)
//! axes      position, rotation (Euler degrees), scale, velocity, angular velocity
//! ```
//!
//! Each vector writes only its synced axes, as `f32` or half float.

use bitstream::{BitReader, BitWriter};
use glam::{IVec3, Vec3};

use crate::error::{DecodeError, EncodeError, WireResult};
use crate::header::{OriginFlags, SyncFlags};
use crate::layout::{FieldKind, FieldLayout, WireLayout, POSITION_COMPRESSION_SCALE};
use crate::limits::Limits;

/// The decoded content of one transform packet.
///
/// `None` fields were not sent. Axes the layout does not sync decode as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WireState {
    pub timestamp: f32,
    pub at_positional_rest: bool,
    pub at_rotational_rest: bool,
    pub origin: Option<IVec3>,
    pub movement_mode: Option<u8>,
    pub position: Option<Vec3>,
    /// Euler angles in degrees (x roll, y pitch, z yaw).
    pub rotation: Option<Vec3>,
    pub scale: Option<Vec3>,
    pub velocity: Option<Vec3>,
    /// Degrees per second around each axis.
    pub angular_velocity: Option<Vec3>,
}

impl WireState {
    /// Creates an empty state stamped with `timestamp`.
    #[must_use]
    pub fn new(timestamp: f32) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }

    /// Header flags describing this state.
    #[must_use]
    pub const fn flags(&self) -> SyncFlags {
        SyncFlags::from_raw(0)
            .with(SyncFlags::POSITION, self.position.is_some())
            .with(SyncFlags::ROTATION, self.rotation.is_some())
            .with(SyncFlags::SCALE, self.scale.is_some())
            .with(SyncFlags::VELOCITY, self.velocity.is_some())
            .with(SyncFlags::ANGULAR_VELOCITY, self.angular_velocity.is_some())
            .with(SyncFlags::AT_POSITIONAL_REST, self.at_positional_rest)
            .with(SyncFlags::AT_ROTATIONAL_REST, self.at_rotational_rest)
            .with(SyncFlags::MOVEMENT_MODE, self.movement_mode.is_some())
    }

    /// The vector field of the given kind.
    #[must_use]
    pub const fn field(&self, kind: FieldKind) -> Option<Vec3> {
        match kind {
            FieldKind::Position => self.position,
            FieldKind::Rotation => self.rotation,
            FieldKind::Scale => self.scale,
            FieldKind::Velocity => self.velocity,
            FieldKind::AngularVelocity => self.angular_velocity,
        }
    }
}

/// Order in which vector fields follow the prefix.
pub const FIELD_ORDER: [FieldKind; 5] = [
    FieldKind::Position,
    FieldKind::Rotation,
    FieldKind::Scale,
    FieldKind::Velocity,
    FieldKind::AngularVelocity,
];

/// Returns the exact encoded size of `state` under `layout`.
#[must_use]
pub fn encoded_len(state: &WireState, layout: &WireLayout) -> usize {
    let mut len = layout.prefix_len();
    if layout.origin_rebasing && state.origin.is_some() {
        len += 12;
    }
    if layout.character && state.movement_mode.is_some() {
        len += 1;
    }
    for kind in FIELD_ORDER {
        if state.field(kind).is_some() {
            len += layout.field(kind).byte_len();
        }
    }
    len
}

/// Encodes a state into a fresh packet.
pub fn encode_packet(
    state: &WireState,
    layout: &WireLayout,
    limits: &Limits,
) -> Result<Vec<u8>, EncodeError> {
    if state.origin.is_some() && !layout.origin_rebasing {
        return Err(EncodeError::OriginWithoutRebasing);
    }
    if state.movement_mode.is_some() && !layout.character {
        return Err(EncodeError::MovementModeWithoutCharacter);
    }
    for kind in FIELD_ORDER {
        if state.field(kind).is_some() && !layout.field(kind).mode.is_enabled() {
            return Err(EncodeError::FieldNotSynced { field: kind });
        }
    }
    let len = encoded_len(state, layout);
    if len > limits.max_packet_bytes {
        return Err(EncodeError::PacketTooLarge {
            actual: len,
            limit: limits.max_packet_bytes,
        });
    }

    let mut writer = BitWriter::with_capacity(len);
    writer.write_bits(u64::from(state.flags().raw()), 8)?;
    if layout.origin_rebasing {
        writer.write_u8_aligned(OriginFlags::origin(state.origin.is_some()).raw())?;
    }
    writer.write_f32_aligned(state.timestamp)?;
    if let Some(origin) = state.origin {
        for axis in origin.to_array() {
            writer.write_i32_aligned(axis)?;
        }
    }
    if let Some(mode) = state.movement_mode {
        writer.write_u8_aligned(mode)?;
    }
    for kind in FIELD_ORDER {
        if let Some(value) = state.field(kind) {
            write_vector(&mut writer, value, layout.field(kind), kind)?;
        }
    }
    Ok(writer.finish())
}

/// Reads only the sync flag byte.
pub fn peek_flags(buf: &[u8]) -> WireResult<SyncFlags> {
    buf.first()
        .map(|&raw| SyncFlags::from_raw(raw))
        .ok_or(DecodeError::PacketTooSmall {
            actual: 0,
            required: 1,
        })
}

/// Decodes a packet produced under the same `layout`.
///
/// The whole buffer must be consumed; a short or oversized packet is an
/// error and no partial state is returned.
pub fn decode_packet(buf: &[u8], layout: &WireLayout, limits: &Limits) -> WireResult<WireState> {
    let required = layout.prefix_len();
    if buf.len() < required {
        return Err(DecodeError::PacketTooSmall {
            actual: buf.len(),
            required,
        });
    }
    if buf.len() > limits.max_packet_bytes {
        return Err(DecodeError::PacketTooLarge {
            actual: buf.len(),
            limit: limits.max_packet_bytes,
        });
    }

    let mut reader = BitReader::new(buf);
    #[allow(clippy::cast_possible_truncation)]
    let flags = SyncFlags::from_raw(reader.read_bits(8)? as u8);
    let origin_flags = if layout.origin_rebasing {
        let raw = reader.read_u8_aligned()?;
        let origin_flags = OriginFlags::from_raw(raw);
        if !origin_flags.is_valid() {
            return Err(DecodeError::InvalidOriginFlags { flags: raw });
        }
        origin_flags
    } else {
        OriginFlags::default()
    };

    let mut state = WireState::new(reader.read_f32_aligned()?);
    state.at_positional_rest = flags.at_positional_rest();
    state.at_rotational_rest = flags.at_rotational_rest();

    if origin_flags.has_origin() {
        let x = reader.read_i32_aligned()?;
        let y = reader.read_i32_aligned()?;
        let z = reader.read_i32_aligned()?;
        state.origin = Some(IVec3::new(x, y, z));
    }
    if flags.has_movement_mode() && layout.character {
        state.movement_mode = Some(reader.read_u8_aligned()?);
    }

    let present = [
        flags.has_position(),
        flags.has_rotation(),
        flags.has_scale(),
        flags.has_velocity(),
        flags.has_angular_velocity(),
    ];
    for (kind, present) in FIELD_ORDER.into_iter().zip(present) {
        if !present {
            continue;
        }
        let field = layout.field(kind);
        if !field.mode.is_enabled() {
            return Err(DecodeError::UnexpectedField { field: kind });
        }
        let value = read_vector(&mut reader, field, kind)?;
        match kind {
            FieldKind::Position => state.position = Some(value),
            FieldKind::Rotation => state.rotation = Some(value),
            FieldKind::Scale => state.scale = Some(value),
            FieldKind::Velocity => state.velocity = Some(value),
            FieldKind::AngularVelocity => state.angular_velocity = Some(value),
        }
    }

    let count = reader.bytes_remaining();
    if count > 0 {
        return Err(DecodeError::TrailingBytes { count });
    }
    Ok(state)
}

fn write_vector(
    writer: &mut BitWriter,
    value: Vec3,
    field: FieldLayout,
    kind: FieldKind,
) -> Result<(), EncodeError> {
    let value = if field.compressed && kind == FieldKind::Position {
        value / POSITION_COMPRESSION_SCALE
    } else {
        value
    };
    let axes = [
        (field.mode.syncs_x(), value.x),
        (field.mode.syncs_y(), value.y),
        (field.mode.syncs_z(), value.z),
    ];
    for (synced, axis) in axes {
        if !synced {
            continue;
        }
        if field.compressed {
            writer.write_f16_aligned(axis)?;
        } else {
            writer.write_f32_aligned(axis)?;
        }
    }
    Ok(())
}

fn read_vector(
    reader: &mut BitReader<'_>,
    field: FieldLayout,
    kind: FieldKind,
) -> WireResult<Vec3> {
    let mut read_axis = |synced: bool| -> WireResult<f32> {
        if !synced {
            return Ok(0.0);
        }
        let value = if field.compressed {
            reader.read_f16_aligned()?
        } else {
            reader.read_f32_aligned()?
        };
        Ok(value)
    };
    let x = read_axis(field.mode.syncs_x())?;
    let y = read_axis(field.mode.syncs_y())?;
    let z = read_axis(field.mode.syncs_z())?;
    let value = Vec3::new(x, y, z);
    if field.compressed && kind == FieldKind::Position {
        Ok(value * POSITION_COMPRESSION_SCALE)
    } else {
        Ok(value)
    }
}
