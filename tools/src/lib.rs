//! Introspection and debugging tools for glide transform packets.
//!
//! This crate provides utilities for inspecting and understanding encoded packets:
//!
//! - Decode a packet into structured JSON or a readable summary
//! - Explain packet size by prefix, origin, movement mode and field
//! - Describe the wire layout a sync configuration produces
//! - Encode hand-written JSON states into packet fixtures
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to see what a sender put on the wire.

use std::fmt::Write as _;

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};
use wire::{
    decode_packet, encode_packet, EncodeError, FieldKind, Limits, SyncFlags, SyncMode, WireLayout,
    WireResult, WireState, FIELD_ORDER,
};

/// Size breakdown of one decoded packet.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectReport {
    pub len: usize,
    pub flags: SyncFlags,
    /// Header byte, optional origin flag byte and timestamp.
    pub prefix_bytes: usize,
    pub origin_bytes: usize,
    pub movement_mode_bytes: usize,
    pub fields: Vec<FieldReport>,
    pub state: WireState,
}

/// One vector field present in a packet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldReport {
    pub kind: FieldKind,
    pub mode: SyncMode,
    pub compressed: bool,
    pub bytes: usize,
}

/// Decodes `bytes` under `layout` and accounts for every byte.
pub fn inspect_packet(
    bytes: &[u8],
    layout: &WireLayout,
    limits: &Limits,
) -> WireResult<InspectReport> {
    let state = decode_packet(bytes, layout, limits)?;
    let fields = FIELD_ORDER
        .iter()
        .filter(|kind| state.field(**kind).is_some())
        .map(|&kind| {
            let field = layout.field(kind);
            FieldReport {
                kind,
                mode: field.mode,
                compressed: field.compressed,
                bytes: field.byte_len(),
            }
        })
        .collect();
    Ok(InspectReport {
        len: bytes.len(),
        flags: state.flags(),
        prefix_bytes: layout.prefix_len(),
        origin_bytes: if state.origin.is_some() { 12 } else { 0 },
        movement_mode_bytes: usize::from(state.movement_mode.is_some()),
        fields,
        state,
    })
}

/// JSON form of a packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedPacket {
    pub timestamp: f32,
    #[serde(default)]
    pub at_positional_rest: bool,
    #[serde(default)]
    pub at_rotational_rest: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<[i32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement_mode: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f32; 3]>,
    /// Euler degrees (x roll, y pitch, z yaw).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angular_velocity: Option<[f32; 3]>,
}

impl From<&WireState> for DecodedPacket {
    fn from(state: &WireState) -> Self {
        let array = |value: Option<Vec3>| value.map(|v| v.to_array());
        Self {
            timestamp: state.timestamp,
            at_positional_rest: state.at_positional_rest,
            at_rotational_rest: state.at_rotational_rest,
            origin: state.origin.map(|origin| origin.to_array()),
            movement_mode: state.movement_mode,
            position: array(state.position),
            rotation: array(state.rotation),
            scale: array(state.scale),
            velocity: array(state.velocity),
            angular_velocity: array(state.angular_velocity),
        }
    }
}

impl From<&DecodedPacket> for WireState {
    fn from(packet: &DecodedPacket) -> Self {
        let vector = |value: Option<[f32; 3]>| value.map(Vec3::from_array);
        Self {
            timestamp: packet.timestamp,
            at_positional_rest: packet.at_positional_rest,
            at_rotational_rest: packet.at_rotational_rest,
            origin: packet.origin.map(IVec3::from_array),
            movement_mode: packet.movement_mode,
            position: vector(packet.position),
            rotation: vector(packet.rotation),
            scale: vector(packet.scale),
            velocity: vector(packet.velocity),
            angular_velocity: vector(packet.angular_velocity),
        }
    }
}

pub fn decode_packet_json(
    bytes: &[u8],
    layout: &WireLayout,
    limits: &Limits,
) -> WireResult<DecodedPacket> {
    decode_packet(bytes, layout, limits).map(|state| DecodedPacket::from(&state))
}

/// Encodes a JSON state, for building packet fixtures.
pub fn encode_packet_json(
    packet: &DecodedPacket,
    layout: &WireLayout,
    limits: &Limits,
) -> Result<Vec<u8>, EncodeError> {
    encode_packet(&WireState::from(packet), layout, limits)
}

pub fn format_decode_pretty(packet: &DecodedPacket) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "timestamp: {:.4}", packet.timestamp);
    let _ = writeln!(
        out,
        "at rest: position={} rotation={}",
        packet.at_positional_rest, packet.at_rotational_rest
    );
    if let Some([x, y, z]) = packet.origin {
        let _ = writeln!(out, "origin: ({x}, {y}, {z})");
    }
    if let Some(mode) = packet.movement_mode {
        let _ = writeln!(out, "movement mode: {mode}");
    }
    for (label, value) in [
        ("position", packet.position),
        ("rotation", packet.rotation),
        ("scale", packet.scale),
        ("velocity", packet.velocity),
        ("angular velocity", packet.angular_velocity),
    ] {
        if let Some([x, y, z]) = value {
            let _ = writeln!(out, "{label}: ({x:.4}, {y:.4}, {z:.4})");
        }
    }
    out.trim_end().to_string()
}

/// Per-field sizes of a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutReport {
    pub prefix_bytes: usize,
    pub origin_rebasing: bool,
    pub character: bool,
    pub fields: Vec<LayoutField>,
    pub max_packet_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutField {
    pub field: String,
    pub mode: SyncMode,
    pub compressed: bool,
    pub bytes: usize,
}

#[must_use]
pub fn describe_layout(layout: &WireLayout) -> LayoutReport {
    LayoutReport {
        prefix_bytes: layout.prefix_len(),
        origin_rebasing: layout.origin_rebasing,
        character: layout.character,
        fields: FIELD_ORDER
            .iter()
            .map(|&kind| {
                let field = layout.field(kind);
                LayoutField {
                    field: kind.to_string(),
                    mode: field.mode,
                    compressed: field.compressed,
                    bytes: field.byte_len(),
                }
            })
            .collect(),
        max_packet_bytes: layout.max_packet_len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wire::FieldLayout;

    fn sample_layout() -> WireLayout {
        WireLayout {
            rotation: FieldLayout::new(SyncMode::Y, true),
            origin_rebasing: true,
            ..WireLayout::default()
        }
    }

    #[test]
    fn inspect_accounts_for_every_byte() {
        let layout = sample_layout();
        let mut state = WireState::new(2.5);
        state.origin = Some(IVec3::new(1, 0, -1));
        state.position = Some(Vec3::new(1.0, 2.0, 3.0));
        state.rotation = Some(Vec3::new(0.0, 90.0, 0.0));
        let bytes = encode_packet(&state, &layout, &Limits::default()).unwrap();

        let report = inspect_packet(&bytes, &layout, &Limits::default()).unwrap();
        let field_bytes: usize = report.fields.iter().map(|field| field.bytes).sum();
        assert_eq!(
            report.prefix_bytes + report.origin_bytes + report.movement_mode_bytes + field_bytes,
            report.len
        );
        assert_eq!(report.fields.len(), 2);
        assert_eq!(report.fields[1].kind, FieldKind::Rotation);
        assert!(report.fields[1].compressed);
        assert!(report.flags.has_position());
    }

    #[test]
    fn json_decode_skips_absent_fields() {
        let layout = WireLayout::default();
        let mut state = WireState::new(1.0);
        state.scale = Some(Vec3::splat(2.0));
        let bytes = encode_packet(&state, &layout, &Limits::default()).unwrap();

        let decoded = decode_packet_json(&bytes, &layout, &Limits::default()).unwrap();
        let json = serde_json::to_value(&decoded).unwrap();
        assert_eq!(json["scale"], serde_json::json!([2.0, 2.0, 2.0]));
        assert!(json.get("position").is_none());
    }

    #[test]
    fn json_fixture_encodes() {
        let packet: DecodedPacket =
            serde_json::from_str(r#"{"timestamp": 0.5, "position": [1.0, 0.0, 0.0]}"#).unwrap();
        let layout = WireLayout::default();
        let bytes = encode_packet_json(&packet, &layout, &Limits::default()).unwrap();
        let back = decode_packet_json(&bytes, &layout, &Limits::default()).unwrap();
        assert_eq!(back, packet);
    }

    #[test]
    fn pretty_output_lists_present_fields() {
        let packet = DecodedPacket {
            timestamp: 1.0,
            at_positional_rest: true,
            at_rotational_rest: false,
            origin: None,
            movement_mode: Some(2),
            position: Some([1.0, 2.0, 3.0]),
            rotation: None,
            scale: None,
            velocity: None,
            angular_velocity: None,
        };
        let text = format_decode_pretty(&packet);
        assert!(text.contains("movement mode: 2"));
        assert!(text.contains("position: (1.0000, 2.0000, 3.0000)"));
        assert!(!text.contains("rotation:"));
    }

    #[test]
    fn layout_report_matches_layout() {
        let layout = sample_layout();
        let report = describe_layout(&layout);
        assert_eq!(report.fields.len(), 5);
        assert_eq!(report.fields[1].bytes, 2);
        assert_eq!(report.max_packet_bytes, layout.max_packet_len());
    }
}
