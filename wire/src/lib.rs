//! Packet layout and flag encoding for the glide transform sync protocol.
//!
//! This crate handles the binary wire format of a single transform update:
//! the sync flag byte, the optional origin flag byte, and the per-axis
//! encoding of each vector field. It does not know how states are chosen for
//! sending or how they are played back; only how they are packed.
//!
//! # Design Principles
//!
//! - **Layout-driven** - Both ends share a [`WireLayout`]; packets carry presence bits only.
//! - **Bounded decoding** - Packets are size-checked against [`Limits`] before parsing.
//! - **Atomic decode** - A packet either decodes completely or yields an error.

mod error;
mod header;
mod layout;
mod limits;
mod packet;

pub use error::{DecodeError, EncodeError, WireResult};
pub use header::{OriginFlags, SyncFlags};
pub use layout::{
    FieldKind, FieldLayout, SyncMode, WireLayout, FULL_AXIS_BYTES, HALF_AXIS_BYTES,
    POSITION_COMPRESSION_SCALE,
};
pub use limits::Limits;
pub use packet::{
    decode_packet, encode_packet, encoded_len, peek_flags, WireState, FIELD_ORDER,
};
