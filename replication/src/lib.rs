//! Owner-authoritative transform replication for the glide protocol.
//!
//! One side of each object is authoritative: it samples the object's
//! transform every frame and decides what to send. Every other side buffers
//! the received states by owner timestamp and plays them back a fixed
//! interval in the past, extrapolating when the buffer runs dry.
//!
//! # Features
//!
//! - Threshold-driven sending with per-field change detection
//! - At-rest detection with a one-time rest send and a restart bridge state
//! - Timestamp-ordered state history with teleport insertion
//! - Owner clock estimation from a rolling average of observed offsets
//! - Interpolation, bounded extrapolation and snap thresholds on playback
//! - Floating origin rebasing and character movement modes
//!
//! # Design Principles
//!
//! - **Host-agnostic** - Objects are reached through [`SyncTarget`]; messages leave
//!   through [`Transport`].
//! - **Per-tick work never fails** - Errors are logged and the tick carries on.
//! - **Deterministic playback** - Interpolation is a pure function of the buffer and
//!   the playback time.

mod buffer;
mod clock;
mod config;
mod error;
mod net;
mod playback;
mod receiver;
mod rest;
mod sender;
mod state;
mod sync;
mod target;

pub use buffer::{AddOutcome, EntryId, StateBuffer};
pub use clock::{ClockSource, FixedOffset, OwnerClock};
pub use config::{ExtrapolationMode, SyncConfig, MAX_HISTORY_WINDOW, MIN_BUFFER_CAPACITY};
pub use error::{ConfigError, SyncError, SyncResult};
pub use net::{
    Authority, NetRole, Outbox, StaticAuthority, SyncMessage, TeleportMessage, TickContext,
    Transport,
};
pub use playback::{
    derived_angular_velocity, derived_velocity, interpolation_factor, is_moving,
    plan_interpolation, Interpolation, PlaybackState, MOTION_EPSILON,
};
pub use receiver::{ReceiveOutcome, Receiver};
pub use rest::{RestState, RestTracker, RestTransition};
pub use sender::{SendSet, Sender};
pub use state::{
    angle_between_degrees, euler_degrees_to_quat, quat_to_euler_degrees, TransformState,
};
pub use sync::{TickOutcome, TransformSync};
pub use target::{Body, SyncTarget, TargetKind};
pub use wire::{Limits as WireLimits, SyncMode};
