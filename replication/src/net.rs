//! Collaborators at the network boundary: who is authoritative, how
//! messages leave, and the per-tick clock.

use glam::{IVec3, Vec3};

/// Which end of the connection this instance runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetRole {
    Server,
    Client,
}

/// Decides which side sends. Exactly one side should be authoritative for
/// an object at a time.
pub trait Authority {
    fn role(&self) -> NetRole;
    fn is_authoritative(&self) -> bool;
}

/// An authority that never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticAuthority {
    pub role: NetRole,
    pub authoritative: bool,
}

impl StaticAuthority {
    /// Server that owns the object.
    #[must_use]
    pub const fn server_owned() -> Self {
        Self {
            role: NetRole::Server,
            authoritative: true,
        }
    }

    /// Server relaying a client-owned object.
    #[must_use]
    pub const fn server_relay() -> Self {
        Self {
            role: NetRole::Server,
            authoritative: false,
        }
    }

    /// Client that owns the object.
    #[must_use]
    pub const fn owner() -> Self {
        Self {
            role: NetRole::Client,
            authoritative: true,
        }
    }

    /// Client observing someone else's object.
    #[must_use]
    pub const fn observer() -> Self {
        Self {
            role: NetRole::Client,
            authoritative: false,
        }
    }
}

impl Authority for StaticAuthority {
    fn role(&self) -> NetRole {
        self.role
    }

    fn is_authoritative(&self) -> bool {
        self.authoritative
    }
}

/// Teleport control message. Rotation is in wire Euler degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeleportMessage {
    pub position: Vec3,
    pub rotation_euler: Vec3,
    pub scale: Vec3,
    pub timestamp: f32,
}

/// Everything a sync instance puts on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncMessage {
    /// An encoded state packet. Servers relay it unchanged.
    Transform(Vec<u8>),
    Enable(bool),
    Teleport(TeleportMessage),
}

/// Unreliable, fire-and-forget delivery supplied by the host.
pub trait Transport {
    /// Client to server.
    fn send_to_server(&mut self, message: SyncMessage);
    /// Server to every client.
    fn broadcast(&mut self, message: SyncMessage);
}

/// A transport that queues messages for the host to deliver.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    pub to_server: Vec<SyncMessage>,
    pub broadcasts: Vec<SyncMessage>,
}

impl Outbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_server.is_empty() && self.broadcasts.is_empty()
    }

    pub fn take_to_server(&mut self) -> Vec<SyncMessage> {
        std::mem::take(&mut self.to_server)
    }

    pub fn take_broadcasts(&mut self) -> Vec<SyncMessage> {
        std::mem::take(&mut self.broadcasts)
    }
}

impl Transport for Outbox {
    fn send_to_server(&mut self, message: SyncMessage) {
        self.to_server.push(message);
    }

    fn broadcast(&mut self, message: SyncMessage) {
        self.broadcasts.push(message);
    }
}

/// Per-tick inputs from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    /// Local clock in seconds.
    pub now: f32,
    /// Seconds since the previous tick.
    pub delta: f32,
    /// The host's floating world origin. Ignored without origin rebasing.
    pub world_origin: IVec3,
}

impl TickContext {
    #[must_use]
    pub const fn new(now: f32, delta: f32) -> Self {
        Self {
            now,
            delta,
            world_origin: IVec3::ZERO,
        }
    }

    #[must_use]
    pub const fn with_world_origin(mut self, origin: IVec3) -> Self {
        self.world_origin = origin;
        self
    }
}
