//! One synchronized object: sender, receiver and the message plumbing
//! between them and the host.

use tracing::{debug, warn};
use wire::Limits;

use crate::clock::ClockSource;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::net::{Authority, NetRole, SyncMessage, TeleportMessage, TickContext, Transport};
use crate::playback::PlaybackState;
use crate::receiver::{ReceiveOutcome, Receiver};
use crate::sender::Sender;
use crate::state::quat_to_euler_degrees;
use crate::target::SyncTarget;

/// What a call to [`TransformSync::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Disabled,
    NoTarget,
    /// Authoritative side with nothing due this tick.
    Idle,
    /// Authoritative side sent a state of this many bytes.
    Sent { bytes: usize },
    /// Non-authoritative side played back.
    Played(PlaybackState),
}

/// Transform synchronization for one object.
///
/// The authoritative side samples the target and sends states; every other
/// side buffers received states and plays them back onto its target. Both
/// run from [`tick`](Self::tick). Incoming messages go to
/// [`handle_client_message`](Self::handle_client_message) on the server and
/// [`handle_server_message`](Self::handle_server_message) on clients.
pub struct TransformSync<T> {
    config: SyncConfig,
    authority: Box<dyn Authority>,
    clock_source: Option<Box<dyn ClockSource>>,
    target: Option<T>,
    sender: Sender,
    receiver: Receiver,
    enabled: bool,
}

impl<T: SyncTarget> TransformSync<T> {
    /// Validates `config` and builds an enabled instance.
    pub fn new(
        config: SyncConfig,
        authority: impl Authority + 'static,
        target: Option<T>,
    ) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self {
            sender: Sender::new(config.clone()),
            receiver: Receiver::new(config.clone()),
            config,
            authority: Box::new(authority),
            clock_source: None,
            target,
            enabled: true,
        })
    }

    /// Uses an external clock instead of the averaged owner offset.
    #[must_use]
    pub fn with_clock_source(mut self, source: impl ClockSource + 'static) -> Self {
        self.clock_source = Some(Box::new(source));
        self
    }

    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.sender = self.sender.with_limits(limits);
        self.receiver = self.receiver.with_limits(limits);
        self
    }

    /// Sends or plays back, depending on authority.
    pub fn tick(&mut self, ctx: &TickContext, transport: &mut dyn Transport) -> TickOutcome {
        if !self.enabled {
            return TickOutcome::Disabled;
        }
        let Some(target) = self.target.as_mut() else {
            return TickOutcome::NoTarget;
        };

        if self.authority.is_authoritative() {
            match self.sender.tick(&*target, ctx) {
                Some(bytes) => {
                    let len = bytes.len();
                    route(self.authority.as_ref(), SyncMessage::Transform(bytes), transport);
                    TickOutcome::Sent { bytes: len }
                }
                None => TickOutcome::Idle,
            }
        } else {
            TickOutcome::Played(self.receiver.tick(target, ctx, self.clock_source.as_deref()))
        }
    }

    /// Server side: handles a message from a client.
    ///
    /// Every message is relayed to all clients unchanged; the server also
    /// applies it locally unless it is authoritative.
    pub fn handle_client_message(
        &mut self,
        message: SyncMessage,
        local_time: f32,
        transport: &mut dyn Transport,
    ) -> SyncResult<ReceiveOutcome> {
        let outcome = match &message {
            SyncMessage::Transform(bytes) => self.receive_transform(bytes, local_time),
            SyncMessage::Enable(enabled) => {
                self.set_enabled(*enabled);
                Ok(ReceiveOutcome::Applied)
            }
            SyncMessage::Teleport(teleport) => self.receive_teleport(teleport),
        };
        transport.broadcast(message);
        outcome
    }

    /// Client side: handles a message from the server.
    pub fn handle_server_message(
        &mut self,
        message: &SyncMessage,
        local_time: f32,
    ) -> SyncResult<ReceiveOutcome> {
        match message {
            SyncMessage::Transform(bytes) => self.receive_transform(bytes, local_time),
            SyncMessage::Enable(enabled) => {
                self.set_enabled(*enabled);
                Ok(ReceiveOutcome::Applied)
            }
            SyncMessage::Teleport(teleport) => self.receive_teleport(teleport),
        }
    }

    /// Tells every receiver to snap to the target's current transform.
    ///
    /// Call after moving the target on the authoritative side.
    pub fn teleport(&mut self, now: f32, transport: &mut dyn Transport) -> SyncResult<()> {
        if !self.authority.is_authoritative() {
            warn!("teleport requested on a non-authoritative instance");
            return Err(SyncError::NotAuthoritative {
                operation: "teleport",
            });
        }
        let Some(target) = self.target.as_ref() else {
            return Err(SyncError::MissingTarget);
        };
        let rotation = target.rotation();
        let message = TeleportMessage {
            position: target.position(),
            rotation_euler: quat_to_euler_degrees(rotation),
            scale: target.scale(),
            timestamp: now,
        };
        self.sender.note_teleport(message.position, rotation);
        debug!(timestamp = now, "teleporting");
        route(self.authority.as_ref(), SyncMessage::Teleport(message), transport);
        Ok(())
    }

    /// Enables or disables sync here, and on every peer when authoritative.
    pub fn enable_sync(&mut self, enabled: bool, transport: &mut dyn Transport) {
        if self.authority.is_authoritative() {
            route(self.authority.as_ref(), SyncMessage::Enable(enabled), transport);
        }
        self.set_enabled(enabled);
    }

    /// Call on the server when a client starts receiving this object.
    ///
    /// Forces a full send; a relaying server re-sends its newest buffered
    /// state so the new client does not wait for the owner.
    pub fn on_became_relevant(&mut self, transport: &mut dyn Transport) -> SyncResult<()> {
        if self.authority.role() != NetRole::Server {
            return Ok(());
        }
        self.sender.force_send();
        if self.authority.is_authoritative() {
            return Ok(());
        }
        let Some(head) = self.receiver.buffer().newest() else {
            return Ok(());
        };
        let kind = self
            .target
            .as_ref()
            .map(SyncTarget::kind)
            .unwrap_or_default();
        let bytes = self.sender.encode_state(head, kind)?;
        transport.broadcast(SyncMessage::Transform(bytes));
        Ok(())
    }

    /// Sends every synced field on the next authoritative tick.
    pub fn force_state_send(&mut self) {
        self.sender.force_send();
    }

    pub fn clear_buffer(&mut self) {
        self.receiver.clear();
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    #[must_use]
    pub fn authority(&self) -> &dyn Authority {
        self.authority.as_ref()
    }

    /// Replaces the authority. Ownership changes drop all runtime state.
    pub fn set_authority(&mut self, authority: impl Authority + 'static) {
        self.authority = Box::new(authority);
        self.reset_runtime();
    }

    #[must_use]
    pub const fn sender(&self) -> &Sender {
        &self.sender
    }

    #[must_use]
    pub const fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    #[must_use]
    pub const fn target(&self) -> Option<&T> {
        self.target.as_ref()
    }

    pub fn target_mut(&mut self) -> Option<&mut T> {
        self.target.as_mut()
    }

    /// Attaches a different object, returning the old one.
    pub fn set_target(&mut self, target: Option<T>) -> Option<T> {
        self.reset_runtime();
        std::mem::replace(&mut self.target, target)
    }

    fn receive_transform(&mut self, bytes: &[u8], local_time: f32) -> SyncResult<ReceiveOutcome> {
        if !self.enabled || self.authority.is_authoritative() {
            return Ok(ReceiveOutcome::Ignored);
        }
        let Some(target) = self.target.as_ref() else {
            warn!(bytes = bytes.len(), "dropping state: no target attached");
            return Err(SyncError::MissingTarget);
        };
        self.receiver.receive_packet(bytes, target, local_time)
    }

    fn receive_teleport(&mut self, message: &TeleportMessage) -> SyncResult<ReceiveOutcome> {
        if !self.enabled || self.authority.is_authoritative() {
            return Ok(ReceiveOutcome::Ignored);
        }
        let Some(target) = self.target.as_ref() else {
            warn!("dropping teleport: no target attached");
            return Err(SyncError::MissingTarget);
        };
        Ok(self.receiver.receive_teleport(message, target))
    }

    fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        debug!(enabled, "sync toggled");
        self.enabled = enabled;
        self.reset_runtime();
    }

    fn reset_runtime(&mut self) {
        self.receiver.clear();
        self.sender.reset();
    }
}

fn route(authority: &dyn Authority, message: SyncMessage, transport: &mut dyn Transport) {
    match authority.role() {
        NetRole::Server => transport.broadcast(message),
        NetRole::Client => transport.send_to_server(message),
    }
}
