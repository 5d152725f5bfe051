//! Send-side decision engine.
//!
//! Runs once per tick on the authoritative side. Each tick it updates rest
//! detection, decides which fields changed enough to send, throttles to the
//! configured send rate, and encodes one packet when something is due.

use glam::{IVec3, Quat, Vec3};
use tracing::{debug, trace, warn};
use wire::{encode_packet, Limits, WireLayout, WireState};

use crate::config::{ExtrapolationMode, SyncConfig};
use crate::error::SyncResult;
use crate::net::TickContext;
use crate::rest::{RestState, RestTracker};
use crate::state::{quat_to_euler_degrees, same_vector, TransformState};
use crate::target::{SyncTarget, TargetKind};

/// Fields carried by one send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendSet {
    pub position: bool,
    pub rotation: bool,
    pub scale: bool,
    pub velocity: bool,
    pub angular_velocity: bool,
    pub movement_mode: bool,
}

impl SendSet {
    #[must_use]
    pub const fn any(&self) -> bool {
        self.position
            || self.rotation
            || self.scale
            || self.velocity
            || self.angular_velocity
            || self.movement_mode
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LastSent {
    position: Vec3,
    origin: IVec3,
    rotation: Quat,
    scale: Vec3,
    velocity: Vec3,
    angular_velocity: Vec3,
    movement_mode: Option<u8>,
}

impl Default for LastSent {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            origin: IVec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            movement_mode: None,
        }
    }
}

/// Per-instance sending state.
#[derive(Debug, Clone)]
pub struct Sender {
    config: SyncConfig,
    limits: Limits,
    position_rest: RestTracker,
    rotation_rest: RestTracker,
    teleported_from: Option<(Vec3, Quat)>,
    force: bool,
    last_send_time: Option<f32>,
    last_sent: LastSent,
    position_last_frame: Vec3,
    origin_last_frame: IVec3,
    rotation_last_frame: Quat,
    unchanged_position_sends: u32,
    unchanged_rotation_sends: u32,
}

impl Sender {
    /// A fresh sender. The first tick always sends every synced field.
    #[must_use]
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            limits: Limits::default(),
            position_rest: RestTracker::new(),
            rotation_rest: RestTracker::new(),
            teleported_from: None,
            force: true,
            last_send_time: None,
            last_sent: LastSent::default(),
            position_last_frame: Vec3::ZERO,
            origin_last_frame: IVec3::ZERO,
            rotation_last_frame: Quat::IDENTITY,
            unchanged_position_sends: 0,
            unchanged_rotation_sends: 0,
        }
    }

    #[must_use]
    pub const fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Runs one tick. Returns the encoded packet when a state is due.
    pub fn tick<T: SyncTarget + ?Sized>(
        &mut self,
        target: &T,
        ctx: &TickContext,
    ) -> Option<Vec<u8>> {
        let packet = self.evaluate(target, ctx);
        self.finish_frame(target, ctx);
        packet
    }

    /// Sends every synced field on the next tick, ignoring the send rate.
    pub fn force_send(&mut self) {
        self.force = true;
    }

    /// Records the pose the object was teleported to. Rest detection does
    /// not count the jump as movement, and the next tick sends a full state.
    pub fn note_teleport(&mut self, position: Vec3, rotation: Quat) {
        self.teleported_from = Some((position, rotation));
        self.force = true;
    }

    /// Encodes an arbitrary state with every synced field and its origin.
    ///
    /// Used to re-send buffered states; the last-sent cache is untouched.
    pub fn encode_state(&self, state: &TransformState, kind: TargetKind) -> SyncResult<Vec<u8>> {
        let layout = self.config.wire_layout(kind.is_character());
        let sends = SendSet {
            position: layout.position.mode.is_enabled(),
            rotation: layout.rotation.mode.is_enabled(),
            scale: layout.scale.mode.is_enabled(),
            velocity: kind.has_velocity_source() && layout.velocity.mode.is_enabled(),
            angular_velocity: kind.is_physics() && layout.angular_velocity.mode.is_enabled(),
            movement_mode: layout.character && self.config.sync_movement_mode,
        };
        let wire_state = to_wire(state, sends, layout.origin_rebasing);
        Ok(encode_packet(&wire_state, &layout, &self.limits)?)
    }

    /// Drops all runtime state. The next tick sends a full state.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone()).with_limits(self.limits);
    }

    #[must_use]
    pub const fn position_rest(&self) -> RestState {
        self.position_rest.state()
    }

    #[must_use]
    pub const fn rotation_rest(&self) -> RestState {
        self.rotation_rest.state()
    }

    /// Local time of the last regular send.
    #[must_use]
    pub const fn last_send_time(&self) -> Option<f32> {
        self.last_send_time
    }

    #[must_use]
    pub const fn is_forced(&self) -> bool {
        self.force
    }

    fn rest_enabled(&self) -> bool {
        self.config.extrapolation_mode != ExtrapolationMode::None
    }

    fn evaluate<T: SyncTarget + ?Sized>(
        &mut self,
        target: &T,
        ctx: &TickContext,
    ) -> Option<Vec<u8>> {
        let kind = target.kind();
        let layout = self.config.wire_layout(kind.is_character());
        let origin = self.config.local_origin(ctx.world_origin);

        if self.rest_enabled() {
            self.update_rest(target, origin, ctx.delta);
        }

        let movement_mode_changed = layout.character
            && self.config.sync_movement_mode
            && target.movement_mode() != self.last_sent.movement_mode;
        if movement_mode_changed {
            self.force = true;
        }

        let interval = self.config.send_interval();
        if !self.force
            && self
                .last_send_time
                .is_some_and(|last| ctx.now - last < interval)
        {
            return None;
        }

        let sends = self.decide(target, kind, &layout);
        if !sends.any() {
            return None;
        }

        self.count_unchanged_sends(target);

        let mut state = TransformState::from_target(target, ctx.now, origin);
        if self.rest_enabled() {
            self.apply_rest_bridge(&mut state, ctx);
        }

        let include_origin = layout.origin_rebasing
            && (self.config.always_send_origin
                || self.force
                || state.origin != self.last_sent.origin);
        let wire_state = to_wire(&state, sends, include_origin);

        match encode_packet(&wire_state, &layout, &self.limits) {
            Ok(bytes) => {
                self.record_sent(&state, sends);
                self.last_send_time = Some(ctx.now);
                trace!(
                    timestamp = state.owner_timestamp,
                    bytes = bytes.len(),
                    "sending state"
                );
                Some(bytes)
            }
            Err(err) => {
                warn!(error = %err, "dropping state that failed to encode");
                None
            }
        }
    }

    fn update_rest<T: SyncTarget + ?Sized>(&mut self, target: &T, origin: IVec3, delta: f32) {
        let duration = self.config.at_rest_duration;
        if self.config.sync_position.is_enabled() {
            let position = target.position();
            let still = same_vector(
                self.origin_last_frame.as_vec3() + self.position_last_frame,
                origin.as_vec3() + position,
                self.config.at_rest_position_threshold,
            );
            let at_teleport = self
                .teleported_from
                .is_some_and(|(from, _)| from == position);
            let transition = self
                .position_rest
                .update(still, at_teleport, delta, duration);
            if let Some(transition) = transition {
                debug!(group = "position", ?transition, "rest transition");
                self.force = true;
            }
        }
        if self.config.sync_rotation.is_enabled() {
            let rotation = target.rotation();
            let still = same_vector(
                quat_to_euler_degrees(self.rotation_last_frame),
                quat_to_euler_degrees(rotation),
                self.config.at_rest_rotation_threshold,
            );
            let at_teleport = self
                .teleported_from
                .is_some_and(|(_, from)| from == rotation);
            let transition = self
                .rotation_rest
                .update(still, at_teleport, delta, duration);
            if let Some(transition) = transition {
                debug!(group = "rotation", ?transition, "rest transition");
                self.force = true;
            }
        }
    }

    fn decide<T: SyncTarget + ?Sized>(
        &self,
        target: &T,
        kind: TargetKind,
        layout: &WireLayout,
    ) -> SendSet {
        let config = &self.config;
        let last = &self.last_sent;
        let forced = self.force;
        let position_at_rest = self.position_rest.is_at_rest();
        let rotation_at_rest = self.rotation_rest.is_at_rest();

        let position_changed = !same_vector(
            target.position(),
            last.position,
            config.send_position_threshold,
        );
        let rotation_changed = !same_vector(
            quat_to_euler_degrees(target.rotation()),
            quat_to_euler_degrees(last.rotation),
            config.send_rotation_threshold,
        );
        let scale_changed = !same_vector(target.scale(), last.scale, config.send_scale_threshold);
        let velocity_changed = !same_vector(
            target.linear_velocity(),
            last.velocity,
            config.send_velocity_threshold,
        );
        let angular_velocity_changed = !same_vector(
            target.angular_velocity(),
            last.angular_velocity,
            config.send_angular_velocity_threshold,
        );

        // A group that just stopped changing is sent once more unchanged so
        // receivers see zero motion between the last two states.
        let position_stop_bridge = self.unchanged_position_sends == 0;
        let rotation_stop_bridge = self.unchanged_rotation_sends == 0;

        SendSet {
            position: layout.position.mode.is_enabled()
                && (forced || (!position_at_rest && (position_changed || position_stop_bridge))),
            rotation: layout.rotation.mode.is_enabled()
                && (forced || (!rotation_at_rest && (rotation_changed || rotation_stop_bridge))),
            scale: layout.scale.mode.is_enabled() && (forced || scale_changed),
            velocity: kind.has_velocity_source()
                && layout.velocity.mode.is_enabled()
                && (forced || (velocity_changed && !position_at_rest)),
            angular_velocity: kind.is_physics()
                && layout.angular_velocity.mode.is_enabled()
                && (forced || (angular_velocity_changed && !rotation_at_rest)),
            movement_mode: layout.character && config.sync_movement_mode && forced,
        }
    }

    fn count_unchanged_sends<T: SyncTarget + ?Sized>(&mut self, target: &T) {
        let config = &self.config;
        if same_vector(
            target.position(),
            self.last_sent.position,
            config.send_position_threshold,
        ) {
            self.unchanged_position_sends = self.unchanged_position_sends.saturating_add(1);
        } else {
            self.unchanged_position_sends = 0;
        }
        if same_vector(
            quat_to_euler_degrees(target.rotation()),
            quat_to_euler_degrees(self.last_sent.rotation),
            config.send_rotation_threshold,
        ) {
            self.unchanged_rotation_sends = self.unchanged_rotation_sends.saturating_add(1);
        } else {
            self.unchanged_rotation_sends = 0;
        }
    }

    /// Sets rest flags and, when a group just left rest, rewrites the state
    /// into a bridge from the rest pose stamped one tick back.
    fn apply_rest_bridge(&self, state: &mut TransformState, ctx: &TickContext) {
        state.at_positional_rest = self.position_rest.is_at_rest();
        state.at_rotational_rest = self.rotation_rest.is_at_rest();

        let position_started = self.position_rest.just_started_moving();
        let rotation_started = self.rotation_rest.just_started_moving();
        if !position_started && !rotation_started {
            return;
        }
        state.owner_timestamp = ctx.now - ctx.delta;
        if position_started {
            state.position = self.last_sent.position;
            state.origin = self.last_sent.origin;
        } else {
            state.position = self.position_last_frame;
            state.origin = self.origin_last_frame;
        }
        if rotation_started {
            state.rotation = self.last_sent.rotation;
        } else {
            state.rotation = self.rotation_last_frame;
        }
        debug!(timestamp = state.owner_timestamp, "sending rest bridge");
    }

    fn record_sent(&mut self, state: &TransformState, sends: SendSet) {
        let last = &mut self.last_sent;
        if sends.position {
            last.position = state.position;
        }
        if sends.rotation {
            last.rotation = state.rotation;
        }
        if sends.scale {
            last.scale = state.scale;
        }
        if sends.velocity {
            last.velocity = state.velocity;
        }
        if sends.angular_velocity {
            last.angular_velocity = state.angular_velocity;
        }
        if sends.movement_mode {
            last.movement_mode = Some(state.movement_mode);
        }
        last.origin = state.origin;
    }

    /// Last-frame values only advance while a group is moving, so slow drift
    /// still accumulates toward the rest threshold.
    fn finish_frame<T: SyncTarget + ?Sized>(&mut self, target: &T, ctx: &TickContext) {
        let rest_enabled = self.rest_enabled();
        let tracking = |tracker: &RestTracker| {
            !rest_enabled || (tracker.still_time() == 0.0 && !tracker.is_at_rest())
        };
        if tracking(&self.position_rest) {
            self.position_last_frame = target.position();
            self.origin_last_frame = self.config.local_origin(ctx.world_origin);
        }
        if tracking(&self.rotation_rest) {
            self.rotation_last_frame = target.rotation();
        }
        self.force = false;
    }
}

fn to_wire(state: &TransformState, sends: SendSet, include_origin: bool) -> WireState {
    WireState {
        timestamp: state.owner_timestamp,
        at_positional_rest: state.at_positional_rest,
        at_rotational_rest: state.at_rotational_rest,
        origin: include_origin.then_some(state.origin),
        movement_mode: sends.movement_mode.then_some(state.movement_mode),
        position: sends.position.then_some(state.position),
        rotation: sends.rotation.then(|| state.rotation_euler()),
        scale: sends.scale.then_some(state.scale),
        velocity: sends.velocity.then_some(state.velocity),
        angular_velocity: sends.angular_velocity.then_some(state.angular_velocity),
    }
}
