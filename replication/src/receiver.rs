//! Receive-side playback engine.
//!
//! Incoming packets are decoded into a temporary state, completed from the
//! buffer head (or the live object) and inserted by timestamp. Each tick the
//! receiver picks a target pose by interpolating, holding a rest state, or
//! extrapolating, and moves the live object toward it.

use glam::{IVec3, Vec3};
use tracing::{debug, trace, warn};
use wire::{decode_packet, Limits, SyncMode, WireLayout, WireState};

use crate::buffer::{AddOutcome, EntryId, StateBuffer};
use crate::clock::{ClockSource, OwnerClock};
use crate::config::{ExtrapolationMode, SyncConfig};
use crate::error::SyncResult;
use crate::net::{TeleportMessage, TickContext};
use crate::playback::{
    derived_angular_velocity, derived_velocity, integrate, is_moving, plan_interpolation,
    PlaybackState,
};
use crate::state::{
    angle_between_degrees, euler_degrees_to_quat, quat_to_euler_degrees, TransformState,
};
use crate::target::{SyncTarget, TargetKind};

/// What happened to an incoming message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// Stored in the history buffer.
    Buffered,
    /// Older than the buffer head; dropped.
    Stale,
    /// Not applied here: this side is authoritative or sync is disabled.
    Ignored,
    /// A control message took effect.
    Applied,
}

/// Bookkeeping for extrapolating from one head state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Extrapolation {
    active_last_frame: bool,
    time_spent: f32,
}

/// Per-instance receiving state.
#[derive(Debug, Clone)]
pub struct Receiver {
    config: SyncConfig,
    limits: Limits,
    buffer: StateBuffer,
    clock: OwnerClock,
    last_origin_received: IVec3,
    latest_movement_mode: Option<u8>,
    latest_velocity: Vec3,
    latest_angular_velocity: Vec3,
    playback: PlaybackState,
    target_state: TransformState,
    extrapolation: Extrapolation,
    latest_end_used: Option<EntryId>,
    dont_lerp: bool,
}

impl Receiver {
    #[must_use]
    pub fn new(config: SyncConfig) -> Self {
        Self {
            limits: Limits::default(),
            buffer: StateBuffer::with_config(&config),
            clock: OwnerClock::with_config(&config),
            last_origin_received: IVec3::ZERO,
            latest_movement_mode: None,
            latest_velocity: Vec3::ZERO,
            latest_angular_velocity: Vec3::ZERO,
            playback: PlaybackState::NoData,
            target_state: TransformState::default(),
            extrapolation: Extrapolation::default(),
            latest_end_used: None,
            dont_lerp: false,
            config,
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

    /// Decodes a state packet and buffers it.
    ///
    /// Malformed packets are logged and returned as errors; nothing is
    /// buffered for them.
    pub fn receive_packet<T: SyncTarget + ?Sized>(
        &mut self,
        bytes: &[u8],
        target: &T,
        local_time: f32,
    ) -> SyncResult<ReceiveOutcome> {
        let layout = self.config.wire_layout(target.kind().is_character());
        let wire_state = decode_packet(bytes, &layout, &self.limits).map_err(|err| {
            warn!(error = %err, bytes = bytes.len(), "discarding malformed state");
            err
        })?;

        let state = self.complete(&wire_state, target, &layout);
        let timestamp = state.owner_timestamp;
        match self.buffer.add_state(state) {
            AddOutcome::Inserted => {
                self.clock.record(timestamp, local_time);
                trace!(timestamp, buffered = self.buffer.len(), "buffered state");
                Ok(ReceiveOutcome::Buffered)
            }
            AddOutcome::Stale => {
                debug!(timestamp, "dropping stale state");
                Ok(ReceiveOutcome::Stale)
            }
        }
    }

    /// Buffers a teleport at its sorted position.
    pub fn receive_teleport<T: SyncTarget + ?Sized>(
        &mut self,
        message: &TeleportMessage,
        target: &T,
    ) -> ReceiveOutcome {
        let mut state =
            TransformState::from_target(target, message.timestamp, self.last_origin_received)
                .with_rotation_euler(message.rotation_euler);
        state.position = message.position;
        state.scale = message.scale;
        state.teleport = true;
        let index = self.buffer.add_teleport_state(state);
        debug!(timestamp = message.timestamp, index, "buffered teleport");
        ReceiveOutcome::Buffered
    }

    /// Plays back one tick onto `target`.
    pub fn tick<T: SyncTarget + ?Sized>(
        &mut self,
        target: &mut T,
        ctx: &TickContext,
        clock_source: Option<&dyn ClockSource>,
    ) -> PlaybackState {
        let Some(head) = self.buffer.newest().copied() else {
            self.playback = PlaybackState::NoData;
            return self.playback;
        };

        if !self.extrapolation.active_last_frame {
            self.target_state = TransformState::default();
        }

        let owner_time = self.clock.owner_time(ctx.now, clock_source);
        let time = owner_time - self.config.interpolation_back_time;
        let origin = self.config.local_origin(ctx.world_origin);
        let kind = target.kind();

        let mut should_set_pose = true;
        let next = if self.buffer.len() > 1 && head.owner_timestamp > time {
            self.extrapolation.active_last_frame = false;
            self.interpolate(time)
        } else if head.at_positional_rest && head.at_rotational_rest {
            self.extrapolation.active_last_frame = false;
            self.target_state = head;
            PlaybackState::AtRestHold
        } else {
            let first_frame = self.begin_extrapolation(&head);
            self.extrapolation.active_last_frame = true;
            match self.extrapolate(target, kind, time, ctx.delta, origin, first_frame) {
                Some(set_pose) => {
                    should_set_pose = set_pose;
                    PlaybackState::Extrapolating
                }
                None => PlaybackState::ExtrapolationExceeded,
            }
        };

        if next != self.playback {
            debug!(from = ?self.playback, to = ?next, "playback state changed");
        }
        self.playback = next;
        self.apply(target, kind, origin, should_set_pose);
        self.playback
    }

    #[must_use]
    pub const fn playback_state(&self) -> PlaybackState {
        self.playback
    }

    #[must_use]
    pub const fn buffer(&self) -> &StateBuffer {
        &self.buffer
    }

    #[must_use]
    pub const fn clock(&self) -> &OwnerClock {
        &self.clock
    }

    /// The pose chosen on the last tick.
    #[must_use]
    pub const fn target_state(&self) -> &TransformState {
        &self.target_state
    }

    /// The origin applied to states that do not carry one.
    #[must_use]
    pub const fn last_origin_received(&self) -> IVec3 {
        self.last_origin_received
    }

    /// Drops the buffer and every derived value.
    pub fn clear(&mut self) {
        let config = self.config.clone();
        *self = Self::new(config).with_limits(self.limits);
    }

    /// Fills fields the packet left out from the newest known values.
    fn complete<T: SyncTarget + ?Sized>(
        &mut self,
        wire_state: &WireState,
        target: &T,
        layout: &WireLayout,
    ) -> TransformState {
        let mut teleport = false;
        if layout.origin_rebasing {
            if let Some(origin) = wire_state.origin {
                if origin != self.last_origin_received {
                    teleport = true;
                }
                self.last_origin_received = origin;
            }
        }
        if let Some(mode) = wire_state.movement_mode {
            self.latest_movement_mode = Some(mode);
        }
        if let Some(velocity) = wire_state.velocity {
            self.latest_velocity = layout.velocity.mode.merge(self.latest_velocity, velocity);
        }
        if let Some(angular_velocity) = wire_state.angular_velocity {
            self.latest_angular_velocity = layout
                .angular_velocity
                .mode
                .merge(self.latest_angular_velocity, angular_velocity);
        }

        let origin = self.last_origin_received;
        let (base_position, base_rotation, base_scale) = self.buffer.newest().map_or_else(
            || (target.position(), target.rotation(), target.scale()),
            |head| (head.rebased_position(origin), head.rotation, head.scale),
        );

        let position = wire_state
            .position
            .map_or(base_position, |p| layout.position.mode.merge(base_position, p));
        let rotation = wire_state.rotation.map_or(base_rotation, |euler| {
            let merged = layout
                .rotation
                .mode
                .merge(quat_to_euler_degrees(base_rotation), euler);
            euler_degrees_to_quat(merged)
        });
        let scale = wire_state
            .scale
            .map_or(base_scale, |s| layout.scale.mode.merge(base_scale, s));

        TransformState {
            position,
            rotation,
            scale,
            velocity: self.latest_velocity,
            angular_velocity: self.latest_angular_velocity,
            owner_timestamp: wire_state.timestamp,
            origin,
            movement_mode: self.latest_movement_mode.unwrap_or(0),
            at_positional_rest: wire_state.at_positional_rest,
            at_rotational_rest: wire_state.at_rotational_rest,
            teleport,
        }
    }

    fn interpolate(&mut self, time: f32) -> PlaybackState {
        let Some(plan) = plan_interpolation(&self.buffer, time, self.latest_end_used) else {
            return PlaybackState::NoData;
        };
        if let Some(state) = plan.state(&self.buffer) {
            self.target_state = state;
        }
        if plan.snap {
            self.dont_lerp = true;
        }
        self.latest_end_used = Some(plan.end_id);
        PlaybackState::Interpolating
    }

    /// Starts over from the head when it changed or extrapolation was idle.
    fn begin_extrapolation(&mut self, head: &TransformState) -> bool {
        let first_frame = !self.extrapolation.active_last_frame
            || self.target_state.owner_timestamp < head.owner_timestamp;
        if first_frame {
            self.target_state = *head;
            self.extrapolation.time_spent = 0.0;
        }
        first_frame
    }

    /// Projects the head forward. Returns whether the pose should be set, or
    /// `None` when a limit was hit.
    fn extrapolate<T: SyncTarget + ?Sized>(
        &mut self,
        target: &mut T,
        kind: TargetKind,
        time: f32,
        delta: f32,
        origin: IVec3,
        first_frame: bool,
    ) -> Option<bool> {
        if self.config.extrapolation_mode == ExtrapolationMode::None {
            return None;
        }
        let head = *self.buffer.newest()?;

        if let Some(limit) = self.config.distance_limit() {
            let distance = head.rebased_position(origin).distance(target.position());
            if distance >= limit {
                debug!(distance, limit, "extrapolation distance limit reached");
                return None;
            }
        }

        let elapsed = if self.extrapolation.time_spent == 0.0 {
            time - self.target_state.owner_timestamp
        } else {
            delta
        };
        self.extrapolation.time_spent += elapsed;
        if let Some(limit) = self.config.time_limit() {
            if self.extrapolation.time_spent > limit {
                debug!(
                    time_spent = self.extrapolation.time_spent,
                    limit, "extrapolation time limit reached"
                );
                return None;
            }
        }

        if first_frame {
            if let Some(previous) = self.buffer.get(1).copied() {
                if !head.at_positional_rest && !head.teleport {
                    if !kind.has_velocity_source() || !self.config.sync_velocity.is_enabled() {
                        self.target_state.velocity = derived_velocity(&head, &previous, origin);
                    }
                    if !kind.is_physics() || !self.config.sync_angular_velocity.is_enabled() {
                        self.target_state.angular_velocity =
                            derived_angular_velocity(&head, &previous);
                    }
                }
            }
            if is_moving(self.target_state.velocity) {
                target.set_linear_velocity(self.target_state.velocity);
            }
            if is_moving(self.target_state.angular_velocity) {
                target.set_angular_velocity(self.target_state.angular_velocity);
            }
        }

        // Physics bodies integrate themselves after the first frame.
        if !kind.is_physics() || first_frame {
            integrate(&mut self.target_state, elapsed);
            return Some(true);
        }
        Some(false)
    }

    /// Moves the live object toward the target state.
    fn apply<T: SyncTarget + ?Sized>(
        &mut self,
        target: &mut T,
        kind: TargetKind,
        origin: IVec3,
        should_set_pose: bool,
    ) {
        let config = &self.config;
        let (mut position_speed, mut rotation_speed, mut scale_speed) = (
            config.position_lerp_speed,
            config.rotation_lerp_speed,
            config.scale_lerp_speed,
        );
        if std::mem::take(&mut self.dont_lerp) {
            (position_speed, rotation_speed, scale_speed) = (1.0, 1.0, 1.0);
        }

        let state = self.target_state;
        match self.playback {
            PlaybackState::NoData => return,
            PlaybackState::ExtrapolationExceeded => {
                if kind.is_physics() {
                    target.set_linear_velocity(Vec3::ZERO);
                    target.set_angular_velocity(Vec3::ZERO);
                }
                self.apply_movement_mode(target, kind);
                return;
            }
            _ => {}
        }

        let target_position = state.rebased_position(origin);
        let live_position = target.position();
        let distance = if live_position != target_position
            && (config.position_snap_threshold != 0.0 || config.received_position_threshold != 0.0)
        {
            live_position.distance(target_position)
        } else {
            0.0
        };
        let position_changed_enough = config.received_position_threshold == 0.0
            || distance > config.received_position_threshold;

        let live_rotation = target.rotation();
        let angle = if live_rotation != state.rotation
            && (config.rotation_snap_threshold != 0.0 || config.received_rotation_threshold != 0.0)
        {
            angle_between_degrees(live_rotation, state.rotation)
        } else {
            0.0
        };
        let rotation_changed_enough = config.received_rotation_threshold == 0.0
            || angle > config.received_rotation_threshold;

        let live_scale = target.scale();
        let scale_changed = live_scale != state.scale;
        let scale_distance = if scale_changed && config.scale_snap_threshold != 0.0 {
            live_scale.distance(state.scale)
        } else {
            0.0
        };

        if self.playback != PlaybackState::Extrapolating {
            target.set_linear_velocity(state.velocity);
            target.set_angular_velocity(state.angular_velocity);
        }
        if kind.drives_animation() {
            target.set_linear_velocity(state.velocity);
        }

        if config.sync_position.is_enabled() && should_set_pose && position_changed_enough {
            if config.position_snap_threshold != 0.0 && distance > config.position_snap_threshold {
                position_speed = 1.0;
            }
            let goal = config.sync_position.merge(live_position, target_position);
            target.set_position(live_position.lerp(goal, position_speed));
        }

        if config.sync_rotation.is_enabled() && should_set_pose && rotation_changed_enough {
            if config.rotation_snap_threshold != 0.0 && angle > config.rotation_snap_threshold {
                rotation_speed = 1.0;
            }
            let goal = if config.sync_rotation == SyncMode::Xyz {
                state.rotation
            } else {
                euler_degrees_to_quat(config.sync_rotation.merge(
                    quat_to_euler_degrees(live_rotation),
                    quat_to_euler_degrees(state.rotation),
                ))
            };
            target.set_rotation(live_rotation.slerp(goal, rotation_speed));
        }

        if config.sync_scale.is_enabled() && scale_changed {
            if config.scale_snap_threshold != 0.0 && scale_distance > config.scale_snap_threshold {
                scale_speed = 1.0;
            }
            let goal = config.sync_scale.merge(live_scale, state.scale);
            target.set_scale(live_scale.lerp(goal, scale_speed));
        }

        self.apply_movement_mode(target, kind);
    }

    fn apply_movement_mode<T: SyncTarget + ?Sized>(&self, target: &mut T, kind: TargetKind) {
        if kind.is_character() && self.latest_movement_mode.is_some() {
            target.set_movement_mode(self.target_state.movement_mode);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Body;
    use glam::Quat;
    use wire::encode_packet;

    fn packet(config: &SyncConfig, state: &WireState) -> Vec<u8> {
        encode_packet(state, &config.wire_layout(false), &Limits::default()).unwrap()
    }

    fn position_state(x: f32, ts: f32) -> WireState {
        WireState {
            position: Some(Vec3::new(x, 0.0, 0.0)),
            ..WireState::new(ts)
        }
    }

    #[test]
    fn empty_buffer_is_no_data() {
        let mut receiver = Receiver::new(SyncConfig::for_testing());
        let mut body = Body::default();
        let state = receiver.tick(&mut body, &TickContext::new(1.0, 0.1), None);
        assert_eq!(state, PlaybackState::NoData);
        assert_eq!(body, Body::default());
    }

    #[test]
    fn missing_fields_carry_forward() {
        let config = SyncConfig::for_testing();
        let mut receiver = Receiver::new(config.clone());
        let body = Body::default();
        let full = WireState {
            rotation: Some(Vec3::new(0.0, 0.0, 90.0)),
            scale: Some(Vec3::splat(2.0)),
            ..position_state(1.0, 1.0)
        };
        receiver
            .receive_packet(&packet(&config, &full), &body, 1.0)
            .unwrap();
        receiver
            .receive_packet(&packet(&config, &position_state(2.0, 2.0)), &body, 2.0)
            .unwrap();
        let head = receiver.buffer().newest().unwrap();
        assert_eq!(head.position.x, 2.0);
        assert_eq!(head.scale, Vec3::splat(2.0));
        let yaw = quat_to_euler_degrees(head.rotation).z;
        assert!((yaw - 90.0).abs() < 1e-3);
    }

    #[test]
    fn first_state_falls_back_to_live_object() {
        let config = SyncConfig::for_testing();
        let mut receiver = Receiver::new(config.clone());
        let body = Body {
            scale: Vec3::splat(3.0),
            ..Body::default()
        };
        receiver
            .receive_packet(&packet(&config, &position_state(1.0, 1.0)), &body, 1.0)
            .unwrap();
        assert_eq!(receiver.buffer().newest().unwrap().scale, Vec3::splat(3.0));
    }

    #[test]
    fn origin_changes_mark_teleports_and_missing_origin_inherits() {
        let config = SyncConfig::for_testing().with_origin_rebasing(true);
        let mut receiver = Receiver::new(config.clone());
        let body = Body::default();
        let a = IVec3::new(1, 0, -2);
        let b = IVec3::new(4, 0, -2);
        let cases = [
            (Some(a), 1.0, a, true),
            (None, 2.0, a, false),
            (Some(b), 3.0, b, true),
            (Some(b), 4.0, b, false),
        ];
        for (origin, ts, expected_origin, expected_teleport) in cases {
            let state = WireState {
                origin,
                ..position_state(ts, ts)
            };
            receiver
                .receive_packet(&packet(&config, &state), &body, ts)
                .unwrap();
            let head = receiver.buffer().newest().unwrap();
            assert_eq!(head.origin, expected_origin, "origin at {ts}");
            assert_eq!(head.teleport, expected_teleport, "teleport at {ts}");
            assert_eq!(receiver.last_origin_received(), expected_origin);
        }
    }

    #[test]
    fn stale_packets_do_not_touch_buffer_or_clock() {
        let config = SyncConfig::for_testing();
        let mut receiver = Receiver::new(config.clone());
        let body = Body::default();
        for ts in [1.0, 2.0] {
            receiver
                .receive_packet(&packet(&config, &position_state(ts, ts)), &body, ts)
                .unwrap();
        }
        let outcome = receiver
            .receive_packet(&packet(&config, &position_state(9.0, 1.5)), &body, 3.0)
            .unwrap();
        assert_eq!(outcome, ReceiveOutcome::Stale);
        assert_eq!(receiver.buffer().len(), 2);
        assert_eq!(receiver.clock().len(), 2);
    }

    #[test]
    fn malformed_packet_is_an_error() {
        let mut receiver = Receiver::new(SyncConfig::for_testing());
        let body = Body::default();
        assert!(receiver.receive_packet(&[0x01, 0, 0], &body, 0.0).is_err());
        assert!(receiver.buffer().is_empty());
    }

    #[test]
    fn interpolates_between_states() {
        let config = SyncConfig::for_testing().with_interpolation_back_time(0.0);
        let mut receiver = Receiver::new(config.clone());
        let mut body = Body::default();
        for (x, ts) in [(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)] {
            receiver
                .receive_packet(&packet(&config, &position_state(x, ts)), &body, ts)
                .unwrap();
        }
        let state = receiver.tick(&mut body, &TickContext::new(1.5, 0.1), None);
        assert_eq!(state, PlaybackState::Interpolating);
        assert!((body.position.x - 1.5).abs() < 1e-5);
    }

    #[test]
    fn lerp_speed_moves_part_way() {
        let config = SyncConfig {
            position_lerp_speed: 0.5,
            ..SyncConfig::for_testing().with_interpolation_back_time(0.0)
        };
        let mut receiver = Receiver::new(config.clone());
        let mut body = Body::default();
        for (x, ts) in [(0.0, 0.0), (4.0, 1.0), (8.0, 2.0)] {
            receiver
                .receive_packet(&packet(&config, &position_state(x, ts)), &body, ts)
                .unwrap();
        }
        receiver.tick(&mut body, &TickContext::new(1.0, 0.1), None);
        assert!((body.position.x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn snap_threshold_overrides_lerp_speed() {
        let config = SyncConfig {
            position_lerp_speed: 0.1,
            position_snap_threshold: 1.0,
            ..SyncConfig::for_testing().with_interpolation_back_time(0.0)
        };
        let mut receiver = Receiver::new(config.clone());
        let mut body = Body::default();
        for (x, ts) in [(10.0, 0.0), (10.0, 1.0), (10.0, 2.0)] {
            receiver
                .receive_packet(&packet(&config, &position_state(x, ts)), &body, ts)
                .unwrap();
        }
        receiver.tick(&mut body, &TickContext::new(1.0, 0.1), None);
        assert_eq!(body.position.x, 10.0);
    }

    #[test]
    fn received_threshold_ignores_small_corrections() {
        let config = SyncConfig {
            received_position_threshold: 0.5,
            ..SyncConfig::for_testing().with_interpolation_back_time(0.0)
        };
        let mut receiver = Receiver::new(config.clone());
        let mut body = Body::default();
        for (x, ts) in [(0.2, 0.0), (0.2, 1.0), (0.2, 2.0)] {
            receiver
                .receive_packet(&packet(&config, &position_state(x, ts)), &body, ts)
                .unwrap();
        }
        receiver.tick(&mut body, &TickContext::new(1.0, 0.1), None);
        assert_eq!(body.position, Vec3::ZERO);
    }

    #[test]
    fn holds_rest_state() {
        let config = SyncConfig::for_testing().with_interpolation_back_time(0.0);
        let mut receiver = Receiver::new(config.clone());
        let mut body = Body::default();
        let rest = WireState {
            at_positional_rest: true,
            at_rotational_rest: true,
            ..position_state(3.0, 1.0)
        };
        receiver
            .receive_packet(&packet(&config, &position_state(0.0, 0.0)), &body, 0.0)
            .unwrap();
        receiver
            .receive_packet(&packet(&config, &rest), &body, 1.0)
            .unwrap();
        let state = receiver.tick(&mut body, &TickContext::new(5.0, 0.1), None);
        assert_eq!(state, PlaybackState::AtRestHold);
        assert_eq!(body.position.x, 3.0);
    }

    #[test]
    fn extrapolates_with_derived_velocity() {
        let config = SyncConfig::for_testing().with_interpolation_back_time(0.0);
        let mut receiver = Receiver::new(config.clone());
        let mut body = Body::default();
        for (x, ts) in [(0.0, 0.0), (1.0, 1.0)] {
            receiver
                .receive_packet(&packet(&config, &position_state(x, ts)), &body, ts)
                .unwrap();
        }
        let state = receiver.tick(&mut body, &TickContext::new(1.5, 0.1), None);
        assert_eq!(state, PlaybackState::Extrapolating);
        assert!((body.position.x - 1.5).abs() < 1e-5);

        receiver.tick(&mut body, &TickContext::new(1.6, 0.1), None);
        assert!((body.position.x - 1.6).abs() < 1e-5);
    }

    #[test]
    fn extrapolation_time_limit() {
        let config = SyncConfig {
            extrapolation_time_limit: 0.25,
            ..SyncConfig::for_testing().with_interpolation_back_time(0.0)
        };
        let mut receiver = Receiver::new(config.clone());
        let mut body = Body::default();
        for (x, ts) in [(0.0, 0.0), (1.0, 1.0)] {
            receiver
                .receive_packet(&packet(&config, &position_state(x, ts)), &body, ts)
                .unwrap();
        }
        assert_eq!(
            receiver.tick(&mut body, &TickContext::new(1.2, 0.2), None),
            PlaybackState::Extrapolating
        );
        assert_eq!(
            receiver.tick(&mut body, &TickContext::new(1.4, 0.2), None),
            PlaybackState::ExtrapolationExceeded
        );
        let frozen = body.position;
        receiver.tick(&mut body, &TickContext::new(1.6, 0.2), None);
        assert_eq!(body.position, frozen);
    }

    #[test]
    fn no_extrapolation_freezes() {
        let config = SyncConfig::for_testing()
            .with_interpolation_back_time(0.0)
            .with_extrapolation_mode(ExtrapolationMode::None);
        let mut receiver = Receiver::new(config.clone());
        let mut body = Body::default();
        for (x, ts) in [(0.0, 0.0), (1.0, 1.0)] {
            receiver
                .receive_packet(&packet(&config, &position_state(x, ts)), &body, ts)
                .unwrap();
        }
        assert_eq!(
            receiver.tick(&mut body, &TickContext::new(2.0, 0.1), None),
            PlaybackState::ExtrapolationExceeded
        );
    }

    #[test]
    fn teleport_message_is_buffered_as_teleport() {
        let config = SyncConfig::for_testing();
        let mut receiver = Receiver::new(config);
        let body = Body::default();
        let message = TeleportMessage {
            position: Vec3::new(5.0, 0.0, 0.0),
            rotation_euler: Vec3::new(0.0, 0.0, 45.0),
            scale: Vec3::ONE,
            timestamp: 2.0,
        };
        receiver.receive_teleport(&message, &body);
        assert_eq!(receiver.buffer().len(), 2);
        let head = receiver.buffer().newest().unwrap();
        assert!(head.teleport);
        assert_eq!(head.position, message.position);
        let expected = Quat::from_rotation_z(45f32.to_radians());
        assert!(head.rotation.angle_between(expected) < 1e-5);
    }

    #[test]
    fn clear_resets_everything() {
        let config = SyncConfig::for_testing();
        let mut receiver = Receiver::new(config.clone());
        let mut body = Body::default();
        receiver
            .receive_packet(&packet(&config, &position_state(1.0, 1.0)), &body, 1.0)
            .unwrap();
        receiver.tick(&mut body, &TickContext::new(1.0, 0.1), None);
        receiver.clear();
        assert!(receiver.buffer().is_empty());
        assert!(receiver.clock().is_empty());
        assert_eq!(receiver.playback_state(), PlaybackState::NoData);
    }
}
