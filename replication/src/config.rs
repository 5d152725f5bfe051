//! Sync configuration.

use std::num::NonZeroUsize;

use glam::IVec3;
use wire::{FieldLayout, SyncMode, WireLayout};

use crate::error::ConfigError;

/// Smallest history buffer regardless of send rate.
pub const MIN_BUFFER_CAPACITY: usize = 30;

/// Largest history window `send_rate * time_smoothing` may ask for.
pub const MAX_HISTORY_WINDOW: usize = 4096;

/// How receivers behave once playback runs past the newest state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExtrapolationMode {
    /// Hold the newest state. Rest detection is also off.
    None,
    /// Extrapolate within the configured time and distance limits.
    #[default]
    Limited,
    /// Extrapolate forever; both limits are ignored.
    Unlimited,
}

/// Configuration for one sync instance.
///
/// Set once and read every tick. Both ends of a sync must agree on the
/// fields that make up [`wire_layout`](Self::wire_layout).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SyncConfig {
    /// States sent per second by the authoritative side.
    pub send_rate: f32,
    /// Seconds of history used to average the owner clock offset.
    pub time_smoothing: f32,
    /// Playback delay in seconds behind the estimated owner clock.
    pub interpolation_back_time: f32,

    pub extrapolation_mode: ExtrapolationMode,
    pub use_extrapolation_time_limit: bool,
    /// Seconds of extrapolation from a single state.
    pub extrapolation_time_limit: f32,
    pub use_extrapolation_distance_limit: bool,
    /// Distance between the live object and the newest state that stops extrapolation.
    pub extrapolation_distance_limit: f32,

    pub sync_position: SyncMode,
    pub sync_rotation: SyncMode,
    pub sync_scale: SyncMode,
    pub sync_velocity: SyncMode,
    pub sync_angular_velocity: SyncMode,
    pub sync_movement_mode: bool,

    pub compress_position: bool,
    pub compress_rotation: bool,
    pub compress_scale: bool,
    pub compress_velocity: bool,
    pub compress_angular_velocity: bool,

    /// Per-axis change needed before a field is sent. Zero sends any change.
    pub send_position_threshold: f32,
    /// Degrees.
    pub send_rotation_threshold: f32,
    pub send_scale_threshold: f32,
    pub send_velocity_threshold: f32,
    pub send_angular_velocity_threshold: f32,

    /// Distance a received target must differ before it is applied. Zero always applies.
    pub received_position_threshold: f32,
    /// Degrees.
    pub received_rotation_threshold: f32,

    /// Distance beyond which receivers snap instead of lerping. Zero never snaps.
    pub position_snap_threshold: f32,
    /// Degrees.
    pub rotation_snap_threshold: f32,
    pub scale_snap_threshold: f32,

    /// Fraction of the remaining distance covered per tick.
    pub position_lerp_speed: f32,
    pub rotation_lerp_speed: f32,
    pub scale_lerp_speed: f32,

    /// Per-axis movement below which a group counts as still.
    pub at_rest_position_threshold: f32,
    /// Degrees.
    pub at_rest_rotation_threshold: f32,
    /// Seconds a group must stay still before it is at rest.
    pub at_rest_duration: f32,

    /// Write the second header byte and track world origins.
    pub origin_rebasing: bool,
    /// Include the origin in every state instead of only when it changes.
    pub always_send_origin: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            send_rate: 30.0,
            time_smoothing: 2.0,
            interpolation_back_time: 0.1,
            extrapolation_mode: ExtrapolationMode::Limited,
            use_extrapolation_time_limit: true,
            extrapolation_time_limit: 5.0,
            use_extrapolation_distance_limit: false,
            extrapolation_distance_limit: 20.0,
            sync_position: SyncMode::Xyz,
            sync_rotation: SyncMode::Xyz,
            sync_scale: SyncMode::Xyz,
            sync_velocity: SyncMode::Xyz,
            sync_angular_velocity: SyncMode::Xyz,
            sync_movement_mode: false,
            compress_position: false,
            compress_rotation: false,
            compress_scale: false,
            compress_velocity: false,
            compress_angular_velocity: false,
            send_position_threshold: 0.0,
            send_rotation_threshold: 0.0,
            send_scale_threshold: 0.0,
            send_velocity_threshold: 0.0,
            send_angular_velocity_threshold: 0.0,
            received_position_threshold: 0.0,
            received_rotation_threshold: 0.0,
            position_snap_threshold: 5.0,
            rotation_snap_threshold: 100.0,
            scale_snap_threshold: 3.0,
            position_lerp_speed: 0.85,
            rotation_lerp_speed: 0.85,
            scale_lerp_speed: 0.85,
            at_rest_position_threshold: 0.05,
            at_rest_rotation_threshold: 0.1,
            at_rest_duration: 1.0,
            origin_rebasing: false,
            always_send_origin: false,
        }
    }
}

impl SyncConfig {
    /// Config with instant lerps and no snapping, convenient for exact
    /// playback assertions.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            position_lerp_speed: 1.0,
            rotation_lerp_speed: 1.0,
            scale_lerp_speed: 1.0,
            position_snap_threshold: 0.0,
            rotation_snap_threshold: 0.0,
            scale_snap_threshold: 0.0,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_send_rate(mut self, send_rate: f32) -> Self {
        self.send_rate = send_rate;
        self
    }

    #[must_use]
    pub const fn with_interpolation_back_time(mut self, seconds: f32) -> Self {
        self.interpolation_back_time = seconds;
        self
    }

    #[must_use]
    pub const fn with_extrapolation_mode(mut self, mode: ExtrapolationMode) -> Self {
        self.extrapolation_mode = mode;
        self
    }

    #[must_use]
    pub const fn with_origin_rebasing(mut self, enabled: bool) -> Self {
        self.origin_rebasing = enabled;
        self
    }

    #[must_use]
    pub const fn with_movement_mode(mut self, enabled: bool) -> Self {
        self.sync_movement_mode = enabled;
        self
    }

    /// Checks every numeric field against its valid range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("send_rate", self.send_rate)?;
        positive("time_smoothing", self.time_smoothing)?;
        let samples = self.send_rate * self.time_smoothing;
        if !(samples <= MAX_HISTORY_WINDOW as f32) {
            return Err(ConfigError::WindowTooLarge {
                samples,
                max: MAX_HISTORY_WINDOW,
            });
        }
        non_negative("interpolation_back_time", self.interpolation_back_time)?;
        non_negative("extrapolation_time_limit", self.extrapolation_time_limit)?;
        non_negative(
            "extrapolation_distance_limit",
            self.extrapolation_distance_limit,
        )?;
        for (field, value) in [
            ("send_position_threshold", self.send_position_threshold),
            ("send_rotation_threshold", self.send_rotation_threshold),
            ("send_scale_threshold", self.send_scale_threshold),
            ("send_velocity_threshold", self.send_velocity_threshold),
            (
                "send_angular_velocity_threshold",
                self.send_angular_velocity_threshold,
            ),
            ("received_position_threshold", self.received_position_threshold),
            ("received_rotation_threshold", self.received_rotation_threshold),
            ("position_snap_threshold", self.position_snap_threshold),
            ("rotation_snap_threshold", self.rotation_snap_threshold),
            ("scale_snap_threshold", self.scale_snap_threshold),
            ("at_rest_position_threshold", self.at_rest_position_threshold),
            ("at_rest_rotation_threshold", self.at_rest_rotation_threshold),
            ("at_rest_duration", self.at_rest_duration),
        ] {
            non_negative(field, value)?;
        }
        for (field, value) in [
            ("position_lerp_speed", self.position_lerp_speed),
            ("rotation_lerp_speed", self.rotation_lerp_speed),
            ("scale_lerp_speed", self.scale_lerp_speed),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::LerpSpeedOutOfRange { field, value });
            }
        }
        Ok(())
    }

    /// Seconds between regular sends.
    #[must_use]
    pub fn send_interval(&self) -> f32 {
        1.0 / self.send_rate
    }

    /// Whether the time limit applies, taking the extrapolation mode into account.
    #[must_use]
    pub fn time_limit(&self) -> Option<f32> {
        (self.extrapolation_mode == ExtrapolationMode::Limited && self.use_extrapolation_time_limit)
            .then_some(self.extrapolation_time_limit)
    }

    /// Whether the distance limit applies, taking the extrapolation mode into account.
    #[must_use]
    pub fn distance_limit(&self) -> Option<f32> {
        (self.extrapolation_mode == ExtrapolationMode::Limited
            && self.use_extrapolation_distance_limit)
            .then_some(self.extrapolation_distance_limit)
    }

    /// History capacity: enough for the smoothing window, never below 30.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn buffer_capacity(&self) -> NonZeroUsize {
        let window = (self.send_rate * self.time_smoothing)
            .clamp(0.0, MAX_HISTORY_WINDOW as f32)
            .ceil() as usize;
        let window = window.saturating_add(1).max(MIN_BUFFER_CAPACITY);
        NonZeroUsize::new(window).unwrap_or(NonZeroUsize::MIN)
    }

    /// Number of clock offset samples averaged.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn clock_window(&self) -> NonZeroUsize {
        let samples = self.send_rate * self.time_smoothing;
        let window = samples.clamp(1.0, MAX_HISTORY_WINDOW as f32) as usize;
        NonZeroUsize::new(window).unwrap_or(NonZeroUsize::MIN)
    }

    /// Origin states are expressed against: the host's world origin with
    /// rebasing, zero without.
    #[must_use]
    pub const fn local_origin(&self, world_origin: IVec3) -> IVec3 {
        if self.origin_rebasing {
            world_origin
        } else {
            IVec3::ZERO
        }
    }

    /// The wire layout implied by this config.
    #[must_use]
    pub const fn wire_layout(&self, character: bool) -> WireLayout {
        WireLayout {
            position: FieldLayout::new(self.sync_position, self.compress_position),
            rotation: FieldLayout::new(self.sync_rotation, self.compress_rotation),
            scale: FieldLayout::new(self.sync_scale, self.compress_scale),
            velocity: FieldLayout::new(self.sync_velocity, self.compress_velocity),
            angular_velocity: FieldLayout::new(
                self.sync_angular_velocity,
                self.compress_angular_velocity,
            ),
            origin_rebasing: self.origin_rebasing,
            character,
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}
