//! The replicated transform snapshot.

use glam::{EulerRot, IVec3, Quat, Vec3};

use crate::target::SyncTarget;

const DEGREES_PER_RADIAN: f32 = 180.0 / std::f32::consts::PI;
const RADIANS_PER_DEGREE: f32 = std::f32::consts::PI / 180.0;

/// Euler order used for rotations on the wire: x roll, y pitch, z yaw.
pub const WIRE_EULER: EulerRot = EulerRot::ZYX;

/// One owner-side transform at a point in owner time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    /// Position relative to `origin`.
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub velocity: Vec3,
    /// Rotation vector in degrees per second.
    pub angular_velocity: Vec3,
    /// Owner clock time at which this state was true.
    pub owner_timestamp: f32,
    /// World origin the position is expressed against.
    pub origin: IVec3,
    pub movement_mode: u8,
    pub at_positional_rest: bool,
    pub at_rotational_rest: bool,
    /// Receivers snap to this state instead of blending into it.
    pub teleport: bool,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            owner_timestamp: 0.0,
            origin: IVec3::ZERO,
            movement_mode: 0,
            at_positional_rest: false,
            at_rotational_rest: false,
            teleport: false,
        }
    }
}

impl TransformState {
    /// Samples the live fields of a target.
    pub fn from_target<T: SyncTarget + ?Sized>(
        target: &T,
        owner_timestamp: f32,
        origin: IVec3,
    ) -> Self {
        Self {
            position: target.position(),
            rotation: target.rotation(),
            scale: target.scale(),
            velocity: target.linear_velocity(),
            angular_velocity: target.angular_velocity(),
            owner_timestamp,
            origin,
            movement_mode: target.movement_mode().unwrap_or(0),
            ..Self::default()
        }
    }

    /// Position expressed against another world origin.
    #[must_use]
    pub fn rebased_position(&self, origin: IVec3) -> Vec3 {
        self.position + (self.origin - origin).as_vec3()
    }

    /// Rotation as wire Euler degrees.
    #[must_use]
    pub fn rotation_euler(&self) -> Vec3 {
        quat_to_euler_degrees(self.rotation)
    }

    /// Replaces the rotation from wire Euler degrees.
    #[must_use]
    pub fn with_rotation_euler(mut self, euler: Vec3) -> Self {
        self.rotation = euler_degrees_to_quat(euler);
        self
    }

    /// Blends two states. `t` is not clamped; at `t == 1` the result is `end`.
    ///
    /// `start` is rebased onto `end`'s origin before positions are blended.
    #[must_use]
    pub fn lerp(start: &Self, end: &Self, t: f32) -> Self {
        if t >= 1.0 {
            return *end;
        }
        let start_position = start.rebased_position(end.origin);
        Self {
            position: start_position.lerp(end.position, t),
            rotation: start.rotation.slerp(end.rotation, t),
            scale: start.scale.lerp(end.scale, t),
            velocity: start.velocity.lerp(end.velocity, t),
            angular_velocity: start.angular_velocity.lerp(end.angular_velocity, t),
            owner_timestamp: start.owner_timestamp
                + (end.owner_timestamp - start.owner_timestamp) * t,
            origin: end.origin,
            movement_mode: end.movement_mode,
            at_positional_rest: false,
            at_rotational_rest: false,
            teleport: false,
        }
    }
}

/// Quaternion to Euler degrees (x roll, y pitch, z yaw).
#[must_use]
pub fn quat_to_euler_degrees(rotation: Quat) -> Vec3 {
    let (yaw, pitch, roll) = rotation.to_euler(WIRE_EULER);
    Vec3::new(roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees())
}

/// Euler degrees (x roll, y pitch, z yaw) to a quaternion.
#[must_use]
pub fn euler_degrees_to_quat(euler: Vec3) -> Quat {
    Quat::from_euler(
        WIRE_EULER,
        euler.z.to_radians(),
        euler.y.to_radians(),
        euler.x.to_radians(),
    )
}

/// Per-axis comparison: `true` when no axis differs by more than `threshold`.
#[must_use]
pub fn same_vector(a: Vec3, b: Vec3, threshold: f32) -> bool {
    (a - b).abs().cmple(Vec3::splat(threshold)).all()
}

/// Applies an angular velocity (degrees per second rotation vector) for `delta` seconds.
#[must_use]
pub fn integrate_rotation(rotation: Quat, angular_velocity: Vec3, delta: f32) -> Quat {
    let step = angular_velocity * (delta * RADIANS_PER_DEGREE);
    if step == Vec3::ZERO {
        return rotation;
    }
    (Quat::from_scaled_axis(step) * rotation).normalize()
}

/// Angular velocity (degrees per second rotation vector) that turns `from`
/// into `to` over `seconds`, taking the short way around.
#[must_use]
pub fn angular_velocity_between(from: Quat, to: Quat, seconds: f32) -> Vec3 {
    if seconds <= 0.0 {
        return Vec3::ZERO;
    }
    let mut delta = to * from.inverse();
    if delta.w < 0.0 {
        delta = -delta;
    }
    delta.to_scaled_axis() * (DEGREES_PER_RADIAN / seconds)
}

/// Angle between two rotations in degrees.
#[must_use]
pub fn angle_between_degrees(a: Quat, b: Quat) -> f32 {
    a.angle_between(b).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_at(position: Vec3, ts: f32) -> TransformState {
        TransformState {
            position,
            owner_timestamp: ts,
            ..TransformState::default()
        }
    }

    #[test]
    fn default_is_identity_and_not_teleport() {
        let state = TransformState::default();
        assert_eq!(state.scale, Vec3::ONE);
        assert_eq!(state.rotation, Quat::IDENTITY);
        assert!(!state.teleport);
    }

    #[test]
    fn rebased_position_adds_origin_delta() {
        let state = TransformState {
            position: Vec3::new(1.0, 0.0, 0.0),
            origin: IVec3::new(100, 0, 0),
            ..TransformState::default()
        };
        assert_eq!(state.rebased_position(IVec3::ZERO), Vec3::new(101.0, 0.0, 0.0));
        assert_eq!(state.rebased_position(IVec3::new(100, 0, 0)), Vec3::X);
    }

    #[test]
    fn lerp_endpoints() {
        let a = state_at(Vec3::ZERO, 1.0);
        let b = TransformState {
            rotation: Quat::from_rotation_y(1.0),
            teleport: true,
            ..state_at(Vec3::new(2.0, 0.0, 0.0), 2.0)
        };
        assert_eq!(TransformState::lerp(&a, &b, 1.0), b);
        let mid = TransformState::lerp(&a, &b, 0.5);
        assert_eq!(mid.position, Vec3::new(1.0, 0.0, 0.0));
        assert!((mid.owner_timestamp - 1.5).abs() < 1e-6);
        assert!(mid.rotation.angle_between(Quat::from_rotation_y(0.5)) < 1e-4);
    }

    #[test]
    fn lerp_is_unclamped_below_zero() {
        let a = state_at(Vec3::ZERO, 0.0);
        let b = state_at(Vec3::X, 1.0);
        let before = TransformState::lerp(&a, &b, -0.5);
        assert_eq!(before.position, Vec3::new(-0.5, 0.0, 0.0));
    }

    #[test]
    fn lerp_rebases_start() {
        let a = TransformState {
            origin: IVec3::new(10, 0, 0),
            ..state_at(Vec3::ZERO, 0.0)
        };
        let b = state_at(Vec3::new(12.0, 0.0, 0.0), 1.0);
        let mid = TransformState::lerp(&a, &b, 0.5);
        assert_eq!(mid.position, Vec3::new(11.0, 0.0, 0.0));
        assert_eq!(mid.origin, IVec3::ZERO);
    }

    #[test]
    fn euler_roundtrip() {
        let euler = Vec3::new(10.0, -20.0, 135.0);
        let back = quat_to_euler_degrees(euler_degrees_to_quat(euler));
        assert!((back - euler).abs().max_element() < 1e-3, "{back:?}");
    }

    #[test]
    fn yaw_is_about_z() {
        let q = euler_degrees_to_quat(Vec3::new(0.0, 0.0, 90.0));
        let forward = q * Vec3::X;
        assert!((forward - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn angular_velocity_integrates_back() {
        let from = euler_degrees_to_quat(Vec3::new(0.0, 0.0, 10.0));
        let to = euler_degrees_to_quat(Vec3::new(0.0, 0.0, 40.0));
        let av = angular_velocity_between(from, to, 0.5);
        assert!((av - Vec3::new(0.0, 0.0, 60.0)).length() < 1e-3, "{av:?}");
        let again = integrate_rotation(from, av, 0.5);
        assert!(angle_between_degrees(again, to) < 1e-3);
        assert_eq!(angular_velocity_between(from, to, 0.0), Vec3::ZERO);
    }

    #[test]
    fn angular_velocity_takes_short_way() {
        let from = euler_degrees_to_quat(Vec3::new(0.0, 0.0, 170.0));
        let to = euler_degrees_to_quat(Vec3::new(0.0, 0.0, -170.0));
        let av = angular_velocity_between(from, to, 1.0);
        assert!((av.length() - 20.0).abs() < 1e-2, "{av:?}");
    }

    #[test]
    fn same_vector_is_per_axis() {
        assert!(same_vector(Vec3::ZERO, Vec3::splat(0.05), 0.05));
        assert!(!same_vector(Vec3::ZERO, Vec3::new(0.0, 0.06, 0.0), 0.05));
        assert!(same_vector(Vec3::ONE, Vec3::ONE, 0.0));
        assert!(!same_vector(Vec3::ONE, Vec3::new(1.0, 1.0, 1.000_001), 0.0));
    }
}
