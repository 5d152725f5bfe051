//! The object being synchronized.

use glam::{Quat, Vec3};

use crate::state::integrate_rotation;

/// What drives the object's motion on the host.
///
/// The kind decides which velocities are meaningful: only objects with a
/// velocity source send linear velocity, only physics bodies send angular
/// velocity, and only characters carry a movement mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TargetKind {
    /// Moved directly by setting its transform.
    #[default]
    Kinematic,
    /// Simulated rigid body. Integrates its own velocities.
    Physics,
    /// Driven by a movement controller that reports a velocity.
    Movement,
    /// A character with a movement controller and a movement mode.
    Character,
}

impl TargetKind {
    #[must_use]
    pub const fn has_velocity_source(self) -> bool {
        matches!(self, Self::Physics | Self::Movement | Self::Character)
    }

    #[must_use]
    pub const fn is_physics(self) -> bool {
        matches!(self, Self::Physics)
    }

    #[must_use]
    pub const fn is_character(self) -> bool {
        matches!(self, Self::Character)
    }

    /// Movement and character velocities feed animation and are applied even
    /// while extrapolating.
    #[must_use]
    pub const fn drives_animation(self) -> bool {
        matches!(self, Self::Movement | Self::Character)
    }
}

/// Access to the live transform of a synchronized object.
///
/// Positions are relative to the host's current world origin. Angular
/// velocity is a rotation vector in degrees per second.
pub trait SyncTarget {
    fn kind(&self) -> TargetKind {
        TargetKind::Kinematic
    }

    fn position(&self) -> Vec3;
    fn rotation(&self) -> Quat;
    fn scale(&self) -> Vec3;

    fn set_position(&mut self, position: Vec3);
    fn set_rotation(&mut self, rotation: Quat);
    fn set_scale(&mut self, scale: Vec3);

    fn linear_velocity(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn set_linear_velocity(&mut self, _velocity: Vec3) {}

    fn angular_velocity(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn set_angular_velocity(&mut self, _velocity: Vec3) {}

    /// Current movement mode; only characters have one.
    fn movement_mode(&self) -> Option<u8> {
        None
    }

    fn set_movement_mode(&mut self, _mode: u8) {}
}

impl<T: SyncTarget + ?Sized> SyncTarget for Box<T> {
    fn kind(&self) -> TargetKind {
        (**self).kind()
    }

    fn position(&self) -> Vec3 {
        (**self).position()
    }

    fn rotation(&self) -> Quat {
        (**self).rotation()
    }

    fn scale(&self) -> Vec3 {
        (**self).scale()
    }

    fn set_position(&mut self, position: Vec3) {
        (**self).set_position(position);
    }

    fn set_rotation(&mut self, rotation: Quat) {
        (**self).set_rotation(rotation);
    }

    fn set_scale(&mut self, scale: Vec3) {
        (**self).set_scale(scale);
    }

    fn linear_velocity(&self) -> Vec3 {
        (**self).linear_velocity()
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) {
        (**self).set_linear_velocity(velocity);
    }

    fn angular_velocity(&self) -> Vec3 {
        (**self).angular_velocity()
    }

    fn set_angular_velocity(&mut self, velocity: Vec3) {
        (**self).set_angular_velocity(velocity);
    }

    fn movement_mode(&self) -> Option<u8> {
        (**self).movement_mode()
    }

    fn set_movement_mode(&mut self, mode: u8) {
        (**self).set_movement_mode(mode);
    }
}

/// A plain in-memory transform, for hosts without their own scene types and
/// for simulations.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub kind: TargetKind,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub movement_mode: u8,
}

impl Default for Body {
    fn default() -> Self {
        Self::new(TargetKind::Kinematic)
    }
}

impl Body {
    #[must_use]
    pub const fn new(kind: TargetKind) -> Self {
        Self {
            kind,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            movement_mode: 0,
        }
    }

    #[must_use]
    pub const fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Advances position and rotation by the current velocities.
    pub fn integrate(&mut self, delta: f32) {
        self.position += self.velocity * delta;
        self.rotation = integrate_rotation(self.rotation, self.angular_velocity, delta);
    }
}

impl SyncTarget for Body {
    fn kind(&self) -> TargetKind {
        self.kind
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn scale(&self) -> Vec3 {
        self.scale
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    fn linear_velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) {
        if self.kind.has_velocity_source() {
            self.velocity = velocity;
        }
    }

    fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    fn set_angular_velocity(&mut self, velocity: Vec3) {
        if self.kind.is_physics() {
            self.angular_velocity = velocity;
        }
    }

    fn movement_mode(&self) -> Option<u8> {
        self.kind.is_character().then_some(self.movement_mode)
    }

    fn set_movement_mode(&mut self, mode: u8) {
        self.movement_mode = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_capabilities() {
        assert!(!TargetKind::Kinematic.has_velocity_source());
        assert!(TargetKind::Physics.has_velocity_source());
        assert!(TargetKind::Physics.is_physics());
        assert!(!TargetKind::Movement.is_physics());
        assert!(TargetKind::Character.drives_animation());
        assert!(!TargetKind::Physics.drives_animation());
    }

    #[test]
    fn kinematic_body_ignores_velocity() {
        let mut body = Body::default();
        body.set_linear_velocity(Vec3::X);
        assert_eq!(body.linear_velocity(), Vec3::ZERO);
        assert_eq!(body.movement_mode(), None);
    }

    #[test]
    fn physics_body_integrates() {
        let mut body = Body::new(TargetKind::Physics);
        body.set_linear_velocity(Vec3::new(2.0, 0.0, 0.0));
        body.set_angular_velocity(Vec3::new(0.0, 0.0, 90.0));
        body.integrate(0.5);
        assert_eq!(body.position, Vec3::new(1.0, 0.0, 0.0));
        let expected = Quat::from_rotation_z(45f32.to_radians());
        assert!(body.rotation.angle_between(expected) < 1e-5);
    }

    #[test]
    fn boxed_target_forwards() {
        let mut boxed: Box<dyn SyncTarget> = Box::new(Body::new(TargetKind::Character));
        boxed.set_movement_mode(3);
        assert_eq!(boxed.movement_mode(), Some(3));
        assert_eq!(boxed.kind(), TargetKind::Character);
    }
}
