//! Pure playback math over a state buffer.

use glam::{IVec3, Vec3};

use crate::buffer::{EntryId, StateBuffer};
use crate::state::{angular_velocity_between, integrate_rotation, TransformState};

/// Velocity magnitude per axis below which a state counts as not moving.
pub const MOTION_EPSILON: f32 = 0.01;

/// What the receiver did on its last tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackState {
    /// Nothing buffered yet.
    #[default]
    NoData,
    Interpolating,
    /// The newest state is at rest on both groups; holding it.
    AtRestHold,
    Extrapolating,
    /// A limit was hit; the object is frozen.
    ExtrapolationExceeded,
}

/// A chosen pair of buffered states and the blend factor between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpolation {
    pub start_index: usize,
    pub end_index: usize,
    pub t: f32,
    /// A teleport forced `t` to 1; the result is applied without lerping.
    pub snap: bool,
    pub end_id: EntryId,
}

impl Interpolation {
    /// The blended state.
    #[must_use]
    pub fn state(&self, buffer: &StateBuffer) -> Option<TransformState> {
        let start = buffer.get(self.start_index)?;
        let end = buffer.get(self.end_index)?;
        Some(TransformState::lerp(start, end, self.t))
    }
}

/// Blend factor for `time` between two timestamps, never below zero.
///
/// A zero or negative span yields 1 so the newer state wins.
#[must_use]
pub fn interpolation_factor(start_time: f32, end_time: f32, time: f32) -> f32 {
    let span = end_time - start_time;
    if span <= 0.0 {
        return 1.0;
    }
    ((time - start_time) / span).max(0.0)
}

/// Picks the states surrounding `time`.
///
/// `start` is the newest state at or before `time` (or the oldest state when
/// all are newer) and `end` is the state just after it. Teleports force a
/// snap when the start is a lone teleport not reached yet, when a teleport
/// was skipped since `previous_end`, or when the end is a teleport.
#[must_use]
pub fn plan_interpolation(
    buffer: &StateBuffer,
    time: f32,
    previous_end: Option<EntryId>,
) -> Option<Interpolation> {
    let len = buffer.len();
    let oldest = len.checked_sub(1)?;
    let start_index = buffer
        .iter()
        .position(|state| state.owner_timestamp <= time)
        .unwrap_or(oldest);
    let end_index = start_index.saturating_sub(1);

    let start = buffer.get(start_index)?;
    let mut t = interpolation_factor(
        start.owner_timestamp,
        buffer.get(end_index)?.owner_timestamp,
        time,
    );
    let mut snap = false;

    // A lone teleport not reached yet jumps straight to the end state.
    if start.owner_timestamp > time && start.teleport && len == 2 {
        t = 1.0;
        snap = true;
    }

    let start_id = buffer.id_at(start_index)?;
    let end_id = buffer.id_at(end_index)?;
    if let Some(previous) = previous_end.filter(|id| *id != start_id && *id != end_id) {
        if let Some(previous_index) = buffer.index_of(previous) {
            let skipped_teleport = (start_index..previous_index)
                .filter_map(|index| buffer.get(index))
                .any(|state| state.teleport);
            if skipped_teleport {
                t = 1.0;
                snap = true;
            }
        }
    }

    if buffer.get(end_index)?.teleport {
        t = 1.0;
        snap = true;
    }

    Some(Interpolation {
        start_index,
        end_index,
        t,
        snap,
        end_id,
    })
}

/// Velocity between the two newest states, both expressed against `origin`.
#[must_use]
pub fn derived_velocity(newer: &TransformState, older: &TransformState, origin: IVec3) -> Vec3 {
    let seconds = newer.owner_timestamp - older.owner_timestamp;
    if seconds <= 0.0 {
        return Vec3::ZERO;
    }
    (newer.rebased_position(origin) - older.rebased_position(origin)) / seconds
}

/// Angular velocity between the two newest states.
#[must_use]
pub fn derived_angular_velocity(newer: &TransformState, older: &TransformState) -> Vec3 {
    angular_velocity_between(
        older.rotation,
        newer.rotation,
        newer.owner_timestamp - older.owner_timestamp,
    )
}

/// Whether any axis moves faster than [`MOTION_EPSILON`].
#[must_use]
pub fn is_moving(velocity: Vec3) -> bool {
    velocity.abs().cmpge(Vec3::splat(MOTION_EPSILON)).any()
}

/// Advances a state's pose by its own velocities.
pub fn integrate(state: &mut TransformState, seconds: f32) {
    if is_moving(state.velocity) {
        state.position += state.velocity * seconds;
    }
    if is_moving(state.angular_velocity) {
        state.rotation = integrate_rotation(state.rotation, state.angular_velocity, seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    fn at(x: f32, ts: f32) -> TransformState {
        TransformState {
            position: Vec3::new(x, 0.0, 0.0),
            owner_timestamp: ts,
            ..TransformState::default()
        }
    }

    fn buffer_of(states: &[TransformState]) -> StateBuffer {
        let mut buffer = StateBuffer::new(NonZeroUsize::new(32).unwrap());
        for state in states {
            if state.teleport {
                buffer.add_teleport_state(*state);
            } else {
                buffer.add_state(*state);
            }
        }
        buffer
    }

    #[test]
    fn factor_is_pure_function_of_timestamps() {
        assert_eq!(interpolation_factor(1.0, 2.0, 1.25), 0.25);
        assert_eq!(interpolation_factor(1.0, 2.0, 1.25), 0.25);
        assert_eq!(interpolation_factor(1.0, 1.0, 1.0), 1.0);
        assert_eq!(interpolation_factor(1.0, 2.0, 0.5), 0.0);
    }

    #[test]
    fn picks_surrounding_pair() {
        let buffer = buffer_of(&[at(0.0, 0.0), at(1.0, 1.0), at(2.0, 2.0), at(3.0, 3.0)]);
        let plan = plan_interpolation(&buffer, 1.5, None).unwrap();
        assert_eq!((plan.start_index, plan.end_index), (2, 1));
        assert!((plan.t - 0.5).abs() < 1e-6);
        assert!(!plan.snap);
        let state = plan.state(&buffer).unwrap();
        assert!((state.position.x - 1.5).abs() < 1e-6);
    }

    #[test]
    fn before_oldest_holds_oldest() {
        let buffer = buffer_of(&[at(0.0, 1.0), at(1.0, 2.0)]);
        let plan = plan_interpolation(&buffer, 0.5, None).unwrap();
        assert_eq!((plan.start_index, plan.end_index), (1, 0));
        assert_eq!(plan.t, 0.0);
        assert_eq!(plan.state(&buffer).unwrap().position.x, 0.0);
    }

    #[test]
    fn end_teleport_snaps() {
        let mut teleport = at(50.0, 2.0);
        teleport.teleport = true;
        let buffer = buffer_of(&[at(0.0, 1.0), at(1.0, 3.0), teleport]);
        let plan = plan_interpolation(&buffer, 1.5, None).unwrap();
        assert!(buffer.get(plan.end_index).unwrap().teleport);
        assert_eq!(plan.t, 1.0);
        assert!(plan.snap);
        assert_eq!(plan.state(&buffer).unwrap().position.x, 50.0);
    }

    #[test]
    fn lone_teleport_into_empty_buffer_snaps_to_teleport() {
        let mut teleport = at(9.0, 5.0);
        teleport.teleport = true;
        let buffer = buffer_of(&[teleport]);
        assert_eq!(buffer.len(), 2);
        let plan = plan_interpolation(&buffer, 4.0, None).unwrap();
        assert!(plan.snap);
        assert_eq!(plan.t, 1.0);
        assert_eq!(plan.state(&buffer).unwrap().position.x, 9.0);
    }

    #[test]
    fn unreached_teleport_start_snaps_to_end_state() {
        let mut teleport = at(9.0, 2.0);
        teleport.teleport = true;
        let buffer = buffer_of(&[at(1.0, 3.0), teleport]);
        // Order: 3.0, 2.0 (teleport).
        assert_eq!(buffer.len(), 2);
        let plan = plan_interpolation(&buffer, 1.0, None).unwrap();
        assert_eq!((plan.start_index, plan.end_index), (1, 0));
        assert_eq!(plan.t, 1.0);
        assert!(plan.snap);
        assert_eq!(plan.state(&buffer).unwrap().position.x, 1.0);
    }

    #[test]
    fn skipped_teleport_snaps() {
        let mut teleport = at(100.0, 2.0);
        teleport.teleport = true;
        let buffer = buffer_of(&[at(0.0, 1.0), at(101.0, 3.0), at(102.0, 4.0), teleport]);
        // Order: 4.0, 3.0, 2.0 (teleport), 1.0.
        let before = plan_interpolation(&buffer, 1.5, None).unwrap();
        assert_eq!(before.end_index, 2);

        // A long frame jumps past the teleport into [3.0, 4.0] while the
        // previous end was the 1.0 state.
        let previous = buffer.id_at(3).unwrap();
        let plan = plan_interpolation(&buffer, 3.5, Some(previous)).unwrap();
        assert_eq!((plan.start_index, plan.end_index), (1, 0));
        assert!(plan.snap);
        assert_eq!(plan.t, 1.0);

        // Without the history the same frame blends normally.
        let plain = plan_interpolation(&buffer, 3.5, None).unwrap();
        assert!(!plain.snap);
    }

    #[test]
    fn empty_buffer_has_no_plan() {
        let buffer = buffer_of(&[]);
        assert!(plan_interpolation(&buffer, 0.0, None).is_none());
    }

    #[test]
    fn derived_velocity_uses_rebased_positions() {
        let older = TransformState {
            origin: IVec3::new(10, 0, 0),
            ..at(0.0, 1.0)
        };
        let newer = at(12.0, 2.0);
        assert_eq!(derived_velocity(&newer, &older, IVec3::ZERO), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(derived_velocity(&older, &newer, IVec3::ZERO), Vec3::ZERO);
    }

    #[test]
    fn integrate_ignores_tiny_velocity() {
        let mut state = at(0.0, 0.0);
        state.velocity = Vec3::splat(0.001);
        integrate(&mut state, 10.0);
        assert_eq!(state.position, Vec3::ZERO);
        state.velocity = Vec3::new(2.0, 0.0, 0.0);
        integrate(&mut state, 0.5);
        assert_eq!(state.position, Vec3::X);
    }
}
