//! Rest detection for one field group on the sending side.

/// Motion classification of a field group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RestState {
    #[default]
    Moving,
    /// First tick of motion after being at rest. Lasts one tick.
    JustStartedMoving,
    AtRest,
}

/// A rest transition; both force a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestTransition {
    CameToRest,
    StartedMoving,
}

/// Tracks how long a group has stayed still.
#[derive(Debug, Clone, Default)]
pub struct RestTracker {
    state: RestState,
    still_time: f32,
}

impl RestTracker {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: RestState::Moving,
            still_time: 0.0,
        }
    }

    /// Advances the tracker by one tick.
    ///
    /// `still` is whether the group stayed within the rest threshold since
    /// the last tick. `at_teleport_target` suppresses waking up when the only
    /// movement is a teleport to the current value.
    pub fn update(
        &mut self,
        still: bool,
        at_teleport_target: bool,
        delta: f32,
        duration: f32,
    ) -> Option<RestTransition> {
        if self.state == RestState::JustStartedMoving {
            self.state = RestState::Moving;
        }
        if still {
            if self.state == RestState::AtRest {
                return None;
            }
            self.still_time += delta;
            if self.still_time >= duration {
                self.still_time = 0.0;
                self.state = RestState::AtRest;
                return Some(RestTransition::CameToRest);
            }
            return None;
        }

        match self.state {
            RestState::AtRest if !at_teleport_target => {
                self.state = RestState::JustStartedMoving;
                Some(RestTransition::StartedMoving)
            }
            _ => {
                self.still_time = 0.0;
                None
            }
        }
    }

    #[must_use]
    pub const fn state(&self) -> RestState {
        self.state
    }

    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.state == RestState::AtRest
    }

    #[must_use]
    pub fn just_started_moving(&self) -> bool {
        self.state == RestState::JustStartedMoving
    }

    /// Seconds accumulated toward rest.
    #[must_use]
    pub const fn still_time(&self) -> f32 {
        self.still_time
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.25;

    #[test]
    fn comes_to_rest_after_duration() {
        let mut tracker = RestTracker::new();
        assert_eq!(tracker.update(true, false, DT, 1.0), None);
        assert_eq!(tracker.update(true, false, DT, 1.0), None);
        assert_eq!(tracker.update(true, false, DT, 1.0), None);
        assert_eq!(
            tracker.update(true, false, DT, 1.0),
            Some(RestTransition::CameToRest)
        );
        assert!(tracker.is_at_rest());
        assert_eq!(tracker.still_time(), 0.0);
    }

    #[test]
    fn rest_is_reported_once() {
        let mut tracker = RestTracker::new();
        assert_eq!(
            tracker.update(true, false, 1.0, 1.0),
            Some(RestTransition::CameToRest)
        );
        for _ in 0..100 {
            assert_eq!(tracker.update(true, false, 1.0, 1.0), None);
        }
        // Zero duration must not retrigger either.
        for _ in 0..10 {
            assert_eq!(tracker.update(true, false, 1.0, 0.0), None);
        }
    }

    #[test]
    fn movement_resets_still_time() {
        let mut tracker = RestTracker::new();
        tracker.update(true, false, 0.5, 1.0);
        assert_eq!(tracker.still_time(), 0.5);
        tracker.update(false, false, 0.5, 1.0);
        assert_eq!(tracker.still_time(), 0.0);
        assert_eq!(tracker.state(), RestState::Moving);
    }

    #[test]
    fn wakes_through_just_started_moving() {
        let mut tracker = RestTracker::new();
        tracker.update(true, false, 1.0, 1.0);
        assert_eq!(
            tracker.update(false, false, DT, 1.0),
            Some(RestTransition::StartedMoving)
        );
        assert!(tracker.just_started_moving());
        assert_eq!(tracker.update(false, false, DT, 1.0), None);
        assert_eq!(tracker.state(), RestState::Moving);
    }

    #[test]
    fn just_started_moving_lasts_one_tick_when_still_again() {
        let mut tracker = RestTracker::new();
        tracker.update(true, false, 1.0, 1.0);
        tracker.update(false, false, DT, 1.0);
        assert!(tracker.just_started_moving());
        assert_eq!(tracker.update(true, false, DT, 1.0), None);
        assert_eq!(tracker.state(), RestState::Moving);
        assert_eq!(tracker.still_time(), DT);
    }

    #[test]
    fn teleport_target_does_not_wake() {
        let mut tracker = RestTracker::new();
        tracker.update(true, false, 1.0, 1.0);
        assert_eq!(tracker.update(false, true, DT, 1.0), None);
        assert!(tracker.is_at_rest());
    }

    #[test]
    fn reset_returns_to_moving() {
        let mut tracker = RestTracker::new();
        tracker.update(true, false, 1.0, 1.0);
        tracker.reset();
        assert_eq!(tracker.state(), RestState::Moving);
    }
}
