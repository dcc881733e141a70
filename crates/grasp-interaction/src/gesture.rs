//! Two-handed gesture recognition.
//!
//! ```text
//!            both controllers have a gesture button down
//! NoGesture ─────────────────────────────────────────────▶ Ambiguous
//!     ▲                                                        │ first controller move
//!     │ any release, or a count other than 1/1                 ▼  (emits Start)
//!     └───────────────────────────────────────────────────── Pinch ──▶ Update per move
//! ```
//!
//! Leaving `Pinch` for any reason emits `End`.

use crate::pose_store::PoseStore;
use glam::DMat4;
use grasp_input::{ButtonState, Device};
use tracing::debug;

/// Recognizer state for the controller pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GestureState {
    /// No two-handed gesture in progress.
    #[default]
    NoGesture,
    /// Both buttons down, waiting for motion to classify.
    Ambiguous,
    /// Two-handed pinch in progress.
    Pinch,
}

/// Edges forwarded to world navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureEdge {
    /// A pinch began; snapshot starting poses.
    Start,
    /// The pinch continues; recompute the world transform.
    Update,
    /// The pinch is over.
    End,
}

/// Turns gesture button edges and controller motion into [`GestureEdge`]s.
#[derive(Debug, Default)]
pub struct GestureRecognizer {
    state: GestureState,
}

impl GestureRecognizer {
    /// Recognizer in [`GestureState::NoGesture`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Feed a gesture-button edge from `device`.
    ///
    /// A press snapshots the device's starting pose and `physical_to_world`;
    /// once both controllers are down, both starting poses are re-snapshotted
    /// so the pair shares one instant.
    pub fn on_button(
        &mut self,
        poses: &mut PoseStore,
        device: Device,
        state: ButtonState,
        physical_to_world: Option<DMat4>,
    ) -> Option<GestureEdge> {
        if !device.is_controller() {
            return None;
        }

        match state {
            ButtonState::Pressed => {
                let count = poses.increment_button_down(device);
                poses.record_starting_pose(device);
                if let Some(p2w) = physical_to_world {
                    poses.record_starting_physical_to_world(p2w);
                }

                if !(1..=2).contains(&count) {
                    debug!(%device, count, "gesture button count out of range, aborting gesture");
                    return self.reset();
                }

                let both_down = Device::CONTROLLERS
                    .iter()
                    .all(|d| poses.button_down_count(*d) > 0);
                if both_down {
                    for controller in Device::CONTROLLERS {
                        poses.record_starting_pose(controller);
                    }
                    let edge = self.leave_pinch();
                    self.state = GestureState::Ambiguous;
                    return edge;
                }
                None
            }
            ButtonState::Released => {
                poses.reset_button_down(device);
                self.reset()
            }
        }
    }

    /// Classify after controller motion.
    pub fn recognize(&mut self, poses: &PoseStore) -> Option<GestureEdge> {
        let exactly_one_each = Device::CONTROLLERS
            .iter()
            .all(|d| poses.button_down_count(*d) == 1);
        if !exactly_one_each {
            return self.reset();
        }

        match self.state {
            GestureState::NoGesture => None,
            GestureState::Ambiguous => {
                self.state = GestureState::Pinch;
                Some(GestureEdge::Start)
            }
            GestureState::Pinch => Some(GestureEdge::Update),
        }
    }

    /// Abandon any gesture and clear both controllers' counts.
    pub fn cancel(&mut self, poses: &mut PoseStore) -> Option<GestureEdge> {
        for controller in Device::CONTROLLERS {
            poses.reset_button_down(controller);
        }
        self.reset()
    }

    fn reset(&mut self) -> Option<GestureEdge> {
        let edge = self.leave_pinch();
        self.state = GestureState::NoGesture;
        edge
    }

    fn leave_pinch(&self) -> Option<GestureEdge> {
        (self.state == GestureState::Pinch).then_some(GestureEdge::End)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const L: Device = Device::LeftController;
    const R: Device = Device::RightController;

    fn store() -> PoseStore {
        let mut store = PoseStore::new();
        store.record_pose(L, DMat4::IDENTITY);
        store.record_pose(R, DMat4::IDENTITY);
        store
    }

    #[test]
    fn test_both_down_then_move_starts_pinch() {
        let mut poses = store();
        let mut g = GestureRecognizer::new();
        assert_eq!(g.on_button(&mut poses, L, ButtonState::Pressed, None), None);
        assert_eq!(g.state(), GestureState::NoGesture);
        assert_eq!(g.on_button(&mut poses, R, ButtonState::Pressed, None), None);
        assert_eq!(g.state(), GestureState::Ambiguous);
        assert_eq!(g.recognize(&poses), Some(GestureEdge::Start));
        assert_eq!(g.recognize(&poses), Some(GestureEdge::Update));
        assert_eq!(g.state(), GestureState::Pinch);
    }

    #[test]
    fn test_release_ends_pinch_once() {
        let mut poses = store();
        let mut g = GestureRecognizer::new();
        g.on_button(&mut poses, L, ButtonState::Pressed, None);
        g.on_button(&mut poses, R, ButtonState::Pressed, None);
        g.recognize(&poses);
        assert_eq!(
            g.on_button(&mut poses, R, ButtonState::Released, None),
            Some(GestureEdge::End)
        );
        assert_eq!(g.on_button(&mut poses, R, ButtonState::Released, None), None);
        assert_eq!(g.state(), GestureState::NoGesture);
        assert_eq!(poses.button_down_count(R), 0);
    }

    #[test]
    fn test_second_button_on_one_hand_aborts() {
        let mut poses = store();
        let mut g = GestureRecognizer::new();
        g.on_button(&mut poses, L, ButtonState::Pressed, None);
        g.on_button(&mut poses, R, ButtonState::Pressed, None);
        g.recognize(&poses);
        // Second gesture button on the left hand: the pinch is torn down.
        assert_eq!(
            g.on_button(&mut poses, L, ButtonState::Pressed, None),
            Some(GestureEdge::End)
        );
        assert_eq!(g.recognize(&poses), None);
        assert_eq!(g.state(), GestureState::NoGesture);
    }

    #[test]
    fn test_third_press_forces_no_gesture() {
        let mut poses = store();
        let mut g = GestureRecognizer::new();
        g.on_button(&mut poses, L, ButtonState::Pressed, None);
        g.on_button(&mut poses, L, ButtonState::Pressed, None);
        g.on_button(&mut poses, L, ButtonState::Pressed, None);
        assert_eq!(poses.button_down_count(L), 3);
        assert_eq!(g.state(), GestureState::NoGesture);
    }

    #[test]
    fn test_single_hand_never_pinches() {
        let mut poses = store();
        let mut g = GestureRecognizer::new();
        g.on_button(&mut poses, L, ButtonState::Pressed, None);
        assert_eq!(g.recognize(&poses), None);
        assert_eq!(g.state(), GestureState::NoGesture);
    }

    #[test]
    fn test_press_snapshots_physical_to_world() {
        let mut poses = store();
        let mut g = GestureRecognizer::new();
        let p2w = DMat4::from_scale(glam::DVec3::splat(2.0));
        g.on_button(&mut poses, L, ButtonState::Pressed, Some(p2w));
        assert_eq!(poses.starting_physical_to_world(), Some(p2w));
        assert_eq!(poses.starting_pose(L), Some(DMat4::IDENTITY));
    }

    #[test]
    fn test_non_controllers_are_ignored() {
        let mut poses = store();
        let mut g = GestureRecognizer::new();
        let edge = g.on_button(
            &mut poses,
            Device::HeadMountedDisplay,
            ButtonState::Pressed,
            None,
        );
        assert_eq!(edge, None);
        assert_eq!(poses.button_down_count(Device::HeadMountedDisplay), 0);
    }

    #[test]
    fn test_cancel_clears_counts() {
        let mut poses = store();
        let mut g = GestureRecognizer::new();
        g.on_button(&mut poses, L, ButtonState::Pressed, None);
        g.on_button(&mut poses, R, ButtonState::Pressed, None);
        g.recognize(&poses);
        assert_eq!(g.cancel(&mut poses), Some(GestureEdge::End));
        assert_eq!(poses.button_down_count(L), 0);
        assert_eq!(poses.button_down_count(R), 0);
    }
}
