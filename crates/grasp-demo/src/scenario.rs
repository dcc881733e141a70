//! Scripted controller sessions.
//!
//! Each scenario is a fixed number of ticks: both controllers connect on the
//! first tick of the session, the scenario's button goes down on its second
//! tick and comes back up on its last. Controllers report a pose every tick.

use clap::ValueEnum;
use glam::{DMat4, DQuat, DVec3};
use grasp_input::{ButtonEdge, ControllerButton, Device};
use grasp_interaction::InteractionEvent;
use std::f64::consts::FRAC_PI_2;

/// Where the demo crate sits in physical space at session start.
pub const CRATE_POSITION: DVec3 = DVec3::new(0.0, 1.0, -0.5);

/// Shortest scenario that still has a press, a move and a release.
pub const MIN_TICKS: u64 = 3;

/// Which interaction to script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Left hand carries the crate in an arc, turning it a quarter turn.
    Grab,
    /// Both hands pinch the world and spread apart, zooming in by 2x.
    Pinch,
    /// Right hand flies forward.
    Dolly,
    /// Grab, then pinch, then dolly.
    All,
}

impl Scenario {
    fn phases(self) -> &'static [Scenario] {
        match self {
            Scenario::Grab => &[Scenario::Grab],
            Scenario::Pinch => &[Scenario::Pinch],
            Scenario::Dolly => &[Scenario::Dolly],
            Scenario::All => &[Scenario::Grab, Scenario::Pinch, Scenario::Dolly],
        }
    }
}

/// A scenario unrolled into per-tick event batches.
#[derive(Debug, Clone)]
pub struct Script {
    phases: &'static [Scenario],
    ticks_per_phase: u64,
}

impl Script {
    /// Script `scenario`, giving each phase `ticks_per_phase` ticks.
    pub fn new(scenario: Scenario, ticks_per_phase: u64) -> Self {
        Self {
            phases: scenario.phases(),
            ticks_per_phase: ticks_per_phase.max(MIN_TICKS),
        }
    }

    /// Total ticks in the script.
    pub fn total_ticks(&self) -> u64 {
        self.ticks_per_phase * self.phases.len() as u64
    }

    /// Events for session tick `tick`. Empty past the end.
    pub fn events(&self, tick: u64) -> Vec<InteractionEvent> {
        if tick >= self.total_ticks() {
            return Vec::new();
        }
        let phase = self.phases[(tick / self.ticks_per_phase) as usize];
        let local = tick % self.ticks_per_phase;
        let last = self.ticks_per_phase - 1;
        let progress = local as f64 / last as f64;

        let mut events = Vec::new();
        if tick == 0 {
            events.extend(Device::CONTROLLERS.map(InteractionEvent::Connected));
        }

        let (left, right) = poses(phase, progress);
        events.push(InteractionEvent::moved(Device::LeftController, left));
        events.push(InteractionEvent::moved(Device::RightController, right));

        let buttons: &[(Device, ControllerButton)] = match phase {
            Scenario::Grab => &[(Device::LeftController, ControllerButton::Trigger)],
            Scenario::Pinch => &[
                (Device::LeftController, ControllerButton::Grip),
                (Device::RightController, ControllerButton::Grip),
            ],
            Scenario::Dolly | Scenario::All => {
                &[(Device::RightController, ControllerButton::TrackPad)]
            }
        };
        if local == 1 {
            events.extend(
                buttons
                    .iter()
                    .map(|(d, b)| InteractionEvent::from(ButtonEdge::pressed(*d, *b))),
            );
        } else if local == last {
            events.extend(
                buttons
                    .iter()
                    .map(|(d, b)| InteractionEvent::from(ButtonEdge::released(*d, *b))),
            );
        }
        events
    }
}

/// Physical controller poses for a phase at `progress` in `[0, 1]`.
fn poses(phase: Scenario, progress: f64) -> (DMat4, DMat4) {
    let rest_left = DMat4::from_translation(DVec3::new(-0.3, 1.0, -0.2));
    let rest_right = DMat4::from_translation(DVec3::new(0.3, 1.0, -0.2));

    match phase {
        Scenario::Grab => {
            let angle = progress * FRAC_PI_2;
            let offset = DVec3::new(0.3 * angle.sin(), 0.1 * progress, 0.0);
            let left = DMat4::from_rotation_translation(
                DQuat::from_rotation_y(angle),
                CRATE_POSITION + offset,
            );
            (left, rest_right)
        }
        Scenario::Pinch => {
            let half = 0.2 + 0.2 * progress;
            (
                DMat4::from_translation(DVec3::new(-half, 1.2, -0.4)),
                DMat4::from_translation(DVec3::new(half, 1.2, -0.4)),
            )
        }
        Scenario::Dolly | Scenario::All => {
            let right = DMat4::from_rotation_translation(
                DQuat::from_rotation_y(0.3),
                DVec3::new(0.3, 1.0, -0.2),
            );
            (rest_left, right)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grasp_input::ButtonState;

    fn count_edges(events: &[InteractionEvent], state: ButtonState) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, InteractionEvent::Button(edge) if edge.state == state))
            .count()
    }

    #[test]
    fn test_all_runs_three_phases() {
        let script = Script::new(Scenario::All, 10);
        assert_eq!(script.total_ticks(), 30);
        assert!(script.events(30).is_empty());
    }

    #[test]
    fn test_connects_only_on_first_tick() {
        let script = Script::new(Scenario::Grab, 5);
        let connects = |tick| {
            script
                .events(tick)
                .iter()
                .filter(|e| matches!(e, InteractionEvent::Connected(_)))
                .count()
        };
        assert_eq!(connects(0), 2);
        assert_eq!(connects(1), 0);
    }

    #[test]
    fn test_press_on_second_tick_release_on_last() {
        let script = Script::new(Scenario::Pinch, 6);
        assert_eq!(count_edges(&script.events(0), ButtonState::Pressed), 0);
        assert_eq!(count_edges(&script.events(1), ButtonState::Pressed), 2);
        let releases = count_edges(&script.events(5), ButtonState::Released);
        assert_eq!(releases, 2);
    }

    #[test]
    fn test_grab_starts_on_the_crate() {
        let (left, _) = poses(Scenario::Grab, 0.0);
        assert!(left.w_axis.truncate().abs_diff_eq(CRATE_POSITION, 1e-12));
    }

    #[test]
    fn test_tick_count_has_a_floor() {
        assert_eq!(Script::new(Scenario::Dolly, 0).total_ticks(), MIN_TICKS);
    }
}
