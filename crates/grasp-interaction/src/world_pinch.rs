//! Two-handed world pinch: grab the whole world with both hands and
//! translate, rotate and uniformly scale it.
//!
//! The engine solves for the physical-to-world transform that keeps the
//! combined controller handle fixed in world space:
//!
//! ```text
//! modifier = combined_start · combined_current⁻¹
//! new_p2w  = p2w_start · modifier
//! ```
//!
//! Everything is recomputed from the gesture-start snapshot, so ticks never
//! accumulate drift.

use crate::combined_pose::{self, PARALLEL_AXIS_THRESHOLD};
use crate::error::{DegenerateGeometry, InteractionError};
use glam::DMat4;
use tracing::debug;

/// Pinch state between gesture start and end.
#[derive(Debug)]
pub struct WorldPinch {
    parallel_threshold: f64,
    starting_combined: Option<DMat4>,
    last_valid_combined: Option<DMat4>,
}

impl Default for WorldPinch {
    fn default() -> Self {
        Self::new(PARALLEL_AXIS_THRESHOLD)
    }
}

impl WorldPinch {
    /// Engine rejecting frames whose `|X · Y'|` exceeds `parallel_threshold`.
    #[must_use]
    pub fn new(parallel_threshold: f64) -> Self {
        Self {
            parallel_threshold,
            starting_combined: None,
            last_valid_combined: None,
        }
    }

    /// Whether the gesture has a usable starting handle.
    #[must_use]
    pub fn has_valid_start(&self) -> bool {
        self.starting_combined.is_some()
    }

    /// Snapshot the combined handle from the two physical starting poses.
    /// A degenerate start leaves the whole gesture inert until it ends.
    pub fn start_gesture(&mut self, a: &DMat4, b: &DMat4) -> Result<(), InteractionError> {
        self.last_valid_combined = None;
        self.starting_combined = None;
        let start = self.checked_combine(a, b)?;
        self.starting_combined = Some(start);
        self.last_valid_combined = Some(start);
        Ok(())
    }

    /// Forget the gesture.
    pub fn end_gesture(&mut self) {
        self.starting_combined = None;
        self.last_valid_combined = None;
    }

    /// Physical-to-world transform for the current live poses.
    ///
    /// A degenerate live frame falls back to the last valid one, so the world
    /// freezes instead of jumping.
    pub fn update(
        &mut self,
        a: &DMat4,
        b: &DMat4,
        starting_physical_to_world: &DMat4,
    ) -> Result<DMat4, InteractionError> {
        let start = self
            .starting_combined
            .ok_or(InteractionError::NoStartingPose)?;

        let current = match self.checked_combine(a, b) {
            Ok(current) => {
                self.last_valid_combined = Some(current);
                current
            }
            Err(err) => {
                debug!(%err, "degenerate pinch frame, holding last valid handle");
                self.last_valid_combined.ok_or(err)?
            }
        };

        let modifier = start * combined_pose::invert_checked(&current)?;
        Ok(*starting_physical_to_world * modifier)
    }

    /// Combine and make sure the result can be inverted later.
    fn checked_combine(&self, a: &DMat4, b: &DMat4) -> Result<DMat4, DegenerateGeometry> {
        let m = combined_pose::combine_with_threshold(a, b, self.parallel_threshold)?.to_mat4();
        combined_pose::invert_checked(&m)?;
        Ok(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DQuat, DVec3};

    fn at(x: f64, y: f64, z: f64) -> DMat4 {
        DMat4::from_translation(DVec3::new(x, y, z))
    }

    #[test]
    fn test_unmoved_hands_leave_world_alone() {
        let mut pinch = WorldPinch::default();
        let (a, b) = (at(-0.5, 1.0, 0.0), at(0.5, 1.0, 0.0));
        pinch.start_gesture(&a, &b).unwrap();
        let p2w = DMat4::from_scale(DVec3::splat(1000.0));
        let out = pinch.update(&a, &b, &p2w).unwrap();
        assert!(out.abs_diff_eq(p2w, 1e-9));
    }

    #[test]
    fn test_spreading_hands_halves_physical_scale() {
        let mut pinch = WorldPinch::default();
        pinch
            .start_gesture(&at(-0.25, 1.0, 0.0), &at(0.25, 1.0, 0.0))
            .unwrap();
        let out = pinch
            .update(&at(-0.5, 1.0, 0.0), &at(0.5, 1.0, 0.0), &DMat4::IDENTITY)
            .unwrap();
        let (scale, _, _) = out.to_scale_rotation_translation();
        assert!(scale.abs_diff_eq(DVec3::splat(0.5), 1e-12));
    }

    #[test]
    fn test_world_point_under_handle_stays_put() {
        let mut pinch = WorldPinch::default();
        let (a0, b0) = (at(-0.2, 1.0, 0.0), at(0.2, 1.0, 0.0));
        pinch.start_gesture(&a0, &b0).unwrap();
        let p2w0 = DMat4::from_translation(DVec3::new(5.0, 0.0, 0.0));
        let turn = DQuat::from_rotation_y(0.6);
        let a1 = DMat4::from_rotation_translation(turn, DVec3::new(0.1, 1.1, -0.3));
        let b1 = DMat4::from_rotation_translation(
            turn,
            DVec3::new(0.1, 1.1, -0.3) + turn * DVec3::new(0.6, 0.0, 0.0),
        );
        let p2w1 = pinch.update(&a1, &b1, &p2w0).unwrap();

        // The world point that sat at the handle midpoint when the gesture
        // started is now under the live midpoint.
        let start_mid = DVec3::new(0.0, 1.0, 0.0);
        let live_mid = (a1.w_axis.truncate() + b1.w_axis.truncate()) * 0.5;
        let anchored = p2w0.transform_point3(start_mid);
        assert!(p2w1.transform_point3(live_mid).abs_diff_eq(anchored, 1e-9));
    }

    #[test]
    fn test_degenerate_frame_holds_last_valid() {
        let mut pinch = WorldPinch::default();
        pinch
            .start_gesture(&at(-0.5, 1.0, 0.0), &at(0.5, 1.0, 0.0))
            .unwrap();
        let good = pinch
            .update(&at(-0.5, 1.0, 0.0), &at(0.7, 1.0, 0.0), &DMat4::IDENTITY)
            .unwrap();
        // Vertical stack: X parallel to up.
        let held = pinch
            .update(&at(0.0, 1.0, 0.0), &at(0.0, 1.5, 0.0), &DMat4::IDENTITY)
            .unwrap();
        assert!(held.abs_diff_eq(good, 1e-12));
    }

    #[test]
    fn test_degenerate_start_makes_gesture_inert() {
        let mut pinch = WorldPinch::default();
        let p = at(0.0, 1.0, 0.0);
        assert!(pinch.start_gesture(&p, &p).is_err());
        assert!(!pinch.has_valid_start());
        assert_eq!(
            pinch.update(&at(-0.5, 1.0, 0.0), &at(0.5, 1.0, 0.0), &DMat4::IDENTITY),
            Err(InteractionError::NoStartingPose)
        );
    }

    #[test]
    fn test_end_clears_start() {
        let mut pinch = WorldPinch::default();
        pinch
            .start_gesture(&at(-0.5, 1.0, 0.0), &at(0.5, 1.0, 0.0))
            .unwrap();
        pinch.end_gesture();
        assert!(!pinch.has_valid_start());
    }
}
