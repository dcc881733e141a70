//! Single-controller world navigation: dolly flight and magnification.

use glam::{DMat4, DVec3};

/// Relative magnification changes smaller than this are ignored.
pub const MAGNIFICATION_EPSILON: f64 = 0.001;

/// Smallest magnification a caller can ask for.
pub const MIN_MAGNIFICATION: f64 = 0.01;

/// Largest magnification a caller can ask for.
pub const MAX_MAGNIFICATION: f64 = 100.0;

/// Pull a requested magnification into `[MIN_MAGNIFICATION, MAX_MAGNIFICATION]`.
#[must_use]
pub fn clamp_magnification(target: f64) -> f64 {
    target.clamp(MIN_MAGNIFICATION, MAX_MAGNIFICATION)
}

/// World units per physical metre encoded in `physical_to_world`.
#[must_use]
pub fn physical_scale(physical_to_world: &DMat4) -> f64 {
    physical_to_world.x_axis.truncate().length()
}

/// Magnification: `world_units_per_meter / physical_scale`. At 1.0 one
/// physical metre spans one real-world metre of scene.
#[must_use]
pub fn magnification(physical_to_world: &DMat4, world_units_per_meter: f64) -> Option<f64> {
    let scale = physical_scale(physical_to_world);
    (scale > f64::EPSILON).then(|| world_units_per_meter / scale)
}

/// Rescale `physical_to_world` about the world-space `focus` so that the
/// magnification becomes `target`. `None` when the change is negligible or
/// the inputs are unusable.
#[must_use]
pub fn magnify(
    physical_to_world: &DMat4,
    focus: DVec3,
    target: f64,
    world_units_per_meter: f64,
) -> Option<DMat4> {
    if !(target.is_finite() && target > 0.0) {
        return None;
    }
    let current = physical_scale(physical_to_world);
    if current <= f64::EPSILON {
        return None;
    }
    let factor = (world_units_per_meter / target) / current;
    if (factor - 1.0).abs() < MAGNIFICATION_EPSILON {
        return None;
    }
    Some(
        DMat4::from_translation(focus)
            * DMat4::from_scale(DVec3::splat(factor))
            * DMat4::from_translation(-focus)
            * *physical_to_world,
    )
}

/// Fly `distance_m` physical metres along the controller's pointing
/// direction (its local −Z). Composing in physical space means the step
/// covers `distance_m × physical_scale` world units.
#[must_use]
pub fn dolly(physical_to_world: &DMat4, controller_pose: &DMat4, distance_m: f64) -> Option<DMat4> {
    let forward = (-controller_pose.z_axis.truncate()).try_normalize()?;
    Some(*physical_to_world * DMat4::from_translation(forward * distance_m))
}
