//! Single-controller grab: pick the object under a controller and carry it
//! rigidly with the hand.
//!
//! Each tick's hand motion becomes an incremental world-space transform that
//! is left-multiplied into one dedicated interaction transform at the top of
//! the object's parent chain. The chain never grows past that one node no
//! matter how long the grab lasts.

use crate::error::InteractionError;
use crate::pose_store::WorldPose;
use crate::scene::{ObjectHandle, SceneGraph, TransformHandle, TransformKind};
use glam::{DMat4, DQuat};
use grasp_input::Device;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

/// Suffix appended to an object's name for the transform the core creates.
pub const INTERACTION_TRANSFORM_SUFFIX: &str = "_VR_Interaction_Transform";

/// Incremental world transform carrying an object attached to a hand that
/// moved from `last` to `current`: rotate about the hand's current position
/// by the orientation delta, then translate by the position delta.
#[must_use]
pub fn incremental_transform(last: &WorldPose, current: &WorldPose) -> DMat4 {
    let translation = current.position - last.position;
    let delta: DQuat = (current.rotation * last.rotation.conjugate()).normalize();
    let pivot = current.position;
    DMat4::from_translation(pivot)
        * DMat4::from_quat(delta)
        * DMat4::from_translation(-pivot)
        * DMat4::from_translation(translation)
}

/// Outcome of trying to start a grab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabStart {
    /// A selectable object was picked and is now held.
    Picked(ObjectHandle),
    /// Nothing selectable under the controller, or grabbing is disabled.
    NothingPicked,
    /// Another controller already holds this object; the later grab loses.
    AlreadyHeld {
        /// The object in question.
        object: ObjectHandle,
        /// The device that holds it.
        holder: Device,
    },
}

#[derive(Debug, Clone, Copy)]
struct Grab {
    object: ObjectHandle,
    last_world: WorldPose,
}

/// Per-device grab sessions.
#[derive(Debug)]
pub struct ObjectManipulator {
    grabs: FxHashMap<Device, Grab>,
    grab_enabled: bool,
}

impl Default for ObjectManipulator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ObjectManipulator {
    /// Manipulator with grabbing switched on or off.
    #[must_use]
    pub fn new(grab_enabled: bool) -> Self {
        Self {
            grabs: FxHashMap::default(),
            grab_enabled,
        }
    }

    /// Whether picking is allowed.
    #[must_use]
    pub fn grab_enabled(&self) -> bool {
        self.grab_enabled
    }

    /// Switch picking on or off. Grabs in progress are left alone.
    pub fn set_grab_enabled(&mut self, enabled: bool) {
        self.grab_enabled = enabled;
    }

    /// The object `device` holds, if any.
    #[must_use]
    pub fn picked(&self, device: Device) -> Option<ObjectHandle> {
        self.grabs.get(&device).map(|g| g.object)
    }

    /// Which device holds `object`, if any.
    #[must_use]
    pub fn holder_of(&self, object: ObjectHandle) -> Option<Device> {
        self.grabs
            .iter()
            .find(|(_, g)| g.object == object)
            .map(|(d, _)| *d)
    }

    /// Whether any held object is still alive and selectable. World pinch
    /// yields to object manipulation while this holds.
    pub fn holds_selectable<S: SceneGraph + ?Sized>(&self, scene: &S) -> bool {
        self.grabs
            .values()
            .any(|g| scene.is_selectable(g.object) == Some(true))
    }

    /// Pick at the controller's world position and start a grab session.
    pub fn start<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &S,
        device: Device,
        pose: WorldPose,
    ) -> GrabStart {
        if !self.grab_enabled {
            return GrabStart::NothingPicked;
        }
        let Some(pick) = scene.pick_object_at(pose.position) else {
            return GrabStart::NothingPicked;
        };
        if !pick.selectable {
            debug!(%device, object = %pick.object, "picked object is not selectable");
            return GrabStart::NothingPicked;
        }
        if let Some(holder) = self.holder_of(pick.object)
            && holder != device
        {
            return GrabStart::AlreadyHeld {
                object: pick.object,
                holder,
            };
        }

        self.grabs.insert(
            device,
            Grab {
                object: pick.object,
                last_world: pose,
            },
        );
        GrabStart::Picked(pick.object)
    }

    /// Carry the held object with this tick's hand motion.
    ///
    /// Returns `Ok(false)` when there is nothing to move (no grab, or the
    /// object stopped being selectable). The hand's last pose advances even
    /// when the update is skipped so a later tick does not replay the motion.
    pub fn update<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &mut S,
        device: Device,
        pose: WorldPose,
    ) -> Result<bool, InteractionError> {
        let Some(grab) = self.grabs.get_mut(&device) else {
            return Ok(false);
        };
        let incremental = incremental_transform(&grab.last_world, &pose);
        grab.last_world = pose;
        let object = grab.object;

        match scene.is_selectable(object) {
            None => return Err(InteractionError::StaleObject(object)),
            Some(false) => return Ok(false),
            Some(true) => {}
        }

        let transform = interaction_transform(scene, object)?;
        scene.concatenate(transform, &incremental)?;
        Ok(true)
    }

    /// Release the held object, if any.
    pub fn end(&mut self, device: Device) -> Option<ObjectHandle> {
        self.grabs.remove(&device).map(|g| g.object)
    }

    /// Release every held object, in device order.
    pub fn end_all(&mut self) -> Vec<(Device, ObjectHandle)> {
        let mut released: Vec<(Device, ObjectHandle)> =
            self.grabs.drain().map(|(d, g)| (d, g.object)).collect();
        released.sort();
        released
    }
}

/// Find or create the single interaction transform at the top of `object`'s
/// parent chain.
fn interaction_transform<S: SceneGraph + ?Sized>(
    scene: &mut S,
    object: ObjectHandle,
) -> Result<TransformHandle, InteractionError> {
    match scene.outermost_transform(object) {
        None => {
            let name = format!("{}{INTERACTION_TRANSFORM_SUFFIX}", scene_name(scene, object));
            let transform = scene.create_linear_transform(&name);
            scene.tag_interaction_transform(transform)?;
            scene.set_outermost_transform(object, transform)?;
            debug!(%object, "created interaction transform");
            Ok(transform)
        }
        Some(top) if top.kind == TransformKind::NonLinear => {
            let object = scene_name(scene, object);
            warn!(%object, "outermost transform is non-linear, not moving object");
            Err(InteractionError::NonLinearTransform { object })
        }
        Some(top) if !top.interaction_tagged => {
            let name = scene_name(scene, object);
            info!(object = %name, "adopting existing linear transform for interaction");
            scene.tag_interaction_transform(top.handle)?;
            Ok(top.handle)
        }
        Some(top) => Ok(top.handle),
    }
}

fn scene_name<S: SceneGraph + ?Sized>(scene: &S, object: ObjectHandle) -> String {
    scene
        .object_name(object)
        .unwrap_or_else(|| object.to_string())
}
