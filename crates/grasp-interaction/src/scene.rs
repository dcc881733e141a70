//! Collaborator seams: the scene graph that owns pickable objects and their
//! transform chains, and the render view that owns the physical-to-world
//! transform.
//!
//! The interaction core never owns scene objects. It holds weak
//! [`ObjectHandle`]s and asks the [`SceneGraph`] whether they are still alive
//! every time it dereferences one.

use crate::error::InteractionError;
use glam::{DMat4, DVec3};
use std::fmt;

/// Weak reference to a scene object: slot index plus the generation the slot
/// had when the handle was issued. A removed object bumps its slot's
/// generation, so old handles stop resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle {
    index: u32,
    generation: u32,
}

impl ObjectHandle {
    /// Build a handle from raw parts. Only scene implementations should need this.
    #[must_use]
    pub const fn from_raw(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation at issue time.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}v{}", self.index, self.generation)
    }
}

/// Weak reference to a transform node in the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransformHandle {
    index: u32,
    generation: u32,
}

impl TransformHandle {
    /// Build a handle from raw parts.
    #[must_use]
    pub const fn from_raw(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation at issue time.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

/// Result of a world-space pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickResult {
    /// The hit object.
    pub object: ObjectHandle,
    /// Whether the object currently accepts manipulation.
    pub selectable: bool,
}

/// Whether a transform node is a rigid/linear matrix the core may compose
/// into, or something it must leave alone (warps, deformers, etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    /// A plain 4x4 matrix.
    Linear,
    /// Anything else.
    NonLinear,
}

/// The transform at the top of an object's parent chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutermostTransform {
    /// The node itself.
    pub handle: TransformHandle,
    /// Linear or not.
    pub kind: TransformKind,
    /// Carries the interaction tag, i.e. the core created or adopted it.
    pub interaction_tagged: bool,
}

/// The scene graph the core manipulates objects in.
///
/// All positions are world-space. Methods that mutate return
/// [`InteractionError::StaleObject`] / [`InteractionError::StaleTransform`]
/// when handed a handle that no longer resolves.
pub trait SceneGraph {
    /// Pick the object under `world_point`, if any.
    fn pick_object_at(&self, world_point: DVec3) -> Option<PickResult>;

    /// `None` when the object is gone, otherwise its current selectability.
    fn is_selectable(&self, object: ObjectHandle) -> Option<bool>;

    /// Display name, used to name interaction transforms.
    fn object_name(&self, object: ObjectHandle) -> Option<String>;

    /// The top of the object's parent transform chain. `None` when the object
    /// has no parent transform (or is gone).
    fn outermost_transform(&self, object: ObjectHandle) -> Option<OutermostTransform>;

    /// Create a new identity linear transform node.
    fn create_linear_transform(&mut self, name: &str) -> TransformHandle;

    /// Make `transform` the new top of the object's parent chain.
    fn set_outermost_transform(
        &mut self,
        object: ObjectHandle,
        transform: TransformHandle,
    ) -> Result<(), InteractionError>;

    /// Mark a transform as owned by the interaction core.
    fn tag_interaction_transform(&mut self, transform: TransformHandle)
    -> Result<(), InteractionError>;

    /// Left-multiply `incremental` into the transform's matrix.
    fn concatenate(
        &mut self,
        transform: TransformHandle,
        incremental: &DMat4,
    ) -> Result<(), InteractionError>;
}

/// The rendering surface: owner of the physical-to-world transform.
pub trait RenderView {
    /// Current physical-to-world transform. `None` when there is no camera rig.
    fn physical_to_world(&self) -> Option<DMat4>;

    /// Replace the physical-to-world transform.
    fn set_physical_to_world(&mut self, physical_to_world: DMat4);

    /// Centre of the visible scene bounds in world space, if anything is visible.
    fn visible_bounds_center(&self) -> Option<DVec3>;

    /// Ask for a redraw.
    fn request_render(&mut self);
}
