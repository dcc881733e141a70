//! Two-controller VR interaction core: object grab, two-handed world pinch,
//! dolly and magnification, driven once per tick by device events.
//!
//! The core is engine-agnostic. It talks to the host through two traits,
//! [`SceneGraph`] for pickable objects and their transform chains and
//! [`RenderView`] for the physical-to-world transform, and ships in-memory
//! implementations of both in [`memory`].

pub mod combined_pose;
pub mod error;
pub mod event;
pub mod gesture;
pub mod memory;
pub mod navigation;
pub mod object_manipulation;
pub mod pose_store;
pub mod scene;
pub mod style;
pub mod world_pinch;

pub use combined_pose::{CombinedPose, combine, invert_checked};
pub use error::{DegenerateGeometry, InteractionError};
pub use event::InteractionEvent;
pub use gesture::{GestureEdge, GestureRecognizer, GestureState};
pub use memory::{MemoryScene, MemoryView};
pub use object_manipulation::{GrabStart, ObjectManipulator};
pub use pose_store::{PoseStore, WorldPose};
pub use scene::{
    ObjectHandle, OutermostTransform, PickResult, RenderView, SceneGraph, TransformHandle,
    TransformKind,
};
pub use style::{InteractionState, InteractionStyle, NavigationSettings, TickReport};
pub use world_pinch::WorldPinch;
