//! Error taxonomy of the interaction core.
//!
//! None of these escape [`InteractionStyle::process_tick`]: each is recovered
//! locally and logged, so a bad tick degrades to "nothing happens".
//!
//! [`InteractionStyle::process_tick`]: crate::style::InteractionStyle::process_tick

use crate::scene::{ObjectHandle, TransformHandle};

/// Why two controller poses could not be combined into a manipulation handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DegenerateGeometry {
    /// The inter-controller axis is nearly parallel to the average up vector.
    #[error("inter-controller axis is nearly parallel to the average up direction")]
    ParallelAxes,
    /// Both controller origins coincide, so there is no X axis and no scale.
    #[error("controller origins coincide")]
    CoincidentControllers,
    /// The two up vectors cancel out.
    #[error("controller up vectors cancel out")]
    NoUpDirection,
    /// A matrix that must be inverted is singular.
    #[error("matrix is not invertible")]
    SingularMatrix,
}

/// Errors raised inside the interaction core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InteractionError {
    /// Combined-pose geometry is degenerate this tick.
    #[error("degenerate controller geometry: {0}")]
    DegenerateGeometry(#[from] DegenerateGeometry),

    /// The outermost transform of a grabbed object is not rigid/linear.
    #[error("object `{object}` has a non-linear outermost transform")]
    NonLinearTransform {
        /// Display name of the grabbed object.
        object: String,
    },

    /// A weak object handle outlived its object.
    #[error("object handle {0:?} no longer refers to a live object")]
    StaleObject(ObjectHandle),

    /// A transform handle outlived its transform node.
    #[error("transform handle {0:?} no longer refers to a live transform")]
    StaleTransform(TransformHandle),

    /// A collaborator the core needs was not wired up.
    #[error("{0} is not available")]
    MissingCollaborator(&'static str),

    /// The current gesture has no valid starting combined pose.
    #[error("gesture has no valid starting pose")]
    NoStartingPose,
}
