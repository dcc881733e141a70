//! Two-controller combined pose: a single virtual handle whose origin sits
//! between the hands, whose X axis runs from A to B, and whose uniform scale
//! is the hand separation. Dividing two such handles yields a similarity
//! transform (rotation, translation, uniform scale) for world pinch.

use crate::error::DegenerateGeometry;
use glam::{DMat4, DVec3, DVec4};

/// Default cut-off on `|X · Y'|` above which the frame is rejected.
pub const PARALLEL_AXIS_THRESHOLD: f64 = 0.99;

/// Separations and summed up vectors shorter than this count as zero.
pub const MIN_LENGTH: f64 = 1e-9;

/// Matrices whose determinant magnitude falls below this are not inverted.
pub const MIN_DETERMINANT: f64 = 1e-12;

/// Orthonormal frame plus uniform scale built from two controller poses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombinedPose {
    /// Midpoint of the two controller origins.
    pub position: DVec3,
    /// Distance between the controller origins.
    pub scale: f64,
    /// Unit vector from A towards B.
    pub x_axis: DVec3,
    /// Re-orthogonalised average up direction.
    pub y_axis: DVec3,
    /// `x_axis × y_axis`.
    pub z_axis: DVec3,
}

impl CombinedPose {
    /// Columns are the axes scaled by [`Self::scale`], translation is the midpoint.
    #[must_use]
    pub fn to_mat4(&self) -> DMat4 {
        DMat4::from_cols(
            (self.x_axis * self.scale).extend(0.0),
            (self.y_axis * self.scale).extend(0.0),
            (self.z_axis * self.scale).extend(0.0),
            DVec4::from((self.position, 1.0)),
        )
    }
}

/// [`combine_with_threshold`] at [`PARALLEL_AXIS_THRESHOLD`].
pub fn combine(a: &DMat4, b: &DMat4) -> Result<CombinedPose, DegenerateGeometry> {
    combine_with_threshold(a, b, PARALLEL_AXIS_THRESHOLD)
}

/// Combine two controller poses (same frame, physical in practice).
///
/// The up direction of each controller is its local Y axis, i.e. matrix
/// column 1.
pub fn combine_with_threshold(
    a: &DMat4,
    b: &DMat4,
    parallel_threshold: f64,
) -> Result<CombinedPose, DegenerateGeometry> {
    let pa = a.w_axis.truncate();
    let pb = b.w_axis.truncate();

    let separation = pb - pa;
    let scale = separation.length();
    if scale < MIN_LENGTH {
        return Err(DegenerateGeometry::CoincidentControllers);
    }
    let x_axis = separation / scale;

    let up_sum = a.y_axis.truncate().normalize_or_zero() + b.y_axis.truncate().normalize_or_zero();
    let up_len = up_sum.length();
    if up_len < MIN_LENGTH {
        return Err(DegenerateGeometry::NoUpDirection);
    }
    let up = up_sum / up_len;

    if x_axis.dot(up).abs() > parallel_threshold {
        return Err(DegenerateGeometry::ParallelAxes);
    }

    let z_axis = x_axis.cross(up).normalize();
    let y_axis = z_axis.cross(x_axis).normalize();

    Ok(CombinedPose {
        position: (pa + pb) * 0.5,
        scale,
        x_axis,
        y_axis,
        z_axis,
    })
}

/// Invert `m`, refusing (near-)singular matrices.
pub fn invert_checked(m: &DMat4) -> Result<DMat4, DegenerateGeometry> {
    let det = m.determinant();
    if !det.is_finite() || det.abs() < MIN_DETERMINANT {
        return Err(DegenerateGeometry::SingularMatrix);
    }
    Ok(m.inverse())
}
