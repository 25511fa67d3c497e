//! Junction enclosure test.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Axis-aligned box hiding the splice point.
///
/// A point is inside only when it is strictly within the half-extent on all
/// three axes. Points exactly on a face are outside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OcclusionVolume {
    /// Box center in world coordinates
    pub center: Vector3<f64>,

    /// Half size along x, y and z
    pub half_extents: Vector3<f64>,
}

impl OcclusionVolume {
    /// Default junction half-extents.
    pub const DEFAULT_HALF_EXTENTS: [f64; 3] = [0.5, 0.35, 0.3];

    /// Creates a box from its center and half-extents.
    pub fn new(center: Vector3<f64>, half_extents: Vector3<f64>) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Returns true if `point` lies strictly inside the box.
    pub fn contains(&self, point: &Vector3<f64>) -> bool {
        let rel = point - self.center;
        rel.x.abs() < self.half_extents.x
            && rel.y.abs() < self.half_extents.y
            && rel.z.abs() < self.half_extents.z
    }
}

impl Default for OcclusionVolume {
    fn default() -> Self {
        let [x, y, z] = Self::DEFAULT_HALF_EXTENTS;
        Self::new(Vector3::zeros(), Vector3::new(x, y, z))
    }
}
