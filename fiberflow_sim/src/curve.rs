//! Fiber curves for scene assembly.
//!
//! A uniform Catmull-Rom spline through control points, reparameterized by
//! arc length so carriers with equal speed cover equal distance per second.

use fiberflow_core::{FlowError, PathAdapter};
use nalgebra::Vector3;

/// Samples used to build the arc-length lookup table.
const ARC_DIVISIONS: usize = 200;

/// Catmull-Rom spline through `points`, evaluated at constant speed.
#[derive(Debug, Clone)]
pub struct CatmullRomPath {
    points: Vec<Vector3<f64>>,

    /// Cumulative length at each of `ARC_DIVISIONS + 1` raw parameters
    arc_lengths: Vec<f64>,
}

impl CatmullRomPath {
    /// Builds a spline through at least two control points.
    pub fn new(points: Vec<Vector3<f64>>) -> Result<Self, FlowError> {
        if points.len() < 2 {
            return Err(FlowError::invalid(
                "control_points",
                points.len() as f64,
                "a curve needs at least two control points",
            ));
        }

        let mut path = Self {
            points,
            arc_lengths: Vec::with_capacity(ARC_DIVISIONS + 1),
        };
        path.build_arc_table();
        Ok(path)
    }

    /// Builds a spline from `[x, y, z]` triples.
    pub fn from_points(points: &[[f64; 3]]) -> Result<Self, FlowError> {
        Self::new(points.iter().map(|p| Vector3::from(*p)).collect())
    }

    /// Total curve length.
    pub fn length(&self) -> f64 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    pub fn control_points(&self) -> &[Vector3<f64>] {
        &self.points
    }

    fn build_arc_table(&mut self) {
        let mut total = 0.0;
        let mut prev = self.raw_point(0.0);
        self.arc_lengths.push(0.0);

        for i in 1..=ARC_DIVISIONS {
            let p = self.raw_point(i as f64 / ARC_DIVISIONS as f64);
            total += (p - prev).norm();
            self.arc_lengths.push(total);
            prev = p;
        }
    }

    /// Control point `i`, mirroring the ends for the missing neighbors.
    fn control(&self, i: isize) -> Vector3<f64> {
        let n = self.points.len() as isize;
        if i < 0 {
            self.points[0] * 2.0 - self.points[1]
        } else if i >= n {
            self.points[(n - 1) as usize] * 2.0 - self.points[(n - 2) as usize]
        } else {
            self.points[i as usize]
        }
    }

    /// Point at uniform spline parameter `s ∈ [0,1]`.
    fn raw_point(&self, s: f64) -> Vector3<f64> {
        let segments = self.points.len() - 1;
        let scaled = s.clamp(0.0, 1.0) * segments as f64;
        let seg = (scaled.floor() as usize).min(segments - 1);
        let u = scaled - seg as f64;

        let i = seg as isize;
        let p0 = self.control(i - 1);
        let p1 = self.control(i);
        let p2 = self.control(i + 1);
        let p3 = self.control(i + 2);

        let u2 = u * u;
        let u3 = u2 * u;
        (p1 * 2.0
            + (p2 - p0) * u
            + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * u2
            + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * u3)
            * 0.5
    }

    /// Maps an arc-length fraction to the uniform spline parameter.
    fn arc_to_raw(&self, t: f64) -> f64 {
        let total = self.length();
        if total <= 0.0 {
            return t;
        }

        let target = t * total;
        let idx = self.arc_lengths.partition_point(|&len| len < target);
        if idx == 0 {
            return 0.0;
        }
        if idx > ARC_DIVISIONS {
            return 1.0;
        }

        let before = self.arc_lengths[idx - 1];
        let after = self.arc_lengths[idx];
        let seg_len = after - before;
        let frac = if seg_len > 0.0 {
            (target - before) / seg_len
        } else {
            0.0
        };

        ((idx - 1) as f64 + frac) / ARC_DIVISIONS as f64
    }
}

impl PathAdapter for CatmullRomPath {
    fn point_at(&self, t: f64) -> Vector3<f64> {
        self.raw_point(self.arc_to_raw(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn demo_curve() -> CatmullRomPath {
        CatmullRomPath::from_points(&[
            [-5.0, 0.0, 0.0],
            [-3.0, 2.0, -1.0],
            [-1.0, 1.0, -2.0],
            [1.0, -1.0, -1.0],
            [3.0, 0.0, 1.0],
            [5.0, 2.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_passes_through_endpoints() {
        let curve = demo_curve();
        let start = curve.point_at(0.0);
        let end = curve.point_at(1.0);

        assert_relative_eq!(start.x, -5.0, epsilon = 1e-9);
        assert_relative_eq!(end.x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(end.y, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_passes_through_interior_points() {
        let curve = demo_curve();
        // Segment boundaries in uniform parameterization
        let p = curve.raw_point(2.0 / 5.0);
        assert_relative_eq!(p.x, -1.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-9);
        assert_relative_eq!(p.z, -2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_straight_line_is_linear() {
        let curve = CatmullRomPath::from_points(&[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0]]).unwrap();

        assert_relative_eq!(curve.length(), 4.0, epsilon = 1e-9);
        assert_relative_eq!(curve.point_at(0.25).x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(curve.point_at(0.5).x, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_constant_speed() {
        let curve = demo_curve();
        let steps = 50;
        let expected = curve.length() / steps as f64;

        for i in 0..steps {
            let a = curve.point_at(i as f64 / steps as f64);
            let b = curve.point_at((i + 1) as f64 / steps as f64);
            let d = (b - a).norm();
            // Chords are slightly shorter than arcs; allow a small margin
            assert!(
                (d - expected).abs() < expected * 0.05,
                "step {} chord {} vs {}",
                i,
                d,
                expected
            );
        }
    }

    #[test]
    fn test_too_few_points_rejected() {
        assert!(CatmullRomPath::from_points(&[[0.0, 0.0, 0.0]]).is_err());
    }

    proptest! {
        #[test]
        fn test_arc_mapping_is_monotone(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let curve = demo_curve();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let s_lo = curve.arc_to_raw(lo);
            let s_hi = curve.arc_to_raw(hi);
            prop_assert!(s_lo <= s_hi + 1e-12);
            prop_assert!((0.0..=1.0).contains(&s_lo));
            prop_assert!(curve.point_at(hi).iter().all(|v| v.is_finite()));
        }
    }
}
