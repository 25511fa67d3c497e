//! Path adapter contract.
//!
//! A path maps a normalized parameter `t ∈ [0,1]` to a point on a fiber
//! curve. Curve construction lives outside this crate; the core only ever
//! evaluates points, and always with `t` already clamped into the domain.

use nalgebra::Vector3;

/// A parametric fiber curve.
///
/// Implementations must be pure: the same `t` always yields the same point.
/// Callers guarantee `0.0 <= t <= 1.0`.
pub trait PathAdapter {
    /// Returns the point at normalized parameter `t`.
    fn point_at(&self, t: f64) -> Vector3<f64>;
}

impl<P: PathAdapter + ?Sized> PathAdapter for &P {
    fn point_at(&self, t: f64) -> Vector3<f64> {
        (**self).point_at(t)
    }
}

impl<P: PathAdapter + ?Sized> PathAdapter for std::sync::Arc<P> {
    fn point_at(&self, t: f64) -> Vector3<f64> {
        (**self).point_at(t)
    }
}

impl<P: PathAdapter + ?Sized> PathAdapter for Box<P> {
    fn point_at(&self, t: f64) -> Vector3<f64> {
        (**self).point_at(t)
    }
}

/// Evaluates `path` after clamping `t` into `[0,1]`.
///
/// This is the only way the lifecycle engine queries a path.
pub fn sample_clamped<P: PathAdapter + ?Sized>(path: &P, t: f64) -> Vector3<f64> {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    path.point_at(t)
}

/// Straight segment from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearPath {
    pub start: Vector3<f64>,
    pub end: Vector3<f64>,
}

impl LinearPath {
    /// Creates a segment between two points.
    pub fn new(start: Vector3<f64>, end: Vector3<f64>) -> Self {
        Self { start, end }
    }

    /// The unit segment along x: `point_at(t) = (t, 0, 0)`.
    pub fn unit_x() -> Self {
        Self::new(Vector3::zeros(), Vector3::x())
    }
}

impl PathAdapter for LinearPath {
    fn point_at(&self, t: f64) -> Vector3<f64> {
        self.start + (self.end - self.start) * t
    }
}
