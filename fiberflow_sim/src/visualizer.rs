//! Rerun visualization for fiber runs.
//!
//! Visualization is optional and only available with the `visualization` feature.
//!
//! # What Gets Logged
//!
//! - Visible carriers of each fiber as colored points sized by their scale
//! - Opacity folded into the point color's alpha
//! - Drop and respawn counters as scalars

use fiberflow_core::VisualAttributes;
#[cfg(feature = "visualization")]
use rerun::{Color, Points3D, Position3D, Radius, RecordingStream};

/// Rerun logger for simulation visualization.
pub struct RerunLogger {
    #[cfg(feature = "visualization")]
    rec: Option<RecordingStream>,

    /// Whether visualization is enabled
    enabled: bool,
}

impl RerunLogger {
    /// Creates a new logger with visualization disabled.
    pub fn disabled() -> Self {
        Self {
            #[cfg(feature = "visualization")]
            rec: None,
            enabled: false,
        }
    }

    /// Creates a new logger with visualization enabled.
    #[cfg(feature = "visualization")]
    pub fn new(name: &str) -> Self {
        match rerun::RecordingStreamBuilder::new(name).spawn() {
            Ok(rec) => {
                tracing::info!("Rerun visualization enabled - open the viewer to watch fibers");
                Self {
                    rec: Some(rec),
                    enabled: true,
                }
            }
            Err(e) => {
                tracing::warn!("Failed to initialize Rerun: {:?}", e);
                Self {
                    rec: None,
                    enabled: false,
                }
            }
        }
    }

    /// Creates a logger - returns disabled if visualization feature not enabled.
    #[cfg(not(feature = "visualization"))]
    pub fn new(_name: &str) -> Self {
        tracing::info!("Rerun visualization not available (compile with --features visualization)");
        Self::disabled()
    }

    /// Returns whether visualization is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the simulation time for subsequent logs.
    #[cfg(feature = "visualization")]
    pub fn set_time(&self, seconds: f64) {
        if let Some(ref rec) = self.rec {
            rec.set_time_seconds("sim_time", seconds);
        }
    }

    #[cfg(not(feature = "visualization"))]
    pub fn set_time(&self, _seconds: f64) {}

    /// Logs the visible carriers of one fiber.
    #[cfg(feature = "visualization")]
    pub fn log_fiber(&self, name: &str, attrs: &[VisualAttributes]) {
        if let Some(ref rec) = self.rec {
            let visible: Vec<&VisualAttributes> = attrs.iter().filter(|a| a.visible).collect();

            let points: Vec<Position3D> = visible
                .iter()
                .map(|a| {
                    let p = a.position;
                    Position3D::new(p.x as f32, p.y as f32, p.z as f32)
                })
                .collect();
            let colors: Vec<Color> = visible
                .iter()
                .map(|a| {
                    let [r, g, b] = a.color.to_u8();
                    let alpha = (a.opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
                    Color::from_unmultiplied_rgba(r, g, b, alpha)
                })
                .collect();
            let radii: Vec<Radius> = visible
                .iter()
                .map(|a| Radius::new_scene_units(a.scale as f32))
                .collect();

            let _ = rec.log(
                format!("world/fibers/{}", name),
                &Points3D::new(points).with_colors(colors).with_radii(radii),
            );
        }
    }

    #[cfg(not(feature = "visualization"))]
    pub fn log_fiber(&self, _name: &str, _attrs: &[VisualAttributes]) {}

    /// Logs a cumulative counter (drops, respawns) as a scalar metric.
    #[cfg(feature = "visualization")]
    pub fn log_counter(&self, metric: &str, value: u64) {
        if let Some(ref rec) = self.rec {
            let _ = rec.log(
                format!("metrics/{}", metric),
                &rerun::Scalar::new(value as f64),
            );
        }
    }

    #[cfg(not(feature = "visualization"))]
    pub fn log_counter(&self, _metric: &str, _value: u64) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiberflow_core::Rgb;
    use nalgebra::Vector3;

    #[test]
    fn test_disabled_logger() {
        let logger = RerunLogger::disabled();
        assert!(!logger.is_enabled());

        // These should be no-ops
        logger.set_time(1.0);
        logger.log_fiber(
            "trunk",
            &[VisualAttributes {
                position: Vector3::zeros(),
                visible: true,
                scale: 0.1,
                opacity: 0.7,
                color: Rgb::new(1.0, 0.8, 0.2),
            }],
        );
        logger.log_counter("drops", 3);
        logger.log_counter("respawns", 2);
    }
}
