//! JSON frame exporter.
//!
//! Writes sampled frames of every fiber so an external renderer or notebook
//! can replay a run.

use crate::world::SimWorld;

use fiberflow_core::{CarrierRole, FlowError, VisualAttributes};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Simulation time in seconds
    pub time_sec: f64,

    /// Cable glow opacity
    pub glow_opacity: f64,

    /// One entry per fiber
    pub fibers: Vec<FiberFrame>,
}

/// Carriers of one fiber in a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiberFrame {
    pub name: String,
    pub role: CarrierRole,
    pub carriers: Vec<CarrierSample>,
}

/// Render attributes of one carrier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierSample {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub visible: bool,
    pub scale: f64,
    pub opacity: f64,
    pub color: [u8; 3],
}

impl CarrierSample {
    pub fn new(index: usize, attrs: &VisualAttributes) -> Self {
        Self {
            index,
            x: attrs.position.x,
            y: attrs.position.y,
            z: attrs.position.z,
            visible: attrs.visible,
            scale: attrs.scale,
            opacity: attrs.opacity,
            color: attrs.color.to_u8(),
        }
    }
}

impl SimFrame {
    /// Captures the latest attributes of every fiber in `world`.
    pub fn capture(world: &SimWorld) -> Self {
        let fibers = world
            .fibers
            .iter()
            .map(|fiber| FiberFrame {
                name: fiber.name.clone(),
                role: fiber.role,
                carriers: fiber
                    .driver
                    .attributes()
                    .iter()
                    .enumerate()
                    .map(|(i, attrs)| CarrierSample::new(i, attrs))
                    .collect(),
            })
            .collect();

        Self {
            time_sec: world.time(),
            glow_opacity: world.glow(),
            fibers,
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Duration in seconds
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    /// Splice losses over the run
    pub total_drops: u64,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            frames: Vec::new(),
            passed: false,
            total_drops: 0,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, total_drops: u64) {
        self.passed = passed;
        self.total_drops = total_drops;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> Result<(), FlowError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::ScenarioId;
    use crate::scene::Scene;
    use crate::world::SimConfig;
    use fiberflow_core::SimulationParams;

    #[test]
    fn test_capture_and_serialize() {
        let params = SimulationParams {
            carrier_count: 6,
            ..Default::default()
        };
        let scene = Scene::for_scenario(ScenarioId::Splice, &params).unwrap();
        let mut world = SimWorld::new(SimConfig::default(), scene).unwrap();
        world.tick();

        let mut export = SimExport::new("splice", 42);
        export.add_frame(SimFrame::capture(&world));
        export.finalize(true, 0);

        assert_eq!(export.frames[0].fibers.len(), 3);
        assert_eq!(export.frames[0].fibers[0].carriers.len(), 6);
        assert_eq!(export.frames[0].fibers[1].carriers.len(), 3);

        let json = serde_json::to_string(&export).unwrap();
        let back: SimExport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.frames.len(), 1);
        assert_eq!(back.frames[0].fibers[2].role, CarrierRole::Branch);
        assert!(json.contains("\"branch_upper\""));
    }
}
