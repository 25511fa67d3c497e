//! Scene assembly: which fibers exist, where they run, and where the splice sits.

use crate::curve::CatmullRomPath;
use crate::scenarios::ScenarioId;

use fiberflow_core::{
    CarrierRole, DropPolicy, FlowError, FrameToggles, PathAdapter, SimulationParams,
};
use std::sync::Arc;

/// Control points of the standalone cable.
const CABLE_POINTS: [[f64; 3]; 6] = [
    [-5.0, 0.0, 0.0],
    [-3.0, 2.0, -1.0],
    [-1.0, 1.0, -2.0],
    [1.0, -1.0, -1.0],
    [3.0, 0.0, 1.0],
    [5.0, 2.0, 0.0],
];

/// Incoming fiber, ending inside the splice enclosure at the origin.
const TRUNK_POINTS: [[f64; 3]; 5] = [
    [-5.0, 0.8, 0.0],
    [-3.5, 1.6, -0.6],
    [-1.8, 0.4, -0.2],
    [-0.6, 0.0, 0.0],
    [0.2, 0.0, 0.0],
];

/// Outgoing fibers, starting inside the enclosure.
const UPPER_BRANCH_POINTS: [[f64; 3]; 5] = [
    [-0.2, 0.05, 0.0],
    [0.6, 0.2, 0.1],
    [2.0, 1.0, 0.6],
    [3.6, 1.8, 0.3],
    [5.0, 2.2, 0.0],
];

const LOWER_BRANCH_POINTS: [[f64; 3]; 5] = [
    [-0.2, -0.05, 0.0],
    [0.6, -0.2, -0.1],
    [2.0, -1.0, -0.6],
    [3.6, -1.6, -0.2],
    [5.0, -2.0, 0.0],
];

/// Base glow opacity of the cable jacket.
const GLOW_BASE: f64 = 0.3;

/// Swing of the glow pulse.
const GLOW_SWING: f64 = 0.1;

/// Opacity of the cable's inner glow at time `elapsed`.
pub fn glow_opacity(elapsed: f64) -> f64 {
    GLOW_BASE + (elapsed * 2.0).sin() * GLOW_SWING
}

/// One fiber in a scene.
#[derive(Debug, Clone)]
pub struct FiberSpec {
    pub name: String,
    pub role: CarrierRole,
    pub path: Arc<CatmullRomPath>,
    pub carrier_count: usize,
}

/// Everything needed to start a run.
#[derive(Debug, Clone)]
pub struct Scene {
    pub fibers: Vec<FiberSpec>,
    pub params: SimulationParams,
    pub toggles: FrameToggles,
}

impl Scene {
    /// Builds the scene for a scenario on top of `base` parameters.
    pub fn for_scenario(scenario: ScenarioId, base: &SimulationParams) -> Result<Self, FlowError> {
        let mut scene = match scenario {
            ScenarioId::SingleFiber => Self::single_fiber(base)?,
            _ => Self::splice(base)?,
        };

        match scenario {
            ScenarioId::NoisySplice => scene.toggles.noise_enabled = true,
            ScenarioId::Rainbow => scene.toggles.colorful_mode = true,
            ScenarioId::LossySplice => scene.params.drop_probability_per_frame = 0.05,
            ScenarioId::PassLoss => {
                scene.params.drop_policy = DropPolicy::PerPass;
                scene.params.drop_probability_per_frame = 0.5;
            }
            ScenarioId::SingleFiber | ScenarioId::Splice => {}
        }

        scene.params.validate()?;
        Ok(scene)
    }

    /// One cable with the junction at its arc-length midpoint.
    pub fn single_fiber(base: &SimulationParams) -> Result<Self, FlowError> {
        let path = Arc::new(CatmullRomPath::from_points(&CABLE_POINTS)?);
        let mid = path.point_at(0.5);

        let params = SimulationParams {
            junction_center: [mid.x, mid.y, mid.z],
            ..base.clone()
        };

        Ok(Self {
            fibers: vec![FiberSpec {
                name: "cable".to_string(),
                role: CarrierRole::Trunk,
                path,
                carrier_count: base.carrier_count,
            }],
            params,
            toggles: FrameToggles::default(),
        })
    }

    /// A trunk merging into a splice enclosure with two branches leaving it.
    ///
    /// Each branch carries half the trunk population (at least one carrier).
    pub fn splice(base: &SimulationParams) -> Result<Self, FlowError> {
        let branch_count = (base.carrier_count / 2).max(1);

        let params = SimulationParams {
            junction_center: [0.0, 0.0, 0.0],
            ..base.clone()
        };

        let fibers = vec![
            FiberSpec {
                name: "trunk".to_string(),
                role: CarrierRole::Trunk,
                path: Arc::new(CatmullRomPath::from_points(&TRUNK_POINTS)?),
                carrier_count: base.carrier_count,
            },
            FiberSpec {
                name: "branch_upper".to_string(),
                role: CarrierRole::Branch,
                path: Arc::new(CatmullRomPath::from_points(&UPPER_BRANCH_POINTS)?),
                carrier_count: branch_count,
            },
            FiberSpec {
                name: "branch_lower".to_string(),
                role: CarrierRole::Branch,
                path: Arc::new(CatmullRomPath::from_points(&LOWER_BRANCH_POINTS)?),
                carrier_count: branch_count,
            },
        ];

        Ok(Self {
            fibers,
            params,
            toggles: FrameToggles::default(),
        })
    }

    /// Total carriers across all fibers.
    pub fn total_carriers(&self) -> usize {
        self.fibers.iter().map(|f| f.carrier_count).sum()
    }
}
