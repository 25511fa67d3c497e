//! Per-carrier state record.

use crate::color::CarrierColors;
use crate::config::SimulationParams;
use crate::jitter::NoiseProfile;
use nalgebra::Vector3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Where a carrier is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Waiting out its start delay, not yet visible
    Pending,
    /// Moving along the path and visible
    Flowing,
    /// Inside the junction and hidden, still advancing
    Occluded,
    /// Lost at the splice, scattering and fading
    Dropped,
}

impl LifecycleState {
    /// True while the carrier moves along its path.
    pub fn is_on_path(self) -> bool {
        matches!(self, LifecycleState::Flowing | LifecycleState::Occluded)
    }
}

/// Which segment a carrier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarrierRole {
    /// Incoming segment, eligible for splice loss
    Trunk,
    /// Outgoing segment, never dropped, staggered start
    Branch,
}

/// One simulated photon.
///
/// Fields fixed at creation: `speed`, `phase_offset`, `size`, `role`,
/// `noise`, `colors`. Everything else is advanced by the lifecycle engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    /// Progress along the path in `[0,1]`
    pub path_param: f64,

    /// Path fraction per second
    pub speed: f64,

    /// Phase used by wobble and pulse
    pub phase_offset: f64,

    /// Base visual radius
    pub size: f64,

    /// Remaining time before the carrier becomes active
    pub start_delay: f64,

    pub state: LifecycleState,

    /// Time since the drop, only meaningful while dropped
    pub drop_clock: f64,

    /// Ballistic direction chosen at drop time
    pub scatter_direction: Option<Vector3<f64>>,

    /// Integrated position while dropped
    pub scatter_position: Vector3<f64>,

    /// Opacity multiplier, 1 until dropped, decays to 0 while scattering
    pub fade_alpha: f64,

    pub role: CarrierRole,

    pub noise: NoiseProfile,

    pub colors: CarrierColors,
}

impl Carrier {
    /// Creates carrier `index` of a population of `count` on a segment.
    ///
    /// Trunk carriers are strung evenly along the path with no delay.
    /// Branch carriers wait at the path start, their delays spread over
    /// `branch_stagger_secs`.
    pub fn spawn<R: Rng + ?Sized>(
        index: usize,
        count: usize,
        role: CarrierRole,
        params: &SimulationParams,
        rng: &mut R,
    ) -> Self {
        let fraction = index as f64 / count.max(1) as f64;
        let (path_param, start_delay) = match role {
            CarrierRole::Trunk => (fraction, 0.0),
            CarrierRole::Branch => (0.0, fraction * params.branch_stagger_secs),
        };

        let speed = params.base_speed + rng.gen::<f64>() * params.speed_variance;
        let phase_offset = rng.gen_range(0.0..TAU);
        let size = params.base_size + rng.gen::<f64>() * params.size_variance;
        let noise = NoiseProfile::sample(rng, params.noise_fraction);
        let colors = CarrierColors::sample(params.palette, rng);

        let state = if start_delay > 0.0 {
            LifecycleState::Pending
        } else {
            LifecycleState::Flowing
        };

        Self {
            path_param,
            speed,
            phase_offset,
            size,
            start_delay,
            state,
            drop_clock: 0.0,
            scatter_direction: None,
            scatter_position: Vector3::zeros(),
            fade_alpha: 1.0,
            role,
            noise,
            colors,
        }
    }

    /// True for branch carriers.
    pub fn is_branch(&self) -> bool {
        self.role == CarrierRole::Branch
    }

    /// Enters the dropped state at `position` heading along `direction`.
    pub(crate) fn begin_drop(&mut self, position: Vector3<f64>, direction: Vector3<f64>) {
        self.state = LifecycleState::Dropped;
        self.drop_clock = 0.0;
        self.scatter_direction = Some(direction);
        self.scatter_position = position;
        self.fade_alpha = 1.0;
    }

    /// Returns a faded-out carrier to the start of its path.
    pub(crate) fn respawn(&mut self) {
        self.state = LifecycleState::Flowing;
        self.path_param = 0.0;
        self.fade_alpha = 1.0;
        self.drop_clock = 0.0;
        self.scatter_direction = None;
        self.scatter_position = Vector3::zeros();
    }
}
