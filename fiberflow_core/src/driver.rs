//! Simulation driver: one carrier population bound to one path.

use crate::carrier::{Carrier, CarrierRole, LifecycleState};
use crate::config::{FrameToggles, SimulationParams};
use crate::error::FlowError;
use crate::lifecycle::{Frame, LifecycleEngine, VisualAttributes};
use crate::occlusion::OcclusionVolume;
use crate::path::PathAdapter;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Counters accumulated across steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Steps taken, including zero-delta ones
    pub frames: u64,

    /// Carriers lost at the splice
    pub drops: u64,

    /// Dropped carriers returned to the path start
    pub respawns: u64,
}

/// Owns a fixed population of carriers on one path.
///
/// Carriers are stepped in index order and the attribute buffer keeps that
/// order, so index `i` always refers to the same carrier.
pub struct SimulationDriver<P> {
    path: P,
    junction: OcclusionVolume,
    engine: LifecycleEngine,
    carriers: Vec<Carrier>,
    attributes: Vec<VisualAttributes>,
    rng: ChaCha8Rng,
    stats: DriverStats,
}

impl<P: PathAdapter> SimulationDriver<P> {
    /// Creates a driver with `params.carrier_count` carriers.
    ///
    /// Fails on a zero count or any out-of-range parameter.
    pub fn new(
        path: P,
        role: CarrierRole,
        params: &SimulationParams,
        seed: u64,
    ) -> Result<Self, FlowError> {
        Self::with_junction(path, role, params, params.junction(), seed)
    }

    /// Creates a driver whose junction differs from the one in `params`.
    pub fn with_junction(
        path: P,
        role: CarrierRole,
        params: &SimulationParams,
        junction: OcclusionVolume,
        seed: u64,
    ) -> Result<Self, FlowError> {
        params.validate()?;

        let count = params.carrier_count;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let carriers: Vec<Carrier> = (0..count)
            .map(|i| Carrier::spawn(i, count, role, params, &mut rng))
            .collect();

        let noisy = carriers.iter().filter(|c| c.noise.enabled).count();
        debug!(
            "driver created: {} {:?} carriers, {} noise-reactive, seed={}",
            count, role, noisy, seed
        );

        Ok(Self {
            path,
            junction,
            engine: LifecycleEngine::from_params(params),
            attributes: Vec::with_capacity(count),
            carriers,
            rng,
            stats: DriverStats::default(),
        })
    }

    /// Advances every carrier by `delta` seconds and returns their attributes.
    pub fn step(&mut self, delta: f64, elapsed: f64, toggles: FrameToggles) -> &[VisualAttributes] {
        let frame = Frame::new(delta, elapsed, toggles);

        self.attributes.clear();
        for carrier in self.carriers.iter_mut() {
            let was_dropped = carrier.state == LifecycleState::Dropped;
            let attrs = self
                .engine
                .advance(carrier, &frame, &self.path, &self.junction, &mut self.rng);
            let is_dropped = carrier.state == LifecycleState::Dropped;

            match (was_dropped, is_dropped) {
                (false, true) => self.stats.drops += 1,
                (true, false) => self.stats.respawns += 1,
                _ => {}
            }
            self.attributes.push(attrs);
        }

        self.stats.frames += 1;
        &self.attributes
    }

    /// Attributes from the most recent step.
    pub fn attributes(&self) -> &[VisualAttributes] {
        &self.attributes
    }

    /// The carrier population in index order.
    pub fn carriers(&self) -> &[Carrier] {
        &self.carriers
    }

    /// Number of carriers; constant for the driver's lifetime.
    pub fn len(&self) -> usize {
        self.carriers.len()
    }

    /// Always false: drivers refuse empty populations.
    pub fn is_empty(&self) -> bool {
        self.carriers.is_empty()
    }

    pub fn path(&self) -> &P {
        &self.path
    }

    pub fn junction(&self) -> &OcclusionVolume {
        &self.junction
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    /// Carriers currently scattering after a drop.
    pub fn dropped_count(&self) -> usize {
        self.carriers
            .iter()
            .filter(|c| c.state == LifecycleState::Dropped)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::LinearPath;
    use nalgebra::Vector3;

    fn params(count: usize) -> SimulationParams {
        SimulationParams {
            carrier_count: count,
            ..Default::default()
        }
    }

    fn trunk_driver(p: &SimulationParams, seed: u64) -> SimulationDriver<LinearPath> {
        SimulationDriver::new(LinearPath::unit_x(), CarrierRole::Trunk, p, seed).unwrap()
    }

    #[test]
    fn test_zero_count_fails_fast() {
        let result = SimulationDriver::new(LinearPath::unit_x(), CarrierRole::Trunk, &params(0), 1);
        assert!(matches!(result, Err(FlowError::EmptyPopulation)));
    }

    #[test]
    fn test_invalid_params_fail_fast() {
        let bad = SimulationParams {
            fade_duration_secs: 0.0,
            ..params(10)
        };
        let result = SimulationDriver::new(LinearPath::unit_x(), CarrierRole::Trunk, &bad, 1);
        assert!(matches!(result, Err(FlowError::InvalidParameter { .. })));
    }

    #[test]
    fn test_step_returns_one_record_per_carrier() {
        let mut driver = trunk_driver(&params(25), 1);

        for i in 1..=50 {
            let attrs = driver.step(1.0 / 60.0, i as f64 / 60.0, FrameToggles::default());
            assert_eq!(attrs.len(), 25);
        }
        assert_eq!(driver.len(), 25);
        assert_eq!(driver.stats().frames, 50);
    }

    #[test]
    fn test_colors_stable_across_steps() {
        let mut driver = trunk_driver(&params(30), 5);
        let toggles = FrameToggles {
            colorful_mode: true,
            ..Default::default()
        };

        let first: Vec<_> = driver.step(0.01, 0.01, toggles).iter().map(|a| a.color).collect();
        for i in 2..200 {
            let colors: Vec<_> = driver
                .step(0.01, i as f64 * 0.01, toggles)
                .iter()
                .map(|a| a.color)
                .collect();
            assert_eq!(colors, first);
        }
    }

    #[test]
    fn test_zero_delta_leaves_state_untouched() {
        let mut driver = trunk_driver(&params(40), 9);
        for i in 1..=30 {
            driver.step(0.05, i as f64 * 0.05, FrameToggles::default());
        }

        let before: Vec<_> = driver
            .carriers()
            .iter()
            .map(|c| (c.path_param, c.state, c.scatter_position))
            .collect();
        driver.step(0.0, 5.0, FrameToggles::default());
        let after: Vec<_> = driver
            .carriers()
            .iter()
            .map(|c| (c.path_param, c.state, c.scatter_position))
            .collect();

        assert_eq!(before, after);
    }

    #[test]
    fn test_same_seed_same_stream() {
        let p = SimulationParams {
            drop_probability_per_frame: 0.2,
            ..params(20)
        };
        let mut a = trunk_driver(&p, 77);
        let mut b = trunk_driver(&p, 77);

        for i in 1..=300 {
            let t = i as f64 / 30.0;
            let toggles = FrameToggles {
                noise_enabled: i % 50 < 25,
                colorful_mode: false,
            };
            assert_eq!(a.step(1.0 / 30.0, t, toggles), b.step(1.0 / 30.0, t, toggles));
        }
        assert_eq!(a.stats(), b.stats());
    }

    #[test]
    fn test_drops_counted_and_recycled() {
        let p = SimulationParams {
            drop_probability_per_frame: 1.0,
            fade_duration_secs: 0.5,
            wobble_amplitude: 0.0,
            ..params(10)
        };
        let mut driver = trunk_driver(&p, 3);

        for i in 1..=600 {
            driver.step(0.02, i as f64 * 0.02, FrameToggles::default());
            assert_eq!(driver.len(), 10);
        }

        let stats = driver.stats();
        assert!(stats.drops > 0);
        assert!(stats.respawns > 0);
        assert!(stats.drops - stats.respawns <= 10);
        assert_eq!(stats.drops - stats.respawns, driver.dropped_count() as u64);
    }

    #[test]
    fn test_branch_population_never_drops() {
        let p = SimulationParams {
            drop_probability_per_frame: 1.0,
            ..params(15)
        };
        let mut driver =
            SimulationDriver::new(LinearPath::unit_x(), CarrierRole::Branch, &p, 3).unwrap();

        for i in 1..=600 {
            driver.step(0.02, i as f64 * 0.02, FrameToggles::default());
        }
        assert_eq!(driver.stats().drops, 0);
    }

    #[test]
    fn test_custom_junction() {
        let junction =
            OcclusionVolume::new(Vector3::new(5.0, 5.0, 5.0), Vector3::new(0.1, 0.1, 0.1));
        let driver = SimulationDriver::with_junction(
            LinearPath::unit_x(),
            CarrierRole::Trunk,
            &params(3),
            junction,
            1,
        )
        .unwrap();
        assert_eq!(driver.junction(), &junction);
        assert!(!driver.is_empty());
    }
}
