//! SimWorld - every fiber of a scene, stepped on one virtual clock.

use crate::context::SimContext;
use crate::curve::CatmullRomPath;
use crate::scene::{glow_opacity, Scene};

use fiberflow_core::{
    CarrierRole, FlowError, FrameToggles, PathAdapter, SimulationDriver, SimulationParams,
    VisualAttributes,
};
use nalgebra::Vector3;
use std::cell::Cell;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Tick rate in Hz
    pub tick_rate_hz: u32,

    /// Maximum simulation duration in seconds
    pub max_duration_secs: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_rate_hz: 60,
            max_duration_secs: 10.0,
        }
    }
}

/// Path wrapper that counts queries outside `[0,1]`.
#[derive(Debug)]
pub struct GuardedPath {
    inner: Arc<CatmullRomPath>,
    out_of_domain: Cell<u64>,
}

impl GuardedPath {
    pub fn new(inner: Arc<CatmullRomPath>) -> Self {
        Self {
            inner,
            out_of_domain: Cell::new(0),
        }
    }

    /// Queries seen with `t` outside `[0,1]`.
    pub fn violations(&self) -> u64 {
        self.out_of_domain.get()
    }

    pub fn curve(&self) -> &CatmullRomPath {
        &self.inner
    }
}

impl PathAdapter for GuardedPath {
    fn point_at(&self, t: f64) -> Vector3<f64> {
        if !(0.0..=1.0).contains(&t) {
            self.out_of_domain.set(self.out_of_domain.get() + 1);
        }
        self.inner.point_at(t)
    }
}

/// One fiber's population.
pub struct FiberRun {
    pub name: String,
    pub role: CarrierRole,
    pub driver: SimulationDriver<GuardedPath>,
}

/// The SimWorld - container for the entire simulation.
pub struct SimWorld {
    /// Configuration
    pub config: SimConfig,

    /// Virtual clock and seed source
    pub context: SimContext,

    /// Parameters the drivers were built from
    pub params: SimulationParams,

    /// Current global toggles
    pub toggles: FrameToggles,

    /// One entry per fiber, in scene order
    pub fibers: Vec<FiberRun>,

    /// Current tick count
    tick_count: u64,
}

impl SimWorld {
    /// Creates a world with one driver per fiber of `scene`.
    ///
    /// Fiber `i` draws from the stream seeded by `derive_seed(i)`.
    pub fn new(config: SimConfig, scene: Scene) -> Result<Self, FlowError> {
        if config.tick_rate_hz == 0 {
            return Err(FlowError::invalid(
                "tick_rate_hz",
                0.0,
                "tick rate must be at least 1 Hz",
            ));
        }
        if !(config.max_duration_secs.is_finite() && config.max_duration_secs >= 0.0) {
            return Err(FlowError::invalid(
                "max_duration_secs",
                config.max_duration_secs,
                "duration must be finite and non-negative",
            ));
        }

        let context = SimContext::new(config.seed);
        debug!(
            "world seed={} at {} Hz for {:.1}s",
            context.seed(),
            config.tick_rate_hz,
            config.max_duration_secs
        );

        let mut fibers = Vec::with_capacity(scene.fibers.len());
        for (i, fiber) in scene.fibers.into_iter().enumerate() {
            let params = SimulationParams {
                carrier_count: fiber.carrier_count,
                ..scene.params.clone()
            };
            let driver = SimulationDriver::new(
                GuardedPath::new(fiber.path),
                fiber.role,
                &params,
                context.derive_seed(i as u64),
            )?;

            debug!("fiber '{}' ready with {} carriers", fiber.name, driver.len());
            fibers.push(FiberRun {
                name: fiber.name,
                role: fiber.role,
                driver,
            });
        }

        Ok(Self {
            config,
            context,
            params: scene.params,
            toggles: scene.toggles,
            fibers,
            tick_count: 0,
        })
    }

    /// Seconds per tick.
    pub fn dt(&self) -> f64 {
        1.0 / self.config.tick_rate_hz as f64
    }

    /// Ticks needed to cover the configured duration.
    pub fn target_ticks(&self) -> u64 {
        (self.config.max_duration_secs * self.config.tick_rate_hz as f64) as u64
    }

    /// Advances simulation by one tick.
    pub fn tick(&mut self) {
        let dt = self.dt();

        // Advance virtual time
        self.context.advance_time(Duration::from_secs_f64(dt));
        let elapsed = self.context.elapsed_secs();

        for fiber in self.fibers.iter_mut() {
            fiber.driver.step(dt, elapsed, self.toggles);
        }

        self.tick_count += 1;
    }

    /// Re-evaluates attributes without moving any carrier.
    pub fn refresh(&mut self) {
        let elapsed = self.context.elapsed_secs();
        for fiber in self.fibers.iter_mut() {
            fiber.driver.step(0.0, elapsed, self.toggles);
        }
    }

    /// Changes the global toggles; takes effect on the next tick.
    pub fn set_toggles(&mut self, toggles: FrameToggles) {
        if toggles != self.toggles {
            debug!("toggles changed: {:?} -> {:?}", self.toggles, toggles);
        }
        self.toggles = toggles;
    }

    /// Latest attributes of every fiber, in scene order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &[VisualAttributes])> + '_ {
        self.fibers
            .iter()
            .map(|f| (f.name.as_str(), f.driver.attributes()))
    }

    /// Cable glow opacity at the current time.
    pub fn glow(&self) -> f64 {
        glow_opacity(self.time())
    }

    /// Returns the current simulation time in seconds.
    pub fn time(&self) -> f64 {
        self.context.elapsed_secs()
    }

    /// Returns the current tick count.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Total carriers across fibers; constant for the world's lifetime.
    pub fn carrier_count(&self) -> usize {
        self.fibers.iter().map(|f| f.driver.len()).sum()
    }

    /// Path queries outside `[0,1]` across all fibers.
    pub fn domain_violations(&self) -> u64 {
        let total: u64 = self.fibers.iter().map(|f| f.driver.path().violations()).sum();
        if total > 0 {
            warn!("{} path queries left the [0,1] domain", total);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::ScenarioId;
    use fiberflow_core::Rgb;

    fn world(seed: u64, scenario: ScenarioId) -> SimWorld {
        let scene = Scene::for_scenario(scenario, &SimulationParams::default()).unwrap();
        let config = SimConfig {
            seed,
            tick_rate_hz: 30,
            ..Default::default()
        };
        SimWorld::new(config, scene).unwrap()
    }

    #[test]
    fn test_sim_world_creation() {
        let world = world(42, ScenarioId::Splice);
        assert_eq!(world.fibers.len(), 3);
        assert_eq!(world.carrier_count(), 160);
    }

    #[test]
    fn test_zero_tick_rate_rejected() {
        let scene = Scene::for_scenario(ScenarioId::Splice, &SimulationParams::default()).unwrap();
        let config = SimConfig {
            tick_rate_hz: 0,
            ..Default::default()
        };
        let result = SimWorld::new(config, scene);
        assert!(matches!(
            result,
            Err(FlowError::InvalidParameter { name, .. }) if name == "tick_rate_hz"
        ));
    }

    #[test]
    fn test_target_ticks_cover_duration() {
        let scene = Scene::for_scenario(ScenarioId::Splice, &SimulationParams::default()).unwrap();
        let config = SimConfig {
            tick_rate_hz: 30,
            max_duration_secs: 2.0,
            ..Default::default()
        };
        let world = SimWorld::new(config, scene).unwrap();
        assert_eq!(world.target_ticks(), 60);
    }

    #[test]
    fn test_toggle_change_applies_on_next_tick() {
        let params = SimulationParams {
            noise_fraction: 1.0,
            ..Default::default()
        };
        let scene = Scene::for_scenario(ScenarioId::SingleFiber, &params).unwrap();
        let config = SimConfig {
            tick_rate_hz: 30,
            ..Default::default()
        };
        let mut calm = SimWorld::new(config.clone(), scene.clone()).unwrap();
        let mut noisy = SimWorld::new(config, scene).unwrap();

        for _ in 0..10 {
            calm.tick();
            noisy.tick();
        }
        let colors = |w: &SimWorld| -> Vec<Rgb> {
            w.fibers[0].driver.attributes().iter().map(|a| a.color).collect()
        };
        let colors_before = colors(&noisy);

        let both_on = FrameToggles {
            noise_enabled: true,
            colorful_mode: true,
        };
        noisy.set_toggles(both_on);
        assert_eq!(noisy.toggles, both_on);

        // Nothing is re-evaluated until the next tick
        assert_eq!(colors(&noisy), colors_before);

        calm.tick();
        noisy.tick();

        let calm_attrs = calm.fibers[0].driver.attributes();
        let noisy_attrs = noisy.fibers[0].driver.attributes();
        let carriers = noisy.fibers[0].driver.carriers();

        // Same seed, so only the toggles separate the two worlds
        let mut moved = 0;
        for ((c, n), carrier) in calm_attrs.iter().zip(noisy_attrs).zip(carriers) {
            assert_eq!(n.color, carrier.colors.rainbow);
            assert_eq!(c.color, carrier.colors.themed);
            if n.visible && c.visible && n.position != c.position {
                moved += 1;
            }
        }
        assert!(moved > 0);
    }

    #[test]
    fn test_sim_world_tick() {
        let mut world = world(42, ScenarioId::SingleFiber);

        assert_eq!(world.tick_count(), 0);
        assert_eq!(world.time(), 0.0);

        world.tick();

        assert_eq!(world.tick_count(), 1);
        assert!((world.time() - 1.0 / 30.0).abs() < 0.0001);
        for (_, attrs) in world.attributes() {
            assert_eq!(attrs.len(), 80);
        }
    }

    #[test]
    fn test_sim_world_determinism() {
        let mut world1 = world(42, ScenarioId::LossySplice);
        let mut world2 = world(42, ScenarioId::LossySplice);

        for _ in 0..120 {
            world1.tick();
            world2.tick();
        }

        for (a, b) in world1.attributes().zip(world2.attributes()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_fibers_use_independent_streams() {
        let world = world(42, ScenarioId::Splice);
        let upper = world.fibers[1].driver.carriers();
        let lower = world.fibers[2].driver.carriers();
        assert_ne!(upper[0].phase_offset, lower[0].phase_offset);
    }

    #[test]
    fn test_no_domain_violations() {
        let mut world = world(7, ScenarioId::NoisySplice);
        for _ in 0..300 {
            world.tick();
        }
        assert_eq!(world.domain_violations(), 0);
    }

    #[test]
    fn test_refresh_keeps_positions_on_path() {
        let mut world = world(3, ScenarioId::Splice);
        for _ in 0..30 {
            world.tick();
        }
        let path_params = |w: &SimWorld| -> Vec<f64> {
            w.fibers[0].driver.carriers().iter().map(|c| c.path_param).collect()
        };
        let before = path_params(&world);
        world.refresh();
        let after = path_params(&world);
        assert_eq!(before, after);
        assert_eq!(world.tick_count(), 30);
    }
}
