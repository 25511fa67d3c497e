//! Scenario runner - drives a scene for a fixed duration and checks invariants.

use crate::exporter::{SimExport, SimFrame};
use crate::scenarios::ScenarioId;
use crate::scene::Scene;
use crate::visualizer::RerunLogger;
use crate::world::{SimConfig, SimWorld};

use fiberflow_core::{FrameToggles, Rgb, SimulationParams};
use tracing::{debug, error, info};

/// Minimum simulated time before a lossy scenario must have dropped something.
const LOSS_EXPECTED_AFTER_SECS: f64 = 5.0;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total ticks executed
    pub total_ticks: u64,

    /// Final simulation time in seconds
    pub final_time_secs: f64,

    /// Carriers across all fibers
    pub carrier_count: usize,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

impl ScenarioResult {
    fn failed(scenario: ScenarioId, seed: u64, reason: String) -> Self {
        Self {
            scenario,
            seed,
            passed: false,
            total_ticks: 0,
            final_time_secs: 0.0,
            carrier_count: 0,
            failure_reason: Some(reason),
            metrics: ScenarioMetrics::default(),
        }
    }
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default)]
pub struct ScenarioMetrics {
    /// Splice losses across all fibers
    pub drops: u64,

    /// Dropped carriers that came back
    pub respawns: u64,

    /// Most carriers scattering at once
    pub peak_dropped: usize,

    /// Fewest visible carriers in any frame
    pub min_visible: usize,

    /// Most visible carriers in any frame
    pub max_visible: usize,

    /// Path queries outside `[0,1]`
    pub domain_violations: u64,

    /// Frames that broke an invariant
    pub invariant_failures: u64,
}

/// Runs scenarios.
pub struct ScenarioRunner {
    /// Seed, tick rate and duration handed to every world
    config: SimConfig,

    /// Parameters each scenario starts from
    base_params: SimulationParams,

    /// Toggles forced on in addition to the scenario's own
    forced_toggles: FrameToggles,

    /// Export every Nth tick
    export_interval: u64,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            config: SimConfig {
                seed,
                ..Default::default()
            },
            base_params: SimulationParams::default(),
            forced_toggles: FrameToggles::default(),
            export_interval: 10,
        }
    }

    /// Sets the tick rate.
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.config.tick_rate_hz = hz.max(1);
        self
    }

    /// Sets the maximum duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.config.max_duration_secs = secs;
        self
    }

    /// Sets the parameters scenarios build on.
    pub fn with_params(mut self, params: SimulationParams) -> Self {
        self.base_params = params;
        self
    }

    /// Forces toggles on for every scenario.
    pub fn with_toggles(mut self, toggles: FrameToggles) -> Self {
        self.forced_toggles = toggles;
        self
    }

    /// Sets how many ticks pass between exported frames.
    pub fn with_export_interval(mut self, ticks: u64) -> Self {
        self.export_interval = ticks.max(1);
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.run_with(scenario, None, &RerunLogger::disabled())
    }

    /// Runs a scenario, optionally exporting frames and logging to Rerun.
    pub fn run_with(
        &self,
        scenario: ScenarioId,
        mut export: Option<&mut SimExport>,
        logger: &RerunLogger,
    ) -> ScenarioResult {
        let seed = self.config.seed;
        info!("Starting scenario: {} (seed={})", scenario.name(), seed);
        debug!("  {}", scenario.description());

        let mut world = match self.build_world(scenario) {
            Ok(world) => world,
            Err(e) => {
                error!("Scenario {} could not start: {}", scenario.name(), e);
                return ScenarioResult::failed(scenario, seed, e.to_string());
            }
        };

        let initial_count = world.carrier_count();
        let target_ticks = world.target_ticks();
        let ticks_per_sec = world.config.tick_rate_hz as u64;

        let mut metrics = ScenarioMetrics {
            min_visible: usize::MAX,
            ..Default::default()
        };
        let mut first_failure: Option<String> = None;
        let mut reference_colors: Vec<Vec<Rgb>> = Vec::new();

        for tick in 0..target_ticks {
            world.tick();

            if let Err(reason) = check_frame(&world, initial_count, &mut reference_colors) {
                metrics.invariant_failures += 1;
                if first_failure.is_none() {
                    error!("tick {}: {}", tick, reason);
                    first_failure = Some(reason);
                }
            }

            let visible: usize = world
                .attributes()
                .map(|(_, attrs)| attrs.iter().filter(|a| a.visible).count())
                .sum();
            metrics.min_visible = metrics.min_visible.min(visible);
            metrics.max_visible = metrics.max_visible.max(visible);

            let dropped: usize = world.fibers.iter().map(|f| f.driver.dropped_count()).sum();
            metrics.peak_dropped = metrics.peak_dropped.max(dropped);

            if tick % self.export_interval == 0 {
                if let Some(export) = export.as_deref_mut() {
                    export.add_frame(SimFrame::capture(&world));
                }
                if logger.is_enabled() {
                    logger.set_time(world.time());
                    for (name, attrs) in world.attributes() {
                        logger.log_fiber(name, attrs);
                    }
                    let (drops, respawns) = world.fibers.iter().fold((0, 0), |(d, r), f| {
                        let stats = f.driver.stats();
                        (d + stats.drops, r + stats.respawns)
                    });
                    logger.log_counter("drops", drops);
                    logger.log_counter("respawns", respawns);
                }
            }

            if tick % ticks_per_sec == 0 {
                debug!(
                    "  t={:.1}s | visible={} | scattering={}",
                    world.time(),
                    visible,
                    dropped
                );
            }
        }

        for fiber in &world.fibers {
            let stats = fiber.driver.stats();
            metrics.drops += stats.drops;
            metrics.respawns += stats.respawns;
        }
        metrics.domain_violations = world.domain_violations();
        if metrics.min_visible == usize::MAX {
            metrics.min_visible = 0;
        }

        if first_failure.is_none() && metrics.domain_violations > 0 {
            first_failure = Some(format!(
                "{} path queries outside [0,1]",
                metrics.domain_violations
            ));
        }

        if first_failure.is_none()
            && scenario.is_lossy()
            && world.time() >= LOSS_EXPECTED_AFTER_SECS
            && metrics.drops == 0
        {
            first_failure = Some(format!(
                "no splice loss after {:.1}s in a lossy scenario",
                world.time()
            ));
        }

        let passed = first_failure.is_none();
        info!(
            "Scenario {} finished: {} ticks, {} drops, {} respawns",
            scenario.name(),
            world.tick_count(),
            metrics.drops,
            metrics.respawns
        );

        if let Some(export) = export {
            export.finalize(passed, metrics.drops);
        }

        ScenarioResult {
            scenario,
            seed,
            passed,
            total_ticks: world.tick_count(),
            final_time_secs: world.time(),
            carrier_count: world.carrier_count(),
            failure_reason: first_failure,
            metrics,
        }
    }

    fn build_world(&self, scenario: ScenarioId) -> Result<SimWorld, fiberflow_core::FlowError> {
        let mut scene = Scene::for_scenario(scenario, &self.base_params)?;
        scene.toggles.noise_enabled |= self.forced_toggles.noise_enabled;
        scene.toggles.colorful_mode |= self.forced_toggles.colorful_mode;

        SimWorld::new(self.config.clone(), scene)
    }
}

/// Checks per-frame invariants of every fiber.
///
/// The first call records each fiber's colors; later calls require them to
/// be unchanged, since toggles are fixed for a run.
fn check_frame(
    world: &SimWorld,
    initial_count: usize,
    reference_colors: &mut Vec<Vec<Rgb>>,
) -> Result<(), String> {
    if world.carrier_count() != initial_count {
        return Err(format!(
            "population changed from {} to {}",
            initial_count,
            world.carrier_count()
        ));
    }

    let record = reference_colors.is_empty();

    for (i, fiber) in world.fibers.iter().enumerate() {
        let attrs = fiber.driver.attributes();
        if attrs.len() != fiber.driver.len() {
            return Err(format!(
                "fiber '{}' produced {} records for {} carriers",
                fiber.name,
                attrs.len(),
                fiber.driver.len()
            ));
        }

        for (j, a) in attrs.iter().enumerate() {
            if a.visible {
                let finite = a.position.iter().all(|v| v.is_finite()) && a.scale.is_finite();
                if !finite || a.scale < 0.0 || !(0.0..=1.0).contains(&a.opacity) {
                    return Err(format!(
                        "fiber '{}' carrier {} has bad attributes: {:?}",
                        fiber.name, j, a
                    ));
                }
            }
        }

        for (j, c) in fiber.driver.carriers().iter().enumerate() {
            if !(0.0..=1.0).contains(&c.fade_alpha) {
                return Err(format!("fiber '{}' carrier {} fade {}", fiber.name, j, c.fade_alpha));
            }
            if c.state.is_on_path() && !(0.0..=1.0).contains(&c.path_param) {
                return Err(format!(
                    "fiber '{}' carrier {} path_param {}",
                    fiber.name, j, c.path_param
                ));
            }
        }

        let colors: Vec<Rgb> = attrs.iter().map(|a| a.color).collect();
        if record {
            reference_colors.push(colors);
        } else if reference_colors.get(i) != Some(&colors) {
            return Err(format!("fiber '{}' colors changed mid-run", fiber.name));
        }
    }

    Ok(())
}
