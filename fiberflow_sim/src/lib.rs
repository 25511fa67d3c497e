//! Fiberflow deterministic harness
//!
//! Assembles fiber scenes on Catmull-Rom cables and runs them headless on a
//! virtual clock. Every random draw comes from streams derived from one
//! 64-bit seed, so a run replays exactly.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                   SimWorld                   │
//! │   SimContext (virtual clock + seed source)   │
//! │        │              │              │       │
//! │   ┌────▼────┐    ┌────▼────┐    ┌────▼────┐  │
//! │   │  trunk  │    │ branch  │    │ branch  │  │
//! │   │ driver  │    │ driver  │    │ driver  │  │
//! │   └─────────┘    └─────────┘    └─────────┘  │
//! └──────────────────────────────────────────────┘
//!          │ attributes per tick
//!   ScenarioRunner (invariants) ─► SimExport / RerunLogger
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use fiberflow_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42)
//!     .with_duration(5.0)
//!     .run(ScenarioId::LossySplice);
//! assert!(result.passed);
//! ```

mod context;
mod curve;
mod exporter;
mod runner;
pub mod scenarios;
mod scene;
mod visualizer;
mod world;

pub use context::SimContext;
pub use curve::CatmullRomPath;
pub use exporter::{CarrierSample, FiberFrame, SimExport, SimFrame};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use scene::{glow_opacity, FiberSpec, Scene};
pub use visualizer::RerunLogger;
pub use world::{FiberRun, GuardedPath, SimConfig, SimWorld};
