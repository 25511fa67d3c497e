//! Fiberflow Core - photon carrier simulation for fiber-optic visualizations
//!
//! Discrete "photon" carriers flow along fiber curves, disappear inside an
//! opaque splice enclosure, and are occasionally lost there: a dropped
//! carrier scatters ballistically, fades out, and respawns at the start of
//! its path. The population of every path is fixed for its lifetime.
//!
//! # Layers
//!
//! - [`PathAdapter`]: `t ∈ [0,1]` to a 3D point, supplied by the caller
//! - [`OcclusionVolume`]: the junction box predicate
//! - [`Carrier`]: per-photon state
//! - [`LifecycleEngine`]: one carrier, one frame
//! - [`SimulationDriver`]: one path's population, stepped once per frame
//!
//! # Usage
//!
//! ```ignore
//! use fiberflow_core::{CarrierRole, FrameToggles, LinearPath, SimulationDriver, SimulationParams};
//!
//! let params = SimulationParams::default();
//! let mut driver = SimulationDriver::new(LinearPath::unit_x(), CarrierRole::Trunk, &params, 42)?;
//!
//! let attrs = driver.step(1.0 / 60.0, 1.0 / 60.0, FrameToggles::default());
//! assert_eq!(attrs.len(), params.carrier_count);
//! ```

pub mod carrier;
pub mod color;
pub mod config;
pub mod driver;
pub mod error;
pub mod jitter;
pub mod lifecycle;
pub mod occlusion;
pub mod path;

// Re-export key types for convenience
pub use carrier::{Carrier, CarrierRole, LifecycleState};
pub use color::{CarrierColors, Palette, Rgb};
pub use config::{DropPolicy, FrameToggles, SimulationParams};
pub use driver::{DriverStats, SimulationDriver};
pub use error::FlowError;
pub use lifecycle::{Frame, LifecycleEngine, VisualAttributes};
pub use occlusion::OcclusionVolume;
pub use path::{LinearPath, PathAdapter};
