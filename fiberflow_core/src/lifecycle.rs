//! The carrier lifecycle engine.
//!
//! Advances one [`Carrier`] by one frame and reports what the renderer
//! should draw for it.
//!
//! # State machine
//!
//! ```text
//!             start_delay hits 0
//!   Pending ─────────────────────► Flowing ◄──────────┐
//!                                   │   ▲             │
//!                     enters box    │   │ leaves box  │ fade complete,
//!                                   ▼   │             │ path_param = 0
//!                                  Occluded           │
//!                                   │                 │
//!                 trunk + trial hit │                 │
//!                                   ▼                 │
//!                                  Dropped ───────────┘
//! ```
//!
//! A step with `delta <= 0` is evaluation-only: no transition, no drop trial
//! and no integration happen, but jitter and pulse still follow `elapsed`.

use crate::carrier::{Carrier, CarrierRole, LifecycleState};
use crate::color::Rgb;
use crate::config::{DropPolicy, FrameToggles, SimulationParams};
use crate::jitter::{self, JitterAmplitudes};
use crate::occlusion::OcclusionVolume;
use crate::path::{sample_clamped, PathAdapter};
use nalgebra::Vector3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use tracing::trace;

/// Size pulse frequency for trunk carriers.
pub const TRUNK_PULSE_FREQUENCY: f64 = 3.0;

/// Size pulse frequency for branch carriers.
pub const BRANCH_PULSE_FREQUENCY: f64 = 4.0;

/// Relative size swing of the pulse.
pub const PULSE_DEPTH: f64 = 0.3;

/// Timing for one step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    /// Seconds since the previous frame
    pub delta: f64,

    /// Seconds since the simulation started
    pub elapsed: f64,

    pub toggles: FrameToggles,
}

impl Frame {
    pub fn new(delta: f64, elapsed: f64, toggles: FrameToggles) -> Self {
        Self {
            delta,
            elapsed,
            toggles,
        }
    }
}

/// What the renderer draws for one carrier this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualAttributes {
    pub position: Vector3<f64>,
    pub visible: bool,
    /// Instantaneous radius
    pub scale: f64,
    pub opacity: f64,
    pub color: Rgb,
}

impl VisualAttributes {
    fn hidden(position: Vector3<f64>, color: Rgb) -> Self {
        Self {
            position,
            visible: false,
            scale: 0.0,
            opacity: 0.0,
            color,
        }
    }
}

/// Pulsed radius of a flowing carrier.
pub fn pulse_scale(size: f64, elapsed: f64, phase_offset: f64, role: CarrierRole) -> f64 {
    let frequency = match role {
        CarrierRole::Trunk => TRUNK_PULSE_FREQUENCY,
        CarrierRole::Branch => BRANCH_PULSE_FREQUENCY,
    };
    size * (1.0 + (elapsed * frequency + phase_offset).sin() * PULSE_DEPTH)
}

/// Direction from two uniform angles, `θ ∈ [0,2π)` and `φ ∈ [0,π)`.
pub fn scatter_direction<R: Rng + ?Sized>(rng: &mut R) -> Vector3<f64> {
    let theta: f64 = rng.gen_range(0.0..TAU);
    let phi: f64 = rng.gen_range(0.0..PI);
    Vector3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos())
}

/// Per-step rules derived from [`SimulationParams`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecycleEngine {
    pub drop_probability: f64,
    pub drop_policy: DropPolicy,
    pub scatter_speed: f64,
    pub fade_duration: f64,
    pub nominal_opacity: f64,
    pub amplitudes: JitterAmplitudes,
}

impl LifecycleEngine {
    /// Builds the engine from validated parameters.
    pub fn from_params(params: &SimulationParams) -> Self {
        Self {
            drop_probability: params.drop_probability_per_frame,
            drop_policy: params.drop_policy,
            scatter_speed: params.scatter_speed,
            fade_duration: params.fade_duration_secs,
            nominal_opacity: params.nominal_opacity,
            amplitudes: JitterAmplitudes {
                wobble: params.wobble_amplitude,
                noise: params.noise_amplitude,
                imperfection: params.imperfection_amplitude,
            },
        }
    }

    /// Advances `carrier` by one frame.
    pub fn advance<P, R>(
        &self,
        carrier: &mut Carrier,
        frame: &Frame,
        path: &P,
        junction: &OcclusionVolume,
        rng: &mut R,
    ) -> VisualAttributes
    where
        P: PathAdapter + ?Sized,
        R: Rng + ?Sized,
    {
        let color = carrier.colors.select(frame.toggles.colorful_mode);

        match carrier.state {
            LifecycleState::Pending => self.advance_pending(carrier, frame, path, color),
            LifecycleState::Flowing | LifecycleState::Occluded => {
                self.advance_on_path(carrier, frame, path, junction, rng, color)
            }
            LifecycleState::Dropped => self.advance_dropped(carrier, frame, path, color),
        }
    }

    fn advance_pending<P: PathAdapter + ?Sized>(
        &self,
        carrier: &mut Carrier,
        frame: &Frame,
        path: &P,
        color: Rgb,
    ) -> VisualAttributes {
        if frame.delta > 0.0 {
            carrier.start_delay = (carrier.start_delay - frame.delta).max(0.0);
            if carrier.start_delay == 0.0 {
                carrier.state = LifecycleState::Flowing;
            }
        }
        VisualAttributes::hidden(sample_clamped(path, carrier.path_param), color)
    }

    fn advance_on_path<P, R>(
        &self,
        carrier: &mut Carrier,
        frame: &Frame,
        path: &P,
        junction: &OcclusionVolume,
        rng: &mut R,
        color: Rgb,
    ) -> VisualAttributes
    where
        P: PathAdapter + ?Sized,
        R: Rng + ?Sized,
    {
        let advancing = frame.delta > 0.0;

        if advancing {
            carrier.path_param += frame.delta * carrier.speed;
            if carrier.path_param > 1.0 {
                carrier.path_param = 0.0;
            }
        }

        let offset = jitter::jitter(
            &carrier.noise,
            frame.toggles.noise_enabled,
            frame.elapsed,
            carrier.phase_offset,
            carrier.path_param,
            &self.amplitudes,
        );
        let position = sample_clamped(path, carrier.path_param) + offset;

        if !junction.contains(&position) {
            if advancing {
                carrier.state = LifecycleState::Flowing;
            }
            return VisualAttributes {
                position,
                visible: true,
                scale: pulse_scale(carrier.size, frame.elapsed, carrier.phase_offset, carrier.role),
                opacity: self.nominal_opacity,
                color,
            };
        }

        if advancing {
            let entering = carrier.state != LifecycleState::Occluded;
            carrier.state = LifecycleState::Occluded;

            if carrier.role == CarrierRole::Trunk
                && self.trial_due(entering)
                && rng.gen_bool(self.drop_probability)
            {
                let direction = scatter_direction(rng);
                carrier.begin_drop(position, direction);
                trace!(
                    "carrier dropped at t={:.3} heading ({:.2}, {:.2}, {:.2})",
                    frame.elapsed,
                    direction.x,
                    direction.y,
                    direction.z
                );
                return self.scatter_attributes(carrier, color);
            }
        }

        VisualAttributes::hidden(position, color)
    }

    fn advance_dropped<P: PathAdapter + ?Sized>(
        &self,
        carrier: &mut Carrier,
        frame: &Frame,
        path: &P,
        color: Rgb,
    ) -> VisualAttributes {
        if frame.delta > 0.0 {
            if carrier.drop_clock >= self.fade_duration {
                carrier.respawn();
                trace!("carrier respawned at t={:.3}", frame.elapsed);
                return VisualAttributes::hidden(sample_clamped(path, carrier.path_param), color);
            }

            let direction = carrier.scatter_direction.unwrap_or_else(Vector3::zeros);
            carrier.scatter_position += direction * self.scatter_speed * frame.delta;
            carrier.drop_clock += frame.delta;
            carrier.fade_alpha = if carrier.drop_clock >= self.fade_duration {
                0.0
            } else {
                (1.0 - carrier.drop_clock / self.fade_duration).max(0.0)
            };
        }

        self.scatter_attributes(carrier, color)
    }

    fn scatter_attributes(&self, carrier: &Carrier, color: Rgb) -> VisualAttributes {
        VisualAttributes {
            position: carrier.scatter_position,
            visible: true,
            scale: carrier.size * carrier.fade_alpha,
            opacity: self.nominal_opacity * carrier.fade_alpha,
            color,
        }
    }

    fn trial_due(&self, entering: bool) -> bool {
        match self.drop_policy {
            DropPolicy::PerFrame => true,
            DropPolicy::PerPass => entering,
        }
    }
}
