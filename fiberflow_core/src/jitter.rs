//! Positional jitter synthesis.
//!
//! Two mutually exclusive modes:
//! - **Ambient wobble**: one slow sine shared by all three axes.
//! - **Interference noise**: three high-frequency harmonics per axis plus a
//!   static, path-dependent fiber imperfection term. Only carriers whose
//!   [`NoiseProfile`] is enabled react to the global noise toggle.

use nalgebra::Vector3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Angular frequency of the ambient wobble.
pub const WOBBLE_FREQUENCY: f64 = 2.0;

/// Spatial frequency of the fiber imperfection term along the path.
pub const IMPERFECTION_FREQUENCY: f64 = 4.0;

/// Per-axis weighting of the fiber imperfection term.
pub const IMPERFECTION_WEIGHTS: [f64; 3] = [1.0, 0.7, 1.2];

/// Amplitudes the jitter functions scale by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitterAmplitudes {
    pub wobble: f64,
    pub noise: f64,
    pub imperfection: f64,
}

/// Fixed per-carrier interference parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseProfile {
    /// Whether the global noise toggle affects this carrier
    pub enabled: bool,

    /// Base angular frequency of the primary harmonic
    pub frequency: f64,

    /// Frequency multipliers for the three harmonics
    pub multipliers: [f64; 3],

    /// Relative amplitude of each harmonic (primary is 1.0)
    pub weights: [f64; 3],

    /// Phase offset per axis and harmonic
    pub phases: [[f64; 3]; 3],
}

impl NoiseProfile {
    /// Draws a profile. `fraction` is the chance that the carrier reacts to noise.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, fraction: f64) -> Self {
        let enabled = rng.gen_bool(fraction.clamp(0.0, 1.0));
        let frequency = rng.gen_range(8.0..14.0);
        let multipliers = [1.0, rng.gen_range(2.1..2.9), rng.gen_range(3.3..4.7)];
        let weights = [1.0, rng.gen_range(0.2..0.3), rng.gen_range(0.15..0.3)];

        let mut phases = [[0.0; 3]; 3];
        for axis in phases.iter_mut() {
            for phase in axis.iter_mut() {
                *phase = rng.gen_range(0.0..TAU);
            }
        }

        Self {
            enabled,
            frequency,
            multipliers,
            weights,
            phases,
        }
    }

    /// A profile that never reacts to the noise toggle.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            frequency: 0.0,
            multipliers: [1.0; 3],
            weights: [1.0, 0.0, 0.0],
            phases: [[0.0; 3]; 3],
        }
    }
}

/// Slow wobble applied identically to all axes.
pub fn ambient_wobble(elapsed: f64, phase_offset: f64, amplitude: f64) -> Vector3<f64> {
    let w = (elapsed * WOBBLE_FREQUENCY + phase_offset).sin() * amplitude;
    Vector3::new(w, w, w)
}

/// Harmonic interference plus fiber imperfection.
pub fn interference(
    profile: &NoiseProfile,
    elapsed: f64,
    path_param: f64,
    amplitude: f64,
    imperfection: f64,
) -> Vector3<f64> {
    let flaw = (path_param * IMPERFECTION_FREQUENCY).sin() * imperfection;

    let mut out = Vector3::zeros();
    for axis in 0..3 {
        let harmonics: f64 = (0..3)
            .map(|k| {
                let omega = profile.frequency * profile.multipliers[k];
                profile.weights[k] * (elapsed * omega + profile.phases[axis][k]).sin()
            })
            .sum();
        out[axis] = harmonics * amplitude + flaw * IMPERFECTION_WEIGHTS[axis];
    }
    out
}

/// Jitter for one carrier this frame.
pub fn jitter(
    profile: &NoiseProfile,
    noise_toggle: bool,
    elapsed: f64,
    phase_offset: f64,
    path_param: f64,
    amps: &JitterAmplitudes,
) -> Vector3<f64> {
    if noise_toggle && profile.enabled {
        interference(profile, elapsed, path_param, amps.noise, amps.imperfection)
    } else {
        ambient_wobble(elapsed, phase_offset, amps.wobble)
    }
}
