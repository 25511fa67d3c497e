//! Simulation parameters and per-frame toggles.

use crate::color::Palette;
use crate::error::FlowError;
use crate::occlusion::OcclusionVolume;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How often a trunk carrier inside the junction rolls for splice loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// One trial on every frame spent inside the junction.
    ///
    /// Effective loss per pass grows with frame rate and shrinks with speed.
    #[default]
    PerFrame,

    /// One trial on the frame the carrier enters the junction.
    PerPass,
}

/// Global toggles read on every step.
///
/// These come from an external control layer and may change between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameToggles {
    /// Interference noise for carriers that react to it
    pub noise_enabled: bool,

    /// Rainbow colors instead of the themed palette
    pub colorful_mode: bool,
}

/// Construction-time tunables for a carrier population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Carriers per path
    pub carrier_count: usize,

    /// Bernoulli probability of a splice-loss drop per trial
    pub drop_probability_per_frame: f64,

    /// When drop trials happen
    pub drop_policy: DropPolicy,

    /// Ballistic speed of a dropped carrier (units/s)
    pub scatter_speed: f64,

    /// Time for a dropped carrier to fade out (s)
    pub fade_duration_secs: f64,

    /// Junction box center
    pub junction_center: [f64; 3],

    /// Junction box half-extents
    pub junction_half_extents: [f64; 3],

    /// Lowest carrier speed (path fraction per second)
    pub base_speed: f64,

    /// Speed is drawn from `[base_speed, base_speed + speed_variance)`
    pub speed_variance: f64,

    /// Smallest carrier radius
    pub base_size: f64,

    /// Size is drawn from `[base_size, base_size + size_variance)`
    pub size_variance: f64,

    /// Ambient wobble amplitude
    pub wobble_amplitude: f64,

    /// Primary harmonic amplitude of interference noise
    pub noise_amplitude: f64,

    /// Share of carriers that react to the noise toggle
    pub noise_fraction: f64,

    /// Amplitude of the static fiber imperfection term
    pub imperfection_amplitude: f64,

    /// Opacity of a flowing carrier
    pub nominal_opacity: f64,

    /// Window over which branch start delays are spread (s)
    pub branch_stagger_secs: f64,

    /// Default-mode color theme
    pub palette: Palette,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            carrier_count: 80,
            drop_probability_per_frame: 0.001,
            drop_policy: DropPolicy::PerFrame,
            scatter_speed: 0.15,
            fade_duration_secs: 2.0,
            junction_center: [0.0, 0.0, 0.0],
            junction_half_extents: OcclusionVolume::DEFAULT_HALF_EXTENTS,
            base_speed: 0.3,
            speed_variance: 0.4,
            base_size: 0.05,
            size_variance: 0.1,
            wobble_amplitude: 0.02,
            noise_amplitude: 0.03,
            noise_fraction: 0.3,
            imperfection_amplitude: 0.01,
            nominal_opacity: 0.7,
            branch_stagger_secs: 3.0,
            palette: Palette::Amber,
        }
    }
}

impl SimulationParams {
    /// Loads parameters from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, FlowError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parses parameters from JSON text and validates them.
    pub fn from_json_str(text: &str) -> Result<Self, FlowError> {
        let params: Self = serde_json::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    /// The junction box described by these parameters.
    pub fn junction(&self) -> OcclusionVolume {
        OcclusionVolume::new(
            Vector3::from(self.junction_center),
            Vector3::from(self.junction_half_extents),
        )
    }

    /// Checks every tunable against its valid range.
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.carrier_count == 0 {
            return Err(FlowError::EmptyPopulation);
        }

        unit_interval("drop_probability_per_frame", self.drop_probability_per_frame)?;
        unit_interval("noise_fraction", self.noise_fraction)?;
        unit_interval("nominal_opacity", self.nominal_opacity)?;

        positive("scatter_speed", self.scatter_speed)?;
        positive("fade_duration_secs", self.fade_duration_secs)?;
        positive("base_speed", self.base_speed)?;
        positive("base_size", self.base_size)?;

        non_negative("speed_variance", self.speed_variance)?;
        non_negative("size_variance", self.size_variance)?;
        non_negative("wobble_amplitude", self.wobble_amplitude)?;
        non_negative("noise_amplitude", self.noise_amplitude)?;
        non_negative("imperfection_amplitude", self.imperfection_amplitude)?;
        non_negative("branch_stagger_secs", self.branch_stagger_secs)?;

        for extent in self.junction_half_extents {
            positive("junction_half_extents", extent)?;
        }
        for coord in self.junction_center {
            if !coord.is_finite() {
                return Err(FlowError::invalid("junction_center", coord, "must be finite"));
            }
        }

        Ok(())
    }
}

fn unit_interval(name: &'static str, value: f64) -> Result<(), FlowError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(FlowError::invalid(name, value, "must be within [0, 1]"))
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), FlowError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FlowError::invalid(name, value, "must be positive"))
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), FlowError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FlowError::invalid(name, value, "must be non-negative"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = SimulationParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.drop_probability_per_frame, 0.001);
        assert_eq!(params.scatter_speed, 0.15);
        assert_eq!(params.fade_duration_secs, 2.0);
        assert_eq!(params.junction_half_extents, [0.5, 0.35, 0.3]);
    }

    #[test]
    fn test_zero_count_rejected() {
        let params = SimulationParams {
            carrier_count: 0,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(FlowError::EmptyPopulation)));
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        let params = SimulationParams {
            drop_probability_per_frame: 1.5,
            ..Default::default()
        };
        match params.validate() {
            Err(FlowError::InvalidParameter { name, .. }) => {
                assert_eq!(name, "drop_probability_per_frame")
            }
            other => panic!("expected invalid parameter, got {:?}", other),
        }
    }

    #[test]
    fn test_nan_fade_rejected() {
        let params = SimulationParams {
            fade_duration_secs: f64::NAN,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let params = SimulationParams::from_json_str(
            r#"{ "carrier_count": 12, "drop_policy": "per_pass", "palette": "ruby" }"#,
        )
        .unwrap();

        assert_eq!(params.carrier_count, 12);
        assert_eq!(params.drop_policy, DropPolicy::PerPass);
        assert_eq!(params.palette, Palette::Ruby);
        assert_eq!(params.scatter_speed, 0.15);
    }

    #[test]
    fn test_invalid_json_values_rejected() {
        let result = SimulationParams::from_json_str(r#"{ "scatter_speed": 0.0 }"#);
        assert!(matches!(result, Err(FlowError::InvalidParameter { .. })));

        let result = SimulationParams::from_json_str("{ carrier_count: }");
        assert!(matches!(result, Err(FlowError::Config(_))));
    }

    #[test]
    fn test_junction_from_params() {
        let params = SimulationParams {
            junction_center: [1.0, 2.0, 3.0],
            ..Default::default()
        };
        let junction = params.junction();
        assert!(junction.contains(&Vector3::new(1.2, 2.1, 3.0)));
        assert!(!junction.contains(&Vector3::zeros()));
    }
}
