//! Carrier color policy.
//!
//! Colors are drawn once per carrier at creation. Each carrier keeps a
//! themed color and a rainbow color; the per-frame colorful toggle only
//! chooses between the two.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Linear RGB color with channels in `[0,1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Converts to 8-bit channels.
    pub fn to_u8(self) -> [u8; 3] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }
}

/// Converts hue/saturation/lightness (all in `[0,1]`) to RGB.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        let v = l as f32;
        return Rgb::new(v, v, v);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let channel = |t: f64| -> f32 {
        let t = t.rem_euclid(1.0);
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        v as f32
    };

    Rgb::new(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
}

/// Hue theme for default-mode carriers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    /// Amber/yellow photons
    #[default]
    Amber,
    /// Ruby-red photons
    Ruby,
    /// Cyan-to-blue photons
    Cyan,
}

/// HSL sampling ranges for one palette.
#[derive(Debug, Clone, PartialEq)]
pub struct HslBand {
    pub hue: Range<f64>,
    pub saturation: Range<f64>,
    pub lightness: Range<f64>,
}

impl HslBand {
    /// Draws a color uniformly within the band.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Rgb {
        let h = sample_range(rng, &self.hue);
        let s = sample_range(rng, &self.saturation);
        let l = sample_range(rng, &self.lightness);
        hsl_to_rgb(h, s, l)
    }
}

fn sample_range<R: Rng + ?Sized>(rng: &mut R, range: &Range<f64>) -> f64 {
    if range.end > range.start {
        rng.gen_range(range.clone())
    } else {
        range.start
    }
}

impl Palette {
    /// Narrow themed band for this palette.
    pub fn band(self) -> HslBand {
        match self {
            Palette::Amber => HslBand {
                hue: 0.10..0.15,
                saturation: 1.0..1.0,
                lightness: 0.5..0.7,
            },
            // Wraps past 1.0 into the red end of the wheel
            Palette::Ruby => HslBand {
                hue: 0.96..1.01,
                saturation: 0.9..0.9,
                lightness: 0.4..0.6,
            },
            Palette::Cyan => HslBand {
                hue: 0.5..0.6,
                saturation: 1.0..1.0,
                lightness: 0.55..0.65,
            },
        }
    }
}

/// Full-wheel band used in colorful mode.
pub fn rainbow_band() -> HslBand {
    HslBand {
        hue: 0.0..1.0,
        saturation: 0.8..1.0,
        lightness: 0.5..0.7,
    }
}

/// The two colors fixed for a carrier at creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarrierColors {
    pub themed: Rgb,
    pub rainbow: Rgb,
}

impl CarrierColors {
    /// Samples both colors for a new carrier.
    pub fn sample<R: Rng + ?Sized>(palette: Palette, rng: &mut R) -> Self {
        Self {
            themed: palette.band().sample(rng),
            rainbow: rainbow_band().sample(rng),
        }
    }

    /// Color to display under the current colorful toggle.
    pub fn select(&self, colorful: bool) -> Rgb {
        if colorful {
            self.rainbow
        } else {
            self.themed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_hsl_primaries() {
        let red = hsl_to_rgb(0.0, 1.0, 0.5);
        assert_relative_eq!(red.r, 1.0, epsilon = 1e-6);
        assert_relative_eq!(red.g, 0.0, epsilon = 1e-6);
        assert_relative_eq!(red.b, 0.0, epsilon = 1e-6);

        let green = hsl_to_rgb(1.0 / 3.0, 1.0, 0.5);
        assert_relative_eq!(green.g, 1.0, epsilon = 1e-6);
        assert_relative_eq!(green.r, 0.0, epsilon = 1e-6);

        let cyan = hsl_to_rgb(0.5, 1.0, 0.5);
        assert_eq!(cyan.to_u8(), [0, 255, 255]);
    }

    #[test]
    fn test_hsl_grey_when_unsaturated() {
        let grey = hsl_to_rgb(0.42, 0.0, 0.25);
        assert_eq!(grey, Rgb::new(0.25, 0.25, 0.25));
    }

    #[test]
    fn test_amber_is_warm() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            let c = Palette::Amber.band().sample(&mut rng);
            assert!(c.r >= c.g, "amber should lean red over green: {:?}", c);
            assert!(c.g > c.b, "amber should carry more green than blue: {:?}", c);
        }
    }

    #[test]
    fn test_ruby_is_red_dominant() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..100 {
            let c = Palette::Ruby.band().sample(&mut rng);
            assert!(c.r > c.g && c.r > c.b, "ruby not red: {:?}", c);
        }
    }

    #[test]
    fn test_select_follows_toggle() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let colors = CarrierColors::sample(Palette::Cyan, &mut rng);

        assert_eq!(colors.select(false), colors.themed);
        assert_eq!(colors.select(true), colors.rainbow);
    }

    #[test]
    fn test_palette_serde_names() {
        let json = serde_json::to_string(&Palette::Ruby).unwrap();
        assert_eq!(json, "\"ruby\"");
    }
}
