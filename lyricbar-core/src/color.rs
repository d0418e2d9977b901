//! Color types and the precomputed gradient lookup table used by the
//! karaoke renderer.

use crate::error::CoreError;

/// 24-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse a `#RRGGBB` hex color string
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidColor`] if the string is not a 6-digit hex color.
    pub fn from_hex(hex: &str) -> Result<Self, CoreError> {
        let digits = hex.trim_start_matches('#');
        if digits.len() != 6 {
            return Err(CoreError::InvalidColor {
                value: hex.to_string(),
            });
        }
        let parse = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| CoreError::InvalidColor {
                value: hex.to_string(),
            })
        };
        Ok(Self {
            r: parse(0..2)?,
            g: parse(2..4)?,
            b: parse(4..6)?,
        })
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Linear interpolation between two colors at `t` clamped to [0, 1]
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| {
            let v = f64::from(a) + (f64::from(b) - f64::from(a)) * t;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                v.round().clamp(0.0, 255.0) as u8
            }
        };
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

/// Precomputed gradient table from a base to a highlight color, eased through
/// smoothstep so per-character color resolution is an O(1) index at frame rates.
#[derive(Debug, Clone)]
pub struct ColorLut {
    entries: Vec<Rgb>,
}

impl ColorLut {
    /// Build a table of `steps + 1` entries easing `base` into `highlight`
    #[must_use]
    pub fn build(base: Rgb, highlight: Rgb, steps: usize) -> Self {
        let steps = steps.max(1);
        let mut entries = Vec::with_capacity(steps + 1);
        #[allow(clippy::cast_precision_loss)]
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let eased = t * t * (3.0 - 2.0 * t);
            entries.push(base.lerp(highlight, eased));
        }
        Self { entries }
    }

    /// Color for `progress` in [0, 1]; out-of-range values are clamped
    #[must_use]
    pub fn sample(&self, progress: f64) -> Rgb {
        let p = progress.clamp(0.0, 1.0);
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let idx = (p * (self.entries.len() - 1) as f64) as usize;
        self.entries[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Rgb = Rgb { r: 0, g: 0, b: 0 };
    const HIGHLIGHT: Rgb = Rgb {
        r: 200,
        g: 100,
        b: 50,
    };

    #[test]
    fn test_hex_round_trip() {
        let color = Rgb::from_hex("#FFD700").unwrap();
        assert_eq!(color, Rgb { r: 255, g: 215, b: 0 });
        assert_eq!(color.to_hex(), "#FFD700");
    }

    #[test]
    fn test_hex_rejects_garbage() {
        assert!(Rgb::from_hex("#FFD7").is_err());
        assert!(Rgb::from_hex("nope").is_err());
        assert!(Rgb::from_hex("#GGGGGG").is_err());
    }

    #[test]
    fn test_lut_endpoints() {
        let lut = ColorLut::build(BASE, HIGHLIGHT, 100);
        assert_eq!(lut.sample(0.0), BASE);
        assert_eq!(lut.sample(1.0), HIGHLIGHT);
        // Out-of-range clamps
        assert_eq!(lut.sample(-1.0), BASE);
        assert_eq!(lut.sample(2.0), HIGHLIGHT);
    }

    #[test]
    fn test_lut_midpoint_is_eased_half() {
        // smoothstep(0.5) = 0.5, so the table midpoint is the plain average
        let lut = ColorLut::build(BASE, HIGHLIGHT, 100);
        let mid = lut.sample(0.5);
        assert_eq!(mid, Rgb { r: 100, g: 50, b: 25 });
    }

    #[test]
    fn test_lut_smoothstep_slow_start() {
        // Easing keeps early progress darker than linear interpolation would
        let lut = ColorLut::build(BASE, HIGHLIGHT, 100);
        let early = lut.sample(0.1);
        assert!(u32::from(early.r) < u32::from(HIGHLIGHT.r) / 10 + 2);
    }

    #[test]
    fn test_lerp_clamps() {
        assert_eq!(BASE.lerp(HIGHLIGHT, -0.5), BASE);
        assert_eq!(BASE.lerp(HIGHLIGHT, 1.5), HIGHLIGHT);
    }
}
