//! Gradient color mapping for scalar grids.
//!
//! A [`ColorGradient`] holds sorted `(value, color)` breakpoints. Values that
//! fall between two stops get a per-channel linear blend of their colors;
//! values outside the covered range clamp to the nearest end.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure_finite, FractalError, Result};

// ── Packed color ────────────────────────────────────────────────────────────

/// A color packed as `0xAARRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Argb(pub u32);

impl Argb {
    pub const BLACK: Argb = Argb(0xff00_0000);
    pub const WHITE: Argb = Argb(0xffff_ffff);

    pub const fn from_channels(a: u8, r: u8, g: u8, b: u8) -> Self {
        Argb((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::from_channels(0xff, r, g, b)
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Channels in `[r, g, b, a]` order, as image encoders expect.
    pub const fn to_rgba(self) -> [u8; 4] {
        [self.red(), self.green(), self.blue(), self.alpha()]
    }

    /// Weighted per-channel mix: `self·w1 + other·(1 − w1)`, rounded half up.
    ///
    /// `w1` is expected in `[0, 1]`; channel results saturate at the byte
    /// range otherwise.
    pub fn blend(self, other: Argb, w1: f64) -> Argb {
        let w2 = 1.0 - w1;
        let mix = |a: u8, b: u8| (f64::from(a) * w1 + f64::from(b) * w2 + 0.5) as u8;
        Argb::from_channels(
            mix(self.alpha(), other.alpha()),
            mix(self.red(), other.red()),
            mix(self.green(), other.green()),
            mix(self.blue(), other.blue()),
        )
    }
}

impl From<Argb> for u32 {
    fn from(c: Argb) -> u32 {
        c.0
    }
}

impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08x}", self.0)
    }
}

/// Parses `RRGGBB` or `AARRGGBB` hex, with any `#`, `0x` or `0X` removed
/// first. Six digits or fewer give an opaque color.
impl FromStr for Argb {
    type Err = FractalError;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.replace("0x", "").replace("0X", "").replace('#', "");
        if digits.contains('-') {
            return Err(FractalError::invalid(format!(
                "color {s:?} must not contain a minus sign"
            )));
        }
        if digits.is_empty() || digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(FractalError::ColorFormat(s.to_owned()));
        }
        let value =
            u32::from_str_radix(&digits, 16).map_err(|_| FractalError::ColorFormat(s.to_owned()))?;
        if digits.len() > 6 {
            Ok(Argb(value))
        } else {
            Ok(Argb(0xff00_0000 | value))
        }
    }
}

pub fn parse_color(s: &str) -> Result<Argb> {
    s.parse()
}

// ── Serializable stops ──────────────────────────────────────────────────────

/// One breakpoint as stored in gradient parameter files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub value: f64,
    /// Hex color, see [`parse_color`].
    pub color: String,
}

// ── Builder ─────────────────────────────────────────────────────────────────

/// Collects stops in any order; [`build`](Self::build) sorts and validates.
#[derive(Debug, Clone, Default)]
pub struct GradientBuilder {
    stops: Vec<(f64, Argb)>,
}

impl GradientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, value: f64, color: Argb) -> Self {
        self.stops.push((value, color));
        self
    }

    pub fn add_all<I>(mut self, stops: I) -> Self
    where
        I: IntoIterator<Item = (f64, Argb)>,
    {
        self.stops.extend(stops);
        self
    }

    pub fn add_hex(self, value: f64, color: &str) -> Result<Self> {
        Ok(self.add(value, color.parse()?))
    }

    /// Fails on an empty builder or any non-finite key.
    pub fn build(self) -> Result<ColorGradient> {
        if self.stops.is_empty() {
            return Err(FractalError::invalid("a gradient needs at least one color stop"));
        }
        for (value, _) in &self.stops {
            ensure_finite("gradient stop", *value)?;
        }
        let mut stops = self.stops;
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (keys, colors): (Vec<f64>, Vec<Argb>) = stops.into_iter().unzip();
        debug!(stops = keys.len(), low = keys[0], high = keys[keys.len() - 1], "built gradient");
        Ok(ColorGradient { keys, colors })
    }
}

// ── Gradient ────────────────────────────────────────────────────────────────

/// Immutable value → color map.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorGradient {
    keys: Vec<f64>,
    colors: Vec<Argb>,
}

impl ColorGradient {
    pub fn builder() -> GradientBuilder {
        GradientBuilder::new()
    }

    /// Build from serialized stops.
    pub fn from_stops(stops: &[GradientStop]) -> Result<Self> {
        stops
            .iter()
            .try_fold(GradientBuilder::new(), |b, s| b.add_hex(s.value, &s.color))?
            .build()
    }

    /// Build from a JSON array of [`GradientStop`]s.
    pub fn from_json(json: &str) -> Result<Self> {
        let stops: Vec<GradientStop> = serde_json::from_str(json)?;
        Self::from_stops(&stops)
    }

    /// Black at 0, white at 1.
    pub fn grayscale() -> Self {
        ColorGradient {
            keys: vec![0.0, 1.0],
            colors: vec![Argb::BLACK, Argb::WHITE],
        }
    }

    pub fn map(&self, value: f64) -> Argb {
        match self.keys.binary_search_by(|k| k.total_cmp(&value)) {
            Ok(i) => self.colors[i],
            Err(0) => self.colors[0],
            Err(i) if i >= self.keys.len() => self.colors[self.keys.len() - 1],
            Err(i) => {
                let (low, high) = (self.keys[i - 1], self.keys[i]);
                let ratio = (value - low) / (high - low);
                self.colors[i].blend(self.colors[i - 1], ratio)
            }
        }
    }

    /// Stops in ascending key order.
    pub fn stops(&self) -> impl Iterator<Item = (f64, Argb)> + '_ {
        self.keys.iter().copied().zip(self.colors.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black_white() -> ColorGradient {
        ColorGradient::builder()
            .add(1.0, Argb::WHITE)
            .add(0.0, Argb::BLACK)
            .build()
            .unwrap()
    }

    #[test]
    fn channels_round_trip() {
        let c = Argb::from_channels(0x12, 0x34, 0x56, 0x78);
        assert_eq!(c.0, 0x1234_5678);
        assert_eq!((c.alpha(), c.red(), c.green(), c.blue()), (0x12, 0x34, 0x56, 0x78));
        assert_eq!(c.to_rgba(), [0x34, 0x56, 0x78, 0x12]);
        assert_eq!(c.to_string(), "#12345678");
    }

    #[test]
    fn black_to_white_mapping() {
        let g = black_white();
        assert_eq!(g.map(0.0), Argb::BLACK);
        assert_eq!(g.map(1.0), Argb::WHITE);
        assert_eq!(g.map(-1.0), Argb::BLACK, "below range clamps to lowest stop");
        assert_eq!(g.map(2.0), Argb::WHITE, "above range clamps to highest stop");

        let mid = g.map(0.5);
        assert_eq!(mid.alpha(), 0xff);
        for ch in [mid.red(), mid.green(), mid.blue()] {
            assert!((127..=128).contains(&ch), "mid-gray channel was {ch}");
        }
    }

    #[test]
    fn interpolation_weights_by_position() {
        let g = ColorGradient::builder()
            .add(0.0, Argb::opaque(0, 0, 0))
            .add(4.0, Argb::opaque(200, 100, 40))
            .build()
            .unwrap();
        assert_eq!(g.map(1.0), Argb::opaque(50, 25, 10));
        assert_eq!(g.map(3.0), Argb::opaque(150, 75, 30));
    }

    #[test]
    fn unsorted_stops_are_sorted() {
        let g = ColorGradient::builder()
            .add_all([(2.0, Argb::WHITE), (-1.0, Argb::BLACK), (0.5, Argb::opaque(1, 2, 3))])
            .build()
            .unwrap();
        let keys: Vec<f64> = g.stops().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![-1.0, 0.5, 2.0]);
        assert_eq!(g.map(0.5), Argb::opaque(1, 2, 3));
    }

    #[test]
    fn single_stop_maps_everything() {
        let c = Argb::opaque(9, 8, 7);
        let g = ColorGradient::builder().add(3.0, c).build().unwrap();
        for v in [-100.0, 3.0, 1e9] {
            assert_eq!(g.map(v), c);
        }
    }

    #[test]
    fn build_validates_stops() {
        assert!(matches!(GradientBuilder::new().build(), Err(FractalError::InvalidArgument(_))));
        let nan = GradientBuilder::new().add(f64::NAN, Argb::BLACK).build();
        assert!(matches!(nan, Err(FractalError::InvalidArgument(_))));
    }

    #[test]
    fn blend_rounds_half_up() {
        let a = Argb::from_channels(255, 255, 0, 1);
        let b = Argb::from_channels(255, 0, 255, 0);
        assert_eq!(a.blend(b, 1.0), a);
        assert_eq!(a.blend(b, 0.0), b);
        assert_eq!(a.blend(b, 0.5), Argb::from_channels(255, 128, 128, 1));
    }

    #[test]
    fn parse_color_formats() {
        assert_eq!(parse_color("#001a4b").unwrap(), Argb(0xff00_1a4b));
        assert_eq!(parse_color("0x80ff0000").unwrap(), Argb(0x80ff_0000));
        assert_eq!(parse_color("0XFFFFFF").unwrap(), Argb::WHITE);
        assert_eq!(parse_color("fff").unwrap(), Argb(0xff00_0fff), "short input is not expanded");
        assert_eq!("#00000000".parse::<Argb>().unwrap(), Argb(0));
    }

    #[test]
    fn parse_color_rejects_bad_input() {
        assert!(matches!(parse_color("-"), Err(FractalError::InvalidArgument(_))));
        assert!(matches!(parse_color("#-00ff00"), Err(FractalError::InvalidArgument(_))));
        assert!(matches!(parse_color("#zzzzzz"), Err(FractalError::ColorFormat(_))));
        assert!(matches!(parse_color("#"), Err(FractalError::ColorFormat(_))));
        assert!(matches!(parse_color("+fffff"), Err(FractalError::ColorFormat(_))));
        assert!(matches!(parse_color("123456789"), Err(FractalError::ColorFormat(_))));
    }

    #[test]
    fn gradient_from_json_stops() {
        let json = r##"[{"value": 1.0, "color": "#ffffff"}, {"value": 0.0, "color": "#000000"}]"##;
        assert_eq!(ColorGradient::from_json(json).unwrap(), black_white());
        assert!(matches!(ColorGradient::from_json("{"), Err(FractalError::Params(_))));
        let bad = r##"[{"value": 0.0, "color": "nope"}]"##;
        assert!(matches!(ColorGradient::from_json(bad), Err(FractalError::ColorFormat(_))));
    }

    #[test]
    fn grayscale_matches_built_gradient() {
        assert_eq!(ColorGradient::grayscale(), black_white());
    }
}
