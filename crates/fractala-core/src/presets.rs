//! Ready-made fractals and the serializable parameter record behind them.
//!
//! Everything here is seeded: the same seed always yields the same noise
//! permutation and the same sampling origin.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::noise::{NoiseKind, ProjectionFilter, Ridged, Turbulence};
use crate::projection::{Fractal, FractalConfig, Octaves};
use crate::sphere::Point;

pub const DEFAULT_OCTAVES: u32 = 6;
pub const DEFAULT_PERSISTENCE: f64 = 0.5;
pub const DEFAULT_LACUNARITY: f64 = 2.0;
pub const DEFAULT_POWER: u32 = 10;

/// Origins are drawn from `[-ORIGIN_EXTENT, ORIGIN_EXTENT)` on each axis.
pub const ORIGIN_EXTENT: f64 = 50.0;

/// Decorrelates the origin stream from the noise permutation seed.
const ORIGIN_SALT: u64 = 0x6A09_E667_F3BC_C909;

/// A uniformly random sampling origin in `[-50, 50)³`.
pub fn random_origin<R: Rng>(rng: &mut R) -> Point {
    let mut axis = || rng.gen_range(-ORIGIN_EXTENT..ORIGIN_EXTENT);
    Point::from_finite(axis(), axis(), axis())
}

/// Origin derived deterministically from `seed`.
pub fn seeded_origin(seed: u64) -> Point {
    random_origin(&mut StdRng::seed_from_u64(seed ^ ORIGIN_SALT))
}

/// Permutation seed for the `noise` crate generators, which take 32 bits.
fn noise_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

/// Default-shaped fractal over one of the stock noise kinds, built on the
/// process-wide trig cache.
pub fn fractal_for(kind: NoiseKind, seed: u64, power: u32) -> Result<Fractal> {
    FractalParams { seed, power, noise: kind, ..Default::default() }.build()
}

pub fn simplex_fractal(seed: u64, power: u32) -> Result<Fractal> {
    fractal_for(NoiseKind::Simplex, seed, power)
}

pub fn perlin_fractal(seed: u64, power: u32) -> Result<Fractal> {
    fractal_for(NoiseKind::Perlin, seed, power)
}

pub fn cellular_fractal(seed: u64, power: u32) -> Result<Fractal> {
    fractal_for(NoiseKind::Cellular, seed, power)
}

// ── Parameter record ────────────────────────────────────────────────────────

/// Stock post-filter selectable from parameter files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    #[default]
    None,
    Turbulence,
    Ridged,
}

/// Everything needed to rebuild a fractal, in a form that round-trips
/// through JSON. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalParams {
    pub seed: u64,
    pub power: u32,
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    pub noise: NoiseKind,
    /// Derived from `seed` when absent.
    pub origin: Option<[f64; 3]>,
    pub filter: FilterKind,
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            seed: 42,
            power: DEFAULT_POWER,
            octaves: DEFAULT_OCTAVES,
            persistence: DEFAULT_PERSISTENCE,
            lacunarity: DEFAULT_LACUNARITY,
            noise: NoiseKind::default(),
            origin: None,
            filter: FilterKind::None,
        }
    }
}

impl FractalParams {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The config these parameters describe. Uses the shared trig cache.
    pub fn to_config(&self) -> Result<FractalConfig> {
        let origin = match self.origin {
            Some(xyz) => Point::try_from(xyz)?,
            None => seeded_origin(self.seed),
        };
        let filters: Vec<Arc<dyn ProjectionFilter>> = match self.filter {
            FilterKind::None => Vec::new(),
            FilterKind::Turbulence => vec![Arc::new(Turbulence)],
            FilterKind::Ridged => vec![Arc::new(Ridged)],
        };
        Ok(FractalConfig {
            noise: Some(self.noise.source(noise_seed(self.seed))),
            origin: Some(origin),
            power: self.power,
            lacunarity: self.lacunarity,
            persistence: self.persistence,
            octaves: Octaves::Count(self.octaves),
            filters,
            cache: None,
        })
    }

    pub fn build(&self) -> Result<Fractal> {
        debug!(seed = self.seed, noise = %self.noise, power = self.power, "building fractal from params");
        Fractal::new(self.to_config()?)
    }
}
