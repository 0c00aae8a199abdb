//! Multi-octave projection: a stack of layers summed pixel by pixel.
//!
//! Octave `i` samples the shared noise on a sphere of radius `lacunarity^i`
//! and is weighted by `persistence^i`, so each octave adds finer, fainter
//! detail.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::layer::{LayerConfig, MIN_LAYER_POWER};
use super::{Layer, Projection};
use crate::error::{ensure_finite, FractalError, Result};
use crate::noise::{NoiseSource, ProjectionFilter};
use crate::sphere::Point;
use crate::trig_cache::{TrigCache, MAX_POWER};

/// Which octave indices a fractal is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Octaves {
    /// Indices `0..n`. `n` must be at least 1.
    Count(u32),
    /// An explicit, non-empty index sequence, used in the order given.
    Indices(Vec<i32>),
}

impl Default for Octaves {
    fn default() -> Self {
        Octaves::Count(6)
    }
}

impl Octaves {
    fn resolve(&self) -> Result<Vec<i32>> {
        match self {
            Octaves::Count(0) => Err(FractalError::invalid("octave count must be at least 1")),
            Octaves::Count(n) => {
                let n = i32::try_from(*n)
                    .map_err(|_| FractalError::invalid(format!("octave count {n} is too large")))?;
                Ok((0..n).collect())
            }
            Octaves::Indices(v) if v.is_empty() => {
                Err(FractalError::invalid("octave index sequence must not be empty"))
            }
            Octaves::Indices(v) => Ok(v.clone()),
        }
    }
}

/// Construction parameters for [`Fractal::new`].
#[derive(Clone)]
pub struct FractalConfig {
    /// Required.
    pub noise: Option<Arc<dyn NoiseSource>>,
    /// Required.
    pub origin: Option<Point>,
    pub power: u32,
    /// Per-octave frequency growth.
    pub lacunarity: f64,
    /// Per-octave amplitude decay.
    pub persistence: f64,
    pub octaves: Octaves,
    /// Shared by every octave.
    pub filters: Vec<Arc<dyn ProjectionFilter>>,
    /// Falls back to [`TrigCache::shared`]. Populated for `power` if needed.
    pub cache: Option<Arc<TrigCache>>,
}

impl Default for FractalConfig {
    fn default() -> Self {
        Self {
            noise: None,
            origin: None,
            power: 10,
            lacunarity: 2.0,
            persistence: 0.5,
            octaves: Octaves::default(),
            filters: Vec::new(),
            cache: None,
        }
    }
}

impl fmt::Debug for FractalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FractalConfig")
            .field("noise", &self.noise.is_some())
            .field("origin", &self.origin)
            .field("power", &self.power)
            .field("lacunarity", &self.lacunarity)
            .field("persistence", &self.persistence)
            .field("octaves", &self.octaves)
            .field("filters", &self.filters.len())
            .field("cache", &self.cache.is_some())
            .finish()
    }
}

/// Sum of several projections of equal power.
///
/// `Fractal::new` stacks [`Layer`]s; `Fractal::of` accepts any projections,
/// including `Arc<dyn Projection>` for mixed stacks.
#[derive(Debug, Clone, PartialEq)]
pub struct Fractal<P = Layer> {
    octaves: Vec<P>,
    power: u32,
}

impl Fractal<Layer> {
    pub fn new(config: FractalConfig) -> Result<Self> {
        let power = config.power;
        if !(MIN_LAYER_POWER..=MAX_POWER).contains(&power) {
            return Err(FractalError::invalid(format!(
                "fractal power must be between {MIN_LAYER_POWER} and {MAX_POWER}, got {power}"
            )));
        }
        ensure_finite("lacunarity", config.lacunarity)?;
        ensure_finite("persistence", config.persistence)?;
        let indices = config.octaves.resolve()?;

        let cache = config.cache.unwrap_or_else(TrigCache::shared);
        cache.populate(power)?;

        let layers = indices
            .iter()
            .map(|&i| {
                Layer::new(LayerConfig {
                    noise: config.noise.clone(),
                    origin: config.origin,
                    power,
                    frequency: config.lacunarity.powi(i),
                    amplitude: config.persistence.powi(i),
                    filters: config.filters.clone(),
                    cache: Some(Arc::clone(&cache)),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            power,
            octaves = layers.len(),
            lacunarity = config.lacunarity,
            persistence = config.persistence,
            "built fractal"
        );
        Self::of(layers)
    }
}

impl<P: Projection> Fractal<P> {
    /// Compose arbitrary projections. The list must be non-empty and every
    /// member must report the same power.
    pub fn of(octaves: Vec<P>) -> Result<Self> {
        let power = octaves
            .first()
            .map(Projection::power)
            .ok_or_else(|| FractalError::invalid("a fractal needs at least one octave"))?;
        if let Some(other) = octaves.iter().map(Projection::power).find(|&p| p != power) {
            return Err(FractalError::invalid(format!(
                "octave power mismatch: {other} vs {power}"
            )));
        }
        Ok(Self { octaves, power })
    }

    pub fn octaves(&self) -> &[P] {
        &self.octaves
    }
}

impl<P: Projection> Projection for Fractal<P> {
    #[inline]
    fn value_at(&self, x: usize, y: usize) -> f64 {
        self.octaves.iter().map(|o| o.value_at(x, y)).sum()
    }

    fn power(&self) -> u32 {
        self.power
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::NoiseKind;
    use approx::assert_relative_eq;

    fn config(power: u32) -> FractalConfig {
        FractalConfig {
            noise: Some(NoiseKind::Perlin.source(3)),
            origin: Some(Point::new(-12.5, 4.0, 33.0).unwrap()),
            power,
            cache: Some(Arc::new(TrigCache::new())),
            ..Default::default()
        }
    }

    #[test]
    fn octave_parameters_follow_lacunarity_and_persistence() {
        let f = Fractal::new(FractalConfig { lacunarity: 3.0, persistence: 0.25, ..config(4) }).unwrap();
        assert_eq!(f.octaves().len(), 6);
        for (i, layer) in f.octaves().iter().enumerate() {
            assert_relative_eq!(layer.frequency(), 3.0f64.powi(i as i32));
            assert_relative_eq!(layer.amplitude(), 0.25f64.powi(i as i32));
            assert_eq!(layer.power(), 4);
        }
    }

    #[test]
    fn explicit_indices_are_used_in_order() {
        let f = Fractal::new(FractalConfig { octaves: Octaves::Indices(vec![3, 1]), ..config(4) }).unwrap();
        let freqs: Vec<f64> = f.octaves().iter().map(Layer::frequency).collect();
        assert_eq!(freqs, vec![8.0, 2.0]);
    }

    #[test]
    fn value_is_sum_of_octaves() {
        let f = Fractal::new(config(5)).unwrap();
        for y in 0..16 {
            for x in (0..32).step_by(3) {
                let expected: f64 = f.octaves().iter().map(|o| o.value_at(x, y)).sum();
                assert_eq!(f.value_at(x, y).to_bits(), expected.to_bits());
            }
        }
    }

    #[test]
    fn non_positive_octave_counts_are_rejected() {
        let zero = FractalConfig { octaves: Octaves::Count(0), ..config(4) };
        assert!(matches!(Fractal::new(zero), Err(FractalError::InvalidArgument(_))));
        let empty = FractalConfig { octaves: Octaves::Indices(vec![]), ..config(4) };
        assert!(matches!(Fractal::new(empty), Err(FractalError::InvalidArgument(_))));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(Fractal::new(config(1)).is_err());
        assert!(Fractal::new(config(16)).is_err());
        assert!(Fractal::new(FractalConfig { lacunarity: f64::NAN, ..config(4) }).is_err());
        assert!(Fractal::new(FractalConfig { persistence: f64::INFINITY, ..config(4) }).is_err());
        let no_noise = FractalConfig { noise: None, ..config(4) };
        assert!(matches!(Fractal::new(no_noise), Err(FractalError::MissingField("noise"))));
    }

    #[test]
    fn missing_cache_uses_and_populates_shared_cache() {
        let f = Fractal::new(FractalConfig { cache: None, ..config(7) }).unwrap();
        assert!(TrigCache::shared().contains(7));
        assert!(Arc::ptr_eq(f.octaves()[0].cache(), &TrigCache::shared()));
    }

    #[test]
    fn of_checks_emptiness_and_power() {
        let a = Fractal::new(config(4)).unwrap();
        let b = Fractal::new(config(5)).unwrap();
        assert!(matches!(Fractal::<Layer>::of(vec![]), Err(FractalError::InvalidArgument(_))));
        let mixed: Vec<Arc<dyn Projection>> = vec![Arc::new(a.clone()), Arc::new(b)];
        assert!(matches!(Fractal::of(mixed), Err(FractalError::InvalidArgument(_))));

        let layer: Arc<dyn Projection> = Arc::new(a.octaves()[0].clone());
        let nested: Vec<Arc<dyn Projection>> = vec![Arc::new(a.clone()), layer];
        let f = Fractal::of(nested).unwrap();
        assert_eq!(f.power(), 4);
        let expected = a.value_at(2, 3) + a.octaves()[0].value_at(2, 3);
        assert_eq!(f.value_at(2, 3).to_bits(), expected.to_bits());
    }

    #[test]
    fn equality_is_structural() {
        let cfg = config(4);
        let a = Fractal::new(cfg.clone()).unwrap();
        let b = Fractal::new(cfg.clone()).unwrap();
        assert_eq!(a, b);
        let c = Fractal::new(FractalConfig { octaves: Octaves::Count(5), ..cfg }).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn evaluation_is_dense() {
        let grid = Fractal::new(config(6)).unwrap().evaluate().unwrap();
        assert_eq!((grid.width(), grid.height()), (64, 32));
        assert!(grid.values().iter().all(|v| v.is_finite()));
        assert!(grid.max() > grid.min(), "fractal noise should not be flat");
    }
}
