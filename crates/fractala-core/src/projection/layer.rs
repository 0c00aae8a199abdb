//! Single-octave projection: one noise source sampled over one sphere.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::Projection;
use crate::error::{ensure_finite, FractalError, Result};
use crate::noise::{NoiseSource, ProjectionFilter};
use crate::sphere::Point;
use crate::trig_cache::{TrigCache, TrigTables, MAX_POWER};

/// Smallest power a layer accepts.
pub const MIN_LAYER_POWER: u32 = 2;

/// Construction parameters for a [`Layer`].
///
/// Fill in the fields (struct update from `Default` is the usual way) and
/// pass the value to [`Layer::new`], which validates everything at once.
#[derive(Clone)]
pub struct LayerConfig {
    /// Required.
    pub noise: Option<Arc<dyn NoiseSource>>,
    /// Required. Centre of the sampling sphere in noise space.
    pub origin: Option<Point>,
    pub power: u32,
    /// Radius of the sampling sphere. Larger values "zoom out" the noise.
    pub frequency: f64,
    /// Weight applied to the raw noise before filtering.
    pub amplitude: f64,
    /// Applied in order after amplitude scaling.
    pub filters: Vec<Arc<dyn ProjectionFilter>>,
    /// Required, and must already hold tables for `power`.
    pub cache: Option<Arc<TrigCache>>,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            noise: None,
            origin: None,
            power: 10,
            frequency: 1.0,
            amplitude: 1.0,
            filters: Vec::new(),
            cache: None,
        }
    }
}

impl fmt::Debug for LayerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerConfig")
            .field("noise", &self.noise.is_some())
            .field("origin", &self.origin)
            .field("power", &self.power)
            .field("frequency", &self.frequency)
            .field("amplitude", &self.amplitude)
            .field("filters", &self.filters.len())
            .field("cache", &self.cache.is_some())
            .finish()
    }
}

/// One octave of noise projected onto an equirectangular grid.
///
/// Pixel `(x, y)` becomes azimuth `x·2π/w` and inclination `y·2π/w`, which is
/// converted to a point on a sphere of radius `frequency` centred on `origin`.
/// The noise at that point is scaled by `amplitude` and run through the
/// filters. Immutable once built.
#[derive(Clone)]
pub struct Layer {
    noise: Arc<dyn NoiseSource>,
    origin: Point,
    power: u32,
    frequency: f64,
    amplitude: f64,
    filters: Vec<Arc<dyn ProjectionFilter>>,
    cache: Arc<TrigCache>,
    tables: Arc<TrigTables>,
}

impl Layer {
    pub fn new(config: LayerConfig) -> Result<Self> {
        let noise = config.noise.ok_or(FractalError::MissingField("noise"))?;
        let origin = config.origin.ok_or(FractalError::MissingField("origin"))?;
        let cache = config.cache.ok_or(FractalError::MissingField("cache"))?;
        let power = config.power;

        if !(MIN_LAYER_POWER..=MAX_POWER).contains(&power) {
            return Err(FractalError::invalid(format!(
                "layer power must be between {MIN_LAYER_POWER} and {MAX_POWER}, got {power}"
            )));
        }
        ensure_finite("frequency", config.frequency)?;
        ensure_finite("amplitude", config.amplitude)?;
        if !cache.contains(power) {
            return Err(FractalError::invalid(format!(
                "trig cache must be populated for power {power}"
            )));
        }
        let tables = cache.tables(power)?;

        debug!(
            power,
            frequency = config.frequency,
            amplitude = config.amplitude,
            filters = config.filters.len(),
            "built layer"
        );
        Ok(Self {
            noise,
            origin,
            power,
            frequency: config.frequency,
            amplitude: config.amplitude,
            filters: config.filters,
            cache,
            tables,
        })
    }

    /// A config initialised from this layer, for deriving variants.
    pub fn to_config(&self) -> LayerConfig {
        LayerConfig {
            noise: Some(Arc::clone(&self.noise)),
            origin: Some(self.origin),
            power: self.power,
            frequency: self.frequency,
            amplitude: self.amplitude,
            filters: self.filters.clone(),
            cache: Some(Arc::clone(&self.cache)),
        }
    }

    pub fn noise(&self) -> &Arc<dyn NoiseSource> {
        &self.noise
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn filters(&self) -> &[Arc<dyn ProjectionFilter>] {
        &self.filters
    }

    pub fn cache(&self) -> &Arc<TrigCache> {
        &self.cache
    }
}

impl Projection for Layer {
    #[inline]
    fn value_at(&self, x: usize, y: usize) -> f64 {
        let p = Point::from_tables(&self.tables.sine, &self.tables.cosine, self.frequency, x, y);
        let o = self.origin;
        let mut v = self.noise.sample(p.x() + o.x(), p.y() + o.y(), p.z() + o.z()) * self.amplitude;
        for filter in &self.filters {
            v = filter.adjust(v, x, y);
        }
        v
    }

    fn power(&self) -> u32 {
        self.power
    }
}

/// Layers are equal when they share the same noise, filter and cache
/// instances and have identical numeric parameters.
impl PartialEq for Layer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.noise, &other.noise)
            && self.origin == other.origin
            && self.power == other.power
            && self.frequency == other.frequency
            && self.amplitude == other.amplitude
            && self.filters.len() == other.filters.len()
            && self.filters.iter().zip(&other.filters).all(|(a, b)| Arc::ptr_eq(a, b))
            && Arc::ptr_eq(&self.cache, &other.cache)
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("origin", &self.origin)
            .field("power", &self.power)
            .field("frequency", &self.frequency)
            .field("amplitude", &self.amplitude)
            .field("filters", &self.filters.len())
            .finish_non_exhaustive()
    }
}
