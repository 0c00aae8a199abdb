//! Noise sampling capability consumed by projections.
//!
//! The projection engine treats coherent noise as an opaque function of a 3-D
//! point. Anything that is `Send + Sync` and deterministic can be plugged in:
//! plain closures, the [`Coherent`] adapter over any `noise` crate generator,
//! or one of the stock [`NoiseKind`] generators.

pub mod filter;

use std::fmt;
use std::sync::Arc;

use ::noise::core::worley::{distance_functions, worley_3d, ReturnType};
use ::noise::permutationtable::PermutationTable;
use ::noise::{NoiseFn, OpenSimplex, Perlin, Simplex, Vector3};
use serde::{Deserialize, Serialize};

pub use filter::{ProjectionFilter, Ridged, Turbulence};

/// A stateless, deterministic source of coherent noise over 3-D space.
///
/// Implementations are shared across rayon workers, so identical inputs must
/// always produce identical outputs.
pub trait NoiseSource: Send + Sync {
    fn sample(&self, x: f64, y: f64, z: f64) -> f64;
}

impl<F> NoiseSource for F
where
    F: Fn(f64, f64, f64) -> f64 + Send + Sync,
{
    #[inline]
    fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        self(x, y, z)
    }
}

/// Adapter exposing any 3-D `noise` crate generator as a [`NoiseSource`].
#[derive(Clone)]
pub struct Coherent<N>(pub N);

impl<N> NoiseSource for Coherent<N>
where
    N: NoiseFn<f64, 3> + Send + Sync,
{
    #[inline]
    fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        self.0.get([x, y, z])
    }
}

impl<N> fmt::Debug for Coherent<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Coherent").field(&std::any::type_name::<N>()).finish()
    }
}

/// Cellular (Worley) noise: distance to the nearest feature point, in
/// roughly `[-1, 1]`.
///
/// Runs the `noise` crate's Worley kernel over a bare permutation table;
/// `noise::Worley` keeps its distance function behind an `Rc` and cannot be
/// shared across workers.
#[derive(Debug, Clone, Copy)]
pub struct Cellular {
    table: PermutationTable,
}

impl Cellular {
    pub fn new(seed: u32) -> Self {
        Self { table: PermutationTable::new(seed) }
    }
}

impl NoiseSource for Cellular {
    #[inline]
    fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        worley_3d(
            &self.table,
            distance_functions::euclidean,
            ReturnType::Distance,
            Vector3::new(x, y, z),
        )
    }
}

/// Stock noise generators, selectable from parameter files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoiseKind {
    Perlin,
    #[default]
    Simplex,
    OpenSimplex,
    Cellular,
}

impl NoiseKind {
    /// Instantiate the generator with the given permutation seed.
    pub fn source(self, seed: u32) -> Arc<dyn NoiseSource> {
        match self {
            NoiseKind::Perlin => Arc::new(Coherent(Perlin::new(seed))),
            NoiseKind::Simplex => Arc::new(Coherent(Simplex::new(seed))),
            NoiseKind::OpenSimplex => Arc::new(Coherent(OpenSimplex::new(seed))),
            NoiseKind::Cellular => Arc::new(Cellular::new(seed)),
        }
    }
}

impl fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NoiseKind::Perlin => "perlin",
            NoiseKind::Simplex => "simplex",
            NoiseKind::OpenSimplex => "open-simplex",
            NoiseKind::Cellular => "cellular",
        };
        f.write_str(name)
    }
}
