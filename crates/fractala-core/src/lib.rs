//! Fractal noise projected onto equirectangular grids.
//!
//! Build a [`Fractal`] (or a single [`Layer`]) over a noise source, evaluate
//! it into a [`Grid`] in parallel, normalize, and color it with a
//! [`ColorGradient`]:
//!
//! ```no_run
//! use fractala_core::{presets, ColorGradient, Projection};
//!
//! let grid = presets::simplex_fractal(42, 9)?.evaluate()?.normalize();
//! let gradient = ColorGradient::grayscale();
//! let pixels = grid.to_argb(|v| gradient.map(v).0);
//! # Ok::<(), fractala_core::FractalError>(())
//! ```

pub mod error;
pub mod gradient;
pub mod grid;
pub mod noise;
pub mod presets;
pub mod projection;
pub mod sphere;
pub mod trig_cache;

pub use error::{FractalError, Result};
pub use gradient::{parse_color, Argb, ColorGradient, GradientBuilder, GradientStop};
pub use grid::{Grid, GridBuilder};
pub use noise::{Cellular, Coherent, NoiseKind, NoiseSource, ProjectionFilter, Ridged, Turbulence};
pub use presets::{FilterKind, FractalParams};
pub use projection::{Fractal, FractalConfig, Layer, LayerConfig, Octaves, Projection};
pub use sphere::Point;
pub use trig_cache::{TrigCache, TrigTables};
