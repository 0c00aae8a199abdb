//! Equirectangular projections of 3-D noise and their parallel evaluation.
//!
//! A projection of power `p` covers a `2^p × 2^(p-1)` grid that wraps around
//! a sphere: `x` walks the azimuth over [0, 2π) and `y` the inclination over
//! [0, π). [`Layer`] samples one octave of noise, [`Fractal`] sums several,
//! and callers can supply their own [`Projection`] implementations.

pub mod fractal;
pub mod layer;

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::error::{FractalError, Result};
use crate::grid::{Grid, GridBuilder};

pub use fractal::{Fractal, FractalConfig, Octaves};
pub use layer::{Layer, LayerConfig};

/// Runs of fewer rows than this are filled sequentially.
pub const FORK_THRESHOLD: usize = 4;

/// A grid of values that can be computed one pixel at a time.
pub trait Projection: Send + Sync {
    /// Value at pixel `(x, y)`. Callers keep `x < 2^power` and
    /// `y < 2^(power-1)`; implementations need not re-check.
    fn value_at(&self, x: usize, y: usize) -> f64;

    /// Power of two giving the grid size.
    fn power(&self) -> u32;

    /// Evaluate every pixel in parallel. See [`evaluate`].
    fn evaluate(&self) -> Result<Grid>
    where
        Self: Sized,
    {
        evaluate(self)
    }
}

impl<P: Projection + ?Sized> Projection for Arc<P> {
    #[inline]
    fn value_at(&self, x: usize, y: usize) -> f64 {
        (**self).value_at(x, y)
    }

    fn power(&self) -> u32 {
        (**self).power()
    }
}

impl<P: Projection + ?Sized> Projection for &P {
    #[inline]
    fn value_at(&self, x: usize, y: usize) -> f64 {
        (**self).value_at(x, y)
    }

    fn power(&self) -> u32 {
        (**self).power()
    }
}

/// `(width, height)` of a projection of the given power.
pub fn dimensions(power: u32) -> Result<(usize, usize)> {
    if power == 0 {
        return Err(FractalError::invalid("projection power must be at least 1"));
    }
    let width = 1usize
        .checked_shl(power)
        .ok_or_else(|| FractalError::invalid(format!("projection power {power} is too large")))?;
    Ok((width, width / 2))
}

/// Fill a dense grid by calling `value_at` for every pixel.
///
/// The row range is bisected with `rayon::join` down to leaves of fewer than
/// [`FORK_THRESHOLD`] rows. Each leaf writes its own disjoint run of rows
/// straight into the grid, so no locking or scratch copy is involved. Blocks
/// until every pixel is done.
pub fn evaluate<P: Projection + ?Sized>(projection: &P) -> Result<Grid> {
    let power = projection.power();
    let (width, height) = dimensions(power)?;
    let mut grid = GridBuilder::new(width, height)?;
    let started = Instant::now();

    fill_rows(projection, grid.cells_mut(), 0, width);

    debug!(
        power,
        width,
        height,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "evaluated projection"
    );
    Ok(grid.build())
}

/// `rows` holds whole rows starting at row `first`, each `width` cells long.
fn fill_rows<P: Projection + ?Sized>(projection: &P, rows: &mut [f64], first: usize, width: usize) {
    let count = rows.len() / width;
    if count < FORK_THRESHOLD {
        for (i, row) in rows.chunks_exact_mut(width).enumerate() {
            let y = first + i;
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = projection.value_at(x, y);
            }
        }
    } else {
        let mid = count / 2;
        let (top, bottom) = rows.split_at_mut(mid * width);
        rayon::join(
            || fill_rows(projection, top, first, width),
            || fill_rows(projection, bottom, first + mid, width),
        );
    }
}
