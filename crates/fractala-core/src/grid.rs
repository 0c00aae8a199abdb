//! Dense row-major scalar grids.
//!
//! A [`GridBuilder`] is the writable form used while a projection is being
//! evaluated; [`Grid`] is the finished, immutable form handed to callers for
//! merging, normalization and color export.

use rayon::prelude::*;
use tracing::trace;

use crate::error::{ensure_finite, FractalError, Result};

/// Upper bound (exclusive) on `width × height`.
pub const MAX_CELLS: usize = i32::MAX as usize - 5;

/// Cells per task when merging in parallel.
const MERGE_CHUNK: usize = 20_000;

fn check_dimensions(width: usize, height: usize) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(FractalError::invalid(format!(
            "grid dimensions must be positive, got {width}x{height}"
        )));
    }
    match width.checked_mul(height) {
        Some(size) if size < MAX_CELLS => Ok(size),
        _ => Err(FractalError::invalid(format!(
            "grid of {width}x{height} exceeds the {MAX_CELLS} cell limit"
        ))),
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Writable grid. All cells start at 0.0.
#[derive(Debug, Clone)]
pub struct GridBuilder {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl GridBuilder {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let size = check_dimensions(width, height)?;
        Ok(Self { width, height, data: vec![0.0; size] })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Result<f64> {
        let i = self.checked_index(x, y)?;
        Ok(self.data[i])
    }

    pub fn set(&mut self, x: usize, y: usize, value: f64) -> Result<&mut Self> {
        let i = self.checked_index(x, y)?;
        self.data[i] = value;
        Ok(self)
    }

    /// All cells, row-major. Disjoint runs of rows can be split off with
    /// `split_at_mut` and written by different workers.
    pub(crate) fn cells_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Finish the grid. The builder is consumed, so no further writes can
    /// reach the result.
    pub fn build(self) -> Grid {
        Grid { width: self.width, height: self.height, data: self.data }
    }

    /// Copy the current contents into an immutable grid, leaving the builder
    /// usable.
    pub fn snapshot(&self) -> Grid {
        Grid { width: self.width, height: self.height, data: self.data.clone() }
    }

    fn checked_index(&self, x: usize, y: usize) -> Result<usize> {
        if x < self.width && y < self.height {
            Ok(y * self.width + x)
        } else {
            Err(FractalError::IndexOutOfRange { x, y, width: self.width, height: self.height })
        }
    }
}

// ── Grid ──────────────────────────────────────────────────────────────────────

/// Immutable dense grid of f64 values, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl Grid {
    /// Wrap existing row-major data. `data.len()` must equal `width × height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<f64>) -> Result<Self> {
        let size = check_dimensions(width, height)?;
        if data.len() != size {
            return Err(FractalError::invalid(format!(
                "expected {size} values for a {width}x{height} grid, got {}",
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    /// Build from nested rows (`rows[y][x]`). Every row must have equal length.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        if rows.iter().any(|r| r.as_ref().len() != width) {
            return Err(FractalError::invalid("rows must all have the same length"));
        }
        let data = rows.iter().flat_map(|r| r.as_ref().iter().copied()).collect();
        Self::from_vec(width, rows.len(), data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major position of `(x, y)`. Not bounds-checked.
    #[inline]
    pub fn index_of(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> Result<f64> {
        if x < self.width && y < self.height {
            Ok(self.data[self.index_of(x, y)])
        } else {
            Err(FractalError::IndexOutOfRange { x, y, width: self.width, height: self.height })
        }
    }

    /// Read-only view of the row-major values.
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn row(&self, y: usize) -> Option<&[f64]> {
        self.data.chunks_exact(self.width).nth(y)
    }

    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    // ── Merging ───────────────────────────────────────────────────────────────

    /// Combine grids cell by cell, sequentially.
    ///
    /// `combine` receives every operand's value at one position (in operand
    /// order) and returns the output value. All operands must share the same
    /// dimensions.
    pub fn merge<F>(combine: F, grids: &[&Grid]) -> Result<Grid>
    where
        F: Fn(&[f64]) -> f64,
    {
        let (width, height) = common_dimensions(grids)?;
        trace!(operands = grids.len(), width, height, "merging grids");
        let mut cell = vec![0.0; grids.len()];
        let data = (0..width * height)
            .map(|i| {
                for (slot, g) in cell.iter_mut().zip(grids) {
                    *slot = g.data[i];
                }
                combine(&cell)
            })
            .collect();
        Ok(Grid { width, height, data })
    }

    /// Parallel form of [`Grid::merge`]. Cells are computed concurrently in no
    /// particular order, so `combine` must be free of side effects.
    pub fn merge_parallel<F>(combine: F, grids: &[&Grid]) -> Result<Grid>
    where
        F: Fn(&[f64]) -> f64 + Sync,
    {
        let (width, height) = common_dimensions(grids)?;
        trace!(operands = grids.len(), width, height, "merging grids in parallel");
        let mut data = vec![0.0; width * height];
        data.par_chunks_mut(MERGE_CHUNK).enumerate().for_each(|(chunk, out)| {
            let base = chunk * MERGE_CHUNK;
            let mut cell = vec![0.0; grids.len()];
            for (offset, v) in out.iter_mut().enumerate() {
                for (slot, g) in cell.iter_mut().zip(grids) {
                    *slot = g.data[base + offset];
                }
                *v = combine(&cell);
            }
        });
        Ok(Grid { width, height, data })
    }

    pub fn sum_of(grids: &[&Grid]) -> Result<Grid> {
        Self::merge(|v| v.iter().sum(), grids)
    }

    pub fn average_of(grids: &[&Grid]) -> Result<Grid> {
        Self::merge(|v| v.iter().sum::<f64>() / v.len() as f64, grids)
    }

    // ── Normalization ─────────────────────────────────────────────────────────

    /// Rescale so the minimum becomes 0.0 and the maximum 1.0.
    /// A constant grid maps every cell to 0.5.
    pub fn normalize(&self) -> Grid {
        self.rescale(0.0, 1.0)
    }

    /// Rescale so the minimum becomes `low` and the maximum `high`.
    /// A constant grid maps every cell to the midpoint of the range.
    pub fn normalize_to(&self, low: f64, high: f64) -> Result<Grid> {
        ensure_finite("low", low)?;
        ensure_finite("high", high)?;
        if low > high {
            return Err(FractalError::invalid(format!(
                "low ({low}) must not exceed high ({high})"
            )));
        }
        Ok(self.rescale(low, high))
    }

    fn rescale(&self, low: f64, high: f64) -> Grid {
        let data = match self.unit_scale() {
            Some(unit) => self
                .data
                .iter()
                .map(|&v| {
                    let t = unit(v);
                    low * (1.0 - t) + high * t
                })
                .collect(),
            None => vec![low / 2.0 + high / 2.0; self.data.len()],
        };
        Grid { width: self.width, height: self.height, data }
    }

    /// Maps `[min, max]` onto `[0, 1]`, or `None` for a constant grid.
    ///
    /// Works on halves so the span of any two finite values stays finite.
    fn unit_scale(&self) -> Option<impl Fn(f64) -> f64> {
        let half_min = self.min() / 2.0;
        let span = self.max() / 2.0 - half_min;
        (span > 0.0).then(move || move |v: f64| ((v / 2.0 - half_min) / span).clamp(0.0, 1.0))
    }

    // ── Export ────────────────────────────────────────────────────────────────

    /// Map every cell to a packed `0xAARRGGBB` color, row-major.
    /// `color` is called concurrently and must be pure.
    pub fn to_argb<F>(&self, color: F) -> Vec<u32>
    where
        F: Fn(f64) -> u32 + Sync,
    {
        self.data.par_iter().map(|&v| color(v)).collect()
    }

    /// 8-bit grayscale, minimum at 0 and maximum at 255, floored.
    /// A constant grid is all zeros.
    pub fn to_luma8(&self) -> Vec<u8> {
        match self.unit_scale() {
            Some(unit) => self.data.iter().map(|&v| (unit(v) * 255.0) as u8).collect(),
            None => vec![0; self.data.len()],
        }
    }
}

fn common_dimensions(grids: &[&Grid]) -> Result<(usize, usize)> {
    let first = grids
        .first()
        .ok_or_else(|| FractalError::invalid("merge needs at least one grid"))?;
    let (width, height) = (first.width, first.height);
    for g in &grids[1..] {
        if g.width != width || g.height != height {
            return Err(FractalError::invalid(format!(
                "grid dimensions differ: {width}x{height} vs {}x{}",
                g.width, g.height
            )));
        }
    }
    Ok((width, height))
}
