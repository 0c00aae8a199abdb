//! Per-pixel post-processing hooks applied after a layer samples its noise.

/// Adjusts a layer's noise response at one pixel.
///
/// Filters run in order; each receives the running value and the pixel
/// coordinate and returns the next value. Returning `value` unchanged is a
/// no-op. Filters run concurrently on rayon workers and must be stateless.
pub trait ProjectionFilter: Send + Sync {
    fn adjust(&self, value: f64, x: usize, y: usize) -> f64;
}

impl<F> ProjectionFilter for F
where
    F: Fn(f64, usize, usize) -> f64 + Send + Sync,
{
    #[inline]
    fn adjust(&self, value: f64, x: usize, y: usize) -> f64 {
        self(value, x, y)
    }
}

/// Folds the noise around zero (`|v|`), producing billowy "turbulent" noise.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Turbulence;

impl ProjectionFilter for Turbulence {
    #[inline]
    fn adjust(&self, value: f64, _x: usize, _y: usize) -> f64 {
        value.abs()
    }
}

/// Inverted turbulence (`1 - |v|`), producing sharp ridges along zero crossings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ridged;

impl ProjectionFilter for Ridged {
    #[inline]
    fn adjust(&self, value: f64, _x: usize, _y: usize) -> f64 {
        1.0 - value.abs()
    }
}
