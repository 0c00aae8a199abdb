//! Cartesian points and the spherical conversions used to wrap noise around
//! a sphere. All operations use f64 precision.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, Result};

/// A point in three-dimensional Cartesian space. Components are always finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 3]", into = "[f64; 3]")]
pub struct Point {
    x: f64,
    y: f64,
    z: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0, z: 0.0 };

    /// Build a point from raw components, rejecting NaN and infinities.
    pub fn new(x: f64, y: f64, z: f64) -> Result<Self> {
        ensure_finite("x", x)?;
        ensure_finite("y", y)?;
        ensure_finite("z", z)?;
        Ok(Self { x, y, z })
    }

    /// Caller guarantees every component is finite.
    pub(crate) const fn from_finite(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert a spherical coordinate to Cartesian space.
    ///
    /// `phi` is the azimuth on [0, 2π), `theta` the inclination on [0, π),
    /// `r` the distance from the origin.
    pub fn from_spherical(r: f64, phi: f64, theta: f64) -> Result<Self> {
        Self::new(
            r * phi.cos() * theta.sin(),
            r * phi.sin() * theta.sin(),
            r * theta.cos(),
        )
    }

    /// Spherical conversion through cached trig tables.
    ///
    /// `x` indexes the azimuth and `y` the inclination in the same tables, which
    /// is what makes an image of height `width / 2` cover exactly [0, π).
    /// Table entries lie in [-1, 1], so a finite `r` gives finite components.
    #[inline]
    pub(crate) fn from_tables(sine: &[f64], cosine: &[f64], r: f64, x: usize, y: usize) -> Self {
        let sin_theta = sine[y];
        Self {
            x: r * cosine[x] * sin_theta,
            y: r * sine[x] * sin_theta,
            z: r * cosine[y],
        }
    }

    #[inline]
    pub fn x(self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y(self) -> f64 {
        self.y
    }

    #[inline]
    pub fn z(self) -> f64 {
        self.z
    }

    /// Multiply every component by `scalar`.
    pub fn scale(self, scalar: f64) -> Result<Self> {
        ensure_finite("scalar", scalar)?;
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }

    /// Component-wise sum of two points. Fails if a sum overflows.
    pub fn translate(self, other: Point) -> Result<Self> {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl TryFrom<[f64; 3]> for Point {
    type Error = crate::error::FractalError;

    fn try_from([x, y, z]: [f64; 3]) -> Result<Self> {
        Self::new(x, y, z)
    }
}

impl From<Point> for [f64; 3] {
    fn from(p: Point) -> Self {
        [p.x, p.y, p.z]
    }
}
