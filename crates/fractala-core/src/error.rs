//! Error hierarchy shared by every fallible operation in the crate.

use thiserror::Error;

/// Root error type for projection, grid and gradient failures.
#[derive(Error, Debug)]
pub enum FractalError {
    /// A parameter was out of range, non-finite, or otherwise unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A lookup was made for something that was never populated.
    #[error("not found: {0}")]
    NotFound(String),

    /// A required construction field was left unset.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A grid coordinate fell outside the grid.
    #[error("index ({x}, {y}) out of range for {width}x{height} grid")]
    IndexOutOfRange {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    /// A color string was not valid hexadecimal.
    #[error("malformed color {0:?}")]
    ColorFormat(String),

    /// A parameter record could not be decoded.
    #[error("parameter decoding error: {0}")]
    Params(#[from] serde_json::Error),
}

impl FractalError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, FractalError>;

/// Fail with `InvalidArgument` unless `value` is finite.
pub(crate) fn ensure_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FractalError::invalid(format!("{name} must be finite, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_rejects_nan_and_infinity() {
        assert!(ensure_finite("x", 1.5).is_ok());
        assert!(matches!(ensure_finite("x", f64::NAN), Err(FractalError::InvalidArgument(_))));
        assert!(matches!(
            ensure_finite("x", f64::NEG_INFINITY),
            Err(FractalError::InvalidArgument(_))
        ));
    }

    #[test]
    fn index_error_message_names_dimensions() {
        let e = FractalError::IndexOutOfRange { x: 4, y: 1, width: 4, height: 2 };
        assert_eq!(e.to_string(), "index (4, 1) out of range for 4x2 grid");
    }
}
