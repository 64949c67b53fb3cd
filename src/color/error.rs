use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ColorScaleError {
    #[error("A color scale needs at least two stops, got {0}")]
    TooFewStops(usize),

    #[error("Invalid color scale domain [{vmin}, {vmax}]: bounds must be finite and vmin < vmax")]
    InvalidDomain { vmin: f64, vmax: f64 },

    #[error("A stepped color scale needs at least one bin")]
    ZeroBins,

    #[error("Invalid color '{0}', expected '#rrggbb'")]
    InvalidColor(String),
}
