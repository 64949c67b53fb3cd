//! Piecewise-linear mapping from a concentration to a marker color.

use crate::color::error::ColorScaleError;
use crate::color::rgb::Rgb;
use bon::bon;
use serde::{Deserialize, Serialize};

/// Substituted for a missing value when a color is structurally required.
pub const VALUE_FLOOR_SENTINEL: f64 = 1.0;

/// How a value's position within the domain is turned into a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalePolicy {
    /// Smooth gradient through every stop.
    #[default]
    Continuous,
    /// The domain is cut into `bins` equal-width bins, each painted with a single
    /// color sampled from the continuous gradient.
    Stepped { bins: usize },
}

/// One tick of the legend handed to the rendering side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LegendEntry {
    pub value: f64,
    pub color: Rgb,
}

/// Maps concentrations onto colors over a fixed `[vmin, vmax]` domain.
///
/// The stops are spread evenly across the domain. Values outside the domain are
/// clamped to the first or last stop; blooms routinely exceed the nominal maximum.
///
/// # Examples
///
/// ```
/// use hab_monitor::{ColorScale, Rgb, ScalePolicy};
///
/// let scale = ColorScale::builder()
///     .vmin(0.0)
///     .vmax(100.0)
///     .stops(vec![Rgb(0, 0, 0), Rgb(200, 200, 200)])
///     .build()?;
///
/// assert_eq!(scale.color_for(50.0), Rgb(100, 100, 100));
/// assert_eq!(scale.color_for(1e9), Rgb(200, 200, 200));
/// # Ok::<(), hab_monitor::ColorScaleError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    vmin: f64,
    vmax: f64,
    stops: Vec<Rgb>,
    policy: ScalePolicy,
    caption: String,
}

#[bon]
impl ColorScale {
    /// Validates and builds a scale.
    ///
    /// # Errors
    ///
    /// Returns [`ColorScaleError::TooFewStops`] for fewer than two stops,
    /// [`ColorScaleError::InvalidDomain`] unless `vmin < vmax` and both are finite,
    /// and [`ColorScaleError::ZeroBins`] for a stepped policy without bins.
    #[builder]
    pub fn new(
        vmin: f64,
        vmax: f64,
        stops: Vec<Rgb>,
        #[builder(default)] policy: ScalePolicy,
        #[builder(default, into)] caption: String,
    ) -> Result<Self, ColorScaleError> {
        if stops.len() < 2 {
            return Err(ColorScaleError::TooFewStops(stops.len()));
        }
        if !vmin.is_finite() || !vmax.is_finite() || vmin >= vmax {
            return Err(ColorScaleError::InvalidDomain { vmin, vmax });
        }
        if policy == (ScalePolicy::Stepped { bins: 0 }) {
            return Err(ColorScaleError::ZeroBins);
        }
        Ok(Self {
            vmin,
            vmax,
            stops,
            policy,
            caption,
        })
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.vmin, self.vmax)
    }

    pub fn policy(&self) -> ScalePolicy {
        self.policy
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Color for a concentration. NaN is treated like a value below the domain.
    pub fn color_for(&self, value: f64) -> Rgb {
        let fraction = self.fraction(value);
        match self.policy {
            ScalePolicy::Continuous => self.sample(fraction),
            ScalePolicy::Stepped { bins } => {
                let bin = ((fraction * bins as f64).floor() as usize).min(bins - 1);
                let bin_fraction = if bins > 1 {
                    bin as f64 / (bins - 1) as f64
                } else {
                    0.0
                };
                self.sample(bin_fraction)
            }
        }
    }

    /// Like [`ColorScale::color_for`], substituting [`VALUE_FLOOR_SENTINEL`] for a
    /// missing value.
    pub fn color_for_optional(&self, value: Option<f64>) -> Rgb {
        self.color_for(value.unwrap_or(VALUE_FLOOR_SENTINEL))
    }

    /// Evenly spaced ticks from `vmin` to `vmax` (at least two).
    pub fn legend(&self, ticks: usize) -> Vec<LegendEntry> {
        let ticks = ticks.max(2);
        (0..ticks)
            .map(|i| {
                let value = self.vmin + (self.vmax - self.vmin) * i as f64 / (ticks - 1) as f64;
                LegendEntry {
                    value,
                    color: self.color_for(value),
                }
            })
            .collect()
    }

    fn fraction(&self, value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        ((value - self.vmin) / (self.vmax - self.vmin)).clamp(0.0, 1.0)
    }

    fn sample(&self, fraction: f64) -> Rgb {
        let segments = self.stops.len() - 1;
        let position = fraction * segments as f64;
        let index = (position.floor() as usize).min(segments - 1);
        self.stops[index].lerp(self.stops[index + 1], position - index as f64)
    }
}
