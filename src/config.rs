//! Typed settings for a [`HabMonitor`](crate::HabMonitor), loadable from JSON.
//!
//! Every field has a default, so a config file only needs the keys it changes.

use crate::color::error::ColorScaleError;
use crate::color::rgb::Rgb;
use crate::color::scale::{ColorScale, ScalePolicy};
use crate::filtering::SelectionDefaults;
use crate::records::columns::{ColumnMapping, CoordinateColumns, DEFAULT_UNITS};
use crate::records::loader::RecordLoader;
use crate::types::lat_lon::LatLon;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("Failed to parse config")]
    ParseStr(#[source] serde_json::Error),

    #[error(transparent)]
    InvalidColorScale(#[from] ColorScaleError),
}

/// Color scale parameters as they appear in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScaleConfig {
    pub vmin: f64,
    pub vmax: f64,
    pub stops: Vec<Rgb>,
    pub policy: ScalePolicy,
    pub caption: String,
}

impl Default for ColorScaleConfig {
    fn default() -> Self {
        Self {
            vmin: 1.0,
            vmax: 500_000.0,
            stops: vec![Rgb::GREEN, Rgb::YELLOW, Rgb::RED],
            policy: ScalePolicy::Continuous,
            caption: "Cell count (cells/L)".to_string(),
        }
    }
}

impl ColorScaleConfig {
    pub fn build(&self) -> Result<ColorScale, ColorScaleError> {
        ColorScale::builder()
            .vmin(self.vmin)
            .vmax(self.vmax)
            .stops(self.stops.clone())
            .policy(self.policy)
            .caption(self.caption.as_str())
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub columns: ColumnMapping,
    pub coordinate_columns: CoordinateColumns,
    pub default_units: String,
    pub selection: SelectionDefaults,
    pub color_scale: ColorScaleConfig,
    /// Where the map centers when there is nothing to fit.
    pub default_center: LatLon,
    pub legend_ticks: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMapping::default(),
            coordinate_columns: CoordinateColumns::default(),
            default_units: DEFAULT_UNITS.to_string(),
            selection: SelectionDefaults::default(),
            color_scale: ColorScaleConfig::default(),
            default_center: LatLon(-34.9, 138.6),
            legend_ticks: 5,
        }
    }
}

impl MonitorConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw =
            fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(ConfigError::ParseStr)
    }

    pub fn loader(&self) -> RecordLoader {
        RecordLoader::new(
            self.columns.clone(),
            self.coordinate_columns.clone(),
            self.default_units.as_str(),
        )
    }
}
