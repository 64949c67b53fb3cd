use crate::color::error::ColorScaleError;
use crate::config::ConfigError;
use crate::records::error::LoadError;
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HabMonitorError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ColorScale(#[from] ColorScaleError),

    #[error("Failed to process monitoring data")]
    DataFrameProcessing(#[from] PolarsError),
}
