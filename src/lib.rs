mod color;
mod config;
mod error;
mod filtering;
mod monitor;
mod projection;
mod records;
#[cfg(test)]
mod test_utils;
mod trend;
mod types;

pub use error::HabMonitorError;
pub use monitor::*;

pub use config::{ColorScaleConfig, ConfigError, MonitorConfig};

pub use types::any_date::{AnyDate, StartEndDate};
pub use types::lat_lon::LatLon;

pub use color::error::ColorScaleError;
pub use color::rgb::Rgb;
pub use color::scale::{ColorScale, LegendEntry, ScalePolicy, VALUE_FLOOR_SENTINEL};

pub use records::cache::{CacheKey, DatasetCache};
pub use records::columns::{ColumnMapping, CoordinateColumns, DEFAULT_UNITS};
pub use records::coordinates::{build_coordinate_table, SUMMARY_SITE_COLUMN};
pub use records::dataset::{JoinedDataset, LoadReport, MonitoringRecord};
pub use records::dates::parse_date;
pub use records::error::LoadError;
pub use records::loader::RecordLoader;

pub use filtering::{
    default_species, filter, DateSelection, FilterCriteria, MonitoringFrameFilterExt,
    SelectionDefaults, SiteFilter, ALL_SITES,
};
pub use projection::*;
pub use trend::{aggregate, TrendSeriesPoint};
