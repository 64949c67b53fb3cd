//! Canonical column names of a joined dataset and the source-side names they are
//! read from.

use polars::prelude::{DataType, Field, Schema};
use serde::{Deserialize, Serialize};

pub const SITE_NAME: &str = "site_name";
pub const COLLECTED_AT: &str = "collected_at";
pub const SPECIES_NAME: &str = "species_name";
pub const VALUE: &str = "value";
pub const UNITS: &str = "units";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";

/// Unit label applied when the source has no units column or a blank cell.
pub const DEFAULT_UNITS: &str = "cells/L";

/// Column names in the primary monitoring table. Every field except `units` is
/// required; a missing one is a fatal schema error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub site_name: String,
    pub collected_at: String,
    pub species_name: String,
    pub value: String,
    pub units: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            site_name: "Site_Description".to_string(),
            collected_at: "Date_Sample_Collected".to_string(),
            species_name: "Result_Name".to_string(),
            value: "Result_Value_Numeric".to_string(),
            units: "Units".to_string(),
        }
    }
}

/// Column names in the coordinate reference table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinateColumns {
    pub site_name: String,
    pub latitude: String,
    pub longitude: String,
}

impl Default for CoordinateColumns {
    fn default() -> Self {
        Self {
            site_name: "Site_Description".to_string(),
            latitude: "Latitude".to_string(),
            longitude: "Longitude".to_string(),
        }
    }
}

/// Schema shared by every joined dataset, including empty ones.
pub(crate) fn joined_schema() -> Schema {
    Schema::from_iter([
        Field::new(SITE_NAME.into(), DataType::String),
        Field::new(COLLECTED_AT.into(), DataType::Date),
        Field::new(SPECIES_NAME.into(), DataType::String),
        Field::new(VALUE.into(), DataType::Float64),
        Field::new(UNITS.into(), DataType::String),
        Field::new(LATITUDE.into(), DataType::Float64),
        Field::new(LONGITUDE.into(), DataType::Float64),
    ])
}

pub(crate) fn joined_column_names() -> [&'static str; 7] {
    [
        SITE_NAME,
        COLLECTED_AT,
        SPECIES_NAME,
        VALUE,
        UNITS,
        LATITUDE,
        LONGITUDE,
    ]
}
