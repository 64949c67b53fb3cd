//! Reads the monitoring table and the coordinate reference table and left-joins
//! them on site name.

use crate::records::columns::{
    joined_column_names, ColumnMapping, CoordinateColumns, COLLECTED_AT, LATITUDE, LONGITUDE,
    SITE_NAME, SPECIES_NAME, UNITS, VALUE,
};
use crate::records::dataset::{JoinedDataset, LoadReport};
use crate::records::dates::normalize_date_column;
use crate::records::error::LoadError;
use crate::records::source::{read_table, require_column, SourceTable};
use log::{debug, info, warn};
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

const ROW_INDEX: &str = "__row_index";

/// Loads and joins the two source tables.
///
/// The coordinate table is mandatory: without it nothing can be placed on a map,
/// so its absence is a [`LoadError`]. The primary table is not: when it is
/// missing or empty an empty [`JoinedDataset`] is returned and
/// [`LoadReport::primary_missing`] is set.
///
/// When a site appears more than once in the coordinate table, the first
/// occurrence in source order wins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RecordLoader {
    columns: ColumnMapping,
    coordinate_columns: CoordinateColumns,
    default_units: String,
}

impl Default for RecordLoader {
    fn default() -> Self {
        Self::new(
            ColumnMapping::default(),
            CoordinateColumns::default(),
            crate::records::columns::DEFAULT_UNITS,
        )
    }
}

impl RecordLoader {
    pub fn new(
        columns: ColumnMapping,
        coordinate_columns: CoordinateColumns,
        default_units: impl Into<String>,
    ) -> Self {
        Self {
            columns,
            coordinate_columns,
            default_units: default_units.into(),
        }
    }

    pub fn columns(&self) -> &ColumnMapping {
        &self.columns
    }

    pub fn coordinate_columns(&self) -> &CoordinateColumns {
        &self.coordinate_columns
    }

    pub fn default_units(&self) -> &str {
        &self.default_units
    }

    /// Reads both sources and returns the joined dataset.
    ///
    /// # Errors
    ///
    /// * [`LoadError::CoordinatesMissing`] / [`LoadError::CoordinatesEmpty`] when the
    ///   coordinate table is absent or has no complete rows.
    /// * [`LoadError::MissingColumn`] when either table lacks a required column.
    /// * [`LoadError::UnsupportedFormat`] / [`LoadError::SourceParse`] when a table
    ///   cannot be read at all.
    pub fn load(&self, records: &Path, coordinates: &Path) -> Result<JoinedDataset, LoadError> {
        let coordinates = self.load_coordinates(coordinates)?;

        let raw = match read_table(records)? {
            SourceTable::Loaded(frame) => frame,
            SourceTable::Missing | SourceTable::Empty => {
                warn!(
                    "No monitoring records available at {:?}, continuing with an empty dataset",
                    records
                );
                return Ok(JoinedDataset::empty(LoadReport {
                    primary_missing: true,
                    ..Default::default()
                }));
            }
        };

        let (normalized, mut report) = self.normalize_records(&raw, records)?;
        if raw.height() == 0 {
            warn!(
                "Monitoring table {:?} has a header but no records, continuing with an empty dataset",
                records
            );
            return Ok(JoinedDataset::empty(LoadReport {
                primary_missing: true,
                ..report
            }));
        }
        let expected_rows = normalized.height();

        let joined = normalized
            .lazy()
            .with_row_index(ROW_INDEX, None)
            .with_column(col(UNITS).fill_null(lit(self.default_units.clone())))
            .left_join(coordinates.lazy(), col(SITE_NAME), col(SITE_NAME))
            .sort([ROW_INDEX], SortMultipleOptions::default())
            .select(joined_column_names().map(col))
            .collect()?;

        debug_assert_eq!(joined.height(), expected_rows);
        report.without_coordinates = joined.column(LATITUDE)?.null_count();

        info!(
            "Loaded {} monitoring records from {:?} ({} without coordinates, {} bad dates, {} missing sites)",
            joined.height(),
            records,
            report.without_coordinates,
            report.dropped_bad_dates,
            report.dropped_missing_site
        );
        Ok(JoinedDataset::new(joined, report))
    }

    /// Reads the coordinate table into `site_name`, `latitude`, `longitude` with
    /// one row per site.
    fn load_coordinates(&self, path: &Path) -> Result<DataFrame, LoadError> {
        let raw = match read_table(path)? {
            SourceTable::Loaded(frame) => frame,
            SourceTable::Missing => return Err(LoadError::CoordinatesMissing(path.to_path_buf())),
            SourceTable::Empty => return Err(LoadError::CoordinatesEmpty(path.to_path_buf())),
        };
        let names = &self.coordinate_columns;
        let sites = require_column(&raw, path, &names.site_name)?.cast(&DataType::String)?;
        let latitudes = require_column(&raw, path, &names.latitude)?.cast(&DataType::Float64)?;
        let longitudes = require_column(&raw, path, &names.longitude)?.cast(&DataType::Float64)?;

        let site_ca = sites.str()?;
        let lat_ca = latitudes.f64()?;
        let lon_ca = longitudes.f64()?;

        let mut seen = HashSet::new();
        let mut duplicates = 0usize;
        let keep: Vec<bool> = (0..raw.height())
            .map(|idx| {
                let complete = lat_ca.get(idx).is_some() && lon_ca.get(idx).is_some();
                match site_ca.get(idx) {
                    Some(site) if complete && !site.trim().is_empty() => {
                        let first = seen.insert(site.to_string());
                        if !first {
                            duplicates += 1;
                        }
                        first
                    }
                    _ => false,
                }
            })
            .collect();
        if duplicates > 0 {
            warn!(
                "Coordinate table {:?} lists {} duplicate site rows; keeping the first occurrence of each",
                path, duplicates
            );
        }

        let frame = DataFrame::new(vec![
            sites.with_name(SITE_NAME.into()),
            latitudes.with_name(LATITUDE.into()),
            longitudes.with_name(LONGITUDE.into()),
        ])?
        .filter(&BooleanChunked::from_slice("keep".into(), &keep))?;

        if frame.height() == 0 {
            return Err(LoadError::CoordinatesEmpty(path.to_path_buf()));
        }
        debug!("Loaded coordinates for {} sites from {:?}", frame.height(), path);
        Ok(frame)
    }

    /// Renames and types the primary table's columns and drops rows without a
    /// site or a parseable date.
    fn normalize_records(
        &self,
        raw: &DataFrame,
        path: &Path,
    ) -> Result<(DataFrame, LoadReport), LoadError> {
        let names = &self.columns;
        let sites = require_column(raw, path, &names.site_name)?.cast(&DataType::String)?;
        let date_column = require_column(raw, path, &names.collected_at)?;
        let species = require_column(raw, path, &names.species_name)?.cast(&DataType::String)?;
        let values = require_column(raw, path, &names.value)?.cast(&DataType::Float64)?;
        let units = match raw.column(&names.units) {
            Ok(column) => column.cast(&DataType::String)?,
            Err(_) => {
                debug!(
                    "No '{}' column in {:?}, every record gets '{}'",
                    names.units, path, self.default_units
                );
                Series::full_null(UNITS.into(), raw.height(), &DataType::String).into_column()
            }
        };
        let dates = normalize_date_column(date_column)?;

        let mut report = LoadReport {
            rows_read: raw.height(),
            ..Default::default()
        };
        let site_ca = sites.str()?;
        let keep: Vec<bool> = dates
            .iter()
            .enumerate()
            .map(|(idx, date)| {
                let has_site = site_ca.get(idx).is_some_and(|s| !s.trim().is_empty());
                if !has_site {
                    report.dropped_missing_site += 1;
                    false
                } else if date.is_none() {
                    report.dropped_bad_dates += 1;
                    false
                } else {
                    true
                }
            })
            .collect();
        if report.dropped_bad_dates > 0 {
            warn!(
                "Dropped {} rows with unparseable '{}' values from {:?}",
                report.dropped_bad_dates, names.collected_at, path
            );
        }

        let frame = DataFrame::new(vec![
            sites.with_name(SITE_NAME.into()),
            DateChunked::from_naive_date_options(COLLECTED_AT.into(), dates).into_column(),
            species.with_name(SPECIES_NAME.into()),
            values.with_name(VALUE.into()),
            units.with_name(UNITS.into()),
        ])?
        .filter(&BooleanChunked::from_slice("keep".into(), &keep))?;

        Ok((frame, report))
    }
}
