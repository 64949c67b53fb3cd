//! Builds the coordinate reference table from a monitoring-sites summary export.

use crate::records::columns::CoordinateColumns;
use crate::records::error::LoadError;
use crate::records::source::{read_table, require_column, SourceTable};
use bon::builder;
use log::{info, warn};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Site-name column used by the monitoring-sites summary export.
pub const SUMMARY_SITE_COLUMN: &str = "SiteName";

/// Writes a coordinate table with `columns.site_name`, `columns.latitude` and
/// `columns.longitude` taken from `summary`, dropping rows missing any of them.
///
/// Returns the number of sites written.
///
/// # Errors
///
/// Returns [`LoadError::SourceMissing`] when the summary does not exist,
/// [`LoadError::MissingColumn`] when it lacks one of the three columns and
/// [`LoadError::OutputWrite`]/[`LoadError::CsvWrite`] when the output cannot be written.
///
/// # Examples
///
/// ```no_run
/// use hab_monitor::build_coordinate_table;
/// use std::path::Path;
///
/// let sites = build_coordinate_table()
///     .summary(Path::new("MonitoringSites_Summary.csv"))
///     .output(Path::new("site_coordinates.csv"))
///     .call()?;
/// println!("Saved {} site coordinates", sites);
/// # Ok::<(), hab_monitor::LoadError>(())
/// ```
#[builder]
pub fn build_coordinate_table(
    summary: &Path,
    output: &Path,
    summary_site_column: Option<&str>,
    columns: Option<CoordinateColumns>,
) -> Result<usize, LoadError> {
    let summary_site_column = summary_site_column.unwrap_or(SUMMARY_SITE_COLUMN);
    let columns = columns.unwrap_or_default();

    let raw = match read_table(summary)? {
        SourceTable::Loaded(frame) => frame,
        SourceTable::Empty => {
            warn!("Summary {:?} is empty, writing a header-only coordinate table", summary);
            let mut frame = DataFrame::empty_with_schema(&output_schema(&columns));
            write_csv(&mut frame, output)?;
            return Ok(0);
        }
        SourceTable::Missing => return Err(LoadError::SourceMissing(summary.to_path_buf())),
    };
    let available: Vec<String> = raw
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    info!("Summary {:?} columns: {}", summary, available.join(", "));

    for name in [
        summary_site_column,
        columns.latitude.as_str(),
        columns.longitude.as_str(),
    ] {
        require_column(&raw, summary, name)?;
    }
    let mut frame = raw
        .lazy()
        .select([
            col(summary_site_column)
                .cast(DataType::String)
                .alias(columns.site_name.as_str()),
            col(columns.latitude.as_str()).cast(DataType::Float64),
            col(columns.longitude.as_str()).cast(DataType::Float64),
        ])
        .filter(
            col(columns.site_name.as_str())
                .is_not_null()
                .and(col(columns.latitude.as_str()).is_not_null())
                .and(col(columns.longitude.as_str()).is_not_null()),
        )
        .collect()?;

    write_csv(&mut frame, output)?;
    info!("Saved {} site coordinates to {:?}", frame.height(), output);
    Ok(frame.height())
}

fn output_schema(columns: &CoordinateColumns) -> Schema {
    Schema::from_iter([
        Field::new(columns.site_name.as_str().into(), DataType::String),
        Field::new(columns.latitude.as_str().into(), DataType::Float64),
        Field::new(columns.longitude.as_str().into(), DataType::Float64),
    ])
}

fn write_csv(frame: &mut DataFrame, output: &Path) -> Result<(), LoadError> {
    let mut file =
        File::create(output).map_err(|e| LoadError::OutputWrite(output.to_path_buf(), e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(frame)
        .map_err(|source| LoadError::CsvWrite {
            path: output.to_path_buf(),
            source,
        })
}
