use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures while reading or joining the source tables.
///
/// Data-quality problems (a missing primary source, unparseable dates, rows
/// without coordinates) never show up here; they shrink the dataset and are
/// counted in [`crate::LoadReport`] instead.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Coordinate reference table '{0}' not found; generate the site coordinates table first")]
    CoordinatesMissing(PathBuf),

    #[error("Coordinate reference table '{0}' contains no usable site coordinates")]
    CoordinatesEmpty(PathBuf),

    #[error("Source table '{0}' not found")]
    SourceMissing(PathBuf),

    #[error("Failed to read metadata for source '{0}'")]
    SourceMetadata(PathBuf, #[source] std::io::Error),

    #[error("Failed to read source '{0}'")]
    SourceRead(PathBuf, #[source] std::io::Error),

    #[error(
        "Unsupported source format for '{0}', expected .csv, .tsv, .txt, .parquet or a spreadsheet (.xlsx, .xlsm, .xlsb, .xls, .ods)"
    )]
    UnsupportedFormat(PathBuf),

    #[error("Failed to read spreadsheet '{path}'")]
    SpreadsheetRead {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("Failed to parse source '{path}'")]
    SourceParse {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Required column '{column}' not found in '{path}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Failed to write '{0}'")]
    OutputWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to encode CSV output '{path}'")]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
