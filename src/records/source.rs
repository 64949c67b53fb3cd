//! Reads a source table from disk into an untyped `DataFrame`.

use crate::records::error::LoadError;
use calamine::{open_workbook_auto, Data, Reader};
use log::{debug, warn};
use polars::prelude::*;
use std::fs::File;
use std::io;
use std::path::Path;

/// What was found at a source path.
#[derive(Debug)]
pub(crate) enum SourceTable {
    Missing,
    /// Not even a header: a zero-byte file or a workbook without rows.
    Empty,
    Loaded(DataFrame),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Delimited(u8),
    Parquet,
    Spreadsheet,
}

fn source_format(path: &Path) -> Result<SourceFormat, LoadError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("csv") | Some("txt") => Ok(SourceFormat::Delimited(b',')),
        Some("tsv") => Ok(SourceFormat::Delimited(b'\t')),
        Some("parquet") => Ok(SourceFormat::Parquet),
        Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("ods") => {
            Ok(SourceFormat::Spreadsheet)
        }
        _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Reads the table at `path`.
///
/// Delimited text and spreadsheets are read with every column as a string so
/// that the loader decides how each cell is interpreted; Parquet keeps its
/// stored types. A table with a header but no rows is `Loaded`, so its columns
/// can still be checked.
pub(crate) fn read_table(path: &Path) -> Result<SourceTable, LoadError> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("Source table {:?} does not exist", path);
            return Ok(SourceTable::Missing);
        }
        Err(e) => return Err(LoadError::SourceMetadata(path.to_path_buf(), e)),
    };
    let format = source_format(path)?;
    if metadata.len() == 0 {
        warn!("Source table {:?} is empty", path);
        return Ok(SourceTable::Empty);
    }

    let frame = match format {
        SourceFormat::Delimited(separator) => CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .map_parse_options(|options| options.with_separator(separator))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish()),
        SourceFormat::Parquet => {
            let file =
                File::open(path).map_err(|e| LoadError::SourceRead(path.to_path_buf(), e))?;
            ParquetReader::new(file).finish()
        }
        SourceFormat::Spreadsheet => match read_first_sheet(path)? {
            Some(frame) => Ok(frame),
            None => {
                warn!("Spreadsheet {:?} has no rows on its first sheet", path);
                return Ok(SourceTable::Empty);
            }
        },
    }
    .map_err(|source| LoadError::SourceParse {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(
        "Read {} rows x {} columns from {:?}",
        frame.height(),
        frame.width(),
        path
    );
    Ok(SourceTable::Loaded(frame))
}

/// First worksheet as string columns, the first row naming them. `None` when the
/// workbook has no sheet or the sheet has no rows at all.
fn read_first_sheet(path: &Path) -> Result<Option<DataFrame>, LoadError> {
    let spreadsheet_error = |source: calamine::Error| LoadError::SpreadsheetRead {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_error)?;
    let Some(sheet) = workbook.worksheet_range_at(0) else {
        return Ok(None);
    };
    let sheet = sheet.map_err(spreadsheet_error)?;

    let mut rows = sheet.rows();
    let Some(header) = rows.next() else {
        return Ok(None);
    };
    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| cell_text(cell).unwrap_or_else(|| format!("column_{}", idx + 1)))
        .collect();

    let mut cells: Vec<Vec<Option<String>>> =
        vec![Vec::with_capacity(sheet.height()); names.len()];
    for row in rows {
        for (idx, column) in cells.iter_mut().enumerate() {
            column.push(row.get(idx).and_then(cell_text));
        }
    }
    let columns: Vec<Column> = names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Series::new(name.into(), values).into_column())
        .collect();
    DataFrame::new(columns)
        .map(Some)
        .map_err(|source| LoadError::SourceParse {
            path: path.to_path_buf(),
            source,
        })
}

/// Cell contents as text; blank and error cells are null.
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => text.clone(),
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(value) => value.as_datetime()?.format("%Y-%m-%d %H:%M:%S").to_string(),
        Data::Error(_) | Data::Empty => return None,
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Looks up a required column, reporting the source path when it is absent.
pub(crate) fn require_column<'a>(
    frame: &'a DataFrame,
    path: &Path,
    name: &str,
) -> Result<&'a Column, LoadError> {
    frame.column(name).map_err(|_| LoadError::MissingColumn {
        path: path.to_path_buf(),
        column: name.to_string(),
    })
}
