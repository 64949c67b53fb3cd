//! Fixture helpers shared by the unit tests.

use crate::records::dataset::JoinedDataset;
use crate::records::loader::RecordLoader;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub(crate) const RECORDS_HEADER: &str =
    "Site_Description,Date_Sample_Collected,Result_Name,Result_Value_Numeric,Units";
pub(crate) const COORDINATES_HEADER: &str = "Site_Description,Latitude,Longitude";

fn write_table(path: PathBuf, header: &str, rows: &[&str]) -> io::Result<PathBuf> {
    let mut contents = String::from(header);
    for row in rows {
        contents.push('\n');
        contents.push_str(row);
    }
    contents.push('\n');
    fs::write(&path, contents)?;
    Ok(path)
}

/// Writes `monitoring.csv` with the default column names.
pub(crate) fn write_records(dir: &Path, rows: &[&str]) -> io::Result<PathBuf> {
    write_table(dir.join("monitoring.csv"), RECORDS_HEADER, rows)
}

/// Writes `site_coordinates.csv` with the default column names.
pub(crate) fn write_coordinates(dir: &Path, rows: &[&str]) -> io::Result<PathBuf> {
    write_table(dir.join("site_coordinates.csv"), COORDINATES_HEADER, rows)
}

/// Loads a dataset from in-memory CSV rows through the real loader.
pub(crate) fn dataset_from_rows(records: &[&str], coordinates: &[&str]) -> JoinedDataset {
    let dir = tempfile::tempdir().expect("temp dir");
    let records = write_records(dir.path(), records).expect("records fixture");
    let coordinates = write_coordinates(dir.path(), coordinates).expect("coordinates fixture");
    RecordLoader::default()
        .load(&records, &coordinates)
        .expect("fixture dataset loads")
}
