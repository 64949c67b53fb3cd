//! The joined monitoring table shared by the map and trend paths.

use crate::records::columns::{
    joined_schema, COLLECTED_AT, LATITUDE, LONGITUDE, SITE_NAME, SPECIES_NAME, UNITS, VALUE,
};
use crate::types::any_date::StartEndDate;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;

/// Counters describing what the loader dropped or could not geolocate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Rows present in the primary source before any row was dropped.
    pub rows_read: usize,
    /// Rows dropped because the site name was null or blank.
    pub dropped_missing_site: usize,
    /// Rows dropped because the collection date could not be parsed.
    pub dropped_bad_dates: usize,
    /// Joined rows whose site has no entry in the coordinate table.
    pub without_coordinates: usize,
    /// The primary source was absent or held no rows.
    pub primary_missing: bool,
}

/// One observation, materialized from a [`JoinedDataset`] row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoringRecord {
    pub site_name: String,
    pub collected_at: NaiveDate,
    pub species_name: Option<String>,
    pub value: Option<f64>,
    pub units: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Monitoring records left-joined to site coordinates.
///
/// Columns are `site_name`, `collected_at` (date), `species_name`, `value`,
/// `units`, `latitude` and `longitude`. Instances are immutable; filtering
/// returns a new dataset.
#[derive(Debug, Clone)]
pub struct JoinedDataset {
    frame: DataFrame,
    report: LoadReport,
}

impl JoinedDataset {
    pub(crate) fn new(frame: DataFrame, report: LoadReport) -> Self {
        Self { frame, report }
    }

    /// A dataset without rows but with the full joined schema.
    pub(crate) fn empty(report: LoadReport) -> Self {
        Self::new(DataFrame::empty_with_schema(&joined_schema()), report)
    }

    /// A dataset derived from this one, keeping the original load report.
    pub(crate) fn derive(&self, frame: DataFrame) -> Self {
        Self::new(frame, self.report.clone())
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn lazy(&self) -> LazyFrame {
        self.frame.clone().lazy()
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Distinct species names in lexicographic order; null names are skipped.
    pub fn species(&self) -> PolarsResult<Vec<String>> {
        self.distinct_strings(SPECIES_NAME)
    }

    /// Distinct site names in lexicographic order.
    pub fn sites(&self) -> PolarsResult<Vec<String>> {
        self.distinct_strings(SITE_NAME)
    }

    /// Earliest and latest collection date, or `None` for an empty dataset.
    pub fn date_span(&self) -> PolarsResult<Option<StartEndDate>> {
        let dates = self.frame.column(COLLECTED_AT)?.date()?;
        let mut span: Option<StartEndDate> = None;
        for date in dates.as_date_iter().flatten() {
            span = Some(match span {
                None => StartEndDate {
                    start: date,
                    end: date,
                },
                Some(current) => StartEndDate {
                    start: current.start.min(date),
                    end: current.end.max(date),
                },
            });
        }
        Ok(span)
    }

    /// Materializes every row.
    pub fn records(&self) -> PolarsResult<Vec<MonitoringRecord>> {
        let frame = &self.frame;
        let sites = frame.column(SITE_NAME)?.str()?;
        let dates = frame.column(COLLECTED_AT)?.date()?;
        let species = frame.column(SPECIES_NAME)?.str()?;
        let values = frame.column(VALUE)?.f64()?;
        let units = frame.column(UNITS)?.str()?;
        let latitudes = frame.column(LATITUDE)?.f64()?;
        let longitudes = frame.column(LONGITUDE)?.f64()?;

        let mut records = Vec::with_capacity(frame.height());
        for (idx, date) in dates.as_date_iter().enumerate() {
            // The loader never emits rows without a site or a date.
            let (Some(site), Some(collected_at)) = (sites.get(idx), date) else {
                continue;
            };
            records.push(MonitoringRecord {
                site_name: site.to_string(),
                collected_at,
                species_name: species.get(idx).map(str::to_string),
                value: values.get(idx),
                units: units.get(idx).unwrap_or_default().to_string(),
                latitude: latitudes.get(idx),
                longitude: longitudes.get(idx),
            });
        }
        Ok(records)
    }

    fn distinct_strings(&self, column: &str) -> PolarsResult<Vec<String>> {
        let names: BTreeSet<String> = self
            .frame
            .column(column)?
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        Ok(names.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_dataset_keeps_the_schema() -> Result<(), Box<dyn std::error::Error>> {
        let dataset = JoinedDataset::empty(LoadReport {
            primary_missing: true,
            ..Default::default()
        });
        assert!(dataset.is_empty());
        assert_eq!(dataset.frame().width(), 7);
        assert_eq!(dataset.frame().column(COLLECTED_AT)?.dtype(), &DataType::Date);
        assert!(dataset.species()?.is_empty());
        assert_eq!(dataset.date_span()?, None);
        assert!(dataset.records()?.is_empty());
        assert!(dataset.report().primary_missing);
        Ok(())
    }
}
