use crate::filtering::{MonitoringFrameFilterExt, SiteFilter};
use crate::records::columns::{COLLECTED_AT, SPECIES_NAME, VALUE};
use crate::records::dataset::JoinedDataset;
use chrono::NaiveDate;
use log::debug;
use polars::prelude::{col, PolarsResult, SortMultipleOptions};
use serde::Serialize;
use std::collections::BTreeSet;

const MEAN_VALUE: &str = "mean_value";

/// Mean concentration of one species on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeriesPoint {
    pub date: NaiveDate,
    pub species_name: String,
    pub mean_value: f64,
}

/// Daily mean per species over the whole dataset, sorted by date then species.
///
/// The map's date window plays no part here. Days on which a species was not
/// measured are absent rather than zero.
pub fn aggregate(
    dataset: &JoinedDataset,
    species: &BTreeSet<String>,
    site: &SiteFilter,
) -> PolarsResult<Vec<TrendSeriesPoint>> {
    let frame = dataset
        .lazy()
        .filter_species(species)
        .filter_has_value()
        .filter_site(site)
        .group_by([col(COLLECTED_AT), col(SPECIES_NAME)])
        .agg([col(VALUE).mean().alias(MEAN_VALUE)])
        .sort([COLLECTED_AT, SPECIES_NAME], SortMultipleOptions::default())
        .collect()?;

    let dates = frame.column(COLLECTED_AT)?.date()?;
    let names = frame.column(SPECIES_NAME)?.str()?;
    let means = frame.column(MEAN_VALUE)?.f64()?;

    let series: Vec<TrendSeriesPoint> = dates
        .as_date_iter()
        .zip(names)
        .zip(means)
        .filter_map(|((date, name), mean)| {
            Some(TrendSeriesPoint {
                date: date?,
                species_name: name?.to_string(),
                mean_value: mean?,
            })
        })
        .collect();
    debug!(
        "Trend for {:?} at {:?}: {} points",
        species,
        site,
        series.len()
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filtering::{filter, FilterCriteria};
    use crate::test_utils::dataset_from_rows;

    fn species(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    fn dataset() -> JoinedDataset {
        dataset_from_rows(
            &[
                "Wallaroo,2025-09-01,Karenia mikimotoi,100,cells/L",
                "Ardrossan,2025-09-01,Karenia mikimotoi,300,cells/L",
                "Wallaroo,2025-09-01,Alexandrium sp.,40,cells/L",
                "Wallaroo,2025-09-15,Karenia mikimotoi,1000,cells/L",
                "Ardrossan,2025-09-20,Alexandrium sp.,,cells/L",
            ],
            &["Wallaroo,-33.93,137.62", "Ardrossan,-34.42,137.92"],
        )
    }

    #[test]
    fn averages_same_day_same_species() -> PolarsResult<()> {
        let series = aggregate(&dataset(), &species(&["Karenia mikimotoi"]), &SiteFilter::AllSites)?;
        assert_eq!(
            series,
            vec![
                TrendSeriesPoint {
                    date: date(1),
                    species_name: "Karenia mikimotoi".to_string(),
                    mean_value: 200.0,
                },
                TrendSeriesPoint {
                    date: date(15),
                    species_name: "Karenia mikimotoi".to_string(),
                    mean_value: 1000.0,
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn long_form_omits_unmeasured_days() -> PolarsResult<()> {
        let series = aggregate(
            &dataset(),
            &species(&["Karenia mikimotoi", "Alexandrium sp."]),
            &SiteFilter::AllSites,
        )?;
        let keys: Vec<(NaiveDate, &str)> = series
            .iter()
            .map(|point| (point.date, point.species_name.as_str()))
            .collect();
        // The null Alexandrium value on the 20th contributes nothing.
        assert_eq!(
            keys,
            vec![
                (date(1), "Alexandrium sp."),
                (date(1), "Karenia mikimotoi"),
                (date(15), "Karenia mikimotoi"),
            ]
        );
        Ok(())
    }

    #[test]
    fn ignores_the_map_date_window() -> PolarsResult<()> {
        let dataset = dataset();
        let chosen = species(&["Karenia mikimotoi"]);
        let criteria = FilterCriteria::new(chosen.iter().cloned(), date(14), date(16));
        assert_eq!(filter(&dataset, &criteria)?.len(), 1);

        let series = aggregate(&dataset, &chosen, &SiteFilter::AllSites)?;
        assert_eq!(series.len(), 2);
        Ok(())
    }

    #[test]
    fn restricts_to_one_site() -> PolarsResult<()> {
        let series = aggregate(
            &dataset(),
            &species(&["Karenia mikimotoi"]),
            &SiteFilter::from("Ardrossan"),
        )?;
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].mean_value, 300.0);
        Ok(())
    }

    #[test]
    fn nothing_matching_is_an_empty_series() -> PolarsResult<()> {
        let dataset = dataset();
        assert!(aggregate(&dataset, &species(&["Dinophysis sp."]), &SiteFilter::AllSites)?.is_empty());
        assert!(aggregate(&dataset, &BTreeSet::new(), &SiteFilter::AllSites)?.is_empty());
        assert!(aggregate(
            &dataset,
            &species(&["Karenia mikimotoi"]),
            &SiteFilter::Site("Nowhere".to_string())
        )?
        .is_empty());
        Ok(())
    }
}
