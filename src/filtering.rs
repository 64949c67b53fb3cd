//! Predicates over joined monitoring frames, and the request-scoped criteria the
//! map view filters by.

use crate::records::columns::{COLLECTED_AT, SITE_NAME, SPECIES_NAME, VALUE};
use crate::records::dataset::JoinedDataset;
use crate::types::any_date::AnyDate;
use chrono::{Duration, NaiveDate};
use log::debug;
use polars::prelude::{col, lit, LazyFrame, PolarsResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Label a selector shows for "no site restriction".
pub const ALL_SITES: &str = "All sites";

/// Restricts a trend to one site, or to none.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SiteFilter {
    #[default]
    AllSites,
    Site(String),
}

impl From<&str> for SiteFilter {
    /// [`ALL_SITES`] maps to [`SiteFilter::AllSites`], anything else to that site.
    fn from(value: &str) -> Self {
        if value == ALL_SITES {
            SiteFilter::AllSites
        } else {
            SiteFilter::Site(value.to_string())
        }
    }
}

impl From<Option<String>> for SiteFilter {
    fn from(value: Option<String>) -> Self {
        value.map_or(SiteFilter::AllSites, SiteFilter::Site)
    }
}

pub trait MonitoringFrameFilterExt {
    /// Keeps rows whose `species_name` is in `species`. An empty set keeps nothing.
    fn filter_species(self, species: &BTreeSet<String>) -> LazyFrame;

    /// Keeps rows collected within `[start, end]` (inclusive). Nothing survives
    /// when `start > end`.
    fn filter_collected_between(self, start: NaiveDate, end: NaiveDate) -> LazyFrame;

    /// Drops rows without a numeric value.
    fn filter_has_value(self) -> LazyFrame;

    /// Keeps rows for the selected site; [`SiteFilter::AllSites`] keeps everything.
    fn filter_site(self, site: &SiteFilter) -> LazyFrame;
}

impl MonitoringFrameFilterExt for LazyFrame {
    fn filter_species(self, species: &BTreeSet<String>) -> LazyFrame {
        let predicate = species
            .iter()
            .map(|name| col(SPECIES_NAME).eq(lit(name.clone())))
            .reduce(|any, next| any.or(next))
            .unwrap_or_else(|| lit(false));
        self.filter(predicate)
    }

    fn filter_collected_between(self, start: NaiveDate, end: NaiveDate) -> LazyFrame {
        self.filter(
            col(COLLECTED_AT)
                .gt_eq(lit(start))
                .and(col(COLLECTED_AT).lt_eq(lit(end))),
        )
    }

    fn filter_has_value(self) -> LazyFrame {
        self.filter(col(VALUE).is_not_null())
    }

    fn filter_site(self, site: &SiteFilter) -> LazyFrame {
        match site {
            SiteFilter::AllSites => self,
            SiteFilter::Site(name) => self.filter(col(SITE_NAME).eq(lit(name.clone()))),
        }
    }
}

/// Settings that decide what a first, unconfigured view shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionDefaults {
    /// Species containing this text are selected when the caller picks none.
    pub bloom_marker: String,
    /// Length of the default date window ending at the latest collection date.
    pub window_days: i64,
}

impl Default for SelectionDefaults {
    fn default() -> Self {
        Self {
            bloom_marker: "Karenia".to_string(),
            window_days: 7,
        }
    }
}

/// The date window requested for the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateSelection {
    /// The last `window_days` days up to the latest date in the dataset.
    #[default]
    LatestWindow,
    /// Explicit inclusive bounds.
    Range(NaiveDate, NaiveDate),
    /// A lone date; treated as "the whole dataset".
    Single(NaiveDate),
}

impl DateSelection {
    /// Builds an explicit range from anything date-like. The start of `start`
    /// and the end of `end` are used; `None` if either cannot be resolved.
    pub fn range(start: impl AnyDate, end: impl AnyDate) -> Option<Self> {
        let start = start.get_date_range()?.start;
        let end = end.get_date_range()?.end;
        Some(DateSelection::Range(start, end))
    }
}

/// Picks the species shown when the caller made no choice.
///
/// Every species containing `marker` wins; failing that, the first species in
/// lexicographic order. Only an empty species list yields an empty selection.
pub fn default_species(all_species: &[String], marker: &str) -> Vec<String> {
    let mut sorted: Vec<String> = all_species.to_vec();
    sorted.sort();
    sorted.dedup();

    let marked: Vec<String> = sorted
        .iter()
        .filter(|name| name.contains(marker))
        .cloned()
        .collect();
    if !marked.is_empty() {
        return marked;
    }
    sorted.into_iter().take(1).collect()
}

/// Explicit non-empty choices are kept as given; otherwise [`default_species`] applies.
pub(crate) fn resolve_species(
    dataset: &JoinedDataset,
    requested: Option<&[String]>,
    defaults: &SelectionDefaults,
) -> PolarsResult<BTreeSet<String>> {
    match requested {
        Some(chosen) if !chosen.is_empty() => Ok(chosen.iter().cloned().collect()),
        _ => {
            let chosen = default_species(&dataset.species()?, &defaults.bloom_marker);
            debug!("No species selected, defaulting to {:?}", chosen);
            Ok(chosen.into_iter().collect())
        }
    }
}

/// Species set and inclusive date window applied to the map view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
    species: BTreeSet<String>,
    date_start: NaiveDate,
    date_end: NaiveDate,
}

impl FilterCriteria {
    pub fn new<S: Into<String>>(
        species: impl IntoIterator<Item = S>,
        date_start: NaiveDate,
        date_end: NaiveDate,
    ) -> Self {
        Self {
            species: species.into_iter().map(Into::into).collect(),
            date_start,
            date_end,
        }
    }

    /// Applies the default-selection policy against `dataset`.
    ///
    /// Returns `None` when the dataset holds no dates at all, so there is no
    /// window to default to.
    pub fn resolve(
        dataset: &JoinedDataset,
        species: Option<&[String]>,
        dates: DateSelection,
        defaults: &SelectionDefaults,
    ) -> PolarsResult<Option<Self>> {
        let Some(span) = dataset.date_span()? else {
            return Ok(None);
        };
        let (date_start, date_end) = match dates {
            DateSelection::LatestWindow => {
                let start = Duration::try_days(defaults.window_days)
                    .and_then(|window| span.end.checked_sub_signed(window))
                    .unwrap_or(NaiveDate::MIN);
                (start, span.end)
            }
            DateSelection::Range(start, end) => (start, end),
            DateSelection::Single(_) => (span.start, span.end),
        };
        Ok(Some(Self {
            species: resolve_species(dataset, species, defaults)?,
            date_start,
            date_end,
        }))
    }

    pub fn species(&self) -> &BTreeSet<String> {
        &self.species
    }

    pub fn date_start(&self) -> NaiveDate {
        self.date_start
    }

    pub fn date_end(&self) -> NaiveDate {
        self.date_end
    }
}

/// Rows matching the species set, the inclusive date window and carrying a value.
/// An empty result is not an error.
pub fn filter(dataset: &JoinedDataset, criteria: &FilterCriteria) -> PolarsResult<JoinedDataset> {
    let frame = dataset
        .lazy()
        .filter_species(&criteria.species)
        .filter_collected_between(criteria.date_start, criteria.date_end)
        .filter_has_value()
        .collect()?;
    Ok(dataset.derive(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::dataset_from_rows;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> JoinedDataset {
        dataset_from_rows(
            &[
                "Port Lincoln,2025-08-20,Karenia mikimotoi,100,cells/L",
                "Port Lincoln,2025-09-01,Karenia mikimotoi,200,cells/L",
                "Port Lincoln,2025-09-05,Karenia mikimotoi,,cells/L",
                "Port Lincoln,2025-09-08,Karenia mikimotoi,400,cells/L",
                "Victor Harbor,2025-09-08,Alexandrium sp.,50,cells/L",
                "Victor Harbor,2025-09-08,Karenia brevis,70,cells/L",
            ],
            &["Port Lincoln,-34.72,135.86", "Victor Harbor,-35.55,138.62"],
        )
    }

    #[test]
    fn prefers_marker_species() {
        let all = names(&["Karenia mikimotoi", "Alexandrium sp."]);
        assert_eq!(default_species(&all, "Karenia"), names(&["Karenia mikimotoi"]));
    }

    #[test]
    fn falls_back_to_the_first_species_alphabetically() {
        let all = names(&["Other sp.", "Alexandrium sp."]);
        assert_eq!(default_species(&all, "Karenia"), names(&["Alexandrium sp."]));
        assert!(default_species(&[], "Karenia").is_empty());
    }

    #[test]
    fn default_window_ends_at_the_latest_date() -> PolarsResult<()> {
        let dataset = sample();
        let criteria = FilterCriteria::resolve(
            &dataset,
            None,
            DateSelection::LatestWindow,
            &SelectionDefaults::default(),
        )?
        .unwrap();
        assert_eq!(criteria.date_start(), ymd(2025, 9, 1));
        assert_eq!(criteria.date_end(), ymd(2025, 9, 8));
        let expected: BTreeSet<String> = ["Karenia brevis", "Karenia mikimotoi"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(criteria.species(), &expected);

        let subset = filter(&dataset, &criteria)?;
        // 2025-09-01 and 2025-09-08 for mikimotoi (09-05 has no value), brevis on 09-08.
        assert_eq!(subset.len(), 3);
        Ok(())
    }

    #[test]
    fn oversized_window_reaches_back_to_the_earliest_date() -> PolarsResult<()> {
        let dataset = sample();
        let defaults = SelectionDefaults {
            window_days: i64::MAX,
            ..Default::default()
        };
        let criteria =
            FilterCriteria::resolve(&dataset, None, DateSelection::LatestWindow, &defaults)?
                .unwrap();
        assert_eq!(criteria.date_start(), NaiveDate::MIN);
        assert_eq!(criteria.date_end(), ymd(2025, 9, 8));
        assert_eq!(filter(&dataset, &criteria)?.len(), 4);
        Ok(())
    }

    #[test]
    fn single_date_collapses_to_the_full_span() -> PolarsResult<()> {
        let dataset = sample();
        let criteria = FilterCriteria::resolve(
            &dataset,
            Some(names(&["Karenia mikimotoi"]).as_slice()),
            DateSelection::Single(ymd(2025, 9, 1)),
            &SelectionDefaults::default(),
        )?
        .unwrap();
        assert_eq!(criteria.date_start(), ymd(2025, 8, 20));
        assert_eq!(criteria.date_end(), ymd(2025, 9, 8));
        assert_eq!(filter(&dataset, &criteria)?.len(), 3);
        Ok(())
    }

    #[test]
    fn range_bounds_are_inclusive() -> PolarsResult<()> {
        let dataset = sample();
        let criteria =
            FilterCriteria::new(["Karenia mikimotoi"], ymd(2025, 8, 20), ymd(2025, 9, 1));
        let rows = filter(&dataset, &criteria)?.records()?;
        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.collected_at).collect();
        assert_eq!(dates, vec![ymd(2025, 8, 20), ymd(2025, 9, 1)]);
        Ok(())
    }

    #[test]
    fn inverted_ranges_and_unknown_species_give_empty_subsets() -> PolarsResult<()> {
        let dataset = sample();

        let inverted =
            FilterCriteria::new(["Karenia mikimotoi"], ymd(2025, 9, 8), ymd(2025, 8, 20));
        assert!(filter(&dataset, &inverted)?.is_empty());

        let unknown = FilterCriteria::new(["Dinophysis sp."], ymd(2025, 1, 1), ymd(2025, 12, 31));
        assert!(filter(&dataset, &unknown)?.is_empty());

        let nothing = FilterCriteria::new(Vec::<String>::new(), ymd(2025, 1, 1), ymd(2025, 12, 31));
        assert!(filter(&dataset, &nothing)?.is_empty());
        Ok(())
    }

    #[test]
    fn filtering_leaves_the_input_untouched() -> PolarsResult<()> {
        let dataset = sample();
        let criteria = FilterCriteria::new(["Alexandrium sp."], ymd(2025, 9, 8), ymd(2025, 9, 8));
        assert_eq!(filter(&dataset, &criteria)?.len(), 1);
        assert_eq!(dataset.len(), 6);
        Ok(())
    }

    #[test]
    fn explicit_empty_selection_uses_the_default_policy() -> PolarsResult<()> {
        let dataset = sample();
        let chosen: &[String] = &[];
        let species = resolve_species(&dataset, Some(chosen), &SelectionDefaults::default())?;
        assert_eq!(species.len(), 2);
        assert!(species.iter().all(|s| s.contains("Karenia")));
        Ok(())
    }

    #[test]
    fn date_selection_accepts_text_bounds() {
        assert_eq!(
            DateSelection::range("2025-09-01", "08/09/2025"),
            Some(DateSelection::Range(ymd(2025, 9, 1), ymd(2025, 9, 8)))
        );
        assert_eq!(DateSelection::range("later", ymd(2025, 9, 8)), None);
    }

    #[test]
    fn site_filter_from_selector_text() {
        assert_eq!(SiteFilter::from(ALL_SITES), SiteFilter::AllSites);
        assert_eq!(
            SiteFilter::from("Port Lincoln"),
            SiteFilter::Site("Port Lincoln".to_string())
        );
        assert_eq!(SiteFilter::from(None), SiteFilter::AllSites);
    }
}
