//! The entry point a rendering front end drives: load the two sources once, then
//! ask for map views and trend series as the user changes the controls.

use crate::color::scale::ColorScale;
use crate::config::MonitorConfig;
use crate::error::HabMonitorError;
use crate::filtering::{
    default_species, filter, resolve_species, DateSelection, FilterCriteria, SiteFilter, ALL_SITES,
};
use crate::projection::{project, MapView, Viewport};
use crate::records::cache::DatasetCache;
use crate::records::dataset::JoinedDataset;
use crate::records::loader::RecordLoader;
use crate::trend::{aggregate, TrendSeriesPoint};
use bon::bon;
use log::info;
use std::path::Path;

/// Owns the configuration, the color scale built from it and a dataset cache.
///
/// # Examples
///
/// ```no_run
/// use hab_monitor::{DateSelection, HabMonitor, HabMonitorError, MonitorConfig};
///
/// # fn main() -> Result<(), HabMonitorError> {
/// let mut monitor = HabMonitor::new(MonitorConfig::default())?;
/// let dataset = monitor.load("data/monitoring.csv", "data/site_coordinates.csv")?;
///
/// // Default species and the last week of data.
/// let view = monitor.map_view().dataset(&dataset).call()?;
/// println!("{} of {} records shown", view.shown, view.total);
///
/// let trend = monitor
///     .trend()
///     .dataset(&dataset)
///     .species(vec!["Karenia mikimotoi".to_string()])
///     .call()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HabMonitor {
    config: MonitorConfig,
    loader: RecordLoader,
    scale: ColorScale,
    cache: DatasetCache,
}

#[bon]
impl HabMonitor {
    /// # Errors
    ///
    /// Returns [`HabMonitorError::ColorScale`] when the configured color scale is invalid.
    pub fn new(config: MonitorConfig) -> Result<Self, HabMonitorError> {
        let scale = config.color_scale.build()?;
        Ok(Self {
            loader: config.loader(),
            scale,
            cache: DatasetCache::new(),
            config,
        })
    }

    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, HabMonitorError> {
        Self::new(MonitorConfig::from_json_file(path)?)
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn scale(&self) -> &ColorScale {
        &self.scale
    }

    /// Loads and joins the records and coordinate sources, reusing the previous
    /// result while neither file has changed.
    ///
    /// # Errors
    ///
    /// Returns [`HabMonitorError::Load`] when the coordinate table is missing or
    /// empty, a source cannot be parsed, or a required column is absent. A missing
    /// records file is not an error; it yields an empty dataset.
    pub fn load(
        &mut self,
        records: impl AsRef<Path>,
        coordinates: impl AsRef<Path>,
    ) -> Result<JoinedDataset, HabMonitorError> {
        Ok(self
            .cache
            .get_or_load(&self.loader, records.as_ref(), coordinates.as_ref())?)
    }

    /// Filters `dataset` and projects it onto colored map points.
    ///
    /// * `.species(Vec<String>)`: Optional. An empty or absent selection falls back
    ///   to the configured bloom marker species.
    /// * `.dates(DateSelection)`: Optional. Defaults to the configured window ending
    ///   at the latest collection date.
    #[builder]
    pub fn map_view(
        &self,
        dataset: &JoinedDataset,
        species: Option<Vec<String>>,
        #[builder(default)] dates: DateSelection,
    ) -> Result<MapView, HabMonitorError> {
        let criteria =
            FilterCriteria::resolve(dataset, species.as_deref(), dates, &self.config.selection)?;
        let projection = match &criteria {
            Some(criteria) => project(&filter(dataset, criteria)?, &self.scale)?,
            None => Default::default(),
        };
        let shown = projection.points.len() + projection.skipped_without_coordinates;
        info!("{} of {} records shown", shown, dataset.len());

        let bounds = projection.bounding_box();
        let viewport = match bounds {
            Some(bounds) => Viewport::Fit { bounds },
            None => Viewport::Center {
                center: self.config.default_center,
            },
        };
        Ok(MapView {
            criteria,
            points: projection.points,
            bounds,
            viewport,
            shown,
            total: dataset.len(),
            skipped_without_coordinates: projection.skipped_without_coordinates,
            legend_caption: self.scale.caption().to_string(),
            legend: self.scale.legend(self.config.legend_ticks),
        })
    }

    /// Daily mean per species across the whole dataset.
    ///
    /// * `.species(Vec<String>)`: Optional, defaulted like [`HabMonitor::map_view`].
    /// * `.site(SiteFilter)`: Optional. Defaults to [`SiteFilter::AllSites`].
    #[builder]
    pub fn trend(
        &self,
        dataset: &JoinedDataset,
        species: Option<Vec<String>>,
        #[builder(default, into)] site: SiteFilter,
    ) -> Result<Vec<TrendSeriesPoint>, HabMonitorError> {
        let species = resolve_species(dataset, species.as_deref(), &self.config.selection)?;
        Ok(aggregate(dataset, &species, &site)?)
    }

    /// The species preselected when a front end first shows `dataset`.
    pub fn default_species(&self, dataset: &JoinedDataset) -> Result<Vec<String>, HabMonitorError> {
        Ok(default_species(
            &dataset.species()?,
            &self.config.selection.bloom_marker,
        ))
    }

    /// Site selector entries: [`ALL_SITES`] followed by every site, sorted.
    pub fn site_options(&self, dataset: &JoinedDataset) -> Result<Vec<String>, HabMonitorError> {
        let mut options = vec![ALL_SITES.to_string()];
        options.extend(dataset.sites()?);
        Ok(options)
    }
}
