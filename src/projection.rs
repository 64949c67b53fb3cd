//! Turns a filtered dataset into colored, labelled map points.

use crate::color::rgb::Rgb;
use crate::color::scale::{ColorScale, LegendEntry};
use crate::filtering::FilterCriteria;
use crate::records::dataset::{JoinedDataset, MonitoringRecord};
use crate::types::lat_lon::LatLon;
use chrono::NaiveDate;
use log::debug;
use polars::prelude::PolarsResult;
use rstar::{Envelope, RTreeObject, AABB};
use serde::Serialize;

/// One marker for the map renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderablePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub color: Rgb,
    /// Site, date, species and value with units, one per line.
    pub label: String,
    pub site_name: String,
    pub collected_at: NaiveDate,
    pub species_name: String,
    pub value: Option<f64>,
    pub units: String,
}

/// A point is its own degenerate envelope; merging envelopes gives the extent of
/// a set of points.
impl RTreeObject for RenderablePoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.latitude, self.longitude])
    }
}

/// Axis-aligned extent of a set of points, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub south_west: LatLon,
    pub north_east: LatLon,
}

impl BoundingBox {
    /// `[[min_lat, min_lon], [max_lat, max_lon]]`, the form map libraries fit to.
    pub fn as_array(&self) -> [[f64; 2]; 2] {
        [
            [self.south_west.0, self.south_west.1],
            [self.north_east.0, self.north_east.1],
        ]
    }

    pub fn center(&self) -> LatLon {
        LatLon(
            (self.south_west.0 + self.north_east.0) / 2.0,
            (self.south_west.1 + self.north_east.1) / 2.0,
        )
    }
}

/// Points produced from a subset, plus how many rows could not be placed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Projection {
    pub points: Vec<RenderablePoint>,
    pub skipped_without_coordinates: usize,
}

impl Projection {
    /// `None` when there are no points.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let extent = self
            .points
            .iter()
            .map(RTreeObject::envelope)
            .reduce(|all, next| all.merged(&next))?;
        let (lower, upper) = (extent.lower(), extent.upper());
        Some(BoundingBox {
            south_west: LatLon(lower[0], lower[1]),
            north_east: LatLon(upper[0], upper[1]),
        })
    }
}

/// One point per record with both coordinates; records without coordinates are
/// counted in [`Projection::skipped_without_coordinates`]. Multiple observations
/// at one site stay separate points.
pub fn project(subset: &JoinedDataset, scale: &ColorScale) -> PolarsResult<Projection> {
    let mut projection = Projection::default();
    for record in subset.records()? {
        let (Some(latitude), Some(longitude)) = (record.latitude, record.longitude) else {
            projection.skipped_without_coordinates += 1;
            continue;
        };
        let label = format_label(&record);
        projection.points.push(RenderablePoint {
            latitude,
            longitude,
            color: scale.color_for_optional(record.value),
            label,
            site_name: record.site_name,
            collected_at: record.collected_at,
            species_name: record.species_name.unwrap_or_default(),
            value: record.value,
            units: record.units,
        });
    }
    if projection.skipped_without_coordinates > 0 {
        debug!(
            "Skipped {} records without site coordinates",
            projection.skipped_without_coordinates
        );
    }
    Ok(projection)
}

/// `site`, `date`, `species` and `value units` on separate lines.
pub fn format_label(record: &MonitoringRecord) -> String {
    let value = record
        .value
        .map_or_else(|| "n/a".to_string(), format_thousands);
    format!(
        "{}\n{}\n{}\n{} {}",
        record.site_name,
        record.collected_at.format("%Y-%m-%d"),
        record.species_name.as_deref().unwrap_or_default(),
        value,
        record.units
    )
}

/// Formats `value` with comma thousands separators, e.g. `1234567.5` as
/// `1,234,567.5`. Whole numbers print without decimals; fractions keep up to two.
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = format!("{:.2}", value.abs());
    let (whole, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, digit) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && (whole != "0" || !fraction.is_empty()) {
        "-"
    } else {
        ""
    };
    if fraction.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, fraction)
    }
}

/// How the renderer should frame the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Viewport {
    /// Fit the map to the points.
    Fit { bounds: BoundingBox },
    /// No points to fit; center on the configured default.
    Center { center: LatLon },
}

/// Everything the map renderer needs for one filter state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    /// Criteria actually applied, after defaults; `None` for a dataset without rows.
    pub criteria: Option<FilterCriteria>,
    pub points: Vec<RenderablePoint>,
    pub bounds: Option<BoundingBox>,
    pub viewport: Viewport,
    /// Rows that passed the filter.
    pub shown: usize,
    /// Rows in the full dataset.
    pub total: usize,
    pub skipped_without_coordinates: usize,
    pub legend_caption: String,
    pub legend: Vec<LegendEntry>,
}

impl MapView {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
