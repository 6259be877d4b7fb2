//! Decoding and assembling a single CSV row.

use building_map_building_models::BuildingRecord;
use building_map_classifier::classify;
use building_map_geometry::ParseFailure;
use chrono::{DateTime, Utc};
use rand::RngCore;

use crate::Pipeline;

/// Column positions of the fields the pipeline reads.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Columns {
    latitude: Option<usize>,
    longitude: Option<usize>,
    area: Option<usize>,
    confidence: Option<usize>,
    geometry: Option<usize>,
    plus_code: Option<usize>,
}

impl Columns {
    /// Locates the known columns by (trimmed) header name.
    pub(crate) fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut columns = Self::default();
        for (i, header) in headers.iter().enumerate() {
            let slot = match header.trim() {
                "latitude" => &mut columns.latitude,
                "longitude" => &mut columns.longitude,
                "area_in_meters" => &mut columns.area,
                "confidence" => &mut columns.confidence,
                "geometry" => &mut columns.geometry,
                "full_plus_code" => &mut columns.plus_code,
                _ => continue,
            };
            slot.get_or_insert(i);
        }
        columns
    }

    /// Names of required columns missing from the header.
    pub(crate) fn missing(&self) -> Vec<&'static str> {
        [
            ("latitude", self.latitude),
            ("longitude", self.longitude),
            ("area_in_meters", self.area),
            ("confidence", self.confidence),
            ("geometry", self.geometry),
        ]
        .into_iter()
        .filter_map(|(name, idx)| idx.is_none().then_some(name))
        .collect()
    }
}

/// Why a row produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowDrop {
    /// A numeric field is missing, unparseable, non-finite, or (for the
    /// area) not positive.
    Numeric,
    /// The geometry field is missing or blank.
    MissingGeometry,
    /// The WKT could not be parsed into a footprint.
    Geometry(ParseFailure),
}

/// Per-pass context shared by every row.
pub(crate) struct RowContext<'a> {
    pub(crate) pipeline: &'a Pipeline,
    pub(crate) columns: Columns,
    pub(crate) detected_at: DateTime<Utc>,
}

fn field<'r>(record: &'r csv::StringRecord, idx: Option<usize>) -> Option<&'r str> {
    idx.and_then(|i| record.get(i)).map(str::trim)
}

fn finite(record: &csv::StringRecord, idx: Option<usize>) -> Option<f64> {
    field(record, idx)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

impl RowContext<'_> {
    /// Turns one CSV row into a record, or reports why it was dropped.
    ///
    /// `row_index` is the 1-based data row number and becomes part of the
    /// record id.
    pub(crate) fn assemble(
        &self,
        record: &csv::StringRecord,
        row_index: u64,
        rng: &mut dyn RngCore,
    ) -> Result<BuildingRecord, RowDrop> {
        let latitude = finite(record, self.columns.latitude);
        let longitude = finite(record, self.columns.longitude);
        let area = finite(record, self.columns.area);
        let confidence = finite(record, self.columns.confidence);

        let (Some(latitude), Some(longitude), Some(area), Some(confidence)) =
            (latitude, longitude, area, confidence)
        else {
            return Err(RowDrop::Numeric);
        };
        if area <= 0.0 {
            return Err(RowDrop::Numeric);
        }

        let geometry = field(record, self.columns.geometry)
            .filter(|g| !g.is_empty())
            .ok_or(RowDrop::MissingGeometry)?;

        let footprint = self
            .pipeline
            .parser
            .parse_polygon(geometry)
            .map_err(RowDrop::Geometry)?;

        let regularity = self.pipeline.regularity.estimate(footprint.exterior(), rng);
        let near_road = self.pipeline.road_oracle.is_near_road(&footprint, rng);
        let classification = classify(area, near_road, regularity, rng);

        log::trace!(
            "row {row_index}: area={area:.1} near_road={near_road} regularity={regularity:.2} \
             -> {} ({:.1}, classifier)",
            classification.building_type,
            classification.confidence,
        );

        Ok(BuildingRecord {
            id: format!("{}_{row_index}", self.pipeline.options.id_prefix),
            numeric_id: row_index,
            footprint,
            area_in_meters: area.round(),
            classification: classification.building_type,
            confidence: confidence.clamp(0.0, 100.0),
            estimated_value: classification.estimated_value,
            near_road,
            detected_at: self.detected_at,
            latitude: Some(latitude),
            longitude: Some(longitude),
            full_plus_code: field(record, self.columns.plus_code)
                .filter(|code| !code.is_empty())
                .map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_columns_in_any_order() {
        let headers = csv::StringRecord::from(vec![
            "geometry",
            " confidence ",
            "area_in_meters",
            "longitude",
            "latitude",
            "full_plus_code",
        ]);
        let columns = Columns::from_headers(&headers);
        assert!(columns.missing().is_empty());
        assert_eq!(columns.geometry, Some(0));
        assert_eq!(columns.confidence, Some(1));
        assert_eq!(columns.plus_code, Some(5));
    }

    #[test]
    fn reports_missing_columns() {
        let headers = csv::StringRecord::from(vec!["latitude", "longitude", "confidence"]);
        let columns = Columns::from_headers(&headers);
        assert_eq!(columns.missing(), vec!["area_in_meters", "geometry"]);
    }

    #[test]
    fn rejects_non_finite_numbers() {
        let record = csv::StringRecord::from(vec!["inf", "NaN", "", "12.5", "abc"]);
        assert_eq!(finite(&record, Some(0)), None);
        assert_eq!(finite(&record, Some(1)), None);
        assert_eq!(finite(&record, Some(2)), None);
        assert_eq!(finite(&record, Some(3)), Some(12.5));
        assert_eq!(finite(&record, Some(4)), None);
        assert_eq!(finite(&record, Some(9)), None);
        assert_eq!(finite(&record, None), None);
    }
}
