//! Ingestion of previously exported `GeoJSON` building collections.
//!
//! Used when no CSV location loads. Features carry the record property bag
//! directly, so nothing is classified here; records are only validated.

use building_map_building_models::{BuildingRecord, BuildingType, Footprint, LonLat};
use building_map_classifier::estimate_value;
use building_map_geometry::ParseFailure;
use chrono::{DateTime, Utc};
use geojson::{Feature, GeoJson, feature::Id};
use serde::Deserialize;

use crate::row::RowDrop;
use crate::{DropTally, IngestError, IngestOptions, IngestOutcome};

/// Property bag of an exported building feature.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeatureProperties {
    #[serde(rename = "area_in_meters")]
    area_in_meters: f64,
    classification: BuildingType,
    confidence: f64,
    #[serde(default)]
    near_road: bool,
    estimated_value: Option<f64>,
    detected_at: Option<DateTime<Utc>>,
    numeric_id: Option<u64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(rename = "full_plus_code")]
    full_plus_code: Option<String>,
}

/// Ingests a `GeoJSON` `FeatureCollection` of exported building records.
///
/// Features are taken in document order. Only `Polygon` geometries are
/// accepted and only their outer ring is kept. Features without an `id`
/// get `{prefix}_{index}` with a 1-based feature index.
///
/// # Errors
///
/// Returns [`IngestError::GeoJson`] if the text is not valid `GeoJSON`, or
/// [`IngestError::InvalidGeoJson`] if it is not a `FeatureCollection`.
pub fn ingest_geojson(text: &str, options: &IngestOptions) -> Result<IngestOutcome, IngestError> {
    let geojson: GeoJson = text.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(IngestError::InvalidGeoJson {
            message: "expected a FeatureCollection".to_string(),
        });
    };

    let detected_at = Utc::now();
    let mut records = Vec::new();
    let mut dropped = DropTally::default();
    let mut rows_read: u64 = 0;

    for feature in &collection.features {
        if options
            .max_records
            .is_some_and(|max| records.len() as u64 >= max)
        {
            log::info!("Reached limit of {} buildings, stopping", records.len());
            break;
        }

        rows_read += 1;

        match feature_to_record(feature, rows_read, options, detected_at) {
            Ok(record) => records.push(record),
            Err(drop) => {
                log::trace!("Dropping feature {rows_read}: {drop:?}");
                dropped.record(drop);
            }
        }
    }

    log::info!(
        "Loaded {} buildings from {rows_read} GeoJSON features (dropped: {dropped})",
        records.len()
    );

    Ok(IngestOutcome {
        records,
        rows_read,
        dropped,
    })
}

fn feature_to_record(
    feature: &Feature,
    index: u64,
    options: &IngestOptions,
    detected_at: DateTime<Utc>,
) -> Result<BuildingRecord, RowDrop> {
    let geometry = feature.geometry.as_ref().ok_or(RowDrop::MissingGeometry)?;
    let geojson::Value::Polygon(rings) = &geometry.value else {
        return Err(RowDrop::Geometry(ParseFailure::NoMatch));
    };

    let outer = rings.first().ok_or(RowDrop::Geometry(ParseFailure::EmptyRing))?;
    if rings.len() > 1 {
        log::debug!("Discarding {} inner ring(s) of feature {index}", rings.len() - 1);
    }

    let ring = outer
        .iter()
        .map(|position| match position.as_slice() {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => {
                let point = LonLat::new(*lon, *lat);
                options.bounds.contains(point).then_some(point)
            }
            _ => None,
        })
        .collect::<Option<Vec<LonLat>>>()
        .ok_or(RowDrop::Geometry(ParseFailure::TooFewPoints))?;

    if ring.is_empty() {
        return Err(RowDrop::Geometry(ParseFailure::EmptyRing));
    }
    let footprint = Footprint::from_exterior(ring);
    if !footprint.is_well_formed() {
        return Err(RowDrop::Geometry(ParseFailure::TooFewPoints));
    }

    let props: FeatureProperties = feature
        .properties
        .clone()
        .map(serde_json::Value::Object)
        .and_then(|value| serde_json::from_value(value).ok())
        .ok_or(RowDrop::Numeric)?;

    let area = props.area_in_meters;
    if !area.is_finite() || area <= 0.0 || !(0.0..=100.0).contains(&props.confidence) {
        return Err(RowDrop::Numeric);
    }
    let estimated_value = match props.estimated_value {
        Some(value) if value.is_finite() && value >= 0.0 => value,
        Some(_) => return Err(RowDrop::Numeric),
        None => estimate_value(area, props.classification),
    };

    let id = match &feature.id {
        Some(Id::String(id)) => id.clone(),
        Some(Id::Number(n)) => n.to_string(),
        None => format!("{}_{index}", options.id_prefix),
    };

    Ok(BuildingRecord {
        id,
        numeric_id: props.numeric_id.unwrap_or(index),
        footprint,
        area_in_meters: area.round(),
        classification: props.classification,
        confidence: props.confidence,
        estimated_value,
        near_road: props.near_road,
        detected_at: props.detected_at.unwrap_or(detected_at),
        latitude: props.latitude.filter(|v| v.is_finite()),
        longitude: props.longitude.filter(|v| v.is_finite()),
        full_plus_code: props.full_plus_code.filter(|code| !code.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use building_map_building_models::BoundingBox;
    use serde_json::json;

    use super::*;

    fn square() -> serde_json::Value {
        json!([[[11.1, 10.2], [11.2, 10.2], [11.2, 10.3], [11.1, 10.3], [11.1, 10.2]]])
    }

    fn feature(id: Option<&str>, geometry: &serde_json::Value, props: &serde_json::Value) -> serde_json::Value {
        let mut f = json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": props,
        });
        if let Some(id) = id {
            f["id"] = json!(id);
        }
        f
    }

    fn props() -> serde_json::Value {
        json!({
            "area_in_meters": 250.4,
            "classification": "commercial",
            "confidence": 81.5,
            "nearRoad": true,
            "estimatedValue": 300_480.0,
            "detectedAt": "2024-11-02T10:00:00Z",
            "numericId": 7,
            "full_plus_code": "6FX3+XX",
        })
    }

    fn collection(features: Vec<serde_json::Value>) -> String {
        json!({ "type": "FeatureCollection", "features": features }).to_string()
    }

    fn polygon(coordinates: serde_json::Value) -> serde_json::Value {
        json!({ "type": "Polygon", "coordinates": coordinates })
    }

    fn options() -> IngestOptions {
        IngestOptions {
            id_prefix: "gombe".to_string(),
            bounds: BoundingBox {
                min_lon: 10.0,
                max_lon: 13.0,
                min_lat: 9.0,
                max_lat: 12.0,
            },
            ..IngestOptions::default()
        }
    }

    #[test]
    fn reads_exported_features() {
        let text = collection(vec![feature(Some("gombe_7"), &polygon(square()), &props())]);
        let outcome = ingest_geojson(&text, &options()).unwrap();

        assert_eq!(outcome.records.len(), 1);
        let record = &outcome.records[0];
        assert_eq!(record.id, "gombe_7");
        assert_eq!(record.numeric_id, 7);
        assert_eq!(record.classification, BuildingType::Commercial);
        assert!(record.near_road);
        assert!((record.area_in_meters - 250.0).abs() < f64::EPSILON);
        assert!((record.estimated_value - 300_480.0).abs() < f64::EPSILON);
        assert_eq!(record.detected_at.to_rfc3339(), "2024-11-02T10:00:00+00:00");
        assert_eq!(record.full_plus_code.as_deref(), Some("6FX3+XX"));
    }

    #[test]
    fn fills_missing_id_and_value() {
        let mut p = props();
        p.as_object_mut().unwrap().remove("estimatedValue");
        p.as_object_mut().unwrap().remove("numericId");
        let text = collection(vec![
            feature(None, &polygon(square()), &p),
            feature(None, &polygon(square()), &p),
        ]);
        let outcome = ingest_geojson(&text, &options()).unwrap();

        assert_eq!(outcome.records[1].id, "gombe_2");
        assert_eq!(outcome.records[1].numeric_id, 2);
        assert!((outcome.records[0].estimated_value - 300_480.0).abs() < f64::EPSILON);
    }

    #[test]
    fn drops_invalid_features() {
        let mut unknown = props();
        unknown["classification"] = json!("agricultural");
        let mut bad_confidence = props();
        bad_confidence["confidence"] = json!(140.0);

        let unclosed = json!([[[11.1, 10.2], [11.2, 10.2], [11.2, 10.3], [11.1, 10.3]]]);
        let outside = json!([[[20.0, 30.0], [21.0, 30.0], [21.0, 31.0], [20.0, 30.0]]]);

        let text = collection(vec![
            feature(None, &json!({ "type": "Point", "coordinates": [11.1, 10.2] }), &props()),
            feature(None, &polygon(unclosed), &props()),
            feature(None, &polygon(outside), &props()),
            feature(None, &polygon(square()), &unknown),
            feature(None, &polygon(square()), &bad_confidence),
            feature(None, &polygon(square()), &props()),
        ]);
        let outcome = ingest_geojson(&text, &options()).unwrap();

        assert_eq!(outcome.rows_read, 6);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.dropped.total(), 5);
        assert_eq!(outcome.dropped.no_match, 1);
        assert_eq!(outcome.dropped.numeric, 2);
    }

    #[test]
    fn discards_holes() {
        let with_hole = json!([
            [[11.1, 10.2], [11.2, 10.2], [11.2, 10.3], [11.1, 10.3], [11.1, 10.2]],
            [[11.12, 10.22], [11.14, 10.22], [11.14, 10.24], [11.12, 10.22]]
        ]);
        let text = collection(vec![feature(None, &polygon(with_hole), &props())]);
        let outcome = ingest_geojson(&text, &options()).unwrap();
        assert_eq!(outcome.records[0].footprint.rings.len(), 1);
    }

    #[test]
    fn honors_max_records() {
        let features = (0..5)
            .map(|_| feature(None, &polygon(square()), &props()))
            .collect();
        let opts = IngestOptions {
            max_records: Some(2),
            ..options()
        };
        let outcome = ingest_geojson(&collection(features), &opts).unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.rows_read, 2);
    }

    #[test]
    fn zero_max_records_accepts_nothing() {
        let features = (0..3)
            .map(|_| feature(None, &polygon(square()), &props()))
            .collect();
        let opts = IngestOptions {
            max_records: Some(0),
            ..options()
        };
        let outcome = ingest_geojson(&collection(features), &opts).unwrap();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.rows_read, 0);
    }

    #[test]
    fn rejects_non_collections() {
        let err = ingest_geojson(&polygon(square()).to_string(), &options()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidGeoJson { .. }));

        assert!(matches!(
            ingest_geojson("not json", &options()),
            Err(IngestError::GeoJson(_))
        ));
    }
}
