#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Building footprint ingestion.
//!
//! A single sequential pass over a CSV of WKT footprints: each row is
//! decoded, its geometry parsed, its regularity and road adjacency
//! estimated, and the building classified. Rows that fail any validation
//! are dropped and counted, never defaulted. Resource-level failures are
//! handled upstream in [`building_map_source`] and are never confused with
//! an empty result.
//!
//! All randomness comes from the `rng` passed to each call, and progress
//! and cancellation are scoped to the [`Pipeline`] that runs the pass.

pub mod geojson_fallback;
pub mod road;

mod row;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use building_map_building_models::{BoundingBox, BuildingRecord};
use building_map_geometry::{ParseFailure, RegularityEstimator, VertexBandEstimator, WktParser};
use building_map_source::progress::{ProgressCallback, null_progress};
use building_map_source_models::DatasetDefinition;
use rand::RngCore;

pub use geojson_fallback::ingest_geojson;
pub use road::{FixedRoadProximity, RandomRoadProximity, RoadProximityOracle};

use crate::row::{Columns, RowContext, RowDrop};

/// Default number of rows between progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

/// Errors that abort an ingestion pass.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The CSV stream could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The `GeoJSON` document could not be parsed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The `GeoJSON` document is not a `FeatureCollection`.
    #[error("Invalid GeoJSON: {message}")]
    InvalidGeoJson {
        /// Description of what went wrong.
        message: String,
    },

    /// The pass was cancelled between rows.
    #[error("Ingestion cancelled after {rows_read} rows")]
    Cancelled {
        /// Rows read before the cancellation was observed.
        rows_read: u64,
    },

    /// Loading the source failed.
    #[error(transparent)]
    Source(#[from] building_map_source::SourceError),
}

/// Settings for one ingestion pass.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOptions {
    /// Prefix for record identifiers (`{prefix}_{row}`).
    pub id_prefix: String,
    /// Stop once this many records have been accepted.
    pub max_records: Option<u64>,
    /// Coordinate sanity box.
    pub bounds: BoundingBox,
    /// Rows between progress reports.
    pub progress_interval: u64,
}

impl IngestOptions {
    /// Options for a configured dataset.
    #[must_use]
    pub fn from_dataset(dataset: &DatasetDefinition) -> Self {
        Self {
            id_prefix: dataset.id_prefix.clone(),
            max_records: dataset.max_records,
            bounds: dataset.bounds,
            ..Self::default()
        }
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            id_prefix: "building".to_string(),
            max_records: None,
            bounds: BoundingBox::WORLD,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Counts of dropped rows by reason. For logging only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropTally {
    /// Missing, unparseable, non-finite, or non-positive numeric fields.
    pub numeric: u64,
    /// Missing or blank geometry.
    pub missing_geometry: u64,
    /// Geometry without a `POLYGON((...))` body.
    pub no_match: u64,
    /// Outer ring with no valid coordinates.
    pub empty_ring: u64,
    /// Outer ring too short after validation.
    pub too_few_points: u64,
    /// Rows the CSV reader could not decode.
    pub malformed: u64,
}

impl DropTally {
    /// Total number of dropped rows.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.numeric
            + self.missing_geometry
            + self.no_match
            + self.empty_ring
            + self.too_few_points
            + self.malformed
    }

    pub(crate) const fn record(&mut self, drop: RowDrop) {
        match drop {
            RowDrop::Numeric => self.numeric += 1,
            RowDrop::MissingGeometry => self.missing_geometry += 1,
            RowDrop::Geometry(ParseFailure::NoMatch) => self.no_match += 1,
            RowDrop::Geometry(ParseFailure::EmptyRing) => self.empty_ring += 1,
            RowDrop::Geometry(ParseFailure::TooFewPoints) => self.too_few_points += 1,
        }
    }
}

impl std::fmt::Display for DropTally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "numeric={} missing_geometry={} no_match={} empty_ring={} too_few_points={} malformed={}",
            self.numeric,
            self.missing_geometry,
            self.no_match,
            self.empty_ring,
            self.too_few_points,
            self.malformed,
        )
    }
}

/// Result of a completed ingestion pass.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Accepted records, in source row order.
    pub records: Vec<BuildingRecord>,
    /// Data rows read (header excluded).
    pub rows_read: u64,
    /// Dropped rows by reason.
    pub dropped: DropTally,
}

/// A configured ingestion pass: parser, collaborators, progress, and
/// cancellation.
pub struct Pipeline {
    pub(crate) options: IngestOptions,
    pub(crate) parser: WktParser,
    pub(crate) regularity: Box<dyn RegularityEstimator>,
    pub(crate) road_oracle: Box<dyn RoadProximityOracle>,
    progress: Arc<dyn ProgressCallback>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Pipeline {
    /// Creates a pipeline with the default collaborators: vertex-band
    /// regularity, a fair-coin road oracle, and no progress reporting.
    #[must_use]
    pub fn new(options: IngestOptions) -> Self {
        Self {
            parser: WktParser::new(options.bounds),
            options,
            regularity: Box::new(VertexBandEstimator),
            road_oracle: Box::new(RandomRoadProximity::default()),
            progress: null_progress(),
            cancel: None,
        }
    }

    /// Replaces the road adjacency oracle.
    #[must_use]
    pub fn with_road_oracle(mut self, oracle: impl RoadProximityOracle + 'static) -> Self {
        self.road_oracle = Box::new(oracle);
        self
    }

    /// Replaces the regularity estimator.
    #[must_use]
    pub fn with_regularity(mut self, estimator: impl RegularityEstimator + 'static) -> Self {
        self.regularity = Box::new(estimator);
        self
    }

    /// Reports progress to `progress` during each pass.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Stops a pass between rows once `flag` is set.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// The options this pipeline was built with.
    #[must_use]
    pub const fn options(&self) -> &IngestOptions {
        &self.options
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Ingests CSV text with a header row.
    ///
    /// # Errors
    ///
    /// See [`Self::ingest_reader`].
    pub fn ingest_csv(
        &self,
        csv_text: &str,
        rng: &mut dyn RngCore,
    ) -> Result<IngestOutcome, IngestError> {
        self.ingest_reader(csv_text.as_bytes(), rng)
    }

    /// Ingests CSV from a reader, one row at a time.
    ///
    /// Rows are processed in order. Reading stops once
    /// [`IngestOptions::max_records`] records have been accepted.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Cancelled`] if the cancel flag is set, or
    /// [`IngestError::Csv`] if the underlying reader fails. Individual bad
    /// rows never produce an error.
    pub fn ingest_reader<R: std::io::Read>(
        &self,
        reader: R,
        rng: &mut dyn RngCore,
    ) -> Result<IngestOutcome, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let columns = Columns::from_headers(reader.headers()?);
        let missing = columns.missing();
        if !missing.is_empty() {
            log::warn!(
                "CSV header is missing column(s) {}; affected rows will be dropped",
                missing.join(", ")
            );
        }

        let ctx = RowContext {
            pipeline: self,
            columns,
            detected_at: chrono::Utc::now(),
        };

        let limit = self.options.max_records;
        let interval = self.options.progress_interval.max(1);
        let mut records: Vec<BuildingRecord> = Vec::new();
        let mut dropped = DropTally::default();
        let mut rows_read: u64 = 0;
        let mut record = csv::StringRecord::new();

        log::info!("Parsing building CSV...");
        self.progress.set_message("Parsing buildings".to_string());

        loop {
            if self.is_cancelled() {
                log::warn!("Ingestion cancelled after {rows_read} rows");
                self.progress.finish_and_clear();
                return Err(IngestError::Cancelled { rows_read });
            }

            if limit.is_some_and(|max| records.len() as u64 >= max) {
                log::info!("Reached limit of {} buildings, stopping", records.len());
                break;
            }

            match reader.read_record(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) if matches!(e.kind(), csv::ErrorKind::Utf8 { .. }) => {
                    rows_read += 1;
                    log::debug!("Skipping undecodable row {rows_read}: {e}");
                    dropped.malformed += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            rows_read += 1;

            match ctx.assemble(&record, rows_read, rng) {
                Ok(building) => records.push(building),
                Err(drop) => {
                    log::trace!("Dropping row {rows_read}: {drop:?}");
                    dropped.record(drop);
                }
            }

            if rows_read % interval == 0 {
                log::info!(
                    "Parsed {} buildings from {rows_read} rows...",
                    records.len()
                );
                self.progress.set_position(rows_read);
                self.progress.set_message(format!(
                    "Parsed {} buildings from {rows_read} rows",
                    records.len()
                ));
            }
        }

        log::info!(
            "Loaded {} buildings from {rows_read} CSV rows (dropped: {dropped})",
            records.len()
        );
        if let Some(max) = limit.filter(|&max| (records.len() as u64) < max) {
            log::info!(
                "Requested {max} buildings but only {} valid buildings found",
                records.len()
            );
        }
        self.progress.set_position(rows_read);
        self.progress.finish(format!(
            "Loaded {} buildings from {rows_read} rows",
            records.len()
        ));

        Ok(IngestOutcome {
            records,
            rows_read,
            dropped,
        })
    }
}

/// Ingests CSV text with the default collaborators and no coordinate
/// sanity box beyond WGS84 ranges.
///
/// # Errors
///
/// See [`Pipeline::ingest_reader`].
pub fn ingest(
    csv_text: &str,
    max_records: Option<u64>,
    rng: &mut dyn RngCore,
) -> Result<Vec<BuildingRecord>, IngestError> {
    let options = IngestOptions {
        max_records,
        ..IngestOptions::default()
    };
    Ok(Pipeline::new(options).ingest_csv(csv_text, rng)?.records)
}
