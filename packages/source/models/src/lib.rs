#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Building dataset definition types.
//!
//! Each deployment (region) is described by a TOML file listing where its
//! building footprints can be loaded from, in preference order, and the
//! coordinate sanity box that rows must fall inside.

use building_map_building_models::BoundingBox;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// File format of a dataset location.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceFormat {
    /// CSV with `latitude`, `longitude`, `area_in_meters`, `confidence`,
    /// and WKT `geometry` columns.
    Csv,
    /// `GeoJSON` `FeatureCollection` of already-classified buildings.
    Geojson,
}

/// Compression applied to a dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    /// Gzip (`.csv.gz` exports).
    Gzip,
}

/// Where a dataset file lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationTarget {
    /// Local filesystem path. Relative paths resolve against the data
    /// directory.
    Path(String),
    /// HTTP(S) URL.
    Url(String),
}

impl LocationTarget {
    /// Interprets a command-line argument as a URL if it has an HTTP(S)
    /// scheme, otherwise as a path.
    #[must_use]
    pub fn from_arg(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            Self::Url(arg.to_string())
        } else {
            Self::Path(arg.to_string())
        }
    }
}

impl std::fmt::Display for LocationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => f.write_str(path),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// One candidate location for a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetLocation {
    /// File format at this location.
    pub format: SourceFormat,
    /// Path or URL.
    #[serde(flatten)]
    pub target: LocationTarget,
    /// Compression, if the file is compressed.
    #[serde(default)]
    pub compression: Option<Compression>,
}

/// A building footprint dataset, deserialized from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDefinition {
    /// Unique dataset identifier (e.g., `"gombe"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Prefix for record identifiers (`{prefix}_{row}`).
    pub id_prefix: String,
    /// Default cap on the number of records loaded.
    #[serde(default)]
    pub max_records: Option<u64>,
    /// Coordinate sanity box for this deployment.
    pub bounds: BoundingBox,
    /// Candidate locations, tried in order.
    pub locations: Vec<DatasetLocation>,
}

impl DatasetDefinition {
    /// Returns the dataset identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the human-readable dataset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
