#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Building dataset registry and resource loading.
//!
//! Datasets are declared in embedded TOML files ([`registry`]). Loading a
//! dataset ([`load`]) fetches or reads the first location that succeeds
//! and hands its text to the ingestion pipeline. A failed load is a
//! terminal error for that attempt; it is never reported as an empty
//! dataset.

pub mod load;
pub mod progress;
pub mod registry;

/// Environment variable overriding the directory that relative dataset
/// paths resolve against.
pub const DATA_DIR_ENV: &str = "BUILDING_MAP_DATA_DIR";

/// Data directory used when [`DATA_DIR_ENV`] is unset.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Errors that can occur while loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Failed to fetch building data from {url}: HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// I/O error (file read, decompression).
    #[error("I/O error reading {location}: {source}")]
    Io {
        /// Path or URL being read.
        location: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file contents are not valid UTF-8.
    #[error("{location} is not valid UTF-8: {source}")]
    Encoding {
        /// Path or URL being read.
        location: String,
        /// Underlying error.
        source: std::string::FromUtf8Error,
    },

    /// A dataset definition could not be used.
    #[error("Dataset configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

/// Resolves the data directory from [`DATA_DIR_ENV`], falling back to
/// [`DEFAULT_DATA_DIR`].
#[must_use]
pub fn data_dir_from_env() -> std::path::PathBuf {
    std::env::var(DATA_DIR_ENV)
        .map_or_else(|_| DEFAULT_DATA_DIR.into(), std::path::PathBuf::from)
}
