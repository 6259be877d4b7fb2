//! Reads or downloads dataset files.
//!
//! A dataset lists one or more locations in preference order. The first
//! location that loads wins; if none do, the last error is returned so the
//! caller can surface it as a load failure.

use std::io::Read as _;
use std::path::Path;

use building_map_source_models::{
    Compression, DatasetDefinition, DatasetLocation, LocationTarget,
};

use crate::SourceError;

/// Text of a successfully loaded dataset file.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    /// The location the text came from.
    pub location: DatasetLocation,
    /// Decoded (and decompressed) file contents.
    pub text: String,
}

/// Loads the text at a single location.
///
/// Relative paths resolve against `data_dir`. URLs are fetched once with
/// no retries; a non-success status is an error.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be read, the request fails
/// or returns a non-success status, decompression fails, or the contents
/// are not UTF-8.
pub async fn load_text(
    client: &reqwest::Client,
    location: &DatasetLocation,
    data_dir: &Path,
) -> Result<String, SourceError> {
    let label = location.target.to_string();

    let bytes: Vec<u8> = match &location.target {
        LocationTarget::Path(path) => {
            let resolved = data_dir.join(path);
            tokio::fs::read(&resolved)
                .await
                .map_err(|source| SourceError::Io {
                    location: resolved.display().to_string(),
                    source,
                })?
        }
        LocationTarget::Url(url) => {
            let response = client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(SourceError::Status {
                    url: url.clone(),
                    status: status.as_u16(),
                });
            }
            response.bytes().await?.to_vec()
        }
    };

    log::debug!("Read {} bytes from {label}", bytes.len());

    let bytes = match location.compression {
        Some(Compression::Gzip) => {
            let mut decoder = flate2::read::GzDecoder::new(bytes.as_slice());
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|source| SourceError::Io {
                    location: label.clone(),
                    source,
                })?;
            log::debug!("Decompressed to {} bytes", decompressed.len());
            decompressed
        }
        None => bytes,
    };

    #[allow(clippy::cast_precision_loss)]
    let megabytes = bytes.len() as f64 / 1024.0 / 1024.0;
    log::info!("Loaded {label} ({megabytes:.2} MB)");

    String::from_utf8(bytes).map_err(|source| SourceError::Encoding {
        location: label,
        source,
    })
}

/// Tries each location in order and returns the first one that loads.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if `locations` is empty, otherwise the
/// error from the last location tried when none succeed.
pub async fn load_first(
    client: &reqwest::Client,
    locations: &[DatasetLocation],
    data_dir: &Path,
) -> Result<LoadedSource, SourceError> {
    let mut last_error = None;

    for location in locations {
        match load_text(client, location, data_dir).await {
            Ok(text) => {
                return Ok(LoadedSource {
                    location: location.clone(),
                    text,
                });
            }
            Err(e) => {
                log::warn!(
                    "Could not load {} ({}): {e}",
                    location.target,
                    location.format
                );
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| SourceError::Config {
        message: "no dataset locations to try".to_string(),
    }))
}

/// Loads a dataset from the first of its configured locations that
/// succeeds.
///
/// # Errors
///
/// See [`load_first`].
pub async fn load_dataset(
    client: &reqwest::Client,
    dataset: &DatasetDefinition,
    data_dir: &Path,
) -> Result<LoadedSource, SourceError> {
    log::info!("Loading building data for {} ({})", dataset.name(), dataset.id());
    load_first(client, &dataset.locations, data_dir).await
}
