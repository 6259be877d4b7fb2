//! Dataset registry, loaded from TOML definitions embedded at compile time.
//!
//! Adding a deployment means creating a TOML file in `datasets/` and
//! adding it to the list below.

use building_map_source_models::DatasetDefinition;

use crate::SourceError;

/// Environment variable selecting the dataset when none is given on the
/// command line.
pub const DATASET_ENV: &str = "BUILDING_MAP_DATASET";

/// Dataset used when neither the command line nor [`DATASET_ENV`] names one.
pub const DEFAULT_DATASET: &str = "gombe";

/// TOML configs embedded at compile time.
const DATASET_TOMLS: &[(&str, &str)] = &[("gombe", include_str!("../datasets/gombe.toml"))];

/// Total number of configured datasets (used in tests).
#[cfg(test)]
const EXPECTED_DATASET_COUNT: usize = 1;

/// Parses a dataset definition from TOML.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if the TOML is malformed or the
/// definition is unusable (no locations, inverted bounds).
pub fn parse_dataset_toml(toml_str: &str) -> Result<DatasetDefinition, SourceError> {
    let def: DatasetDefinition =
        toml::de::from_str(toml_str).map_err(|e| SourceError::Config {
            message: e.to_string(),
        })?;

    if def.locations.is_empty() {
        return Err(SourceError::Config {
            message: format!("dataset '{}' has no locations", def.id),
        });
    }
    if def.bounds.min_lon > def.bounds.max_lon || def.bounds.min_lat > def.bounds.max_lat {
        return Err(SourceError::Config {
            message: format!("dataset '{}' has inverted bounds", def.id),
        });
    }

    Ok(def)
}

/// Returns all configured dataset definitions.
///
/// # Panics
///
/// Panics if any embedded TOML config is malformed. The configs are
/// compile-time constants, so this indicates a development error and is
/// caught by the tests below.
#[must_use]
pub fn all_datasets() -> Vec<DatasetDefinition> {
    DATASET_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_dataset_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up a dataset by id. Falls back to [`DATASET_ENV`] and then
/// [`DEFAULT_DATASET`] when `id` is `None`.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if no dataset has the requested id.
pub fn find_dataset(id: Option<&str>) -> Result<DatasetDefinition, SourceError> {
    let wanted = id.map_or_else(
        || std::env::var(DATASET_ENV).unwrap_or_else(|_| DEFAULT_DATASET.to_string()),
        str::to_string,
    );

    all_datasets()
        .into_iter()
        .find(|d| d.id() == wanted)
        .ok_or_else(|| SourceError::Config {
            message: format!(
                "unknown dataset '{wanted}'. Available: {}",
                all_datasets()
                    .iter()
                    .map(|d| d.id().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        })
}
