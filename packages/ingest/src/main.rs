#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the building footprint ingestion tool.

use std::collections::BTreeMap;
use std::io::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use building_map_building_models::{BuildingRecord, BuildingType};
use building_map_cli_utils::{IndicatifProgress, MultiProgress, init_logger};
use building_map_geometry::{CompactnessEstimator, VertexBandEstimator};
use building_map_ingest::{
    IngestError, IngestOptions, IngestOutcome, Pipeline, RandomRoadProximity, ingest_geojson,
};
use building_map_source::load::load_first;
use building_map_source::registry::{all_datasets, find_dataset};
use building_map_source_models::{Compression, DatasetLocation, LocationTarget, SourceFormat};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng as _};

#[derive(Parser)]
#[command(name = "building_map_ingest", about = "Building footprint ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all registered datasets
    Datasets,
    /// Load, parse, and classify a building dataset
    Load(LoadArgs),
}

#[derive(Args)]
struct LoadArgs {
    /// Dataset identifier (overrides `BUILDING_MAP_DATASET`, default "gombe")
    #[arg(long)]
    dataset: Option<String>,
    /// Load this file path or URL instead of the dataset's configured
    /// locations
    #[arg(long)]
    source: Option<String>,
    /// Input format. With `--source` it defaults to the file extension;
    /// otherwise it restricts which configured locations are tried.
    #[arg(long)]
    format: Option<SourceFormat>,
    /// Maximum number of buildings to keep (overrides the dataset default)
    #[arg(long)]
    limit: Option<u64>,
    /// Seed for the random number generator, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
    /// Probability that a building is treated as road-adjacent
    #[arg(long, default_value_t = RandomRoadProximity::DEFAULT_PROBABILITY)]
    near_road_probability: f64,
    /// Shape regularity heuristic
    #[arg(long, value_enum, default_value_t = Regularity::VertexBands)]
    regularity: Regularity,
    /// Print records as JSON lines instead of a summary
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Regularity {
    /// Vertex-count bands with jitter
    VertexBands,
    /// Isoperimetric ratio (the classifier is not tuned for this scale)
    Compactness,
}

/// Builds a single location from a `--source` argument.
fn location_from_arg(arg: &str, format: Option<SourceFormat>) -> DatasetLocation {
    let lower = arg.to_ascii_lowercase();
    let (stem, compression) = lower
        .strip_suffix(".gz")
        .map_or((lower.as_str(), None), |stem| (stem, Some(Compression::Gzip)));

    let format = format.unwrap_or_else(|| {
        if stem.ends_with(".geojson") || stem.ends_with(".json") {
            SourceFormat::Geojson
        } else {
            SourceFormat::Csv
        }
    });

    DatasetLocation {
        format,
        target: LocationTarget::from_arg(arg),
        compression,
    }
}

fn print_summary(outcome: &IngestOutcome, elapsed_secs: f64) {
    let mut by_type: BTreeMap<BuildingType, (u64, f64)> = BTreeMap::new();
    for record in &outcome.records {
        let entry = by_type.entry(record.classification).or_default();
        entry.0 += 1;
        entry.1 += record.estimated_value;
    }

    println!(
        "{} buildings from {} rows in {elapsed_secs:.1}s",
        outcome.records.len(),
        outcome.rows_read
    );
    println!("{:<15} {:>10} {:>18}", "TYPE", "COUNT", "EST. VALUE");
    println!("{}", "-".repeat(45));
    for (ty, (count, value)) in &by_type {
        println!("{:<15} {count:>10} {value:>18.0}", ty.as_ref());
    }
    println!("Dropped {}: {}", outcome.dropped.total(), outcome.dropped);
}

fn print_json_lines(records: &[BuildingRecord]) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

async fn run_load(multi: &MultiProgress, args: LoadArgs) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = find_dataset(args.dataset.as_deref())?;

    let locations: Vec<DatasetLocation> = match &args.source {
        Some(source) => vec![location_from_arg(source, args.format)],
        None => dataset
            .locations
            .iter()
            .filter(|l| args.format.is_none_or(|f| l.format == f))
            .cloned()
            .collect(),
    };

    let mut options = IngestOptions::from_dataset(&dataset);
    if args.limit.is_some() {
        options.max_records = args.limit;
    }

    log::info!(
        "Loading {} ({} location(s), limit {})",
        dataset.name(),
        locations.len(),
        options
            .max_records
            .map_or_else(|| "none".to_string(), |n| n.to_string())
    );

    let client = reqwest::Client::builder()
        .user_agent("building-map/1.0")
        .build()?;
    let data_dir = building_map_source::data_dir_from_env();

    let start = Instant::now();
    let loaded = match load_first(&client, &locations, &data_dir)
        .await
        .map_err(IngestError::from)
    {
        Ok(loaded) => loaded,
        Err(e) => {
            log::error!("Failed to load dataset {}: {e}", dataset.id());
            return Err(e.into());
        }
    };

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupt received, cancelling after the current row...");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let progress = IndicatifProgress::rows_bar(multi, "Parsing buildings");
    let format = loaded.location.format;
    let seed = args.seed;
    let near_road = RandomRoadProximity::new(args.near_road_probability);
    let regularity = args.regularity;

    let outcome = tokio::task::spawn_blocking(move || {
        let mut rng: Box<dyn RngCore> = match seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(rand::thread_rng()),
        };

        match format {
            SourceFormat::Csv => {
                let pipeline = Pipeline::new(options)
                    .with_road_oracle(near_road)
                    .with_progress(progress)
                    .with_cancel_flag(cancel);
                let pipeline = match regularity {
                    Regularity::VertexBands => pipeline.with_regularity(VertexBandEstimator),
                    Regularity::Compactness => pipeline.with_regularity(CompactnessEstimator),
                };
                pipeline.ingest_csv(&loaded.text, rng.as_mut())
            }
            SourceFormat::Geojson => {
                progress.finish_and_clear();
                ingest_geojson(&loaded.text, &options)
            }
        }
    })
    .await?;

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Ingestion of {} failed: {e}", dataset.id());
            return Err(e.into());
        }
    };

    let elapsed = start.elapsed().as_secs_f64();
    log::info!(
        "Ingestion complete: {} buildings in {elapsed:.1}s",
        outcome.records.len()
    );

    if args.json {
        print_json_lines(&outcome.records)?;
    } else {
        print_summary(&outcome, elapsed);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Datasets => {
            let datasets = all_datasets();
            println!("{:<20} {:<10} NAME", "ID", "LIMIT");
            println!("{}", "-".repeat(60));
            for dataset in &datasets {
                let limit = dataset
                    .max_records
                    .map_or_else(|| "-".to_string(), |n| n.to_string());
                println!("{:<20} {limit:<10} {}", dataset.id(), dataset.name());
            }
        }
        Commands::Load(args) => run_load(&multi, args).await?,
    }

    Ok(())
}
